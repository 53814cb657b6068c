//! Five-step import sequence, from file selection to the final merge.
//!
//! The operator walks through: select file -> pick the header line -> pick the
//! join column -> map its values to ad copies -> confirm and merge. Each step
//! is its own [`ImportStage`] variant carrying exactly the data the step
//! needs, so a merge without a mapping is not a runtime check but an
//! unrepresentable state.
//!
//! Moving forward runs the step's side effects (upload, parse, store
//! lookup); moving backward never recomputes anything, data already
//! produced stays attached to the stage. Cancelling at any point deletes
//! the uploaded temp file and resets to step one.

use crate::error::AppError;
use crate::file_store::{validate_upload, TempFileStore};
use crate::import::merge;
use crate::mappings_store::MappingStore;
use crate::parser::{self, Separator, PREVIEW_MAX_LINES};
use common::model::report::{ColumnConfig, ReportRow};
use common::model::table::ParsedTable;
use common::requests::MappingEntry;
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Step-1 result: the stored upload plus its raw preview.
#[derive(Debug, Clone)]
pub struct FileSelection {
    pub file_id: String,
    pub original_name: String,
    pub lines: Vec<String>,
    pub total_lines: usize,
    pub is_excel: bool,
    pub detected_separator: char,
    pub sheet_names: Option<Vec<String>>,
}

/// Step-2 result: the table parsed from the chosen header line.
#[derive(Debug, Clone)]
pub struct TableSelection {
    pub start_line: usize,
    pub separator: Separator,
    pub table: ParsedTable,
}

/// Step-3/4 result: the join column, its distinct values and the working
/// mapping (seeded from the persisted store, then edited by the operator).
#[derive(Debug, Clone)]
pub struct ColumnSelection {
    pub join_column: String,
    /// Sorted, deduplicated, non-empty values of the join column.
    pub unique_values: Vec<String>,
    /// What the store knew when step 4 was entered.
    pub existing: BTreeMap<String, String>,
    /// The working mapping; keys are always a subset of `unique_values`.
    pub current: BTreeMap<String, String>,
}

/// Step-5 figures shown before the merge is confirmed.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub row_count: usize,
    pub new_columns: Vec<String>,
    pub mapped_values: usize,
    pub total_values: usize,
    pub matched_report_rows: usize,
    pub report_rows: usize,
}

#[derive(Debug, Clone)]
pub enum ImportStage {
    SelectFile {
        file: Option<FileSelection>,
    },
    SelectStartLine {
        file: FileSelection,
        start_line: usize,
        separator: Separator,
        /// Parse result kept when navigating back from step 3.
        retained: Option<TableSelection>,
    },
    SelectJoinColumn {
        file: FileSelection,
        table: TableSelection,
        selected: Option<String>,
        /// Value work kept when navigating back from step 4.
        retained: Option<ColumnSelection>,
    },
    MapValues {
        file: FileSelection,
        table: TableSelection,
        column: ColumnSelection,
    },
    Confirm {
        file: FileSelection,
        table: TableSelection,
        column: ColumnSelection,
        summary: MergeSummary,
    },
}

impl ImportStage {
    pub fn step(&self) -> u8 {
        match self {
            ImportStage::SelectFile { .. } => 1,
            ImportStage::SelectStartLine { .. } => 2,
            ImportStage::SelectJoinColumn { .. } => 3,
            ImportStage::MapValues { .. } => 4,
            ImportStage::Confirm { .. } => 5,
        }
    }
}

/// Result of the final merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub saved_mappings: usize,
    pub matched_rows: usize,
    pub new_columns: Vec<String>,
}

pub struct ImportWorkflow {
    files: Arc<TempFileStore>,
    mappings: Arc<MappingStore>,
    stage: ImportStage,
}

impl ImportWorkflow {
    pub fn new(files: Arc<TempFileStore>, mappings: Arc<MappingStore>) -> Self {
        Self {
            files,
            mappings,
            stage: ImportStage::SelectFile { file: None },
        }
    }

    pub fn step(&self) -> u8 {
        self.stage.step()
    }

    pub fn stage(&self) -> &ImportStage {
        &self.stage
    }

    pub fn file(&self) -> Option<&FileSelection> {
        match &self.stage {
            ImportStage::SelectFile { file } => file.as_ref(),
            ImportStage::SelectStartLine { file, .. }
            | ImportStage::SelectJoinColumn { file, .. }
            | ImportStage::MapValues { file, .. }
            | ImportStage::Confirm { file, .. } => Some(file),
        }
    }

    pub fn table(&self) -> Option<&ParsedTable> {
        match &self.stage {
            ImportStage::SelectFile { .. } => None,
            ImportStage::SelectStartLine { retained, .. } => {
                retained.as_ref().map(|t| &t.table)
            }
            ImportStage::SelectJoinColumn { table, .. }
            | ImportStage::MapValues { table, .. }
            | ImportStage::Confirm { table, .. } => Some(&table.table),
        }
    }

    pub fn column(&self) -> Option<&ColumnSelection> {
        match &self.stage {
            ImportStage::SelectJoinColumn { retained, .. } => retained.as_ref(),
            ImportStage::MapValues { column, .. } | ImportStage::Confirm { column, .. } => {
                Some(column)
            }
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&MergeSummary> {
        match &self.stage {
            ImportStage::Confirm { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Step 1: validates, stores and previews an upload. Selecting a new
    /// file replaces the previous one and deletes its temp file.
    pub async fn select_file(
        &mut self,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<(), AppError> {
        let ImportStage::SelectFile { file } = &mut self.stage else {
            return Err(wrong_step("A file import is already in progress"));
        };

        validate_upload(original_name, bytes.len())?;

        if let Some(previous) = file.take() {
            self.files.delete(&previous.file_id).await;
        }

        let file_id = self.files.save(bytes, original_name).await?;
        let preview = parser::preview(&self.files, &file_id, PREVIEW_MAX_LINES).await?;
        let detected_separator = parser::detect_separator(&preview.lines);

        let ImportStage::SelectFile { file } = &mut self.stage else {
            return Err(wrong_step("A file import is already in progress"));
        };
        *file = Some(FileSelection {
            file_id,
            original_name: original_name.to_string(),
            lines: preview.lines,
            total_lines: preview.total_lines,
            is_excel: preview.is_excel,
            detected_separator,
            sheet_names: preview.sheet_names,
        });
        Ok(())
    }

    /// Step 1: drops the selected file, deleting its temp file.
    pub async fn clear_file(&mut self) -> Result<(), AppError> {
        let ImportStage::SelectFile { file } = &mut self.stage else {
            return Err(wrong_step("Not at the file selection step"));
        };
        if let Some(previous) = file.take() {
            self.files.delete(&previous.file_id).await;
        }
        Ok(())
    }

    /// Transition 1 -> 2. Requires an uploaded file.
    pub fn confirm_file(&mut self) -> Result<(), AppError> {
        match self.take_stage() {
            ImportStage::SelectFile { file: Some(file) } => {
                self.stage = ImportStage::SelectStartLine {
                    file,
                    start_line: 0,
                    separator: Separator::Auto,
                    retained: None,
                };
                Ok(())
            }
            other => {
                self.stage = other;
                Err(AppError::Validation("Select a file first".to_string()))
            }
        }
    }

    /// Step 2: picks the line the header row starts at.
    pub fn set_start_line(&mut self, line: usize) -> Result<(), AppError> {
        if let ImportStage::SelectStartLine { start_line, .. } = &mut self.stage {
            *start_line = line;
            Ok(())
        } else {
            Err(wrong_step("Not at the start line step"))
        }
    }

    /// Step 2: picks the delimiter, or `auto` to re-detect while parsing.
    pub fn set_separator(&mut self, choice: Separator) -> Result<(), AppError> {
        if let ImportStage::SelectStartLine { separator, .. } = &mut self.stage {
            *separator = choice;
            Ok(())
        } else {
            Err(wrong_step("Not at the start line step"))
        }
    }

    /// Transition 2 -> 3: parses the file from the chosen start line.
    pub async fn parse_table(&mut self) -> Result<(), AppError> {
        match self.take_stage() {
            ImportStage::SelectStartLine {
                file,
                start_line,
                separator,
                retained,
            } => {
                match parser::parse(&self.files, &file.file_id, start_line, separator).await {
                    Ok(table) => {
                        info!(
                            "File parsed: {} row(s), {} column(s)",
                            table.row_count(),
                            table.columns.len()
                        );
                        self.stage = ImportStage::SelectJoinColumn {
                            file,
                            table: TableSelection {
                                start_line,
                                separator,
                                table,
                            },
                            selected: None,
                            retained: None,
                        };
                        Ok(())
                    }
                    Err(e) => {
                        self.stage = ImportStage::SelectStartLine {
                            file,
                            start_line,
                            separator,
                            retained,
                        };
                        Err(e)
                    }
                }
            }
            other => {
                self.stage = other;
                Err(wrong_step("Not at the start line step"))
            }
        }
    }

    /// Step 3: picks the column whose values identify the ad copy.
    pub fn set_join_column(&mut self, column: &str) -> Result<(), AppError> {
        if let ImportStage::SelectJoinColumn {
            table, selected, ..
        } = &mut self.stage
        {
            if !table.table.columns.iter().any(|c| c == column) {
                return Err(AppError::Validation(format!("Unknown column '{column}'")));
            }
            *selected = Some(column.to_string());
            Ok(())
        } else {
            Err(wrong_step("Not at the join column step"))
        }
    }

    /// Transition 3 -> 4: computes the distinct join-column values and seeds
    /// the working mapping from the persisted store.
    pub fn load_mappings(&mut self) -> Result<(), AppError> {
        match self.take_stage() {
            ImportStage::SelectJoinColumn {
                file,
                table,
                selected: Some(join_column),
                ..
            } => {
                let unique_values = unique_column_values(&table.table, &join_column);
                let existing: BTreeMap<String, String> = self
                    .mappings
                    .by_external_values(&unique_values)
                    .into_iter()
                    .map(|m| (m.external_value, m.adcopy_name))
                    .collect();
                let current = existing.clone();
                info!(
                    "Mapping step: {} distinct value(s), {} already known",
                    unique_values.len(),
                    existing.len()
                );
                self.stage = ImportStage::MapValues {
                    file,
                    table,
                    column: ColumnSelection {
                        join_column,
                        unique_values,
                        existing,
                        current,
                    },
                };
                Ok(())
            }
            other @ ImportStage::SelectJoinColumn { .. } => {
                self.stage = other;
                Err(AppError::Validation("Select a join column first".to_string()))
            }
            other => {
                self.stage = other;
                Err(wrong_step("Not at the join column step"))
            }
        }
    }

    /// Step 4: maps one external value to an ad copy, or unmaps it.
    pub fn map_value(&mut self, external: &str, adcopy: Option<&str>) -> Result<(), AppError> {
        if let ImportStage::MapValues { column, .. } = &mut self.stage {
            if !column.unique_values.iter().any(|v| v == external) {
                return Err(AppError::Validation(format!(
                    "Unknown external value '{external}'"
                )));
            }
            match adcopy {
                Some(name) if !name.is_empty() => {
                    column.current.insert(external.to_string(), name.to_string());
                }
                _ => {
                    column.current.remove(external);
                }
            }
            Ok(())
        } else {
            Err(wrong_step("Not at the value mapping step"))
        }
    }

    /// Transition 4 -> 5: requires at least one mapped value and computes the
    /// figures shown on the confirmation step.
    pub fn prepare_summary(&mut self, report: &[ReportRow]) -> Result<(), AppError> {
        match self.take_stage() {
            ImportStage::MapValues {
                file,
                table,
                column,
            } if !column.current.is_empty() => {
                let new_columns = merge::external_columns(&table.table, &column.join_column);
                let mapped: BTreeSet<&str> =
                    column.current.values().map(|s| s.as_str()).collect();
                // A report row counts as matched when either its title or
                // its name is a mapped ad copy.
                let matched_report_rows = report
                    .iter()
                    .filter(|r| {
                        mapped.contains(r.ad_copy_title.as_str())
                            || mapped.contains(r.ad_copy_name.as_str())
                    })
                    .count();
                let summary = MergeSummary {
                    row_count: table.table.row_count(),
                    new_columns,
                    mapped_values: column.current.len(),
                    total_values: column.unique_values.len(),
                    matched_report_rows,
                    report_rows: report.len(),
                };
                self.stage = ImportStage::Confirm {
                    file,
                    table,
                    column,
                    summary,
                };
                Ok(())
            }
            other @ ImportStage::MapValues { .. } => {
                self.stage = other;
                Err(AppError::Validation(
                    "Map at least one value before continuing".to_string(),
                ))
            }
            other => {
                self.stage = other;
                Err(wrong_step("Not at the value mapping step"))
            }
        }
    }

    /// Terminal action from step 5: persists the changed mappings, joins the
    /// imported rows onto the report, deletes the temp file and resets.
    pub async fn merge(
        &mut self,
        report: &mut [ReportRow],
        columns_config: &mut Vec<ColumnConfig>,
    ) -> Result<MergeOutcome, AppError> {
        match self.take_stage() {
            ImportStage::Confirm {
                file,
                table,
                column,
                summary,
            } => {
                // Persist only the mappings that differ from the lookup.
                let changed: Vec<MappingEntry> = column
                    .current
                    .iter()
                    .filter(|(ext, adcopy)| column.existing.get(*ext) != Some(*adcopy))
                    .map(|(ext, adcopy)| MappingEntry {
                        external_value: ext.to_string(),
                        adcopy_name: adcopy.to_string(),
                    })
                    .collect();
                let saved_mappings = match self.mappings.upsert_batch(&changed) {
                    Ok(saved) => {
                        if saved > 0 {
                            info!("{saved} mapping(s) saved");
                        }
                        saved
                    }
                    Err(e) => {
                        self.stage = ImportStage::Confirm {
                            file,
                            table,
                            column,
                            summary,
                        };
                        return Err(e);
                    }
                };

                let new_columns = merge::external_columns(&table.table, &column.join_column);
                merge::register_external_columns(columns_config, &new_columns);
                let matched_rows = merge::merge_external_rows(
                    report,
                    &column.current,
                    &table.table,
                    &column.join_column,
                );

                self.files.delete(&file.file_id).await;
                self.stage = ImportStage::SelectFile { file: None };
                info!("Import merge completed: {matched_rows} matched row(s)");

                Ok(MergeOutcome {
                    saved_mappings,
                    matched_rows,
                    new_columns,
                })
            }
            other => {
                self.stage = other;
                Err(wrong_step("Nothing to merge"))
            }
        }
    }

    /// Moves one step back. Never recomputes or discards forward data; a
    /// no-op on step 1.
    pub fn back(&mut self) {
        self.stage = match self.take_stage() {
            stage @ ImportStage::SelectFile { .. } => stage,
            ImportStage::SelectStartLine { file, .. } => {
                ImportStage::SelectFile { file: Some(file) }
            }
            ImportStage::SelectJoinColumn { file, table, .. } => ImportStage::SelectStartLine {
                file,
                start_line: table.start_line,
                separator: table.separator,
                retained: Some(table),
            },
            ImportStage::MapValues {
                file,
                table,
                column,
            } => ImportStage::SelectJoinColumn {
                file,
                table,
                selected: Some(column.join_column.clone()),
                retained: Some(column),
            },
            ImportStage::Confirm {
                file,
                table,
                column,
                ..
            } => ImportStage::MapValues {
                file,
                table,
                column,
            },
        };
    }

    /// Aborts the import from any step: deletes the uploaded temp file if
    /// one exists and resets to step 1.
    pub async fn cancel(&mut self) {
        let file_id = self.file().map(|f| f.file_id.clone());
        if let Some(file_id) = file_id {
            self.files.delete(&file_id).await;
        }
        self.stage = ImportStage::SelectFile { file: None };
    }

    fn take_stage(&mut self) -> ImportStage {
        std::mem::replace(&mut self.stage, ImportStage::SelectFile { file: None })
    }
}

fn wrong_step(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}

fn unique_column_values(table: &ParsedTable, column: &str) -> Vec<String> {
    let set: BTreeSet<String> = table
        .rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .collect();
    set.into_iter().collect()
}
