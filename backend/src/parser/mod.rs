//! Parsing of uploaded tabular files.
//!
//! Text-delimited files are handled in [`delimited`], spreadsheets in
//! [`spreadsheet`]; dispatch is by the stored extension and both produce the
//! same [`ParsedTable`] shape. Spreadsheets are rendered to `;`-separated
//! text for the raw preview so the two kinds look the same to the client.

mod delimited;
mod spreadsheet;

use crate::error::AppError;
use crate::file_store::{TempFileMeta, TempFileStore};
use common::model::table::ParsedTable;

/// Number of raw lines returned by a preview.
pub const PREVIEW_MAX_LINES: usize = 30;

/// Delimiter candidates, in tie-breaking order.
const SEPARATOR_CANDIDATES: [char; 4] = [';', ',', '\t', '|'];

/// Non-empty lines inspected by [`detect_separator`].
const SEPARATOR_SAMPLE_LINES: usize = 5;

/// Delimiter choice sent by the client: a literal character or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Auto,
    Char(char),
}

impl Separator {
    /// Accepts `None`/`"auto"` or a single ASCII character.
    pub fn from_request(raw: Option<&str>) -> Result<Self, AppError> {
        match raw {
            None | Some("auto") => Ok(Self::Auto),
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii() => Ok(Self::Char(c)),
                    _ => Err(AppError::Validation(format!("Invalid separator '{s}'"))),
                }
            }
        }
    }
}

/// Raw first lines of a stored file, for the start-line picker.
#[derive(Debug, Clone)]
pub struct FilePreview {
    pub lines: Vec<String>,
    pub total_lines: usize,
    pub is_excel: bool,
    pub sheet_names: Option<Vec<String>>,
}

pub async fn preview(
    store: &TempFileStore,
    file_id: &str,
    max_lines: usize,
) -> Result<FilePreview, AppError> {
    let meta = lookup(store, file_id).await?;
    if meta.is_excel() {
        spreadsheet::preview(&meta, file_id, max_lines)
    } else {
        delimited::preview(&meta, file_id, max_lines)
    }
}

pub async fn parse(
    store: &TempFileStore,
    file_id: &str,
    start_line: usize,
    separator: Separator,
) -> Result<ParsedTable, AppError> {
    let meta = lookup(store, file_id).await?;
    if meta.is_excel() {
        spreadsheet::parse(&meta, file_id, start_line)
    } else {
        delimited::parse(&meta, file_id, start_line, separator)
    }
}

async fn lookup(store: &TempFileStore, file_id: &str) -> Result<TempFileMeta, AppError> {
    store
        .metadata(file_id)
        .await
        .ok_or_else(|| AppError::not_found("File", file_id))
}

/// Picks the most plausible delimiter from raw lines.
///
/// Each candidate is counted on the first [`SEPARATOR_SAMPLE_LINES`]
/// non-empty lines. A perfectly consistent count scores ten times the count,
/// an inconsistent one scores the first line's count, a candidate absent
/// from the first line scores zero. Highest score wins, ties go to the
/// earlier candidate, and an all-zero board falls back to `;`.
pub fn detect_separator(lines: &[String]) -> char {
    let mut best = ';';
    let mut best_score = 0;
    for (candidate, score) in separator_scores(lines) {
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }
    best
}

fn separator_scores(lines: &[String]) -> Vec<(char, usize)> {
    let sample: Vec<&str> = lines
        .iter()
        .map(|l| l.as_str())
        .filter(|l| !l.trim().is_empty())
        .take(SEPARATOR_SAMPLE_LINES)
        .collect();

    SEPARATOR_CANDIDATES
        .iter()
        .map(|&candidate| {
            let counts: Vec<usize> = sample
                .iter()
                .map(|line| line.matches(candidate).count())
                .collect();
            let score = match counts.first() {
                Some(&first) if first > 0 => {
                    if counts.iter().all(|&c| c == first) {
                        first * 10
                    } else {
                        first
                    }
                }
                _ => 0,
            };
            (candidate, score)
        })
        .collect()
}

/// Splits file content on line boundaries, accepting `\n` and `\r\n`. A
/// trailing newline yields a final empty line, so the line count matches
/// what a client-side `split(/\r?\n/)` would see.
pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_store::TEMP_FILE_TTL;

    #[test]
    fn consistent_counts_score_ten_times() {
        let lines: Vec<String> = (0..5).map(|i| format!("a;b;c;{i}")).collect();
        let scores = separator_scores(&lines);
        assert!(scores.contains(&(';', 30)));
        assert_eq!(detect_separator(&lines), ';');
    }

    #[test]
    fn inconsistent_counts_score_first_line_count() {
        let lines: Vec<String> = ["a,b,c", "a,b,c,d", "a,b,c", "a,b,c,d", "a,b,c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let scores = separator_scores(&lines);
        assert!(scores.contains(&(',', 2)));
        assert_eq!(detect_separator(&lines), ',');
    }

    #[test]
    fn ties_break_in_declaration_order() {
        let lines = vec!["a;b|c".to_string()];
        // Both ';' and '|' appear once and consistently; ';' is declared first.
        assert_eq!(detect_separator(&lines), ';');
    }

    #[test]
    fn zero_scores_fall_back_to_semicolon() {
        let lines = vec!["plain text".to_string()];
        assert_eq!(detect_separator(&lines), ';');
        assert_eq!(detect_separator(&[]), ';');
    }

    #[test]
    fn empty_lines_are_not_sampled() {
        let lines = vec![
            String::new(),
            "  ".to_string(),
            "x|y|z".to_string(),
            "u|v|w".to_string(),
        ];
        assert_eq!(detect_separator(&lines), '|');
    }

    #[test]
    fn tab_candidate_is_detected() {
        let lines = vec!["a\tb\tc".to_string(), "1\t2\t3".to_string()];
        assert_eq!(detect_separator(&lines), '\t');
    }

    #[test]
    fn split_lines_accepts_both_line_endings() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn separator_choice_parsing() {
        assert_eq!(Separator::from_request(None).unwrap(), Separator::Auto);
        assert_eq!(
            Separator::from_request(Some("auto")).unwrap(),
            Separator::Auto
        );
        assert_eq!(
            Separator::from_request(Some(";")).unwrap(),
            Separator::Char(';')
        );
        assert_eq!(
            Separator::from_request(Some("\t")).unwrap(),
            Separator::Char('\t')
        );
        assert!(Separator::from_request(Some(";;")).is_err());
        assert!(Separator::from_request(Some("")).is_err());
    }

    #[actix_web::test]
    async fn preview_of_unknown_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = TempFileStore::new(dir.path().join("temp"), TEMP_FILE_TTL);
        let err = preview(&store, "missing", PREVIEW_MAX_LINES)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[actix_web::test]
    async fn preview_returns_first_lines_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let store = TempFileStore::new(dir.path().join("temp"), TEMP_FILE_TTL);

        let content: String = (0..40).map(|i| format!("line{i}\n")).collect();
        let id = store.save(content.as_bytes(), "big.csv").await.unwrap();

        let preview = preview(&store, &id, PREVIEW_MAX_LINES).await.unwrap();
        assert_eq!(preview.lines.len(), PREVIEW_MAX_LINES);
        assert_eq!(preview.lines[0], "line0");
        // 40 content lines plus the empty line after the trailing newline.
        assert_eq!(preview.total_lines, 41);
        assert!(!preview.is_excel);
        assert!(preview.sheet_names.is_none());
    }

    #[actix_web::test]
    async fn parse_detects_separator_and_builds_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = TempFileStore::new(dir.path().join("temp"), TEMP_FILE_TTL);

        let id = store
            .save(b"id;name\n1;Foo\n2;Bar", "data.csv")
            .await
            .unwrap();
        let table = parse(&store, &id, 0, Separator::Auto).await.unwrap();

        assert_eq!(table.separator, Some(';'));
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0]["id"], "1");
        assert_eq!(table.rows[0]["name"], "Foo");
        assert_eq!(table.rows[1]["name"], "Bar");
    }

    #[actix_web::test]
    async fn parse_skips_lines_before_start_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = TempFileStore::new(dir.path().join("temp"), TEMP_FILE_TTL);

        let id = store
            .save(b"exported 2024-01-01\n\nid,name\n7,Baz", "export.csv")
            .await
            .unwrap();
        let table = parse(&store, &id, 2, Separator::Auto).await.unwrap();

        assert_eq!(table.separator, Some(','));
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.rows[0]["id"], "7");
    }

    #[actix_web::test]
    async fn start_line_past_the_end_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = TempFileStore::new(dir.path().join("temp"), TEMP_FILE_TTL);

        let id = store.save(b"id;name\n1;Foo", "data.csv").await.unwrap();
        let table = parse(&store, &id, 99, Separator::Auto).await.unwrap();

        assert!(table.columns.is_empty());
        assert_eq!(table.row_count(), 0);
    }
}
