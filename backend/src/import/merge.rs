//! Join between report rows and an imported table.
//!
//! The mapping resolves external join-column values to internal ad-copy
//! names. Several external values may point at the same ad copy; the first
//! one in ascending value order that has an imported row wins. Report rows
//! without a match are kept and get empty values in every new column.

use common::model::report::{ColumnConfig, ColumnFormat, ReportRow};
use common::model::table::ParsedTable;
use std::collections::{BTreeMap, HashMap};

/// Derives the column id used for an imported column. The `ext_` prefix
/// keeps derived ids disjoint from the built-in report columns, and the
/// normalization is deterministic so re-running a merge maps onto the same
/// ids.
pub fn external_column_id(label: &str) -> String {
    let normalized: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("ext_{normalized}")
}

/// Best-effort display format from the column name. Date-like columns stay
/// text because the source date format is not guaranteed parseable.
pub fn detect_column_format(label: &str) -> ColumnFormat {
    let name = label.to_lowercase();
    if name.contains("date") || name.contains("jour") {
        return ColumnFormat::Text;
    }
    if ["€", "eur", "cost", "prix", "montant"]
        .iter()
        .any(|kw| name.contains(kw))
    {
        return ColumnFormat::Currency;
    }
    if ["%", "taux", "rate"].iter().any(|kw| name.contains(kw)) {
        return ColumnFormat::Percent;
    }
    ColumnFormat::Text
}

/// The columns a merge will append: every parsed column except the join
/// column.
pub fn external_columns(table: &ParsedTable, join_column: &str) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|c| c.as_str() != join_column)
        .cloned()
        .collect()
}

/// Registers each new external column in the report configuration, visible
/// by default. Running the merge again with the same labels refreshes values
/// without creating duplicate entries.
pub fn register_external_columns(config: &mut Vec<ColumnConfig>, labels: &[String]) {
    for label in labels {
        let id = external_column_id(label);
        if config.iter().any(|c| c.id == id) {
            continue;
        }
        config.push(ColumnConfig {
            id,
            label: label.clone(),
            visible: true,
            format: detect_column_format(label),
            is_external: true,
        });
    }
}

/// Applies the imported values onto the report rows in place and returns the
/// number of rows that found a matching imported row.
pub fn merge_external_rows(
    report: &mut [ReportRow],
    mapping: &BTreeMap<String, String>,
    table: &ParsedTable,
    join_column: &str,
) -> usize {
    // Invert: ad-copy name -> external values resolving to it, ascending.
    let mut by_adcopy: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (external, adcopy) in mapping {
        by_adcopy
            .entry(adcopy.as_str())
            .or_default()
            .push(external.as_str());
    }

    // Imported rows by join value. On duplicate join values the last row
    // wins.
    let mut by_join_value: HashMap<&str, &HashMap<String, String>> = HashMap::new();
    for row in &table.rows {
        if let Some(value) = row.get(join_column) {
            if !value.is_empty() {
                by_join_value.insert(value.as_str(), row);
            }
        }
    }

    let new_columns = external_columns(table, join_column);
    let mut matched = 0usize;
    for row in report.iter_mut() {
        let external_row = by_adcopy
            .get(row.join_key())
            .and_then(|externals| externals.iter().find_map(|ext| by_join_value.get(*ext)));
        if external_row.is_some() {
            matched += 1;
        }
        for column in &new_columns {
            let value = external_row.and_then(|r| r.get(column)).cloned();
            row.external.insert(external_column_id(column), value);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn report_row(title: &str, name: &str) -> ReportRow {
        ReportRow {
            date: "2025-06-01".to_string(),
            ad_copy_name: name.to_string(),
            ad_copy_title: title.to_string(),
            ad_group_name: String::new(),
            impressions: 0,
            clicks: 0,
            ctr: 0.0,
            cpc: 0.0,
            cpm: 0.0,
            costs: 0.0,
            external: BTreeMap::new(),
        }
    }

    fn table(join_column: &str, rows: Vec<Vec<(&str, &str)>>) -> ParsedTable {
        let mut columns: Vec<String> = vec![join_column.to_string()];
        if let Some(first) = rows.first() {
            for (k, _) in first {
                if *k != join_column {
                    columns.push(k.to_string());
                }
            }
        }
        ParsedTable {
            columns,
            rows: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
            separator: Some(';'),
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn column_ids_are_normalized_and_prefixed() {
        assert_eq!(external_column_id("Clicks"), "ext_clicks");
        assert_eq!(external_column_id("Cost (€)"), "ext_cost____");
        assert_eq!(external_column_id("Taux de clics"), "ext_taux_de_clics");
        // Deterministic: the same label always derives the same id.
        assert_eq!(external_column_id("Clicks"), external_column_id("Clicks"));
    }

    #[test]
    fn format_is_inferred_from_the_name() {
        assert_eq!(detect_column_format("Cost"), ColumnFormat::Currency);
        assert_eq!(detect_column_format("Montant total"), ColumnFormat::Currency);
        assert_eq!(detect_column_format("Conversion Rate"), ColumnFormat::Percent);
        assert_eq!(detect_column_format("Taux %"), ColumnFormat::Percent);
        assert_eq!(detect_column_format("Notes"), ColumnFormat::Text);
        // Date-like names stay textual even when another keyword matches.
        assert_eq!(detect_column_format("Update Date"), ColumnFormat::Text);
    }

    #[test]
    fn column_registration_is_idempotent() {
        let mut config = Vec::new();
        let labels = vec!["Clicks".to_string(), "Cost".to_string()];

        register_external_columns(&mut config, &labels);
        register_external_columns(&mut config, &labels);

        assert_eq!(config.len(), 2);
        assert!(config.iter().all(|c| c.visible && c.is_external));
        assert_eq!(config[1].format, ColumnFormat::Currency);
    }

    #[test]
    fn matched_rows_receive_external_values() {
        let mut report = vec![report_row("T1", "N1"), report_row("T2", "N2")];
        let table = table("sku", vec![vec![("sku", "ext1"), ("Clicks", "42")]]);
        let mapping = mapping(&[("ext1", "T1")]);

        let matched = merge_external_rows(&mut report, &mapping, &table, "sku");

        assert_eq!(matched, 1);
        assert_eq!(
            report[0].external.get("ext_clicks"),
            Some(&Some("42".to_string()))
        );
        // Unmatched rows are retained with empty values in the new columns.
        assert_eq!(report[1].external.get("ext_clicks"), Some(&None));
        assert_eq!(report[1].ad_copy_title, "T2");
    }

    #[test]
    fn first_mapped_external_value_with_a_row_wins() {
        let mut report = vec![report_row("T1", "N1")];
        let table = table(
            "sku",
            vec![
                vec![("sku", "bbb"), ("Clicks", "2")],
                vec![("sku", "aaa"), ("Clicks", "1")],
            ],
        );
        let mapping = mapping(&[("aaa", "T1"), ("bbb", "T1")]);

        merge_external_rows(&mut report, &mapping, &table, "sku");
        assert_eq!(
            report[0].external.get("ext_clicks"),
            Some(&Some("1".to_string()))
        );
    }

    #[test]
    fn skips_mapped_values_without_an_imported_row() {
        let mut report = vec![report_row("T1", "N1")];
        let table = table("sku", vec![vec![("sku", "bbb"), ("Clicks", "2")]]);
        let mapping = mapping(&[("aaa", "T1"), ("bbb", "T1")]);

        let matched = merge_external_rows(&mut report, &mapping, &table, "sku");
        assert_eq!(matched, 1);
        assert_eq!(
            report[0].external.get("ext_clicks"),
            Some(&Some("2".to_string()))
        );
    }

    #[test]
    fn duplicate_join_values_keep_the_last_row() {
        let mut report = vec![report_row("T1", "N1")];
        let table = table(
            "sku",
            vec![
                vec![("sku", "ext1"), ("Clicks", "1")],
                vec![("sku", "ext1"), ("Clicks", "2")],
            ],
        );
        let mapping = mapping(&[("ext1", "T1")]);

        merge_external_rows(&mut report, &mapping, &table, "sku");
        assert_eq!(
            report[0].external.get("ext_clicks"),
            Some(&Some("2".to_string()))
        );
    }

    #[test]
    fn join_key_falls_back_to_the_name_when_the_title_is_empty() {
        let mut report = vec![report_row("", "N1")];
        let table = table("sku", vec![vec![("sku", "ext1"), ("Clicks", "9")]]);
        let mapping = mapping(&[("ext1", "N1")]);

        let matched = merge_external_rows(&mut report, &mapping, &table, "sku");
        assert_eq!(matched, 1);
        assert_eq!(
            report[0].external.get("ext_clicks"),
            Some(&Some("9".to_string()))
        );
    }

    #[test]
    fn rows_with_an_empty_join_value_are_not_indexed() {
        let mut report = vec![report_row("T1", "N1")];
        let table = table("sku", vec![vec![("sku", ""), ("Clicks", "1")]]);
        let mapping = mapping(&[("", "T1")]);

        let matched = merge_external_rows(&mut report, &mapping, &table, "sku");
        assert_eq!(matched, 0);
    }
}
