//! Rule table, conclusion sentences, and the CSV report using Polars

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::config::ItemCatalog;
use crate::rules::Rule;
use crate::ItemId;

/// Report column headers, in output order
pub const REPORT_COLUMNS: [&str; 6] = [
    "Pola Aturan",
    "Support A",
    "Support B",
    "Support (A, B)",
    "Confidence",
    "Lift",
];

/// One presentation row of the rule table
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    /// `"<antecedent> -> <consequent>"` with display names
    pub rule: String,
    pub support_a: u64,
    pub support_b: u64,
    pub support_ab: u64,
    /// Confidence as a rounded percentage, e.g. `"83.0%"`
    pub confidence: String,
    /// Lift rounded to 2 decimals
    pub lift: f64,
}

impl RuleRow {
    pub fn from_rule(rule: &Rule, catalog: &ItemCatalog) -> Self {
        Self {
            rule: format!(
                "{} -> {}",
                display_name(catalog, rule.antecedent),
                display_name(catalog, rule.consequent)
            ),
            support_a: rule.support_a,
            support_b: rule.support_b,
            support_ab: rule.support_ab,
            confidence: format!("{:.1}%", confidence_percent(rule.confidence)),
            lift: round2(rule.lift),
        }
    }
}

/// Round to 2 decimal places; presentation only
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Confidence rounded to 2 decimals, then scaled to a percentage
pub fn confidence_percent(confidence: f64) -> f64 {
    round2(confidence) * 100.0
}

/// Catalog name for an item, or a placeholder when the catalog lacks it
pub fn display_name(catalog: &ItemCatalog, id: ItemId) -> String {
    catalog
        .name(id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("item {id}"))
}

/// Natural-language conclusion for an accepted rule
pub fn conclusion_for(rule: &Rule, catalog: &ItemCatalog) -> String {
    format!(
        "Jika parfum {} terjual terbanyak dalam 1 hari maka, kemungkinan besar pembeli akan \
         membeli parfum {} dengan keyakinan sebesar {:.1}% dan hubungan sebesar (lift: {:.2}).",
        display_name(catalog, rule.antecedent),
        display_name(catalog, rule.consequent),
        confidence_percent(rule.confidence),
        round2(rule.lift)
    )
}

/// Build the report table as a DataFrame
pub fn rules_frame(rows: &[RuleRow]) -> crate::Result<DataFrame> {
    let rule: Vec<String> = rows.iter().map(|r| r.rule.clone()).collect();
    let support_a: Vec<u64> = rows.iter().map(|r| r.support_a).collect();
    let support_b: Vec<u64> = rows.iter().map(|r| r.support_b).collect();
    let support_ab: Vec<u64> = rows.iter().map(|r| r.support_ab).collect();
    let confidence: Vec<String> = rows.iter().map(|r| r.confidence.clone()).collect();
    let lift: Vec<f64> = rows.iter().map(|r| r.lift).collect();

    let df = DataFrame::new(vec![
        Series::new(REPORT_COLUMNS[0], rule),
        Series::new(REPORT_COLUMNS[1], support_a),
        Series::new(REPORT_COLUMNS[2], support_b),
        Series::new(REPORT_COLUMNS[3], support_ab),
        Series::new(REPORT_COLUMNS[4], confidence),
        Series::new(REPORT_COLUMNS[5], lift),
    ])?;
    Ok(df)
}

/// Write the rule table as a CSV report
pub fn write_report_csv(rows: &[RuleRow], output_path: impl AsRef<Path>) -> crate::Result<()> {
    let mut df = rules_frame(rows)?;
    let mut file = File::create(output_path.as_ref())?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}

/// Render the rule table as aligned text
pub fn format_rule_table(rows: &[RuleRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.rule.clone(),
                r.support_a.to_string(),
                r.support_b.to_string(),
                r.support_ab.to_string(),
                r.confidence.clone(),
                format!("{:.2}", r.lift),
            ]
        })
        .collect();

    let mut widths = REPORT_COLUMNS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = REPORT_COLUMNS
        .iter()
        .zip(widths.iter())
        .map(|(h, &w)| format!("{h:<w$}"))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let rule_line: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&rule_line.join("-+-"));
    out.push('\n');

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .enumerate()
            // text left-aligned, numbers right-aligned
            .map(|(i, (cell, &w))| if i == 0 { format!("{cell:<w$}") } else { format!("{cell:>w$}") })
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule(antecedent: ItemId, consequent: ItemId, confidence: f64, lift: f64) -> Rule {
        Rule {
            antecedent,
            consequent,
            support_a: 6,
            support_b: 5,
            support_ab: 5,
            confidence,
            lift,
        }
    }

    #[test]
    fn test_row_rounds_for_presentation() {
        let catalog = ItemCatalog::perfumes();
        let row = RuleRow::from_rule(&rule(1, 2, 5.0 / 6.0, 1.1666666), &catalog);

        assert_eq!(row.rule, "Bacaros -> Je Premium");
        assert_eq!(row.confidence, "83.0%");
        assert_eq!(row.lift, 1.17);
    }

    #[test]
    fn test_conclusion_sentence() {
        let catalog = ItemCatalog::perfumes();
        let text = conclusion_for(&rule(3, 7, 1.0, 1.0), &catalog);

        assert_eq!(
            text,
            "Jika parfum Armor terjual terbanyak dalam 1 hari maka, kemungkinan besar pembeli akan \
             membeli parfum Haizelia dengan keyakinan sebesar 100.0% dan hubungan sebesar (lift: 1.00)."
        );
    }

    #[test]
    fn test_unknown_item_uses_placeholder() {
        let catalog = ItemCatalog::perfumes();
        assert_eq!(display_name(&catalog, 99), "item 99");
        let row = RuleRow::from_rule(&rule(99, 1, 1.0, 1.0), &catalog);
        assert_eq!(row.rule, "item 99 -> Bacaros");
    }

    #[test]
    fn test_write_report_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hasil_analisis.csv");
        let catalog = ItemCatalog::perfumes();
        let rows = vec![RuleRow::from_rule(&rule(1, 2, 1.0, 1.25), &catalog)];

        write_report_csv(&rows, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Pola Aturan,Support A,Support B,"));
        assert!(header.contains("Support (A, B)"));
        assert!(header.ends_with(",Confidence,Lift"));
        assert_eq!(lines.next(), Some("Bacaros -> Je Premium,6,5,5,100.0%,1.25"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_format_rule_table() {
        let catalog = ItemCatalog::perfumes();
        let rows = vec![RuleRow::from_rule(&rule(1, 2, 1.0, 1.0), &catalog)];

        let table = format_rule_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Pola Aturan"));
        assert!(lines[2].starts_with("Bacaros -> Je Premium"));
        assert!(lines[2].ends_with("1.00"));
    }
}
