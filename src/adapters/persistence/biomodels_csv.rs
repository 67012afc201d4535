//! BioModels reaction CSV loader. Uses the `csv` crate.
//!
//! Converts curated rows into prompt-ready Markdown reference tables.

use crate::domain::{BioModelsRow, DomainError};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

pub const GENES_COLUMN: &str = "entity_gene_symbols";
pub const REACTION_COLUMN: &str = "reaction with inferred entities";
pub const RATE_COLUMN: &str = "rate with inferred entities";
pub const MODEL_COLUMN: &str = "model";

const NO_DATA_TABLE: &str =
    "| Reaction | Rate Equation |\n|----------|---------------|\n| No data | No data |";

pub fn load_biomodels_csv(path: &Path) -> Result<Vec<BioModelsRow>, DomainError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DomainError::Input(format!("{}: {}", path.display(), e)))?;
    let rows = read_biomodels(file)?;
    info!(path = %path.display(), rows = rows.len(), "loaded BioModels reactions");
    Ok(rows)
}

/// Read rows from any CSV source with a header line. Missing optional
/// columns yield `None` fields; the gene column is required.
pub fn read_biomodels<R: Read>(reader: R) -> Result<Vec<BioModelsRow>, DomainError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| DomainError::Input(format!("CSV header: {}", e)))?
        .clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let genes_idx = position(GENES_COLUMN)
        .ok_or_else(|| DomainError::Input(format!("CSV is missing column '{}'", GENES_COLUMN)))?;
    let reaction_idx = position(REACTION_COLUMN);
    let rate_idx = position(RATE_COLUMN);
    let model_idx = position(MODEL_COLUMN);

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DomainError::Input(format!("CSV row {}: {}", line + 1, e)))?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim);
        rows.push(BioModelsRow {
            genes: cell(Some(genes_idx)).unwrap_or_default().to_string(),
            reactions: cell(reaction_idx).and_then(parse_list_cell),
            rates: cell(rate_idx).and_then(parse_list_cell),
            model: cell(model_idx)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        });
    }
    Ok(rows)
}

/// A bracketed list literal (`['a', "b"]`) becomes its items; any other
/// non-empty cell becomes a single item.
pub fn parse_list_cell(cell: &str) -> Option<Vec<String>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if !cell.starts_with('[') {
        return Some(vec![cell.to_string()]);
    }
    match parse_list_literal(cell) {
        Some(items) => Some(items),
        None => {
            warn!(cell = %cell.chars().take(80).collect::<String>(), "unreadable list cell, kept as text");
            Some(vec![cell.to_string()])
        }
    }
}

fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        let Some(quote) = chars.next() else {
            return Some(items);
        };
        if quote != '\'' && quote != '"' {
            return None;
        }
        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);
    }
}

/// Markdown table of reference reactions and rate equations for one row.
/// Shorter columns are padded with empty cells.
pub fn reaction_table(row: &BioModelsRow) -> String {
    let (Some(reactions), Some(rates)) = (&row.reactions, &row.rates) else {
        return NO_DATA_TABLE.to_string();
    };
    let len = reactions.len().max(rates.len());
    let escape = |s: Option<&String>| s.map(|v| v.replace('|', "\\|")).unwrap_or_default();

    let mut table = String::from("| Reaction | Rate Equation |\n|----------|---------------|");
    for i in 0..len {
        table.push_str(&format!(
            "\n| {} | {} |",
            escape(reactions.get(i)),
            escape(rates.get(i))
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "entity_gene_symbols,reaction with inferred entities,rate with inferred entities,model\n\
EGFR EGF,\"['EGF + EGFR -> EGF_EGFR', 'EGF_EGFR -> EGF + EGFR']\",\"['k1*EGF*EGFR']\",BIOMD0000000019\n\
MAPK1,,,\n";

    #[test]
    fn test_read_biomodels_rows() {
        let rows = read_biomodels(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].genes, "EGFR EGF");
        assert_eq!(rows[0].reactions.as_ref().unwrap().len(), 2);
        assert_eq!(rows[0].rates.as_deref(), Some(&["k1*EGF*EGFR".to_string()][..]));
        assert_eq!(rows[0].model.as_deref(), Some("BIOMD0000000019"));
        assert_eq!(rows[1].reactions, None);
        assert_eq!(rows[1].model, None);
    }

    #[test]
    fn test_missing_gene_column_is_input_error() {
        let res = read_biomodels("model\nBIOMD1\n".as_bytes());
        assert!(matches!(res, Err(DomainError::Input(_))));
    }

    #[test]
    fn test_parse_list_cell_variants() {
        assert_eq!(
            parse_list_cell(r#"['a, b', "c", 'd\'s']"#),
            Some(vec!["a, b".to_string(), "c".to_string(), "d's".to_string()])
        );
        assert_eq!(parse_list_cell("[]"), Some(vec![]));
        assert_eq!(parse_list_cell("k1*A"), Some(vec!["k1*A".to_string()]));
        assert_eq!(parse_list_cell("   "), None);
        assert_eq!(parse_list_cell("[1, 2]"), Some(vec!["[1, 2]".to_string()]));
    }

    #[test]
    fn test_reaction_table_pads_shorter_column() {
        let row = BioModelsRow {
            genes: "A".to_string(),
            reactions: Some(vec!["A -> B".to_string(), "B -> C".to_string()]),
            rates: Some(vec!["k1*A".to_string()]),
            model: None,
        };
        let table = reaction_table(&row);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Reaction | Rate Equation |");
        assert_eq!(lines[2], "| A -> B | k1*A |");
        assert_eq!(lines[3], "| B -> C |  |");
    }

    #[test]
    fn test_reaction_table_without_data() {
        let row = BioModelsRow {
            genes: "A".to_string(),
            reactions: Some(vec!["A -> B".to_string()]),
            ..Default::default()
        };
        assert!(reaction_table(&row).ends_with("| No data | No data |"));
    }
}
