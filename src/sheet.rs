//! Reads the weekly price sheet export (tab separated).
//!
//! The sheet is laid out in blocks. A block starts with a header row naming
//! the storage category, the next row carries the date labels, and each row
//! after that is one variety with its prices under those dates. A block ends
//! at a blank row or at the next header.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::numbers::{extract_numbers, pick_price};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ColdStorage,
    NewCrop,
}

impl Category {
    const ALL: [Category; 2] = [Category::ColdStorage, Category::NewCrop];

    fn marker(self) -> &'static str {
        match self {
            Category::ColdStorage => "A/C COLD STORAGE",
            Category::NewCrop => "NEW CROP",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Category::ColdStorage => "AC",
            Category::NewCrop => "New Crop",
        }
    }

    fn detect(row: &[String]) -> Option<Self> {
        let first = row.iter().find(|cell| !cell.is_empty())?.to_uppercase();
        Self::ALL.into_iter().find(|category| first.contains(category.marker()))
    }
}

/// Date labels plus one price series per `<variety> (<category>)` key, all
/// aligned to `dates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub dates: Vec<String>,
    pub series: BTreeMap<String, Vec<Option<u32>>>,
}

#[derive(Debug, Default)]
struct Block {
    /// `(column index, date label)` for every non-empty date cell.
    date_columns: Vec<(usize, String)>,
    rows: Vec<(String, Vec<Option<u32>>)>,
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

/// Parses one price cell. Ranges collapse to their midpoint; blanks and
/// placeholders are `None`.
pub fn parse_price_cell(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() || matches!(cell.to_uppercase().as_str(), "-" | "NA" | "N/A" | "NIL") {
        return None;
    }
    let price = pick_price(&extract_numbers(cell));
    if price.is_none() {
        log::warn!("Unreadable price cell {cell:?}");
    }
    price
}

fn read_block(rows: &[Vec<String>]) -> Block {
    let mut block = Block::default();
    let mut remaining = rows.iter().skip_while(|row| is_blank(row));

    let Some(date_row) = remaining.next() else {
        return block;
    };
    block.date_columns = date_row
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(column, cell)| (column, cell.clone()))
        .collect();

    for row in remaining {
        if is_blank(row) || Category::detect(row).is_some() {
            break;
        }
        let label = row.first().map(String::as_str).unwrap_or_default();
        if label.is_empty() {
            continue;
        }
        let prices: Vec<Option<u32>> = block
            .date_columns
            .iter()
            .map(|(column, _)| row.get(*column).and_then(|cell| parse_price_cell(cell)))
            .collect();
        if prices.iter().all(Option::is_none) {
            log::debug!("Skipping sheet row without prices: {label:?}");
            continue;
        }
        block.rows.push((label.to_string(), prices));
    }
    block
}

/// Builds the table from raw, already trimmed rows.
pub fn parse_sheet_rows(rows: &[Vec<String>]) -> SheetTable {
    let mut blocks = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if let Some(category) = Category::detect(row) {
            blocks.push((category, read_block(&rows[index + 1..])));
        }
    }
    for category in Category::ALL {
        if !blocks.iter().any(|(found, _)| *found == category) {
            log::warn!("No {:?} block in the price sheet", category.marker());
        }
    }

    let mut table = SheetTable::default();
    for (_, block) in &blocks {
        for (_, label) in &block.date_columns {
            if !table.dates.contains(label) {
                table.dates.push(label.clone());
            }
        }
    }

    for (category, block) in blocks {
        for (label, prices) in block.rows {
            let mut aligned = vec![None; table.dates.len()];
            for ((_, date), price) in block.date_columns.iter().zip(prices) {
                if let Some(position) = table.dates.iter().position(|d| d == date) {
                    aligned[position] = price;
                }
            }
            table
                .series
                .insert(format!("{label} ({})", category.suffix()), aligned);
        }
    }
    table
}

/// Reads a tab separated sheet from disk.
pub fn read_sheet(path: &Path) -> Result<SheetTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open price sheet {}", path.display()))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read price sheet row")?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    log::info!("Read {} rows from {}", rows.len(), path.display());

    Ok(parse_sheet_rows(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rows(tsv: &str) -> Vec<Vec<String>> {
        tsv.lines()
            .map(|line| line.split('\t').map(|cell| cell.trim().to_string()).collect())
            .collect()
    }

    const SHEET: &str = "Namma Byadgi weekly prices\n\
        A/C COLD STORAGE\n\
        Variety\t06-Nov\t13-Nov\t20-Nov\n\
        Dabbi DLX\t34,500\t48000\t36000\n\
        KDL Medium Best\t26000\t\t24000\n\
        \n\
        NEW CROP (moisture)\n\
        Variety\t13-Nov\t20-Nov\t27-Nov\n\
        Dabbi DLX\t55500\t40000-42000\t-\n\
        NOTE: all prices per quintal\n";

    #[test]
    fn blocks_become_suffixed_series() {
        let table = parse_sheet_rows(&rows(SHEET));
        assert_eq!(table.dates, vec!["06-Nov", "13-Nov", "20-Nov", "27-Nov"]);
        assert_eq!(
            table.series["Dabbi DLX (AC)"],
            vec![Some(34500), Some(48000), Some(36000), None]
        );
        assert_eq!(
            table.series["KDL Medium Best (AC)"],
            vec![Some(26000), None, Some(24000), None]
        );
        assert_eq!(
            table.series["Dabbi DLX (New Crop)"],
            vec![None, Some(55500), Some(41000), None]
        );
        assert_eq!(table.series.len(), 3);
    }

    #[test]
    fn missing_block_is_empty_not_fatal() {
        let only_ac = "A/C COLD STORAGE\nVariety\t01-Dec\nSeed Qty\t15000\n";
        let table = parse_sheet_rows(&rows(only_ac));
        assert_eq!(table.dates, vec!["01-Dec"]);
        assert_eq!(table.series["Seed Qty (AC)"], vec![Some(15000)]);

        let renamed = "COLD STORE\nVariety\t01-Dec\nSeed Qty\t15000\n";
        assert_eq!(parse_sheet_rows(&rows(renamed)), SheetTable::default());
    }

    #[test]
    fn header_row_ends_previous_block() {
        let sheet = "A/C COLD STORAGE\nVariety\t01-Dec\nKDL DLX\t29000\nNEW CROP\nVariety\t01-Dec\nKDL DLX\t41000\n";
        let table = parse_sheet_rows(&rows(sheet));
        assert_eq!(table.series["KDL DLX (AC)"], vec![Some(29000)]);
        assert_eq!(table.series["KDL DLX (New Crop)"], vec![Some(41000)]);
    }

    #[test]
    fn price_cells() {
        assert_eq!(parse_price_cell("31,000"), Some(31000));
        assert_eq!(parse_price_cell(" 40000-42000 "), Some(41000));
        assert_eq!(parse_price_cell(""), None);
        assert_eq!(parse_price_cell("-"), None);
        assert_eq!(parse_price_cell("NA"), None);
        assert_eq!(parse_price_cell("tbd"), None);
    }

    #[test]
    fn reading_twice_gives_the_same_table() {
        let dir = std::env::temp_dir().join("byadgi_trends_sheet_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Prices.tsv");
        fs::write(&path, SHEET).unwrap();

        let first = read_sheet(&path).unwrap();
        let second = read_sheet(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.series.len(), 3);

        fs::remove_file(&path).unwrap();
    }
}
