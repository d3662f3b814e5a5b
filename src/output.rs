//! `data.json`, the dashboard page, and the console summary.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use prettytable::{Cell, Row, Table, format};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{DASHBOARD_FILE, DATA_FILE};
use crate::series::{PriceTable, week_over_week};
use crate::sheet::SheetTable;

const DASHBOARD_HTML: &str = include_str!("../assets/index.html");

/// The document the dashboard page fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub dates: Vec<String>,
    pub varieties: Vec<String>,
    pub ac_prices: BTreeMap<String, Vec<Option<u32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolated: Option<BTreeMap<String, Vec<bool>>>,
    pub wow_change: BTreeMap<String, Vec<Option<f64>>>,
    pub last_updated: String,
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl DashboardData {
    pub fn from_table(table: &PriceTable, now: DateTime<Utc>) -> Self {
        Self {
            dates: table
                .dates
                .iter()
                .map(|date| date.format("%d %b %Y").to_string())
                .collect(),
            varieties: table.varieties.clone(),
            ac_prices: table.prices.clone(),
            interpolated: Some(table.interpolated.clone()),
            wow_change: table.wow_change(),
            last_updated: timestamp(now),
        }
    }

    pub fn from_sheet(sheet: &SheetTable, now: DateTime<Utc>) -> Self {
        Self {
            dates: sheet.dates.clone(),
            varieties: sheet.series.keys().cloned().collect(),
            ac_prices: sheet.series.clone(),
            interpolated: None,
            wow_change: sheet
                .series
                .iter()
                .map(|(variety, column)| (variety.clone(), week_over_week(column)))
                .collect(),
            last_updated: timestamp(now),
        }
    }
}

/// Writes `data.json` and `index.html` into `out_dir`, creating it if needed.
pub fn write_dashboard(out_dir: &Path, data: &DashboardData) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output folder {}", out_dir.display()))?;

    let json_path = out_dir.join(DATA_FILE);
    let json = serde_json::to_string_pretty(data).context("Failed to serialize dashboard data")?;
    fs::write(&json_path, json).with_context(|| format!("Failed to write {}", json_path.display()))?;
    log::info!("JSON saved: {}", json_path.display());

    let html_path = out_dir.join(DASHBOARD_FILE);
    fs::write(&html_path, DASHBOARD_HTML)
        .with_context(|| format!("Failed to write {}", html_path.display()))?;
    log::info!("HTML generated: {}", html_path.display());

    Ok((json_path, html_path))
}

/// Most recent non-null price with its change, per variety.
fn latest(data: &DashboardData, variety: &str) -> Option<(usize, u32, Option<f64>)> {
    let column = data.ac_prices.get(variety)?;
    let (index, price) = column
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, price)| price.map(|p| (i, p)))?;
    let change = data
        .wow_change
        .get(variety)
        .and_then(|wow| wow.get(index).copied().flatten());
    Some((index, price, change))
}

pub fn display_summary(data: &DashboardData) {
    if data.varieties.is_empty() {
        println!("No prices found.");
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.set_titles(Row::new(vec![
        Cell::new("Variety"),
        Cell::new("As of"),
        Cell::new("Price"),
        Cell::new("WoW"),
    ]));

    for variety in &data.varieties {
        let Some((index, price, change)) = latest(data, variety) else {
            table.add_row(Row::new(vec![Cell::new(variety), Cell::new("-"), Cell::new("-"), Cell::new("-")]));
            continue;
        };
        let as_of = data.dates.get(index).map(String::as_str).unwrap_or("-");
        let wow = change.map(|c| format!("{c:+.2}%")).unwrap_or_else(|| "-".to_string());
        let wow_cell = match change {
            Some(c) if c < 0.0 => Cell::new(&wow).style_spec("Fr"),
            Some(c) if c > 0.0 => Cell::new(&wow).style_spec("Fg"),
            _ => Cell::new(&wow),
        };
        table.add_row(Row::new(vec![
            Cell::new(variety),
            Cell::new(as_of),
            Cell::new(&format!("\u{20b9}{price}")).style_spec("b"),
            wow_cell,
        ]));
    }

    table.printstd();
    println!(
        "\nFound {} varieties across {} dates",
        data.varieties.len(),
        data.dates.len()
    );
}
