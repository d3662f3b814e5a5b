mod config;
mod date;
mod extract;
mod noise;
mod normalize;
mod numbers;
mod ocr;
mod output;
mod series;
mod sheet;
mod variety;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_SHEET, OCR_LANGUAGE};
use ocr::{OcrSettings, process_image_directory};
use output::{DashboardData, display_summary, write_dashboard};
use series::{PriceRecords, PriceTable};
use sheet::{SheetTable, read_sheet};

#[derive(Parser)]
#[command(name = "byadgi-trends")]
#[command(about = "Build the Byadgi chilli price dashboard from market screenshots or the price sheet")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// OCR a folder of market price screenshots
    Ocr {
        /// Folder containing PNG/JPG screenshots
        #[arg(short, long, default_value = DEFAULT_INPUT_DIR)]
        dir: PathBuf,
        /// Folder receiving data.json and index.html
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        out: PathBuf,
        /// Tesseract tessdata folder, if not the system default
        #[arg(long)]
        tessdata: Option<String>,
        #[arg(long, default_value = OCR_LANGUAGE)]
        lang: String,
        /// Print the latest prices as a table
        #[arg(long)]
        summary: bool,
    },
    /// Convert the tab separated price sheet
    Sheet {
        #[arg(short, long, default_value = DEFAULT_SHEET)]
        file: PathBuf,
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        out: PathBuf,
        #[arg(long)]
        summary: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Ocr {
            dir: PathBuf::from(DEFAULT_INPUT_DIR),
            out: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tessdata: None,
            lang: OCR_LANGUAGE.to_string(),
            summary: false,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    match args.command.unwrap_or_default() {
        Command::Ocr {
            dir,
            out,
            tessdata,
            lang,
            summary,
        } => {
            let settings = OcrSettings {
                tessdata,
                language: lang,
            };
            run_ocr(&dir, &out, &settings, summary)
        }
        Command::Sheet { file, out, summary } => run_sheet(&file, &out, summary),
    }
}

fn init_logging() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
}

fn run_ocr(dir: &Path, out: &Path, settings: &OcrSettings, summary: bool) -> Result<()> {
    log::info!("Starting dashboard generation from {}", dir.display());

    let records = process_image_directory(dir, settings)?;
    publish_records(&records, dir, out, summary)
}

/// Tabulates the OCR records and writes the dashboard. Nothing is written
/// when no document produced a price.
fn publish_records(records: &PriceRecords, source: &Path, out: &Path, summary: bool) -> Result<()> {
    let Some(table) = PriceTable::assemble(records) else {
        log::error!("No data extracted!");
        bail!("No data extracted from {}", source.display());
    };
    log::info!(
        "Detected {} varieties, {} dates",
        table.varieties.len(),
        table.dates.len()
    );
    log::info!("Varieties: {}", table.varieties.join(", "));

    let data = DashboardData::from_table(&table, Utc::now());
    finish(out, &data, summary)
}

fn run_sheet(file: &Path, out: &Path, summary: bool) -> Result<()> {
    log::info!("Converting price sheet {}", file.display());

    let sheet = read_sheet(file)?;
    publish_sheet(&sheet, file, out, summary)
}

fn publish_sheet(sheet: &SheetTable, source: &Path, out: &Path, summary: bool) -> Result<()> {
    if sheet.series.is_empty() {
        log::error!("No prices found in the sheet!");
        bail!("No data extracted from {}", source.display());
    }
    log::info!(
        "Loaded {} series over {} dates",
        sheet.series.len(),
        sheet.dates.len()
    );

    let data = DashboardData::from_sheet(sheet, Utc::now());
    finish(out, &data, summary)
}

fn finish(out: &Path, data: &DashboardData, summary: bool) -> Result<()> {
    write_dashboard(out, data)?;
    if summary {
        display_summary(data);
    }
    log::info!("SUCCESS! Generated {} varieties", data.varieties.len());
    Ok(())
}
