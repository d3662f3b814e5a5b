//! Compiled-in defaults. Every CLI argument falls back to one of these.

pub const DEFAULT_INPUT_DIR: &str = "Prices";
pub const DEFAULT_OUTPUT_DIR: &str = "web";
pub const DEFAULT_SHEET: &str = "Prices.tsv";

pub const DATA_FILE: &str = "data.json";
pub const DASHBOARD_FILE: &str = "index.html";

pub const OCR_LANGUAGE: &str = "eng";
/// Tesseract page segmentation mode: a single uniform block of text.
pub const OCR_PAGE_SEG_MODE: &str = "6";
pub const BINARIZE_THRESHOLD: u8 = 140;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub const MIN_PRICE: u32 = 100;
pub const MAX_PRICE: u32 = 100_000;

/// Characters scanned before/after a variety mention when neither its own
/// line nor the lookahead lines carry a price.
pub const WINDOW_BEFORE: usize = 100;
pub const WINDOW_AFTER: usize = 200;
pub const LOOKAHEAD_LINES: usize = 2;

pub const WEEK_DAYS: i64 = 7;

pub const CANONICAL_VARIETIES: [&str; 9] = [
    "Syngenta 2043",
    "Syngenta 5531",
    "Syngenta 102",
    "Kashmiri (Dabbi)",
    "Byadgi (KDL)",
    "Local KDL",
    "Devanur Deluxe (DD)",
    "Guntur S-10",
    "Seed Quality",
];

/// Scale factor applied before OCR, keyed on the longest image side.
pub fn upscale_factor(longest_side: u32) -> u32 {
    if longest_side < 600 {
        3
    } else if longest_side < 1000 {
        2
    } else {
        1
    }
}
