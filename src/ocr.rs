//! Screenshot OCR: preprocessing, the Tesseract call, and the folder walk.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Luma};
use std::env;
use std::fs;
use std::path::Path;
use tesseract::Tesseract;
use walkdir::WalkDir;

use crate::config::{BINARIZE_THRESHOLD, IMAGE_EXTENSIONS, OCR_PAGE_SEG_MODE, upscale_factor};
use crate::extract::{DocumentRecord, parse_document};
use crate::series::{PriceRecords, merge_document};

const PREPROCESSED_PAGE_SEG_MODE: Option<&str> = Some(OCR_PAGE_SEG_MODE);
/// The retry on the untouched file runs with Tesseract's defaults.
const FALLBACK_PAGE_SEG_MODE: Option<&str> = None;

#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub tessdata: Option<String>,
    pub language: String,
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Runs every image directly inside `dir`, in file name order, and collects
/// their prices by date. A file that fails is logged and skipped.
pub fn process_image_directory(dir: &Path, settings: &OcrSettings) -> Result<PriceRecords> {
    let mut records = PriceRecords::new();
    let mut images = 0;

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_image(path) {
            continue;
        }
        images += 1;
        log::info!("Processing: {}", path.display());

        let raw = match read_image_text(path, settings) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Error processing {}: {e:#}", path.display());
                continue;
            }
        };
        log::debug!("OCR text for {}:\n{raw}", path.display());

        let document = parse_document(&raw, path);
        let name = entry.file_name().to_string_lossy();
        log::info!(
            "Extracted {} items from {} (dated {} via {:?})",
            document.prices.len(),
            name,
            document.date,
            document.date_source
        );
        collect_document(&mut records, document, &name);
    }

    if images == 0 {
        log::error!("No image files found in {}", dir.display());
    }
    Ok(records)
}

/// Merges a document into the run's records. A document without prices is
/// dropped so it cannot add an empty date row.
fn collect_document(records: &mut PriceRecords, document: DocumentRecord, name: &str) -> bool {
    if document.prices.is_empty() {
        log::warn!("No prices recognised in {name}");
        return false;
    }
    merge_document(records, document);
    true
}

/// OCR on the preprocessed image, falling back to the untouched file.
fn read_image_text(path: &Path, settings: &OcrSettings) -> Result<String> {
    match preprocessed_text(path, settings) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("Preprocessed OCR failed for {} ({e:#}), retrying on the original", path.display());
            run_tesseract(path, settings, FALLBACK_PAGE_SEG_MODE)
        }
    }
}

fn preprocessed_text(path: &Path, settings: &OcrSettings) -> Result<String> {
    let img = image::open(path).with_context(|| format!("Could not open image {}", path.display()))?;
    let processed = preprocess_image(img);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = env::temp_dir().join(format!("processed_{stem}.png"));
    processed
        .save(&temp_path)
        .with_context(|| format!("Could not write {}", temp_path.display()))?;

    let text = run_tesseract(&temp_path, settings, PREPROCESSED_PAGE_SEG_MODE);
    fs::remove_file(&temp_path).ok();
    text
}

/// Engine variables for one OCR call. `None` leaves the page segmentation
/// on Tesseract's default.
fn tesseract_variables(page_seg_mode: Option<&str>) -> Vec<(&'static str, &str)> {
    page_seg_mode
        .map(|mode| ("tessedit_pageseg_mode", mode))
        .into_iter()
        .collect()
}

fn run_tesseract(path: &Path, settings: &OcrSettings, page_seg_mode: Option<&str>) -> Result<String> {
    let path_str = path.to_str().context("Image path is not valid UTF-8")?;
    let mut tesseract = Tesseract::new(settings.tessdata.as_deref(), Some(settings.language.as_str()))?;
    for (name, value) in tesseract_variables(page_seg_mode) {
        tesseract = tesseract.set_variable(name, value)?;
    }
    let mut tesseract = tesseract.set_image(path_str)?;
    let text = tesseract.get_text()?;
    Ok(text)
}

/// Upscales small screenshots, then converts to a black and white image.
pub fn preprocess_image(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let scale = upscale_factor(width.max(height));
    let img = if scale > 1 {
        img.resize_exact(width * scale, height * scale, FilterType::Lanczos3)
    } else {
        img
    };

    DynamicImage::ImageLuma8(binarize(img.to_luma8()))
}

fn binarize(mut img: ImageBuffer<Luma<u8>, Vec<u8>>) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    for pixel in img.pixels_mut() {
        pixel[0] = if pixel[0] < BINARIZE_THRESHOLD { 0 } else { 255 };
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DateSource;
    use crate::extract::PriceMap;
    use chrono::NaiveDate;

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image(Path::new("Prices/2025-11-06.PNG")));
        assert!(is_image(Path::new("a.jpeg")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("no_extension")));
    }

    #[test]
    fn small_images_are_upscaled_and_binarized() {
        let mut gray = ImageBuffer::<Luma<u8>, Vec<u8>>::new(10, 5);
        for (x, _, pixel) in gray.enumerate_pixels_mut() {
            pixel[0] = (x * 25) as u8;
        }
        let out = preprocess_image(DynamicImage::ImageLuma8(gray)).to_luma8();

        assert_eq!(out.dimensions(), (30, 15));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn large_images_keep_their_size() {
        let out = preprocess_image(DynamicImage::new_luma8(1200, 40));
        assert_eq!((out.width(), out.height()), (1200, 40));
    }

    #[test]
    fn only_the_preprocessed_pass_forces_block_segmentation() {
        assert_eq!(
            tesseract_variables(PREPROCESSED_PAGE_SEG_MODE),
            vec![("tessedit_pageseg_mode", "6")]
        );
        assert!(tesseract_variables(FALLBACK_PAGE_SEG_MODE).is_empty());
    }

    #[test]
    fn documents_without_prices_are_dropped() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 6).unwrap();
        let mut records = PriceRecords::new();

        let empty = DocumentRecord {
            date,
            date_source: DateSource::NumericText,
            prices: PriceMap::new(),
        };
        assert!(!collect_document(&mut records, empty, "blank.png"));
        assert!(records.is_empty());

        let priced = DocumentRecord {
            date,
            date_source: DateSource::NumericText,
            prices: [("Byadgi (KDL) | DLX".to_string(), 1250)].into_iter().collect(),
        };
        assert!(collect_document(&mut records, priced, "2025-11-06.png"));
        assert_eq!(records[&date]["Byadgi (KDL) | DLX"], 1250);
    }

    #[test]
    fn upscale_factors() {
        assert_eq!(upscale_factor(599), 3);
        assert_eq!(upscale_factor(600), 2);
        assert_eq!(upscale_factor(999), 2);
        assert_eq!(upscale_factor(1000), 1);
    }

    #[test]
    fn folder_without_images_is_empty_not_an_error() {
        let dir = env::temp_dir().join("byadgi_trends_ocr_empty");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("readme.txt"), "not an image").unwrap();

        let settings = OcrSettings {
            tessdata: None,
            language: "eng".to_string(),
        };
        let records = process_image_directory(&dir, &settings).unwrap();
        assert!(records.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_image_is_skipped() {
        let dir = env::temp_dir().join("byadgi_trends_ocr_broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("2025-11-06.png"), b"definitely not a png").unwrap();

        let settings = OcrSettings {
            tessdata: Some(dir.to_string_lossy().into_owned()),
            language: "eng".to_string(),
        };
        let records = process_image_directory(&dir, &settings).unwrap();
        assert!(records.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }
}
