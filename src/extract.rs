//! Turns the OCR text of one price sheet into `variety -> price` records.
//!
//! A variety name and its price are often split across lines on the
//! screenshots, so each recognised variety line tries a fixed chain of
//! places to find its numbers: the line itself, the next couple of lines,
//! and finally a character window around the line in the full text.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{LOOKAHEAD_LINES, WINDOW_AFTER, WINDOW_BEFORE};
use crate::date::{DateSource, resolve_date};
use crate::noise::is_noise;
use crate::normalize::{clean_text, text_lines};
use crate::numbers::{extract_numbers, mean_rounded, pick_price};
use crate::variety::{find_grade_label, match_variety, record_key};

pub type PriceMap = BTreeMap<String, u32>;

/// Records pulled from a single source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub date: NaiveDate,
    pub date_source: DateSource,
    pub prices: PriceMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    SameLine,
    Lookahead,
    Window,
}

impl Strategy {
    const ORDER: [Strategy; 3] = [Strategy::SameLine, Strategy::Lookahead, Strategy::Window];
}

struct Document<'a> {
    text: &'a str,
    lower: String,
    lines: Vec<&'a str>,
}

impl<'a> Document<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            lower: text.to_lowercase(),
            lines: text_lines(text),
        }
    }

    /// Runs one strategy for the line at `index`. A lookahead line may also
    /// supply the grade label when the variety line had none.
    fn candidates(&self, strategy: Strategy, index: usize, label: &mut Option<&'a str>) -> Vec<u32> {
        match strategy {
            Strategy::SameLine => extract_numbers(self.lines[index]),
            Strategy::Lookahead => {
                for &line in self.lines.iter().skip(index + 1).take(LOOKAHEAD_LINES) {
                    if is_noise(line) {
                        continue;
                    }
                    if label.is_none() {
                        *label = find_grade_label(line);
                    }
                    let numbers = extract_numbers(line);
                    if !numbers.is_empty() {
                        return numbers;
                    }
                }
                Vec::new()
            }
            Strategy::Window => self
                .window_around(self.lines[index])
                .map(extract_numbers)
                .unwrap_or_default(),
        }
    }

    fn window_around(&self, line: &str) -> Option<&'a str> {
        let at = self.lower.find(&line.to_lowercase())?;
        let start = at.saturating_sub(WINDOW_BEFORE);
        let end = (at + WINDOW_AFTER).min(self.text.len());
        self.text.get(start..end)
    }
}

/// Extracts the price map from already cleaned OCR text.
pub fn extract_prices(text: &str) -> PriceMap {
    let doc = Document::new(text);
    let mut prices = PriceMap::new();

    for (index, &line) in doc.lines.iter().enumerate() {
        if is_noise(line) {
            continue;
        }
        let Some(variety) = match_variety(line) else {
            continue;
        };

        let mut label = find_grade_label(line);
        let mut found = None;
        for strategy in Strategy::ORDER {
            let numbers = doc.candidates(strategy, index, &mut label);
            if !numbers.is_empty() {
                found = Some((strategy, numbers));
                break;
            }
        }

        let Some((strategy, numbers)) = found else {
            log::debug!("{variety}: no price near {line:?}");
            continue;
        };
        let Some(price) = pick_price(&numbers) else {
            continue;
        };

        let key = record_key(variety, label);
        log::debug!("{key} = {price} via {strategy:?} from {numbers:?}");
        prices
            .entry(key)
            .and_modify(|existing| *existing = mean_rounded(*existing, price))
            .or_insert(price);
    }

    prices
}

/// Cleans raw OCR output, dates it and extracts its prices.
pub fn parse_document(raw_text: &str, path: &Path) -> DocumentRecord {
    let text = clean_text(raw_text);
    let (date, date_source) = resolve_date(&text, path);
    let prices = extract_prices(&text);
    DocumentRecord {
        date,
        date_source,
        prices,
    }
}
