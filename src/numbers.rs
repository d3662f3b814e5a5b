//! Price candidates from noisy OCR text, and reducing them to one figure.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{MAX_PRICE, MIN_PRICE};

static THOUSANDS_SEP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d),(\d{3})").unwrap());
static CURRENCY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\u{20b9}|Rs\.?").unwrap());
// "to" has already had its o turned into a zero by the time this runs
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{3,6})\s*(?:-|t[o0])\s*(\d{3,6})\b").unwrap());
static SINGLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3,6}\b").unwrap());

/// Undoes the usual OCR letter/digit confusions and strips currency and
/// thousands-separator noise.
pub fn correct_ocr_digits(line: &str) -> String {
    let stripped = CURRENCY.replace_all(line, " ");
    let swapped: String = stripped
        .chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'l' | 'I' => '1',
            c => c,
        })
        .collect();
    let joined = THOUSANDS_SEP.replace_all(&swapped, "$1$2");
    joined.replace(',', " ")
}

fn in_band(value: u32) -> bool {
    (MIN_PRICE..=MAX_PRICE).contains(&value)
}

/// Range endpoints first, then standalone 3-6 digit tokens, all limited to
/// the plausible price band.
pub fn extract_numbers(line: &str) -> Vec<u32> {
    if line.is_empty() {
        return Vec::new();
    }
    let text = correct_ocr_digits(line);

    let mut candidates = Vec::new();
    let mut range_spans = Vec::new();
    for caps in RANGE.captures_iter(&text) {
        let (Some(whole), Some(low), Some(high)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        range_spans.push(whole.range());
        for endpoint in [low, high] {
            if let Ok(value) = endpoint.as_str().parse::<u32>() {
                candidates.push(value);
            }
        }
    }

    for token in SINGLE.find_iter(&text) {
        let inside_range = range_spans
            .iter()
            .any(|span| token.start() >= span.start && token.end() <= span.end);
        if inside_range {
            continue;
        }
        if let Ok(value) = token.as_str().parse::<u32>() {
            candidates.push(value);
        }
    }

    candidates.retain(|&value| in_band(value));
    candidates
}

/// One representative price: the value itself, the mean of a pair, or the
/// median of three or more, rounded to the nearest rupee.
pub fn pick_price(candidates: &[u32]) -> Option<u32> {
    match candidates {
        [] => None,
        [only] => Some(*only),
        [a, b] => Some(mean_rounded(*a, *b)),
        _ => {
            let mut sorted = candidates.to_vec();
            sorted.sort_unstable();
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 1 {
                Some(sorted[mid])
            } else {
                Some(mean_rounded(sorted[mid - 1], sorted[mid]))
            }
        }
    }
}

/// Simple mean of two prices, rounded half away from zero.
pub fn mean_rounded(a: u32, b: u32) -> u32 {
    ((f64::from(a) + f64::from(b)) / 2.0).round() as u32
}
