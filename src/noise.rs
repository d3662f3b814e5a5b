use regex::Regex;
use std::sync::LazyLock;

static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // leading date stamps
        r"^\d{4}-\d{2}-\d{2}",
        r"^\*\d{2}-\d{2}-\d{4}",
        // "10000 BAGS"
        r"(?i)^\d+\s*bags",
        // report headers; QTY is left out since it shows up in variety names
        r"(?i)approx|aporox|sales|arrivals|market",
        // "2025A-2025"
        r"(?i)^\d{4}[a-z]-\d{4}$",
        r"^[A-Z\s]*$",
        // market sentiment
        r"(?i)slow|steady|improving",
        r"(?i)naya maal|new arrivals",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// True when an OCR line is a header, stamp or commentary rather than a price line.
pub fn is_noise(line: &str) -> bool {
    NOISE_PATTERNS.iter().any(|pattern| pattern.is_match(line))
}
