use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Replaces non-ASCII characters with spaces, turns carriage returns into
/// newlines and collapses blank lines.
pub fn clean_text(raw: &str) -> String {
    let ascii: String = raw
        .chars()
        .map(|c| match c {
            '\r' => '\n',
            c if c.is_ascii() => c,
            _ => ' ',
        })
        .collect();

    BLANK_RUNS.replace_all(&ascii, "\n").trim().to_string()
}

/// Trimmed, non-empty lines of already cleaned text.
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
