//! Per-field sanitizers and line normalization.
//!
//! Every function here is idempotent: applying it to its own output returns
//! the same string.

use super::patterns::WHITESPACE_RUN;

/// Normalize one raw line: control characters become spaces, whitespace runs
/// collapse to a single space, and the ends are trimmed.
pub fn normalize_line(line: &str) -> String {
    let replaced: String = line
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    WHITESPACE_RUN.replace_all(&replaced, " ").trim().to_string()
}

/// Split a text blob into normalized, non-blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_line)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Collapse whitespace and trim separator residue left behind after a span
/// was cut out of a line. Text without any alphanumeric character is
/// considered empty.
pub fn tidy_fragment(text: &str) -> String {
    let collapsed = normalize_line(text);
    let trimmed = collapsed.trim_matches(|c: char| c.is_whitespace() || ",;|:-".contains(c));
    if trimmed.chars().any(char::is_alphanumeric) {
        trimmed.to_string()
    } else {
        String::new()
    }
}

/// Money: normalize the decimal separator to '.', then keep only `[0-9.]`.
pub fn clean_money(raw: &str, decimal_separator: char) -> String {
    let swapped = if decimal_separator == ',' {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };
    swapped
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Drop a fraction made only of zeros ("2.00" becomes "2").
pub fn strip_zero_fraction(raw: &str, decimal_separator: char) -> &str {
    let trimmed = raw.trim();
    match trimmed.rfind(decimal_separator) {
        Some(idx) => {
            let fraction = &trimmed[idx + decimal_separator.len_utf8()..];
            if !fraction.is_empty() && fraction.chars().all(|c| c == '0') {
                &trimmed[..idx]
            } else {
                trimmed
            }
        }
        None => trimmed,
    }
}

/// Whether `raw` carries a fraction with a non-zero digit ("2.5").
pub fn has_fraction(raw: &str, decimal_separator: char) -> bool {
    let trimmed = strip_zero_fraction(raw, decimal_separator);
    trimmed.rfind(decimal_separator).is_some_and(|idx| {
        trimmed[idx + decimal_separator.len_utf8()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Keep only ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Part numbers and SKUs: uppercase, keep `[A-Z0-9-/]`.
pub fn clean_part_number(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-' || *c == '/')
        .collect()
}
