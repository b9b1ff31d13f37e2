//! Text normalization shared by search and the client limiter
//!
//! All comparisons on client names, phones and order codes go through these
//! functions so that a record and a query are always folded the same way.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Combining Diacritical Marks block (U+0300..U+036F).
///
/// Always stripped even if the mark table were to miss a code point, which
/// keeps Latin-script folding identical across platforms.
const COMBINING_DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

fn is_diacritic(c: char) -> bool {
    COMBINING_DIACRITICS.contains(&c) || is_combining_mark(c)
}

/// Fold a name: trim, uppercase, strip diacritics.
///
/// `" Agë Krasniqi"` and `"AGE KRASNIQI"` fold to the same string.
pub fn fold_name(s: &str) -> String {
    s.trim()
        .to_uppercase()
        .nfd()
        .filter(|c| !is_diacritic(*c))
        .collect()
}

/// Keep ASCII digits only (`"+383 44 123 456"` -> `"38344123456"`).
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Composite client key: folded name + `|` + digits-only phone.
pub fn client_key(name: &str, phone: &str) -> String {
    let mut key = fold_name(name);
    key.push('|');
    key.push_str(&digits_only(phone));
    key
}

/// Normalized code suffix: strip a leading `X` and leading zeros.
///
/// An empty result becomes `"0"`, so `"X000"`, `"X"` and `""` all map to `"0"`.
pub fn code_suffix(code: &str) -> String {
    let upper = code.trim().to_uppercase();
    let without_prefix = upper.strip_prefix('X').unwrap_or(&upper);
    let trimmed = without_prefix.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Largest code number taken from stored data. Larger suffixes count as 0.
pub const MAX_CODE_NUMBER: u64 = 999_999_999;

/// Numeric value of a code; anything non-numeric or above
/// [`MAX_CODE_NUMBER`] counts as 0.
pub fn code_number(code: &str) -> u64 {
    code_suffix(code)
        .parse()
        .ok()
        .filter(|n| *n <= MAX_CODE_NUMBER)
        .unwrap_or(0)
}

/// Format a code number as `X` + at least three digits.
pub fn format_code(number: u64) -> String {
    format!("X{number:03}")
}
