//! Text-to-number conversions shared by the site rules.
//!
//! Every function here is total on well-formed input and returns
//! [`Malformed`] otherwise; callers attach the field name through
//! [`crate::html::FieldExt`] so that one bad value only drops one record.

use compact_str::CompactString;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed value {0:?}")]
pub struct Malformed(pub CompactString);

impl Malformed {
    fn of(s: &str) -> Self {
        Self(CompactString::new(s))
    }
}

#[inline]
const fn is_numeric(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+')
}

/// `"£51.77"` -> `51.77`, `"$2,000"` -> `2000.0`, `"₹12,999"` -> `12999.0`.
///
/// Thousands separators are removed anywhere, currency symbols (and any other
/// non-numeric decoration) only at either end.
pub fn parse_price(s: &str) -> Result<f64, Malformed> {
    let cleaned = s.replace(',', "");
    let core = cleaned.trim_matches(|c: char| !is_numeric(c));
    if core.is_empty() {
        return Err(Malformed::of(s));
    }
    core.parse().map_err(|_| Malformed::of(s))
}

/// Star ratings written as words, `"Three"` -> `3`. Unknown words map to `0`.
pub fn map_rating(word: &str) -> u8 {
    const TABLE: [(&str, u8); 5] = [("one", 1), ("two", 2), ("three", 3), ("four", 4), ("five", 5)];

    let word = word.trim();
    TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map_or(0, |&(_, n)| n)
}

/// `"-1.25%"` -> `-1.25`.
pub fn parse_percent(s: &str) -> Result<f64, Malformed> {
    let t = s.trim();
    t.strip_suffix('%')
        .unwrap_or(t)
        .trim()
        .parse()
        .map_err(|_| Malformed::of(s))
}

/// Integer with thousands separators, `"1,234"` -> `1234`.
pub fn parse_count(s: &str) -> Result<i64, Malformed> {
    s.trim().replace(',', "").parse().map_err(|_| Malformed::of(s))
}

/// Abbreviated counts, `"1.2k"` -> `1200`, `"3M"` -> `3000000`, `"950"` -> `950`.
pub fn parse_scaled(s: &str) -> Result<u64, Malformed> {
    let t = s.trim().replace(',', "");
    let (digits, scale) = match t.chars().last() {
        Some('k' | 'K') => (&t[..t.len() - 1], 1e3),
        Some('m' | 'M') => (&t[..t.len() - 1], 1e6),
        Some('b' | 'B') => (&t[..t.len() - 1], 1e9),
        _ => (&*t, 1.0),
    };
    let value: f64 = digits.trim().parse().map_err(|_| Malformed::of(s))?;
    if !value.is_finite() || value < 0.0 {
        return Err(Malformed::of(s));
    }
    Ok((value * scale).round() as u64)
}

/// Only the ASCII digits of `s`, as a number (`"1 200 000 сум"` -> `1200000.0`).
/// `None` if there are no digits at all.
pub fn digits_only(s: &str) -> Option<f64> {
    let digits = s.chars().filter(char::is_ascii_digit).collect::<String>();
    digits.parse().ok()
}
