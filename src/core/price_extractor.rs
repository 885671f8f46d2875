use std::sync::LazyLock;

use regex::Regex;

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)").unwrap());

/// Pulls the first numeric run out of free-form price text.
///
/// Commas are dropped before matching, so `"¥12,800"` yields `12800.0`.
/// Only the first run counts: `"¥1,980 (was ¥2,480)"` yields `1980.0`.
/// Full-width digits and commas, common on Japanese storefronts, are
/// treated like their ASCII forms.
/// Returns `None` when the text holds no digits.
pub fn extract_price(text: &str) -> Option<f64> {
    let normalized: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '，'))
        .map(fold_fullwidth_digit)
        .collect();

    let captures = PRICE_PATTERN.captures(&normalized)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}

fn fold_fullwidth_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        _ => c,
    }
}
