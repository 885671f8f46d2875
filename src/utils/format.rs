/// Renders a price as whole yen with thousands separators, e.g. `¥12,800`.
///
/// Negative values carry the sign in front of the symbol (`-¥1,000`) so the
/// same helper formats price deltas.
pub fn format_price(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}¥{}", sign, grouped)
}
