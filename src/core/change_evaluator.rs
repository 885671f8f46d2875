//! Decides whether a freshly fetched price is worth a notification and
//! renders the message text.

use crate::models::ProductRule;
use crate::utils::error::AppError;
use crate::utils::format::format_price;

fn target_hit(rule: &ProductRule, price: f64) -> bool {
    rule.target_price.is_some_and(|target| price <= target)
}

pub fn should_notify(rule: &ProductRule, old_price: Option<f64>, current_price: f64) -> bool {
    let price_dropped = old_price.is_some_and(|old| current_price < old);
    let target_reached = match old_price {
        None => target_hit(rule, current_price),
        Some(old) => {
            target_hit(rule, current_price) && rule.target_price.is_some_and(|target| old > target)
        }
    };
    price_dropped || target_reached
}

/// Builds the notification text for a price that passed [`should_notify`].
///
/// Fails with [`AppError::ConfigurationError`] when the message has to cite a
/// target price the rule does not have. That only happens when this is called
/// for inputs `should_notify` rejected.
pub fn create_message(
    rule: &ProductRule,
    old_price: Option<f64>,
    current_price: f64,
) -> Result<String, AppError> {
    let missing_target = || AppError::ConfigurationError {
        rule: rule.name.clone(),
    };

    let Some(old) = old_price else {
        let target = rule.target_price.ok_or_else(missing_target)?;
        return Ok(format!(
            "🎯 Target price reached on first check: {}\nCurrent: {} (target: {} or less)\n{}",
            rule.name,
            format_price(current_price),
            format_price(target),
            rule.url
        ));
    };

    let diff = current_price - old;
    if diff < 0.0 {
        return Ok(format!(
            "📉 Price drop detected: {}\nPrevious: {} → Now: {} ({})\n{}",
            rule.name,
            format_price(old),
            format_price(current_price),
            format_price(diff),
            rule.url
        ));
    }

    let target = rule.target_price.ok_or_else(missing_target)?;
    Ok(format!(
        "🎯 Target price reached: {}\nCurrent: {} (target: {} or less)\n{}",
        rule.name,
        format_price(current_price),
        format_price(target),
        rule.url
    ))
}

/// Runs [`should_notify`] and [`create_message`] on the same inputs.
pub fn evaluate(
    rule: &ProductRule,
    old_price: Option<f64>,
    current_price: f64,
) -> Result<Option<String>, AppError> {
    if !should_notify(rule, old_price, current_price) {
        return Ok(None);
    }
    create_message(rule, old_price, current_price).map(Some)
}
