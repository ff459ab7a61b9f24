use crate::domain::pricing::{Addon, ManualQuote};
use crate::error::CoreError;

pub fn compute_total(
    base_price_cents: i64,
    addons: &[Addon],
    manual_quote: Option<&ManualQuote>,
) -> Result<i64, CoreError> {
    let mut total = non_negative(base_price_cents)?;
    for addon in addons {
        total = total
            .checked_add(non_negative(addon.price_cents)?)
            .ok_or(CoreError::InvalidPrice(addon.price_cents))?;
    }
    if let Some(quote) = manual_quote {
        total = total
            .checked_add(non_negative(quote.price_cents)?)
            .ok_or(CoreError::InvalidPrice(quote.price_cents))?;
    }
    Ok(total)
}

/// Parses a decimal amount ("50", "49.9", "49.99") into cents.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with('+') {
        return None;
    }
    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2
        || !whole.chars().all(|ch| ch.is_ascii_digit())
        || !frac.chars().all(|ch| ch.is_ascii_digit())
    {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac)
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn non_negative(value: i64) -> Result<i64, CoreError> {
    if value < 0 {
        return Err(CoreError::InvalidPrice(value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{compute_total, format_cents, parse_amount_cents};
    use crate::domain::pricing::{Addon, ManualQuote};
    use crate::error::CoreError;

    #[test]
    fn total_adds_addons_and_quote() {
        let addons = vec![
            Addon {
                name: "ladder".to_string(),
                price_cents: 500,
            },
            Addon {
                name: "parts".to_string(),
                price_cents: 1_250,
            },
        ];
        let quote = ManualQuote {
            description: "extra pipe".to_string(),
            price_cents: 2_000,
        };
        assert_eq!(compute_total(5_000, &addons, Some(&quote)).unwrap(), 8_750);
    }

    #[test]
    fn total_rejects_negative_prices() {
        let addons = vec![Addon {
            name: "refund".to_string(),
            price_cents: -1,
        }];
        assert_eq!(
            compute_total(5_000, &addons, None),
            Err(CoreError::InvalidPrice(-1))
        );
    }

    #[test]
    fn parse_amounts() {
        assert_eq!(parse_amount_cents("50"), Some(5_000));
        assert_eq!(parse_amount_cents("49.9"), Some(4_990));
        assert_eq!(parse_amount_cents("0.05"), Some(5));
        assert_eq!(parse_amount_cents(".5"), Some(50));
        assert_eq!(parse_amount_cents("1.234"), None);
        assert_eq!(parse_amount_cents("-3"), None);
        assert_eq!(parse_amount_cents("abc"), None);
        assert_eq!(parse_amount_cents("."), None);
    }

    #[test]
    fn format_amounts() {
        assert_eq!(format_cents(5_000), "50.00");
        assert_eq!(format_cents(7), "0.07");
    }

    #[test]
    fn crate_root_exposes_pricing_and_money_paths() {
        let pricing = crate::pricing::Pricing::new(1_000, Vec::new(), None).unwrap();
        assert_eq!(crate::money::format_cents(pricing.total_cents), "10.00");
    }
}
