use crate::error::invalid_input;
use anyhow::Result;
use settle_core::domain::{Actor, Addon, BookingId, BookingStatus, ManualQuote, UploadId, UserId};
use settle_core::rules::{parse_amount_cents, Expectation};
use std::str::FromStr;

pub fn parse_booking_id(raw: &str) -> Result<BookingId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("booking id cannot be empty"));
    }
    BookingId::from_str(trimmed).map_err(|_| invalid_input(format!("invalid booking id: {}", raw)))
}

pub fn parse_upload_id(raw: &str) -> Result<UploadId> {
    UploadId::from_str(raw.trim())
        .map_err(|_| invalid_input(format!("invalid upload id: {}", raw)))
}

pub fn parse_user_id(raw: &str) -> Result<UserId> {
    UserId::new(raw).map_err(|err| invalid_input(format!("{}: {:?}", err, raw)))
}

pub fn parse_actor(raw: &str) -> Result<Actor> {
    Actor::parse(raw).map_err(|err| invalid_input(err.to_string()))
}

pub fn parse_status(raw: &str) -> Result<BookingStatus> {
    BookingStatus::from_code(raw).map_err(|err| invalid_input(err.to_string()))
}

pub fn parse_expectation(
    status: Option<&str>,
    version: Option<i64>,
) -> Result<Option<Expectation>> {
    match (status, version) {
        (Some(status), None) => Ok(Some(Expectation::Status(parse_status(status)?))),
        (None, Some(version)) => Ok(Some(Expectation::Version(version))),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Err(invalid_input(
            "use either --expect-status or --expect-version, not both",
        )),
    }
}

/// `49.90` -> 4990 cents.
pub fn parse_amount(raw: &str) -> Result<i64> {
    parse_amount_cents(raw).ok_or_else(|| invalid_input(format!("invalid amount: {}", raw)))
}

/// `name=amount`, e.g. `valve=15.50`.
pub fn parse_addon(raw: &str) -> Result<Addon> {
    let (name, amount) = raw
        .split_once('=')
        .ok_or_else(|| invalid_input(format!("invalid addon (expected name=amount): {}", raw)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid_input(format!("addon name cannot be empty: {}", raw)));
    }
    Ok(Addon {
        name: name.to_string(),
        price_cents: parse_amount(amount)?,
    })
}

pub fn parse_manual_quote(
    description: Option<String>,
    price: Option<&str>,
) -> Result<Option<ManualQuote>> {
    match (description, price) {
        (None, None) => Ok(None),
        (Some(description), Some(price)) => {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(invalid_input("quote description cannot be empty"));
            }
            Ok(Some(ManualQuote {
                description,
                price_cents: parse_amount(price)?,
            }))
        }
        _ => Err(invalid_input(
            "--quote-description and --quote-price must be given together",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_addon, parse_expectation, parse_manual_quote};
    use settle_core::domain::{BookingStatus, DisputeStage};
    use settle_core::rules::Expectation;

    #[test]
    fn addon_parses_name_and_amount() {
        let addon = parse_addon("valve = 15.5").unwrap();
        assert_eq!(addon.name, "valve");
        assert_eq!(addon.price_cents, 1_550);
        assert!(parse_addon("=3").is_err());
        assert!(parse_addon("valve").is_err());
    }

    #[test]
    fn expectation_accepts_fractional_status() {
        assert_eq!(
            parse_expectation(Some("8.2"), None).unwrap(),
            Some(Expectation::Status(BookingStatus::Incompletion(
                DisputeStage::Resolving
            )))
        );
        assert!(parse_expectation(Some("10"), None).is_err());
        assert!(parse_expectation(Some("4"), Some(2)).is_err());
    }

    #[test]
    fn manual_quote_needs_both_parts() {
        assert!(parse_manual_quote(Some("pipe".to_string()), None).is_err());
        let quote = parse_manual_quote(Some("pipe".to_string()), Some("20")).unwrap();
        assert_eq!(quote.unwrap().price_cents, 2_000);
    }
}
