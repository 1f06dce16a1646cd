//! Amount helpers. Every amount in the ledger is an integer count of kobo
//! (1/100 naira); decimal strings only appear at the bank boundary.

use std::str::FromStr;

use sea_orm::prelude::Decimal;

use crate::error::{ AppError, Result };

pub const KOBO_PER_NAIRA: i64 = 100;

/// Largest single posting, ₦1,000,000,000.
pub const MAX_AMOUNT: i64 = 1_000_000_000 * KOBO_PER_NAIRA;

/// Reject zero, negative and oversized posting amounts.
pub fn ensure_positive(amount: i64) -> Result<i64> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount(format!("Amount must be greater than zero, got {}", amount)));
    }
    if amount > MAX_AMOUNT {
        return Err(
            AppError::InvalidAmount(format!("Amount must not exceed {}", format_naira(MAX_AMOUNT)))
        );
    }
    Ok(amount)
}

pub fn checked_add(left: i64, right: i64) -> Result<i64> {
    left
        .checked_add(right)
        .ok_or_else(|| AppError::InvalidAmount("Amount exceeds the supported range".to_string()))
}

pub fn checked_sum<I>(amounts: I) -> Result<i64> where I: IntoIterator<Item = i64> {
    amounts.into_iter().try_fold(0, checked_add)
}

/// Parse a naira amount such as `"1500.50"` into kobo.
pub fn parse_naira(value: &str) -> Result<i64> {
    let decimal = Decimal::from_str(value.trim()).map_err(|_|
        AppError::InvalidAmount(format!("Invalid amount: {}", value))
    )?;

    let kobo = decimal * Decimal::from(KOBO_PER_NAIRA);
    if !kobo.fract().is_zero() {
        return Err(AppError::InvalidAmount(format!("Amount has more than two decimal places: {}", value)));
    }

    let kobo = i64
        ::try_from(kobo.trunc())
        .map_err(|_| AppError::InvalidAmount(format!("Amount out of range: {}", value)))?;

    ensure_positive(kobo)
}

/// Render kobo as `₦12,345.67`.
pub fn format_naira(kobo: i64) -> String {
    let sign = if kobo < 0 { "-" } else { "" };
    let abs = kobo.unsigned_abs();
    let whole = (abs / (KOBO_PER_NAIRA as u64)).to_string();
    let fraction = abs % (KOBO_PER_NAIRA as u64);

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}\u{20a6}{}.{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naira() {
        assert_eq!(parse_naira("1500").unwrap(), 150_000);
        assert_eq!(parse_naira("1500.5").unwrap(), 150_050);
        assert_eq!(parse_naira(" 0.01 ").unwrap(), 1);
    }

    #[test]
    fn test_parse_naira_rejects_bad_values() {
        assert!(parse_naira("0").is_err());
        assert!(parse_naira("-20").is_err());
        assert!(parse_naira("1.001").is_err());
        assert!(parse_naira("ten").is_err());
    }

    #[test]
    fn test_amount_ceiling() {
        assert_eq!(ensure_positive(MAX_AMOUNT).unwrap(), MAX_AMOUNT);
        assert!(matches!(ensure_positive(MAX_AMOUNT + 1), Err(AppError::InvalidAmount(_))));
        assert!(matches!(ensure_positive(i64::MAX), Err(AppError::InvalidAmount(_))));

        assert_eq!(parse_naira("1000000000").unwrap(), MAX_AMOUNT);
        assert!(parse_naira("1000000000.01").is_err());
        assert!(parse_naira("92233720368547758.07").is_err());
    }

    #[test]
    fn test_checked_sums() {
        assert_eq!(checked_sum([1, 2, 3]).unwrap(), 6);
        assert_eq!(checked_sum(std::iter::empty()).unwrap(), 0);
        assert!(checked_add(i64::MAX, 1).is_err());
        assert!(checked_sum([i64::MAX, 1]).is_err());
    }

    #[test]
    fn test_format_naira() {
        assert_eq!(format_naira(1_000_000), "\u{20a6}10,000.00");
        assert_eq!(format_naira(400_050), "\u{20a6}4,000.50");
        assert_eq!(format_naira(99), "\u{20a6}0.99");
        assert_eq!(format_naira(123_456_789), "\u{20a6}1,234,567.89");
    }
}
