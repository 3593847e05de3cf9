//! Decimal-ETH string conversions.
//!
//! Amounts cross the API boundary as user-typed decimal strings and reach the
//! ledger as wei. 18 fractional digits do not fit in an f64, so parsing is
//! string-based.

use crate::error::LockboxError;

pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;
const ETH_DECIMALS: usize = 18;

/// Parse a strictly positive decimal ETH amount into wei.
///
/// Rejects empty, non-numeric, negative, and zero inputs without ever
/// reaching the ledger.
pub fn parse_eth(amount: &str) -> Result<u128, LockboxError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(LockboxError::InvalidAmount("amount is empty".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(LockboxError::InvalidAmount(format!(
            "amount must be positive: {}",
            trimmed
        )));
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(LockboxError::InvalidAmount(format!(
            "amount is not a number: {}",
            trimmed
        )));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(LockboxError::InvalidAmount(format!(
            "amount is not a number: {}",
            trimmed
        )));
    }
    if frac_part.len() > ETH_DECIMALS {
        return Err(LockboxError::InvalidAmount(format!(
            "amount has more than {} decimal places: {}",
            ETH_DECIMALS, trimmed
        )));
    }

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| LockboxError::InvalidAmount(format!("amount is too large: {}", trimmed)))?
    };
    let frac: u128 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_part, width = ETH_DECIMALS);
        padded.parse().map_err(|_| {
            LockboxError::InvalidAmount(format!("amount is not a number: {}", trimmed))
        })?
    };

    let wei = whole
        .checked_mul(WEI_PER_ETH)
        .and_then(|scaled| scaled.checked_add(frac))
        .ok_or_else(|| LockboxError::InvalidAmount(format!("amount is too large: {}", trimmed)))?;

    if wei == 0 {
        return Err(LockboxError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(wei)
}

/// Format wei as a decimal ETH string with trailing zeros trimmed.
pub fn format_eth(wei: u128) -> String {
    let whole = wei / WEI_PER_ETH;
    let frac = wei % WEI_PER_ETH;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:018}", frac);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_eth() {
        assert_eq!(parse_eth("1").unwrap(), WEI_PER_ETH);
        assert_eq!(parse_eth("2").unwrap(), 2 * WEI_PER_ETH);
    }

    #[test]
    fn parses_fractional_eth() {
        assert_eq!(parse_eth("0.5").unwrap(), WEI_PER_ETH / 2);
        assert_eq!(parse_eth(".5").unwrap(), WEI_PER_ETH / 2);
        assert_eq!(parse_eth("1.5").unwrap(), 3 * WEI_PER_ETH / 2);
        assert_eq!(parse_eth("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(parse_eth("").is_err());
        assert!(parse_eth("   ").is_err());
    }

    #[test]
    fn rejects_zero() {
        assert!(parse_eth("0").is_err());
        assert!(parse_eth("0.0").is_err());
    }

    #[test]
    fn rejects_negative() {
        assert!(parse_eth("-1").is_err());
        assert!(parse_eth("-0.5").is_err());
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(parse_eth("abc").is_err());
        assert!(parse_eth("1.2.3").is_err());
        assert!(parse_eth("1e3").is_err());
        assert!(parse_eth(".").is_err());
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(parse_eth("0.0000000000000000001").is_err()); // 19 places
    }

    #[test]
    fn formats_round_amounts() {
        assert_eq!(format_eth(0), "0");
        assert_eq!(format_eth(WEI_PER_ETH), "1");
        assert_eq!(format_eth(WEI_PER_ETH / 2), "0.5");
        assert_eq!(format_eth(3 * WEI_PER_ETH / 2), "1.5");
    }

    #[test]
    fn round_trips() {
        for amount in ["1", "0.5", "12.345", "0.000000000000000001"] {
            assert_eq!(format_eth(parse_eth(amount).unwrap()), amount);
        }
    }
}
