//! Input validation: format patterns and the CNPJ check-digit
//! algorithm.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{LyceumError, LyceumResult};

static CNPJ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{14}$").unwrap());

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^$|^[1-9]{2}(?:[2-8]|9[1-9])[0-9]{3}[0-9]{4}$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]{2,10})+$").unwrap());

static POSTAL_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8}$").unwrap());

pub fn email(value: &str) -> LyceumResult<()> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(LyceumError::Validation {
            field: "email",
            message: format!("'{value}' is not a valid email address"),
        })
    }
}

pub fn phone_number(value: &str) -> LyceumResult<()> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(LyceumError::Validation {
            field: "phone_number",
            message: format!("'{value}' is not a valid phone number"),
        })
    }
}

pub fn postal_code(value: &str) -> LyceumResult<()> {
    if POSTAL_CODE_RE.is_match(value) {
        Ok(())
    } else {
        Err(LyceumError::Validation {
            field: "postal_code",
            message: format!("'{value}' is not a valid postal code"),
        })
    }
}

/// Password policy: 8-128 characters with at least one digit, one
/// uppercase, one lowercase and one symbol, no whitespace.
pub fn password(value: &str) -> LyceumResult<()> {
    let ok = (8..=128).contains(&value.len())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| !c.is_alphanumeric())
        && !value.chars().any(char::is_whitespace);
    if ok {
        Ok(())
    } else {
        Err(LyceumError::Validation {
            field: "password",
            message: "password does not meet the strength policy".into(),
        })
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn date(value: &str) -> LyceumResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| LyceumError::Validation {
        field: "date",
        message: format!("'{value}' is not a valid YYYY-MM-DD date"),
    })
}

/// Validate a CNPJ: 14 digits, not a repeated-digit sequence, and both
/// check digits correct.
pub fn cnpj(value: &str) -> LyceumResult<()> {
    if !CNPJ_RE.is_match(value) {
        return Err(LyceumError::InvalidLegalId);
    }
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.windows(2).all(|w| w[0] == w[1]) {
        return Err(LyceumError::InvalidLegalId);
    }

    const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            0 | 1 => 0,
            rem => 11 - rem,
        }
    };

    if check(&FIRST_WEIGHTS) == digits[12] && check(&SECOND_WEIGHTS) == digits[13] {
        Ok(())
    } else {
        Err(LyceumError::InvalidLegalId)
    }
}
