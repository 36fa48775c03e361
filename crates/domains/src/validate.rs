//! Field-level validation shared by every entity: length limits, e-mail
//! shape, USPS state codes and ZIP codes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DomainError, Result};

/// Default limit for free-text fields.
pub const TEXT_MAX: usize = 255;

const EMAIL_MAX: usize = 320;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("e-mail pattern compiles")
});

static ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("ZIP pattern compiles"));

/// USPS codes accepted for state fields (states, DC, territories, military).
const US_STATES: [&str; 62] = [
    "AL", "AK", "AS", "AZ", "AR", "AA", "AE", "AP", "CA", "CO", "CT", "DE", "DC", "FM", "FL",
    "GA", "GU", "HI", "ID", "IL", "IN", "IA", "KS", "KY", "LA", "ME", "MH", "MD", "MA", "MI",
    "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "MP", "OH", "OK",
    "OR", "PW", "PA", "PR", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VI", "VA", "WA", "WV",
    "WI", "WY",
];

pub fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Blank is allowed; anything else must be `local@domain.tld` with a dot-atom
/// local part and LDH domain labels.
pub fn email(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > EMAIL_MAX || !EMAIL.is_match(value) {
        return Err(DomainError::Validation(format!("{field} is not a valid e-mail address")));
    }
    Ok(())
}

pub fn us_state(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        None => Ok(()),
        Some(code) if US_STATES.contains(&code) => Ok(()),
        Some(code) => Err(DomainError::Validation(format!(
            "{field}: '{code}' is not a US state code"
        ))),
    }
}

pub fn us_zip(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(zip) if !ZIP.is_match(zip) => Err(DomainError::Validation(format!(
            "{field} must be a ZIP code (XXXXX or XXXXX-XXXX)"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_blank_and_plain_addresses() {
        assert!(email("email", "").is_ok());
        assert!(email("email", "agent@fws.gov").is_ok());
        assert!(email("email", "no-at-sign").is_err());
        assert!(email("email", "a@b").is_err());
        assert!(email("email", "a b@c.org").is_err());
        assert!(email("email", "first.last+cbra@sub.fws.gov").is_ok());
    }

    #[test]
    fn email_rejects_malformed_parts() {
        for addr in ["a<script>@x.com", "a@b_c.com", "a@x.c0", "a@b..com", "a(b)@x.com", ".a@x.com", "a@-x.com"] {
            assert!(email("email", addr).is_err(), "{addr} accepted");
        }
    }

    #[test]
    fn zip_formats() {
        assert!(us_zip("zipcode", Some("29401")).is_ok());
        assert!(us_zip("zipcode", Some("29401-1234")).is_ok());
        assert!(us_zip("zipcode", Some("2940")).is_err());
        assert!(us_zip("zipcode", Some("29401-12")).is_err());
        assert!(us_zip("zipcode", None).is_ok());
        assert!(us_zip("zipcode", Some("２９４０１")).is_err());
        assert!(us_zip("zipcode", Some("29401-")).is_err());
    }

    #[test]
    fn state_codes() {
        assert!(us_state("state", Some("SC")).is_ok());
        assert!(us_state("state", Some("PR")).is_ok());
        assert!(us_state("state", Some("XX")).is_err());
    }

    #[test]
    fn length_counts_characters() {
        assert!(max_len("name", &"é".repeat(16), 16).is_ok());
        assert!(max_len("name", &"a".repeat(17), 16).is_err());
    }
}
