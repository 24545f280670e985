//! Taxpayer document checks and field formatting shared by every assembler.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Brazil's fixed offset used on every SPED timestamp (UTC-03:00).
pub const BRAZIL_OFFSET_SECONDS: i32 = 3 * 3600;

/// Kind of Brazilian federal taxpayer document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// CNPJ: legal entity, 14 digits.
    Cnpj,
    /// CPF: natural person, 11 digits.
    Cpf,
}

impl DocumentKind {
    /// Number of digits of the document.
    pub fn digit_count(&self) -> usize {
        match self {
            Self::Cnpj => 14,
            Self::Cpf => 11,
        }
    }

    /// Federal id type digit used inside access keys ("2" CNPJ, "1" CPF).
    pub fn id_type_digit(&self) -> char {
        match self {
            Self::Cnpj => '2',
            Self::Cpf => '1',
        }
    }
}

/// Error returned when a CNPJ/CPF fails structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFormatError {
    /// The input value, digits only.
    pub value: String,
    /// Kind inferred from the length, if any.
    pub kind: Option<DocumentKind>,
    /// Why the value failed validation.
    pub reason: String,
}

impl fmt::Display for DocumentFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(DocumentKind::Cnpj) => write!(f, "invalid CNPJ '{}': {}", self.value, self.reason),
            Some(DocumentKind::Cpf) => write!(f, "invalid CPF '{}': {}", self.value, self.reason),
            None => write!(f, "invalid document '{}': {}", self.value, self.reason),
        }
    }
}

impl std::error::Error for DocumentFormatError {}

/// Strip every non-digit character.
pub fn clean_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Module-11 check digit with weights 2..=9 cycling from the rightmost digit.
///
/// Remainders 0 and 1 map to 0. Non-digit characters are ignored.
pub fn checksum_digit_mod11(digits: &str) -> u8 {
    let mut weight = 2;
    let mut sum = 0u32;
    for d in digits.chars().rev().filter_map(|c| c.to_digit(10)) {
        sum = (sum + d * weight) % 11;
        weight = if weight == 9 { 2 } else { weight + 1 };
    }
    mod11_digit(sum)
}

fn mod11_digit(sum: u32) -> u8 {
    match sum % 11 {
        0 | 1 => 0,
        r => (11 - r) as u8,
    }
}

fn weighted_digit(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    let sum = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    u32::from(mod11_digit(sum))
}

fn to_digits(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Validate a CNPJ (formatting characters are ignored).
pub fn validate_cnpj(s: &str) -> bool {
    let cleaned = clean_digits(s);
    let digits = to_digits(&cleaned);
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }
    // Both digits use weights 2..=9 cycling from the right.
    let first = u32::from(checksum_digit_mod11(&cleaned[..12]));
    let second = u32::from(checksum_digit_mod11(&cleaned[..13]));
    digits[12] == first && digits[13] == second
}

/// Validate a CPF (formatting characters are ignored).
pub fn validate_cpf(s: &str) -> bool {
    let digits = to_digits(s);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }
    let first = weighted_digit(&digits[..9], (2..=10).rev());
    let second = weighted_digit(&digits[..10], (2..=11).rev());
    digits[9] == first && digits[10] == second
}

/// Validate a CNPJ or CPF, dispatching on the number of digits.
pub fn validate_document(s: &str) -> Result<DocumentKind, DocumentFormatError> {
    let value = clean_digits(s);
    let kind = match value.len() {
        14 => DocumentKind::Cnpj,
        11 => DocumentKind::Cpf,
        0 => {
            return Err(DocumentFormatError {
                value,
                kind: None,
                reason: "document is empty".into(),
            });
        }
        n => {
            return Err(DocumentFormatError {
                value,
                kind: None,
                reason: format!("expected 11 (CPF) or 14 (CNPJ) digits, got {n}"),
            });
        }
    };
    let ok = match kind {
        DocumentKind::Cnpj => validate_cnpj(&value),
        DocumentKind::Cpf => validate_cpf(&value),
    };
    if ok {
        Ok(kind)
    } else {
        Err(DocumentFormatError {
            value,
            kind: Some(kind),
            reason: "check digits do not match".into(),
        })
    }
}

/// Format a percentage with fixed decimals. `None` stays `None`.
pub fn format_percentage(value: Option<Decimal>, decimals: u32) -> Option<String> {
    value.map(|v| fixed(v, decimals))
}

/// Format a currency amount with fixed decimals. `None` stays `None`.
pub fn format_currency_fixed(value: Option<Decimal>, decimals: u32) -> Option<String> {
    value.map(|v| fixed(v, decimals))
}

/// Round half away from zero and render exactly `decimals` places.
pub(crate) fn fixed(value: Decimal, decimals: u32) -> String {
    let mut v = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(decimals);
    v.to_string()
}

/// Render an instant as `YYYY-MM-DDTHH:MM:SS-03:00`.
pub fn brazil_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    let local = instant.naive_utc() - TimeDelta::seconds(i64::from(BRAZIL_OFFSET_SECONDS));
    format!("{}-03:00", local.format("%Y-%m-%dT%H:%M:%S"))
}

/// Convert an ISO-8601 timestamp to Brazil time (`YYYY-MM-DDTHH:MM:SS-03:00`).
///
/// Timestamps without an offset and bare dates are read as UTC. Input that
/// cannot be parsed is returned unchanged.
pub fn format_date_brazil(iso: &str) -> String {
    let trimmed = iso.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return brazil_timestamp(&dt);
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return brazil_timestamp(&Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return brazil_timestamp(&Utc.from_utc_datetime(&midnight));
    }
    tracing::warn!(value = %iso, "unparseable timestamp, emitting as given");
    iso.to_string()
}

/// Escape `& < > " '` (ampersand first) and trim.
pub fn sanitize_xml_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .trim()
        .to_string()
}
