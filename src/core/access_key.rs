//! Access keys (chave de acesso) for NFSe and DPS documents.
//!
//! ```text
//! NFS + cMun(7) + tpAmb(1) + idType(1) + doc(11|14) + nNFSe(13) + yyMM(4) + nonce(9) + DV(1)
//! DPS + cMun(7) + idType(1) + doc(14)   + serie(5)  + nDPS(15)
//! ```
//!
//! The NFSe key carries a random nonce, so two keys for the same inputs
//! differ. The DPS key is a pure function of its inputs and has no check
//! digit.

use chrono::{DateTime, FixedOffset};
use rand::Rng;

use super::document::{DocumentKind, checksum_digit_mod11, clean_digits, validate_document};
use super::error::KeyError;
use super::types::Environment;

/// Prefix of NFSe access keys.
pub const NFSE_KEY_PREFIX: &str = "NFS";
/// Prefix of DPS identifiers.
pub const DPS_KEY_PREFIX: &str = "DPS";
/// Upper bound (exclusive) of the NFSe nonce.
pub const NONCE_LIMIT: u32 = 1_000_000_000;

/// Source of the 9-digit NFSe nonce.
pub trait NonceSource {
    /// A value in `0..NONCE_LIMIT`.
    fn nonce(&self) -> u32;
}

/// Thread-local RNG nonce. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn nonce(&self) -> u32 {
        rand::thread_rng().gen_range(0..NONCE_LIMIT)
    }
}

/// Always the same nonce, for reproducible keys in tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u32);

impl NonceSource for FixedNonce {
    fn nonce(&self) -> u32 {
        self.0 % NONCE_LIMIT
    }
}

/// Inputs of an NFSe access key.
#[derive(Debug, Clone)]
pub struct NfseKeyInput<'a> {
    /// CNPJ or CPF of the emitter.
    pub tax_document: &'a str,
    pub environment: Environment,
    /// IBGE code of the incidence municipality.
    pub municipality_code: &'a str,
    /// NFSe number.
    pub sequence_number: &'a str,
    pub processing_timestamp: DateTime<FixedOffset>,
}

/// Inputs of a DPS identifier.
#[derive(Debug, Clone)]
pub struct DpsKeyInput<'a> {
    /// CNPJ or CPF of the provider.
    pub tax_document: &'a str,
    /// IBGE code of the emission municipality.
    pub municipality_code: &'a str,
    pub series: &'a str,
    pub sequence_number: &'a str,
}

fn required(value: &str, field: &'static str) -> Result<String, KeyError> {
    let digits = clean_digits(value);
    if digits.is_empty() {
        return Err(KeyError::MissingField(field));
    }
    Ok(digits)
}

fn padded(digits: &str, width: usize, field: &'static str) -> Result<String, KeyError> {
    if digits.len() > width {
        return Err(KeyError::DocumentInvalid(format!(
            "{field} '{digits}' exceeds {width} digits"
        )));
    }
    Ok(format!("{digits:0>width$}"))
}

fn checked_document(value: &str) -> Result<(String, DocumentKind), KeyError> {
    let digits = required(value, "tax_document")?;
    let kind = validate_document(&digits).map_err(|e| KeyError::DocumentInvalid(e.to_string()))?;
    Ok((digits, kind))
}

/// Generate an NFSe access key with a random nonce.
pub fn generate_nfse_key(input: &NfseKeyInput<'_>) -> Result<String, KeyError> {
    generate_nfse_key_with(input, &RandomNonce)
}

/// Generate an NFSe access key drawing the nonce from `nonces`.
pub fn generate_nfse_key_with(
    input: &NfseKeyInput<'_>,
    nonces: &dyn NonceSource,
) -> Result<String, KeyError> {
    let municipality = required(input.municipality_code, "municipality_code")?;
    let sequence = required(input.sequence_number, "sequence_number")?;
    let (document, kind) = checked_document(input.tax_document)?;

    let mut base = String::with_capacity(50);
    base.push_str(&padded(&municipality, 7, "municipality_code")?);
    base.push(char::from(b'0' + input.environment.code()));
    base.push(kind.id_type_digit());
    base.push_str(&padded(&document, kind.digit_count(), "tax_document")?);
    base.push_str(&padded(&sequence, 13, "sequence_number")?);
    base.push_str(&input.processing_timestamp.format("%y%m").to_string());
    base.push_str(&format!("{:09}", nonces.nonce() % NONCE_LIMIT));

    let dv = checksum_digit_mod11(&base);
    Ok(format!("{NFSE_KEY_PREFIX}{base}{dv}"))
}

/// Generate the DPS identifier. Pure: equal inputs give equal keys.
pub fn generate_dps_key(input: &DpsKeyInput<'_>) -> Result<String, KeyError> {
    let municipality = required(input.municipality_code, "municipality_code")?;
    let series = required(input.series, "series")?;
    let sequence = required(input.sequence_number, "sequence_number")?;
    let (document, kind) = checked_document(input.tax_document)?;

    Ok(format!(
        "{DPS_KEY_PREFIX}{}{}{}{}{}",
        padded(&municipality, 7, "municipality_code")?,
        kind.id_type_digit(),
        padded(&document, 14, "tax_document")?,
        padded(&series, 5, "series")?,
        padded(&sequence, 15, "sequence_number")?,
    ))
}

/// Check the prefix, length and trailing module-11 digit of an NFSe key.
pub fn verify_nfse_key(key: &str) -> bool {
    let Some(body) = key.strip_prefix(NFSE_KEY_PREFIX) else {
        return false;
    };
    // CPF keys carry 11 document digits, CNPJ keys 14.
    if !(body.len() == 47 || body.len() == 50) || !body.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let (base, dv) = body.split_at(body.len() - 1);
    dv.parse::<u8>().ok() == Some(checksum_digit_mod11(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn june_2025() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 15, 7, 0, 0)
            .unwrap()
    }

    fn nfse_input<'a>(document: &'a str, sequence: &'a str) -> NfseKeyInput<'a> {
        NfseKeyInput {
            tax_document: document,
            environment: Environment::Homologation,
            municipality_code: "3550308",
            sequence_number: sequence,
            processing_timestamp: june_2025(),
        }
    }

    #[test]
    fn nfse_key_layout_cnpj() {
        let key =
            generate_nfse_key_with(&nfse_input("11222333000181", "1"), &FixedNonce(123_456_789))
                .unwrap();
        assert_eq!(key, "NFS35503082211222333000181000000000000125061234567895");
        assert_eq!(key.len(), 53);
        assert!(verify_nfse_key(&key));
    }

    #[test]
    fn nfse_key_pads_nonce() {
        let key = generate_nfse_key_with(&nfse_input("11144477735", "42"), &FixedNonce(7)).unwrap();
        assert_eq!(&key[..3], "NFS");
        assert_eq!(key.len(), 50);
        assert!(key[..key.len() - 1].ends_with("000000007"));
        assert!(verify_nfse_key(&key));
    }

    #[test]
    fn nfse_key_rejects_bad_document() {
        let err =
            generate_nfse_key_with(&nfse_input("11222333000180", "1"), &FixedNonce(1)).unwrap_err();
        assert!(matches!(err, KeyError::DocumentInvalid(_)));
    }

    #[test]
    fn nfse_key_missing_fields() {
        let mut input = nfse_input("11222333000181", "1");
        input.municipality_code = "";
        assert_eq!(
            generate_nfse_key(&input).unwrap_err(),
            KeyError::MissingField("municipality_code")
        );

        let input = nfse_input("", "1");
        assert_eq!(
            generate_nfse_key(&input).unwrap_err(),
            KeyError::MissingField("tax_document")
        );

        let input = nfse_input("11222333000181", " ");
        assert_eq!(
            generate_nfse_key(&input).unwrap_err(),
            KeyError::MissingField("sequence_number")
        );
    }

    #[test]
    fn dps_key_layout() {
        let key = generate_dps_key(&DpsKeyInput {
            tax_document: "11.222.333/0001-81",
            municipality_code: "3550308",
            series: "1",
            sequence_number: "1",
        })
        .unwrap();
        assert_eq!(key, "DPS355030821122233300018100001000000000000001");
        assert_eq!(key.len(), 45);
    }

    #[test]
    fn dps_key_pads_cpf_to_14() {
        let key = generate_dps_key(&DpsKeyInput {
            tax_document: "111.444.777-35",
            municipality_code: "3550308",
            series: "900",
            sequence_number: "1234",
        })
        .unwrap();
        assert_eq!(key, "DPS355030810001114447773500900000000000001234");
    }

    #[test]
    fn dps_key_rejects_oversized_series() {
        let err = generate_dps_key(&DpsKeyInput {
            tax_document: "11222333000181",
            municipality_code: "3550308",
            series: "123456",
            sequence_number: "1",
        })
        .unwrap_err();
        assert!(matches!(err, KeyError::DocumentInvalid(_)));
    }

    #[test]
    fn verify_rejects_tampering() {
        let key = "NFS35503082211222333000181000000000000125061234567895";
        assert!(verify_nfse_key(key));
        assert!(!verify_nfse_key("NFS35503082211222333000181000000000000125061234567894"));
        assert!(!verify_nfse_key("DPS35503082211222333000181000000000000125061234567895"));
        assert!(!verify_nfse_key("NFS123"));
    }
}
