//! Property-based tests for the nfse crate.
//!
//! Run with: `cargo test --test proptest_tests`

mod common;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use common::*;
use nfse::core::*;
use nfse::xml;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn with_check_digits(base: &str) -> String {
    let first = checksum_digit_mod11(base);
    let with_first = format!("{base}{first}");
    let second = checksum_digit_mod11(&with_first);
    format!("{with_first}{second}")
}

// ── Strategies ──────────────────────────────────────────────────────────────

/// Amounts from 0.01 to 9,999,999.99.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates from 0.00 to 5.00 percent.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=500i64).prop_map(|bp| Decimal::new(bp, 2))
}

/// Instants between 2000 and 2099.
fn arb_instant() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (946_684_800i64..4_102_444_800i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default().into())
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn check_digit_is_a_digit(s in "[0-9]{0,60}") {
        prop_assert!(checksum_digit_mod11(&s) <= 9);
    }

    /// Twelve digits plus computed check digits form a valid CNPJ.
    #[test]
    fn computed_cnpj_validates(base in "[0-9]{12}") {
        let cnpj = with_check_digits(&base);
        prop_assume!(!cnpj.chars().all(|c| Some(c) == cnpj.chars().next()));
        prop_assert!(validate_cnpj(&cnpj));
        prop_assert_eq!(validate_document(&cnpj), Ok(DocumentKind::Cnpj));
    }

    /// Every generated NFSe key has 53 characters and a valid check digit.
    #[test]
    fn nfse_keys_verify(nonce in 0u32..NONCE_LIMIT, seq in 1u64..10_000_000_000_000u64, at in arb_instant()) {
        let seq = seq.to_string();
        let key = generate_nfse_key_with(
            &NfseKeyInput {
                tax_document: PROVIDER_CNPJ,
                environment: Environment::Production,
                municipality_code: SAO_PAULO,
                sequence_number: &seq,
                processing_timestamp: at,
            },
            &FixedNonce(nonce),
        ).unwrap();
        prop_assert_eq!(key.len(), 53);
        prop_assert!(verify_nfse_key(&key));
    }

    /// Brazil conversion always yields the fixed -03:00 shape.
    #[test]
    fn brazil_dates_are_well_formed(at in arb_instant()) {
        let out = format_date_brazil(&at.to_rfc3339());
        prop_assert_eq!(out.len(), 25);
        prop_assert!(out.ends_with("-03:00"));
        let back = DateTime::parse_from_rfc3339(&out).unwrap();
        prop_assert_eq!(back, at);
    }

    /// Escaped text never contains markup characters.
    #[test]
    fn sanitized_text_has_no_markup(s in "\\PC{0,40}") {
        let out = sanitize_xml_text(&s);
        prop_assert!(!out.contains('<'));
        prop_assert!(!out.contains('>'));
        prop_assert!(!out.contains('"'));
    }

    /// generate → parse keeps the amounts and the ISS rate.
    #[test]
    fn dps_roundtrip_keeps_amounts(amount in arb_amount(), rate in arb_rate()) {
        let mut dps = sample_dps();
        dps.values.service.amount = amount;
        dps.values.taxation.municipal.rate = Some(rate);
        let out = xml::generate_dps_xml(&dps).unwrap();
        let parsed = xml::parse_nfse_xml(&out).unwrap();
        prop_assert_eq!(parsed.values.service.amount, amount);
        prop_assert_eq!(parsed.values.taxation.municipal.rate, Some(rate));
        prop_assert_eq!(parsed.provider.identification, dps.provider.identification);
    }

    /// Net value never exceeds the service amount.
    #[test]
    fn net_never_exceeds_service(amount in arb_amount(), rate in arb_rate()) {
        let mut dps = sample_dps();
        dps.values.service.amount = amount;
        dps.values.taxation.municipal.rate = Some(rate);
        dps.values.taxation.municipal.withholding = Some(IssWithholding::ByTaker);
        let values = NfseValues::compute(&dps);
        prop_assert!(values.net_amount <= amount);
        prop_assert!(values.base >= Decimal::ZERO);
    }
}
