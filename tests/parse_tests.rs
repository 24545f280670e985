mod common;

use chrono::DateTime;
use common::*;
use nfse::core::*;
use nfse::xml::{self, NfseGenerator};
use rust_decimal_macros::dec;

#[test]
fn dps_roundtrip_preserves_key_fields() {
    let original = sample_dps();
    let out = xml::generate_dps_xml(&original).unwrap();
    let parsed = xml::parse_nfse_xml(&out).unwrap();

    assert_eq!(parsed.version, SCHEMA_VERSION);
    assert_eq!(parsed.provider.identification, original.provider.identification);
    assert_eq!(parsed.provider.name, original.provider.name);
    assert_eq!(parsed.provider.regime, original.provider.regime);
    assert_eq!(parsed.taker.name, original.taker.name);
    assert_eq!(parsed.taker.identification, original.taker.identification);
    assert_eq!(parsed.values.service.amount, original.values.service.amount);
    assert_eq!(parsed.service.code, original.service.code);
    assert_eq!(parsed.service.location, original.service.location);
    assert_eq!(parsed.values.taxation.municipal, original.values.taxation.municipal);
    assert_eq!(parsed.series, "1");
    assert_eq!(parsed.number, "1");
    assert_eq!(parsed.issued_at, "2025-06-15T07:00:00-03:00");
}

#[test]
fn addresses_come_back_as_digits() {
    let out = xml::generate_dps_xml(&sample_dps()).unwrap();
    let parsed = xml::parse_nfse_xml(&out).unwrap();
    let address = parsed.provider.address.unwrap();
    assert_eq!(
        address.location,
        AddressLocation::National {
            municipality_code: SAO_PAULO.into(),
            postal_code: "01310100".into(),
        }
    );
    assert_eq!(address.complement.as_deref(), Some("Conj. 101"));
    assert_eq!(parsed.provider.phone.as_deref(), Some("1133334444"));
}

#[test]
fn full_dps_roundtrip() {
    let original = full_dps();
    let out = xml::generate_dps_xml(&original).unwrap();
    let parsed = xml::parse_nfse_xml(&out).unwrap();

    assert_eq!(parsed.environment, Environment::Production);
    assert_eq!(parsed.series, "900");
    assert_eq!(
        parsed.intermediary.as_ref().map(|i| &i.identification),
        Some(&Identification::Cnpj("11444777000161".into()))
    );
    assert_eq!(parsed.values.discounts, original.values.discounts);
    assert_eq!(parsed.values.deduction, original.values.deduction);
    assert_eq!(parsed.values.taxation.federal, original.values.taxation.federal);
    assert_eq!(parsed.values.taxation.totals, original.values.taxation.totals);
    assert_eq!(parsed.service.complementary, original.service.complementary);
}

#[test]
fn zero_filled_groups_parse_as_zero() {
    let out = xml::generate_dps_xml(&sample_dps()).unwrap();
    let parsed = xml::parse_nfse_xml(&out).unwrap();
    let federal = parsed.values.taxation.federal.unwrap();
    assert_eq!(federal.pis_cofins.unwrap().cst, "00");
    assert_eq!(federal.withheld_irrf, Some(dec!(0)));
    let totals = parsed.values.taxation.totals.unwrap();
    assert_eq!(totals.amounts, Some(TaxSplit::default()));
}

#[test]
fn parsed_dps_regenerates() {
    let out = xml::generate_dps_xml(&full_dps()).unwrap();
    let parsed = xml::parse_nfse_xml(&out).unwrap();
    let again = xml::generate_dps_xml(&parsed).unwrap();
    assert_eq!(out, again);
}

#[test]
fn nfse_document_roundtrip() {
    let generator = NfseGenerator::new()
        .with_nonce_source(FixedNonce(1))
        .processed_at(DateTime::parse_from_rfc3339("2025-06-15T13:00:00Z").unwrap());
    let out = generator.generate_nfse(&sample_nfse()).unwrap();
    let parsed = xml::parse_nfse_document(&out).unwrap();

    assert_eq!(parsed.header.number, "1");
    assert_eq!(parsed.header.status, 100);
    assert_eq!(
        parsed.header.processed_at.as_deref(),
        Some("2025-06-15T10:00:00-03:00")
    );
    assert_eq!(parsed.emitter.identification, emitter().identification);
    assert_eq!(parsed.emitter.address.state, "SP");
    let values = parsed.values.unwrap();
    assert_eq!(values.iss_amount, Some(dec!(75.00)));
    assert_eq!(values.net_amount, dec!(1500.00));
    assert_eq!(parsed.dps.taker.name, "Maria Silva");
    assert_eq!(parsed.dps.values.service.amount, dec!(1500.00));
}

#[test]
fn parse_dps_out_of_nfse() {
    let out = NfseGenerator::new()
        .with_nonce_source(FixedNonce(1))
        .generate_nfse(&sample_nfse())
        .unwrap();
    let dps = xml::parse_nfse_xml(&out).unwrap();
    assert_eq!(dps.provider.name, "Prestadora Exemplo Ltda");
}

#[test]
fn structural_check_of_generated_documents() {
    assert!(xml::validate_nfse_xml(&xml::generate_dps_xml(&sample_dps()).unwrap()).is_ok());
    assert!(xml::validate_nfse_xml(&xml::generate_complete_nfse_xml(&sample_nfse()).unwrap()).is_ok());
}

#[test]
fn structural_check_failures() {
    assert!(matches!(
        xml::validate_nfse_xml("<DPS><infDPS><prest/>"),
        Err(NfseError::MalformedXml(_))
    ));
    let err = xml::validate_nfse_xml("<DPS><infDPS><prest/><toma/><valores/></infDPS></DPS>").unwrap_err();
    assert!(err.to_string().contains("serv"));
}

#[test]
fn parse_errors() {
    assert!(matches!(
        xml::parse_nfse_xml("not xml at all <"),
        Err(NfseError::MalformedXml(_))
    ));
    assert!(matches!(
        xml::parse_nfse_xml("<NFSe><infNFSe/></NFSe>"),
        Err(NfseError::SchemaMismatch(_))
    ));
    assert!(matches!(
        xml::parse_nfse_document("<DPS><infDPS/></DPS>"),
        Err(NfseError::SchemaMismatch(_))
    ));
}
