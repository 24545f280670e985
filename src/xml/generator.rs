use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;

use super::NFSE_NAMESPACE;
use super::dps::write_dps;
use super::nfse;
use super::tree::XmlBuilder;
use crate::core::*;

/// Tax groups emitted zero-filled when the caller supplies none.
///
/// Version 1.00 of the national schema rejects a DPS without `tribFed` and
/// `totTrib`, so both default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxGroupDefaults {
    /// Emit `tribFed` with zero PIS/COFINS (CST 00) and zero withholdings.
    pub federal: bool,
    /// Emit `totTrib` with zero `vTotTrib` amounts.
    pub totals: bool,
}

/// Zero-fill policy required by SPED NFSe schema 1.00.
pub const SPED_V1_TAX_GROUP_DEFAULTS: TaxGroupDefaults = TaxGroupDefaults {
    federal: true,
    totals: true,
};

impl Default for TaxGroupDefaults {
    fn default() -> Self {
        SPED_V1_TAX_GROUP_DEFAULTS
    }
}

impl TaxGroupDefaults {
    /// The `tribFed` written when none is supplied.
    pub fn zero_federal() -> FederalTax {
        FederalTax {
            pis_cofins: Some(PisCofins {
                cst: "00".into(),
                base: Some(Decimal::ZERO),
                pis_rate: Some(Decimal::ZERO),
                cofins_rate: Some(Decimal::ZERO),
                pis_amount: Some(Decimal::ZERO),
                cofins_amount: Some(Decimal::ZERO),
                withholding: Some(2),
            }),
            withheld_cp: Some(Decimal::ZERO),
            withheld_irrf: Some(Decimal::ZERO),
            withheld_csll: Some(Decimal::ZERO),
        }
    }

    /// The `totTrib` written when none is supplied.
    pub fn zero_totals() -> TaxTotals {
        TaxTotals {
            amounts: Some(TaxSplit::default()),
            ..TaxTotals::default()
        }
    }
}

/// Assembles DPS and NFSe documents.
///
/// ```
/// use chrono::DateTime;
/// use nfse::core::FixedNonce;
/// use nfse::xml::NfseGenerator;
///
/// let generator = NfseGenerator::new()
///     .with_nonce_source(FixedNonce(123_456_789))
///     .processed_at(DateTime::parse_from_rfc3339("2025-06-15T13:00:00Z").unwrap())
///     .signature_placeholder(false);
/// # let _ = generator;
/// ```
pub struct NfseGenerator {
    nonces: Box<dyn NonceSource>,
    processed_at: Option<DateTime<FixedOffset>>,
    signature_placeholder: bool,
    tax_group_defaults: TaxGroupDefaults,
}

impl Default for NfseGenerator {
    fn default() -> Self {
        Self {
            nonces: Box::new(RandomNonce),
            processed_at: None,
            signature_placeholder: true,
            tax_group_defaults: SPED_V1_TAX_GROUP_DEFAULTS,
        }
    }
}

impl std::fmt::Debug for NfseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NfseGenerator")
            .field("processed_at", &self.processed_at)
            .field("signature_placeholder", &self.signature_placeholder)
            .field("tax_group_defaults", &self.tax_group_defaults)
            .finish_non_exhaustive()
    }
}

impl NfseGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source of the NFSe key nonce. Random by default.
    pub fn with_nonce_source(mut self, nonces: impl NonceSource + 'static) -> Self {
        self.nonces = Box::new(nonces);
        self
    }

    /// Fix the processing timestamp instead of reading the clock.
    pub fn processed_at(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.processed_at = Some(timestamp);
        self
    }

    /// Whether the NFSe ends with a signature placeholder comment.
    pub fn signature_placeholder(mut self, enabled: bool) -> Self {
        self.signature_placeholder = enabled;
        self
    }

    pub fn tax_group_defaults(mut self, defaults: TaxGroupDefaults) -> Self {
        self.tax_group_defaults = defaults;
        self
    }

    /// Render a standalone DPS document.
    pub fn generate_dps(&self, dps: &Dps) -> Result<String, NfseError> {
        tracing::debug!(series = %dps.series, number = %dps.number, "assembling DPS");
        let errors = validate_provider(&dps.provider);
        if !errors.is_empty() {
            return Err(NfseError::Validation(errors));
        }

        let id = dps_id(dps)?;
        let mut b = XmlBuilder::document();
        write_dps(&mut b, dps, &id, &dps.issued_at, self.tax_group_defaults);
        let xml = b.build()?;
        tracing::debug!(id = %id, bytes = xml.len(), "DPS assembled");
        Ok(xml)
    }

    /// Render a complete NFSe wrapping its DPS.
    ///
    /// Header `dhProc`, the key's year-month and the nested `dhEmi` all use
    /// the same processing timestamp.
    pub fn generate_nfse(&self, nfse: &Nfse) -> Result<String, NfseError> {
        tracing::debug!(number = %nfse.header.number, "assembling NFSe");
        let mut errors = validate_emitter(&nfse.emitter);
        errors.extend(validate_provider(&nfse.dps.provider));
        if !errors.is_empty() {
            return Err(NfseError::Validation(errors));
        }

        let brazil = FixedOffset::west_opt(BRAZIL_OFFSET_SECONDS)
            .ok_or_else(|| NfseError::Xml("invalid Brazil UTC offset".into()))?;
        let processed_at = self
            .processed_at
            .unwrap_or_else(|| Utc::now().into())
            .with_timezone(&brazil);
        let timestamp = brazil_timestamp(&processed_at);

        let key = generate_nfse_key_with(
            &NfseKeyInput {
                tax_document: nfse.emitter.identification.value(),
                environment: nfse.dps.environment,
                municipality_code: &nfse.header.incidence_municipality,
                sequence_number: &nfse.header.number,
                processing_timestamp: processed_at,
            },
            self.nonces.as_ref(),
        )?;
        let dps_id = dps_id(&nfse.dps)?;
        let values = nfse
            .values
            .clone()
            .unwrap_or_else(|| NfseValues::compute(&nfse.dps));

        let mut b = XmlBuilder::document();
        b.add_group(
            "NFSe",
            &[("xmlns", NFSE_NAMESPACE), ("versao", &nfse.version)],
            |b| {
                b.add_group("infNFSe", &[("Id", &key)], |b| {
                    nfse::write_header(b, &nfse.header, &timestamp);
                    nfse::write_emitter(b, &nfse.emitter);
                    nfse::write_values(b, &values);
                    write_dps(b, &nfse.dps, &dps_id, &timestamp, self.tax_group_defaults);
                });
                if self.signature_placeholder {
                    b.add_comment("ds:Signature is inserted here by the signing step");
                }
            },
        );
        let xml = b.build()?;
        tracing::debug!(key = %key, bytes = xml.len(), "NFSe assembled");
        Ok(xml)
    }
}

fn dps_id(dps: &Dps) -> Result<String, NfseError> {
    let document = dps.provider.identification.federal_document().ok_or_else(|| {
        KeyError::DocumentInvalid(format!(
            "provider identified by {} cannot key a DPS",
            dps.provider.identification.tag()
        ))
    })?;
    Ok(generate_dps_key(&DpsKeyInput {
        tax_document: document,
        municipality_code: &dps.emission_municipality,
        series: &dps.series,
        sequence_number: &dps.number,
    })?)
}

/// Render a DPS document with the default generator.
pub fn generate_dps_xml(dps: &Dps) -> Result<String, NfseError> {
    NfseGenerator::default().generate_dps(dps)
}

/// Render a complete NFSe with the default generator (random nonce, current time).
pub fn generate_complete_nfse_xml(nfse: &Nfse) -> Result<String, NfseError> {
    NfseGenerator::default().generate_nfse(nfse)
}
