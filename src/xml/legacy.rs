//! Minimal DPS assembler kept for integrations built against the first
//! release. It writes only the mandatory groups and never zero-fills
//! `tribFed`.

use super::NFSE_NAMESPACE;
use super::dps::{write_header, write_identification, write_regime, write_service_location};
use super::tree::XmlBuilder;
use crate::core::*;

/// Render a DPS with only identification, names, service code and ISS.
pub fn generate_simple_dps_xml(dps: &Dps) -> Result<String, NfseError> {
    let errors = validate_provider(&dps.provider);
    if !errors.is_empty() {
        return Err(NfseError::Validation(errors));
    }
    let document = dps.provider.identification.federal_document().ok_or_else(|| {
        KeyError::DocumentInvalid(format!(
            "provider identified by {} cannot key a DPS",
            dps.provider.identification.tag()
        ))
    })?;
    let id = generate_dps_key(&DpsKeyInput {
        tax_document: document,
        municipality_code: &dps.emission_municipality,
        series: &dps.series,
        sequence_number: &dps.number,
    })?;

    let mut b = XmlBuilder::document();
    b.add_group("DPS", &[("xmlns", NFSE_NAMESPACE), ("versao", &dps.version)], |b| {
        b.add_group("infDPS", &[("Id", &id)], |b| {
            write_header(b, dps, &dps.issued_at);
            b.add_group("prest", &[], |b| {
                write_identification(b, &dps.provider.identification);
                b.add_element("xNome", &dps.provider.name);
                write_regime(b, &dps.provider.regime);
            });
            b.add_group("toma", &[], |b| {
                write_identification(b, &dps.taker.identification);
                b.add_element("xNome", &dps.taker.name);
            });
            b.add_group("serv", &[], |b| {
                write_service_location(b, &dps.service.location);
                b.add_group("cServ", &[], |b| {
                    b.add_element("cTribNac", &dps.service.code.national_code)
                        .add_element("xDescServ", &dps.service.code.description);
                });
            });
            let municipal = &dps.values.taxation.municipal;
            b.add_group("valores", &[], |b| {
                b.add_group("vServPrest", &[], |b| {
                    b.add_number("vServ", dps.values.service.amount, 2);
                });
                b.add_group("trib", &[], |b| {
                    b.add_group("tribMun", &[], |b| {
                        b.add_element("tribISSQN", municipal.situation.code())
                            .add_number("pAliq", municipal.rate, 2)
                            .add_element("tpRetISSQN", municipal.withholding.map(|w| w.code()));
                    });
                    b.add_group("totTrib", &[], |b| {
                        b.add_element("indTotTrib", 0);
                    });
                });
            });
        });
    });
    b.build()
}
