//! SPED NFSe XML generation and parsing.
//!
//! # Example
//!
//! ```
//! use nfse::core::*;
//! use nfse::xml;
//! use rust_decimal_macros::dec;
//!
//! let dps = DpsBuilder::new("1", "42", "3550308")
//!     .issued_at("2025-06-15T10:00:00Z")
//!     .provider(ProviderBuilder::new(Identification::Cnpj("11222333000181".into()), "Prestadora Ltda").build())
//!     .taker(PartyBuilder::new(Identification::Cpf("11144477735".into()), "Maria Silva").build())
//!     .service(ServiceLocation::Municipality("3550308".into()), ServiceCode {
//!         national_code: "010101".into(),
//!         municipal_code: None,
//!         description: "Consultoria".into(),
//!         nbs_code: None,
//!         internal_code: None,
//!     })
//!     .service_amount(dec!(800))
//!     .build()
//!     .unwrap();
//!
//! let dps_xml = xml::generate_dps_xml(&dps).unwrap();
//! assert!(xml::validate_nfse_xml(&dps_xml).is_ok());
//! let parsed = xml::parse_nfse_xml(&dps_xml).unwrap();
//! assert_eq!(parsed.number, "42");
//! ```

mod dps;
mod generator;
#[cfg(feature = "legacy")]
pub mod legacy;
mod nfse;
mod parse;
mod tree;
mod validate;
pub(crate) mod xml_utils;

pub use generator::{
    NfseGenerator, SPED_V1_TAX_GROUP_DEFAULTS, TaxGroupDefaults, generate_complete_nfse_xml,
    generate_dps_xml,
};
pub use parse::{parse_nfse_document, parse_nfse_xml};
pub use tree::{Choice, Element, MAX_NUMERIC_MAGNITUDE, Node, XmlBuilder, XmlValue};
pub use validate::validate_nfse_xml;

/// Namespace declared on `DPS` and `NFSe` roots.
pub const NFSE_NAMESPACE: &str = "http://www.sped.fazenda.gov.br/nfse";
