//! # nfse
//!
//! Brazilian national NFSe (Nota Fiscal de Serviço eletrônica) documents:
//! DPS and NFSe XML generation, access keys, CNPJ/CPF validation and
//! round-trip parsing, following the SPED NFSe schema version 1.00.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Signing, transmission and persistence are left to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use nfse::core::*;
//! use nfse::xml;
//! use rust_decimal_macros::dec;
//!
//! let provider = ProviderBuilder::new(Identification::Cnpj("11222333000181".into()), "Prestadora Ltda")
//!     .address(AddressBuilder::national("3550308", "01310100", "Av. Paulista", "1000", "Bela Vista").build())
//!     .build();
//! let taker = PartyBuilder::new(Identification::Cpf("11144477735".into()), "Maria Silva").build();
//!
//! let dps = DpsBuilder::new("1", "1", "3550308")
//!     .issued_at("2025-06-15T10:00:00Z")
//!     .provider(provider)
//!     .taker(taker)
//!     .service(ServiceLocation::Municipality("3550308".into()), ServiceCode {
//!         national_code: "010101".into(),
//!         municipal_code: None,
//!         description: "Desenvolvimento de software".into(),
//!         nbs_code: None,
//!         internal_code: None,
//!     })
//!     .service_amount(dec!(1500.00))
//!     .iss_rate(dec!(5))
//!     .build()
//!     .unwrap();
//!
//! let out = xml::generate_dps_xml(&dps).unwrap();
//! assert!(out.contains(r#"<infDPS Id="DPS355030821122233300018100001000000000000001">"#));
//! assert!(out.contains("<dhEmi>2025-06-15T07:00:00-03:00</dhEmi>"));
//!
//! let parsed = xml::parse_nfse_xml(&out).unwrap();
//! assert_eq!(parsed.values.service.amount, dec!(1500.00));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Data model, CNPJ/CPF checks, formatting, validation, access keys |
//! | `xml` (default) | Conditional XML builder, DPS/NFSe assemblers, parser |
//! | `legacy` | Minimal DPS assembler of the first release |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
