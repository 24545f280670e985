//! Core NFSe/DPS types, document utilities, validation, and access keys.
//!
//! This module provides the data model of the national SPED NFSe standard
//! and everything needed before XML is written: CNPJ/CPF checks, field
//! formatting, provider/emitter validation and access-key generation.

mod access_key;
mod builder;
mod document;
mod error;
mod types;
mod validation;
mod values;

pub use access_key::*;
pub use builder::*;
pub use document::*;
pub use error::*;
pub use types::*;
pub use validation::*;
