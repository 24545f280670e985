use thiserror::Error;

/// Errors that can occur while building, keying or parsing a fiscal document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NfseError {
    /// One or more validation rules failed. Nothing was emitted.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// The access key could not be assembled.
    #[error("access key generation failed: {0}")]
    KeyGeneration(#[from] KeyError),

    /// The input is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// The input is XML but lacks the elements of a DPS/NFSe document.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// XML writing failed or the builder was misused.
    #[error("XML error: {0}")]
    Xml(String),
}

impl NfseError {
    /// Field-level messages when this is a validation failure.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Reasons an access key cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A required input was empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The taxpayer document is not a structurally valid CNPJ or CPF.
    #[error("invalid taxpayer document: {0}")]
    DocumentInvalid(String),
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "provider.address.postal_code").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = NfseError::Validation(vec![
            ValidationError::new("provider.name", "name must not be empty"),
            ValidationError::new("provider.identification", "invalid CNPJ"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: provider.name: name must not be empty; provider.identification: invalid CNPJ"
        );
        assert_eq!(err.validation_errors().len(), 2);
    }

    #[test]
    fn key_error_converts() {
        let err: NfseError = KeyError::MissingField("municipality_code").into();
        assert!(matches!(err, NfseError::KeyGeneration(_)));
        assert!(err.to_string().contains("municipality_code"));
    }
}
