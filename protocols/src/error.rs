//! Validation errors raised while constructing or decoding realtime messages.

use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Error)]
pub enum ValidationError {
    /// A numeric field is outside its inclusive bounds.
    #[error("{field} must be between {min} and {max} (inclusive), got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("missing discriminator field `{field}`")]
    MissingDiscriminator { field: &'static str },

    #[error("unknown {field} `{value}`")]
    UnknownDiscriminator { field: &'static str, value: String },

    /// The payload does not match the field set of its variant.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ValidationError {
    pub(crate) fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::OutOfRange { field, .. }
            | Self::MissingDiscriminator { field }
            | Self::UnknownDiscriminator { field, .. } => Some(field),
            Self::Malformed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message_names_field_and_bounds() {
        let err = ValidationError::out_of_range("temperature", 5.0, 0.0, 1.2);
        let msg = err.to_string();
        assert!(msg.contains("temperature"));
        assert!(msg.contains("1.2"));
        assert!(msg.contains('5'));
        assert_eq!(err.field(), Some("temperature"));
    }

    #[test]
    fn test_unknown_discriminator_message() {
        let err = ValidationError::UnknownDiscriminator {
            field: "type",
            value: "not.a.real.event".to_string(),
        };
        assert_eq!(err.to_string(), "unknown type `not.a.real.event`");
    }
}
