//! ==============================================================================
//! error.rs - ingest rejection reasons
//! ==============================================================================
//!
//! purpose:
//!     the three ways a device payload can be refused. all of them are the
//!     client's fault; once a payload validates, the store cannot fail.
//!
//! relationships:
//!     - produced by: domain.rs (parse_pressure)
//!     - returned by: store.rs (ReadingStore::ingest)
//!     - mapped to http 400 by: server.rs (IntoResponse)
//!
//! ==============================================================================

use thiserror::Error;

/// Reason an ingest payload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IngestError {
    /// Payload is missing, is not a JSON object, or has no `pressure` key
    #[error("invalid data format, expected {{\"pressure\": value}}")]
    MalformedRequest,

    /// `pressure` is present but not a JSON number
    #[error("pressure must be a number")]
    InvalidType,

    /// `pressure` is a number but below zero
    #[error("pressure must be non-negative, got {value}")]
    OutOfRange { value: f64 },
}

impl IngestError {
    /// Stable machine-readable tag for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed_request",
            Self::InvalidType => "invalid_type",
            Self::OutOfRange { .. } => "out_of_range",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            IngestError::MalformedRequest.kind(),
            IngestError::InvalidType.kind(),
            IngestError::OutOfRange { value: -1.0 }.kind(),
        ];
        assert_ne!(kinds[0], kinds[1]);
        assert_ne!(kinds[1], kinds[2]);
        assert_ne!(kinds[0], kinds[2]);
    }

    #[test]
    fn messages_match_the_device_contract() {
        assert_eq!(
            IngestError::MalformedRequest.to_string(),
            "invalid data format, expected {\"pressure\": value}"
        );
        assert_eq!(IngestError::InvalidType.to_string(), "pressure must be a number");
        let msg = IngestError::OutOfRange { value: -3.5 }.to_string();
        assert_eq!(msg, "pressure must be non-negative, got -3.5");
    }

    #[test]
    fn is_a_std_error() {
        let boxed: Box<dyn std::error::Error> = Box::new(IngestError::InvalidType);
        assert!(boxed.source().is_none());
    }
}
