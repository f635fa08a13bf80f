//! Error types for payloads and envelopes.

use esc_codec::xml::XmlError;
use esc_codec::{CharsetError, MimeType, MimeTypeError, SerializationError};
use esc_id::IdError;
use thiserror::Error;

use crate::payload::PayloadKind;

/// Errors that can occur when building, encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// A required field is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A field has the wrong shape.
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The payload variant does not match the declared content type.
    #[error("{kind} payload cannot be carried as '{content_type}'")]
    PayloadMismatch {
        kind: PayloadKind,
        content_type: MimeType,
    },

    /// Base64 text could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A type name is invalid.
    #[error(transparent)]
    Id(#[from] IdError),

    /// A content type is invalid.
    #[error(transparent)]
    MimeType(#[from] MimeTypeError),

    /// Payload text could not be converted with its charset.
    #[error(transparent)]
    Charset(#[from] CharsetError),

    /// JSON text is malformed.
    #[error("invalid JSON envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// XML text is malformed.
    #[error("invalid XML envelope: {0}")]
    Xml(#[from] XmlError),

    /// A registry lookup or codec failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl EnvelopeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EnvelopeError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if the envelope text or one of its fields could not be read.
    pub fn is_malformed(&self) -> bool {
        match self {
            EnvelopeError::MissingField(_)
            | EnvelopeError::InvalidField { .. }
            | EnvelopeError::Base64(_)
            | EnvelopeError::Json(_)
            | EnvelopeError::Xml(_)
            | EnvelopeError::MimeType(_) => true,
            EnvelopeError::Serialization(err) => err.is_malformed(),
            _ => false,
        }
    }
}
