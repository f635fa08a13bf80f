//! Error types for mime types, charsets, codecs and registry configuration.

use std::path::PathBuf;

use esc_id::{IdError, SerializedDataType};
use thiserror::Error;

use crate::mime::MimeType;
use crate::xml::{Severity, XmlError};

/// Boxed error used to carry the cause of a codec or adapter failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when parsing or building a mime type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MimeTypeError {
    /// The mime type string is empty.
    #[error("mime type cannot be empty")]
    Empty,

    /// The base type has no `/` separator.
    #[error("mime type '{0}' is missing the subtype")]
    MissingSubtype(String),

    /// A type, subtype or parameter name is not a valid token.
    #[error("invalid {part} '{value}' in mime type")]
    InvalidToken { part: &'static str, value: String },

    /// A parameter is not of the form `key=value`.
    #[error("malformed mime type parameter '{0}'")]
    MalformedParameter(String),

    /// A quoted parameter value has no closing quote.
    #[error("unterminated quoted value in mime type '{0}'")]
    UnterminatedQuote(String),

    /// `version` or `encoding` was passed through the generic parameter map.
    #[error("parameter '{0}' is reserved and must be set through its dedicated argument")]
    ReservedParameter(String),

    /// The same parameter appears twice.
    #[error("duplicate mime type parameter '{0}'")]
    DuplicateParameter(String),
}

/// Errors that can occur when encoding or decoding text with a charset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CharsetError {
    /// The charset name is not supported.
    #[error("unsupported charset: {0}")]
    Unsupported(String),

    /// A character cannot be represented in the charset.
    #[error("character {character:?} cannot be encoded as {charset}")]
    Unmappable {
        charset: &'static str,
        character: char,
    },

    /// The bytes are not valid for the charset.
    #[error("invalid {charset} input at byte {position}")]
    InvalidInput {
        charset: &'static str,
        position: usize,
    },
}

/// Errors that can occur when serializing or deserializing a payload.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// No serializer is registered for the type.
    #[error("no serializer registered for type '{data_type}'")]
    SerializerNotFound { data_type: SerializedDataType },

    /// No deserializer is registered for the type and mime type.
    #[error("no deserializer registered for type '{data_type}' and mime type '{mime_type}'")]
    DeserializerNotFound {
        data_type: SerializedDataType,
        mime_type: MimeType,
    },

    /// A deserializer was requested without a mime type and the type has no default.
    #[error("no default mime type configured for type '{data_type}'")]
    DefaultMimeTypeNotFound { data_type: SerializedDataType },

    /// No payload class is registered for the type.
    #[error("no class registered for type '{data_type}'")]
    ClassNotFound { data_type: SerializedDataType },

    /// The value handed to a codec is not of a kind the codec understands.
    #[error("{codec} codec expected {expected}")]
    TypeMismatch {
        codec: &'static str,
        expected: &'static str,
    },

    /// The value is not an instance of the class registered for its type tag.
    #[error("value is not assignable to {class}, the class registered for type '{data_type}'")]
    NotAssignable {
        data_type: SerializedDataType,
        class: &'static str,
    },

    /// The codec cannot read or write the given mime type.
    #[error("{codec} codec does not support mime type '{mime_type}'")]
    UnsupportedMimeType {
        codec: &'static str,
        mime_type: MimeType,
    },

    /// The input bytes could not be parsed.
    #[error("malformed {format} input: {source}")]
    Malformed {
        format: &'static str,
        #[source]
        source: BoxError,
    },

    /// A validation event was escalated to a failure.
    #[error("XML validation failed ({severity}): {message}")]
    Validation { severity: Severity, message: String },

    /// Generic codec failure wrapping the underlying cause.
    #[error("{codec} serialization failed: {source}")]
    Codec {
        codec: &'static str,
        #[source]
        source: BoxError,
    },

    /// Charset conversion failed.
    #[error(transparent)]
    Charset(#[from] CharsetError),

    /// Mime type construction failed.
    #[error(transparent)]
    MimeType(#[from] MimeTypeError),

    /// A type name failed validation.
    #[error(transparent)]
    Id(#[from] IdError),
}

impl SerializationError {
    /// Wraps a parser diagnostic as malformed input.
    pub fn malformed(format: &'static str, source: impl Into<BoxError>) -> Self {
        SerializationError::Malformed {
            format,
            source: source.into(),
        }
    }

    /// Wraps any codec-level failure.
    pub fn codec(codec: &'static str, source: impl Into<BoxError>) -> Self {
        SerializationError::Codec {
            codec,
            source: source.into(),
        }
    }

    /// Returns true if this error reports a missing registry entry.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            SerializationError::SerializerNotFound { .. }
                | SerializationError::DeserializerNotFound { .. }
                | SerializationError::DefaultMimeTypeNotFound { .. }
                | SerializationError::ClassNotFound { .. }
        )
    }

    /// Returns true if this error reports unparseable input.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SerializationError::Malformed { .. }
                | SerializationError::Charset(CharsetError::InvalidInput { .. })
        )
    }
}

impl From<XmlError> for SerializationError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Write(_) => SerializationError::codec("xml", err),
            _ => SerializationError::malformed("xml", err),
        }
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::malformed("json", err)
    }
}

/// Errors that can occur when loading a serialization config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML document is invalid.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured encoding is not a supported charset.
    #[error(transparent)]
    Charset(#[from] CharsetError),

    /// A bound type name is invalid.
    #[error(transparent)]
    InvalidTypeName(#[from] IdError),

    /// A boolean setting has an unrecognized value.
    #[error("invalid value '{value}' for {key}")]
    InvalidFlag { key: &'static str, value: String },

    /// A type is bound twice to codecs with the same base mime type.
    #[error("type '{name}' is bound more than once to {base_type}")]
    DuplicateBinding { name: String, base_type: &'static str },

    /// A type has more than one binding marked as default.
    #[error("type '{name}' has more than one default binding")]
    ConflictingDefaults { name: String },

    /// A type has several bindings and none is marked as default.
    #[error("type '{name}' has several bindings but no default")]
    MissingDefault { name: String },
}
