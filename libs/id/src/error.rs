//! Error types for name and identifier parsing.

use thiserror::Error;

/// Errors that can occur when parsing or validating names and IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The name string is empty.
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    /// The name contains a character that cannot travel in an envelope.
    #[error("invalid character {character:?} in {kind} '{value}'")]
    InvalidCharacter {
        kind: &'static str,
        value: String,
        character: char,
    },

    /// The name exceeds the maximum length.
    #[error("{kind} exceeds maximum length of {max} bytes")]
    TooLong { kind: &'static str, max: usize },

    /// The UUID portion of an event ID is invalid.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty { .. })
    }
}
