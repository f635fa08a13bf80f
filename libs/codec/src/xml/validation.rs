//! Validation events raised while reading or writing bound XML.

use std::fmt;

use tracing::warn;

use super::node::XmlNode;
use crate::error::SerializationError;

/// Severity of a validation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning = 0,
    Error = 1,
    FatalError = 2,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::FatalError => write!(f, "fatal error"),
        }
    }
}

/// A single finding reported by the XML codec or an [`XmlValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEvent {
    pub severity: Severity,
    pub message: String,
}

impl ValidationEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Structural check run against a document before it is bound to a class.
pub trait XmlValidator: Send + Sync + fmt::Debug {
    /// Appends any findings for `root` to `events`.
    fn validate(&self, root: &XmlNode, events: &mut Vec<ValidationEvent>);
}

/// Decides whether a validation event aborts the current operation.
pub trait ValidationHandler: Send + Sync + fmt::Debug {
    fn handle(&self, event: &ValidationEvent) -> Result<(), SerializationError>;
}

/// Fails on every event above [`Severity::Warning`] and logs warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalatingHandler;

impl ValidationHandler for EscalatingHandler {
    fn handle(&self, event: &ValidationEvent) -> Result<(), SerializationError> {
        if event.severity > Severity::Warning {
            return Err(SerializationError::Validation {
                severity: event.severity,
                message: event.message.clone(),
            });
        }
        warn!(message = %event.message, "XML validation warning");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::FatalError);
        assert_eq!(Severity::FatalError as u8, 2);
    }

    #[test]
    fn test_escalating_handler() {
        let handler = EscalatingHandler;
        assert!(handler
            .handle(&ValidationEvent::new(Severity::Warning, "unknown attribute"))
            .is_ok());
        let err = handler
            .handle(&ValidationEvent::new(Severity::Error, "missing attribute 'name'"))
            .unwrap_err();
        assert!(matches!(
            err,
            SerializationError::Validation {
                severity: Severity::Error,
                ..
            }
        ));
        assert!(handler
            .handle(&ValidationEvent::new(Severity::FatalError, "truncated"))
            .is_err());
    }
}
