//! XML tree, reading, writing and validation.

mod node;
mod validation;

pub use node::{is_valid_name, parse_document, write_document, XmlContent, XmlDocument, XmlError, XmlNode};
pub use validation::{EscalatingHandler, Severity, ValidationEvent, ValidationHandler, XmlValidator};
