//! Payload classes: the concrete Rust types behind logical type names.
//!
//! Class-bound codecs must materialize a concrete type from raw bytes. A
//! [`PayloadClass`] captures everything they need about such a type without
//! knowing it statically: its [`TypeId`] for the assignability check and erased
//! converters to and from JSON and XML text.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::contract::BoxedValue;
use crate::error::BoxError;

type ToText = fn(&dyn Any) -> Result<String, BoxError>;
type FromText = fn(&str) -> Result<BoxedValue, BoxError>;
type FromJsonValue = fn(serde_json::Value) -> Result<BoxedValue, BoxError>;
type ToXml = fn(&dyn Any, &str) -> Result<String, BoxError>;

/// Descriptor of a concrete payload type.
#[derive(Clone)]
pub struct PayloadClass {
    type_id: TypeId,
    type_name: &'static str,
    xml_root: Option<String>,
    to_json: ToText,
    from_json: FromText,
    from_json_value: FromJsonValue,
    to_xml: ToXml,
    from_xml: FromText,
}

impl PayloadClass {
    /// Describes `T`.
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            xml_root: None,
            to_json: to_json::<T>,
            from_json: from_json::<T>,
            from_json_value: from_json_value::<T>,
            to_xml: to_xml::<T>,
            from_xml: from_xml::<T>,
        }
    }

    /// Sets the root element name used when writing XML.
    #[must_use]
    pub fn with_xml_root(mut self, root: impl Into<String>) -> Self {
        self.xml_root = Some(root.into());
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the class, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn xml_root(&self) -> Option<&str> {
        self.xml_root.as_deref()
    }

    /// True if `value` is an instance of this class.
    pub fn is_instance(&self, value: &dyn Any) -> bool {
        value.type_id() == self.type_id
    }

    pub fn to_json(&self, value: &dyn Any) -> Result<String, BoxError> {
        (self.to_json)(value)
    }

    pub fn from_json(&self, json: &str) -> Result<BoxedValue, BoxError> {
        (self.from_json)(json)
    }

    pub fn from_json_value(&self, value: serde_json::Value) -> Result<BoxedValue, BoxError> {
        (self.from_json_value)(value)
    }

    /// Writes `value` as an XML element named `root`.
    pub fn to_xml(&self, value: &dyn Any, root: &str) -> Result<String, BoxError> {
        (self.to_xml)(value, root)
    }

    pub fn from_xml(&self, xml: &str) -> Result<BoxedValue, BoxError> {
        (self.from_xml)(xml)
    }
}

impl fmt::Debug for PayloadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadClass")
            .field("type_name", &self.type_name)
            .field("xml_root", &self.xml_root)
            .finish()
    }
}

impl PartialEq for PayloadClass {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.xml_root == other.xml_root
    }
}

impl Eq for PayloadClass {}

fn downcast<T: 'static>(value: &dyn Any) -> Result<&T, BoxError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| format!("value is not a {}", type_name::<T>()).into())
}

fn to_json<T: Serialize + 'static>(value: &dyn Any) -> Result<String, BoxError> {
    Ok(serde_json::to_string(downcast::<T>(value)?)?)
}

fn from_json<T: DeserializeOwned + Send + Sync + 'static>(json: &str) -> Result<BoxedValue, BoxError> {
    Ok(Box::new(serde_json::from_str::<T>(json)?))
}

fn from_json_value<T: DeserializeOwned + Send + Sync + 'static>(
    value: serde_json::Value,
) -> Result<BoxedValue, BoxError> {
    Ok(Box::new(serde_json::from_value::<T>(value)?))
}

fn to_xml<T: Serialize + 'static>(value: &dyn Any, root: &str) -> Result<String, BoxError> {
    Ok(quick_xml::se::to_string_with_root(root, downcast::<T>(value)?)?)
}

fn from_xml<T: DeserializeOwned + Send + Sync + 'static>(xml: &str) -> Result<BoxedValue, BoxError> {
    Ok(Box::new(quick_xml::de::from_str::<T>(xml)?))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Book {
        #[serde(rename = "@name")]
        name: String,
    }

    #[test]
    fn test_instance_check() {
        let class = PayloadClass::of::<Book>();
        let book = Book {
            name: "Shining".to_string(),
        };
        assert!(class.is_instance(&book));
        assert!(!class.is_instance(&"Shining".to_string()));
        assert!(class.type_name().ends_with("Book"));
    }

    #[test]
    fn test_json_conversion() {
        let class = PayloadClass::of::<Book>();
        let book = Book {
            name: "Shining".to_string(),
        };
        let json = class.to_json(&book).unwrap();
        assert_eq!(json, r#"{"@name":"Shining"}"#);
        let parsed = class.from_json(&json).unwrap();
        assert_eq!(parsed.downcast_ref::<Book>(), Some(&book));
    }

    #[test]
    fn test_xml_conversion() {
        let class = PayloadClass::of::<Book>().with_xml_root("book");
        let book = Book {
            name: "Shining".to_string(),
        };
        let xml = class.to_xml(&book, "book").unwrap();
        assert_eq!(xml, r#"<book name="Shining"/>"#);
        let parsed = class.from_xml(&xml).unwrap();
        assert_eq!(parsed.downcast_ref::<Book>(), Some(&book));
    }

    #[test]
    fn test_wrong_value_reports_error() {
        let class = PayloadClass::of::<Book>();
        assert!(class.to_json(&42_u32).is_err());
    }
}
