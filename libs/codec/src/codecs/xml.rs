use std::any::Any;
use std::fmt;
use std::sync::Arc;

use esc_id::SerializedDataType;
use tracing::trace;

use super::charset_of;
use crate::charset::Charset;
use crate::contract::{BoxedValue, Deserializer, Input, Serializer};
use crate::error::{BoxError, SerializationError};
use crate::mime::MimeType;
use crate::registry::SerializedDataTypeRegistry;
use crate::xml::{
    parse_document, write_document, EscalatingHandler, Severity, ValidationEvent,
    ValidationHandler, XmlNode, XmlValidator,
};

const CODEC: &str = "xml";

/// Rewrites the element tree of a bound payload.
///
/// `marshal` runs on the tree written from a value, in registration order;
/// `unmarshal` runs on the parsed tree before binding, in reverse order.
pub trait XmlAdapter: Send + Sync + fmt::Debug {
    fn marshal(&self, node: XmlNode) -> Result<XmlNode, BoxError>;

    fn unmarshal(&self, node: XmlNode) -> Result<XmlNode, BoxError>;
}

/// XML codec bound to the classes of a [`SerializedDataTypeRegistry`].
///
/// Values are written through their [`PayloadClass`](crate::PayloadClass) under
/// the class's root element name, or the type name if the class has none. An
/// [`XmlNode`] is the codec's native structure and is written as-is.
///
/// Every call builds its own reader or writer, so a codec can be shared between
/// threads.
#[derive(Debug, Clone)]
pub struct XmlCodec {
    registry: Arc<dyn SerializedDataTypeRegistry>,
    mime_type: MimeType,
    charset: Charset,
    fragment: bool,
    adapters: Vec<Arc<dyn XmlAdapter>>,
    validator: Option<Arc<dyn XmlValidator>>,
    handler: Arc<dyn ValidationHandler>,
}

impl XmlCodec {
    /// `application/xml` in UTF-8, writing full documents.
    pub fn new(registry: Arc<dyn SerializedDataTypeRegistry>) -> Self {
        Self {
            registry,
            mime_type: MimeType::xml(Charset::Utf8),
            charset: Charset::Utf8,
            fragment: false,
            adapters: Vec::new(),
            validator: None,
            handler: Arc::new(EscalatingHandler),
        }
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.mime_type = MimeType::xml(charset);
        self.charset = charset;
        self
    }

    /// Reports another XML mime type, e.g. `text/xml`.
    pub fn with_mime_type(mut self, mime_type: MimeType) -> Result<Self, SerializationError> {
        if !mime_type.is_xml() {
            return Err(SerializationError::UnsupportedMimeType {
                codec: CODEC,
                mime_type,
            });
        }
        self.charset = mime_type.charset()?.unwrap_or(self.charset);
        self.mime_type = mime_type;
        Ok(self)
    }

    /// Omits the XML declaration when writing.
    #[must_use]
    pub fn fragment(mut self, fragment: bool) -> Self {
        self.fragment = fragment;
        self
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn XmlAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn XmlValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ValidationHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    fn report(&self, root: &XmlNode, mut events: Vec<ValidationEvent>) -> Result<(), SerializationError> {
        if let Some(validator) = &self.validator {
            validator.validate(root, &mut events);
        }
        events.iter().try_for_each(|event| self.handler.handle(event))
    }

    fn to_tree(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<XmlNode, SerializationError> {
        if let Some(node) = value.downcast_ref::<XmlNode>() {
            return Ok(node.clone());
        }

        let class = self.registry.find_class(data_type)?;
        if !class.is_instance(value) {
            return Err(SerializationError::NotAssignable {
                data_type: data_type.clone(),
                class: class.type_name(),
            });
        }
        let root = class.xml_root().unwrap_or(data_type.as_str());
        let xml = class
            .to_xml(value, root)
            .map_err(|e| SerializationError::codec(CODEC, e))?;
        XmlNode::parse(&xml).map_err(|e| SerializationError::codec(CODEC, e))
    }
}

impl Serializer for XmlCodec {
    fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    fn marshal(
        &self,
        value: &dyn Any,
        data_type: &SerializedDataType,
    ) -> Result<Vec<u8>, SerializationError> {
        let mut tree = self.to_tree(value, data_type)?;
        for adapter in &self.adapters {
            tree = adapter
                .marshal(tree)
                .map_err(|e| SerializationError::codec(CODEC, e))?;
        }
        self.report(&tree, Vec::new())?;

        let encoding = (!self.fragment).then(|| self.charset.name());
        let text = write_document(&tree, encoding)?;
        let bytes = self.charset.encode(&text)?;
        trace!(%data_type, root = tree.name(), len = bytes.len(), "marshalled XML");
        Ok(bytes)
    }
}

impl Deserializer for XmlCodec {
    fn unmarshal(
        &self,
        input: Input<'_>,
        data_type: &SerializedDataType,
        mime_type: &MimeType,
    ) -> Result<BoxedValue, SerializationError> {
        let bytes = match input {
            Input::Native(value) if value.is::<XmlNode>() => return Ok(value),
            Input::Native(value) => {
                let class = self.registry.find_class(data_type)?;
                if class.is_instance(&*value) {
                    return Ok(value);
                }
                return Err(SerializationError::TypeMismatch {
                    codec: CODEC,
                    expected: "an XML node or an instance of the registered class",
                });
            }
            Input::Bytes(bytes) => bytes,
        };
        if !mime_type.is_xml() {
            return Err(SerializationError::UnsupportedMimeType {
                codec: CODEC,
                mime_type: mime_type.clone(),
            });
        }

        let charset = charset_of(mime_type, self.charset)?;
        let document = parse_document(&charset.decode(bytes)?)?;
        let mut events = Vec::new();
        if let Some(declared) = &document.declared_encoding {
            if Charset::from_name(declared).ok() != Some(charset) {
                events.push(ValidationEvent::new(
                    Severity::Error,
                    format!("declared encoding '{declared}' does not match {charset}"),
                ));
            }
        }
        self.report(&document.root, events)?;

        let mut tree = document.root;
        for adapter in self.adapters.iter().rev() {
            tree = adapter
                .unmarshal(tree)
                .map_err(|e| SerializationError::codec(CODEC, e))?;
        }

        let class = self.registry.find_class(data_type)?;
        let xml = write_document(&tree, None)?;
        let value = class
            .from_xml(&xml)
            .map_err(|e| SerializationError::codec(CODEC, e))?;
        trace!(%data_type, %mime_type, len = bytes.len(), "unmarshalled XML");
        Ok(value)
    }
}
