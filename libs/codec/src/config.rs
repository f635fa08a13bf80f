//! Registry configuration.
//!
//! A [`SerializationConfig`] is an explicit registration table: which codec
//! reads and writes each logical type. It is loaded from TOML or the
//! environment and turned into a combined registry at startup.
//!
//! ```toml
//! encoding = "UTF-8"
//! xml_fragment = false
//!
//! [[types]]
//! name = "BookAdded"
//! codec = "typed-json"
//!
//! [[types]]
//! name = "BookAdded"
//! codec = "xml"
//! default = false
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use esc_id::SerializedDataType;
use serde::Deserialize;
use tracing::debug;

use crate::charset::Charset;
use crate::codecs::{BinaryCodec, JsonCodec, TextCodec, TypedJsonCodec, XmlCodec};
use crate::contract::{Deserializer, Serializer};
use crate::error::ConfigError;
use crate::registry::{
    SerDeserializerRegistryBuilder, SerializedDataTypeRegistry, SimpleSerDeserializerRegistry,
};

/// Environment variable naming a TOML config file.
pub const CONFIG_PATH_ENV: &str = "ESC_SERIALIZATION_CONFIG";
/// Environment variable overriding the default charset.
pub const ENCODING_ENV: &str = "ESC_ENCODING";
/// Environment variable overriding the XML fragment flag.
pub const XML_FRAGMENT_ENV: &str = "ESC_XML_FRAGMENT";

/// Codec selected for a type binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    Json,
    Text,
    Binary,
    TypedJson,
    Xml,
}

impl CodecKind {
    /// Base mime type the codec writes. Two bindings of one type must differ here.
    pub fn base_type(&self) -> &'static str {
        match self {
            CodecKind::Json | CodecKind::TypedJson => "application/json",
            CodecKind::Text => "text/plain",
            CodecKind::Binary => "application/octet-stream",
            CodecKind::Xml => "application/xml",
        }
    }
}

/// Binds a logical type to a codec.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeBinding {
    /// Logical type name.
    pub name: String,

    pub codec: CodecKind,

    /// Whether this binding serializes the type and answers lookups without a
    /// mime type. The only binding of a type is its default.
    #[serde(default)]
    pub default: bool,
}

/// Serialization settings and type bindings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializationConfig {
    /// Charset of the text-based codecs.
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Write XML without a declaration.
    #[serde(default)]
    pub xml_fragment: bool,

    #[serde(default)]
    pub types: Vec<TypeBinding>,
}

fn default_encoding() -> String {
    Charset::Utf8.name().to_string()
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            xml_fragment: false,
            types: Vec::new(),
        }
    }
}

impl SerializationConfig {
    /// Parses and validates a TOML config.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load configuration from environment variables.
    ///
    /// Bindings come from the file named by `ESC_SERIALIZATION_CONFIG`, if set;
    /// `ESC_ENCODING` and `ESC_XML_FRAGMENT` override the file's settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(encoding) = lookup(ENCODING_ENV) {
            Charset::from_name(&encoding)?;
            config.encoding = encoding;
        }

        if let Some(value) = lookup(XML_FRAGMENT_ENV) {
            config.xml_fragment = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        key: XML_FRAGMENT_ENV,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    /// The configured charset.
    pub fn charset(&self) -> Result<Charset, ConfigError> {
        Ok(Charset::from_name(&self.encoding)?)
    }

    /// Checks the charset and the bindings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.charset()?;
        self.resolve_defaults().map(|_| ())
    }

    /// Builds a combined registry from the bindings.
    ///
    /// `data_types` backs the class-bound codecs.
    pub fn build_registry(
        &self,
        data_types: Arc<dyn SerializedDataTypeRegistry>,
    ) -> Result<SimpleSerDeserializerRegistry, ConfigError> {
        let charset = self.charset()?;
        let defaults = self.resolve_defaults()?;
        let mut builder = SimpleSerDeserializerRegistry::builder();

        for (index, binding) in self.types.iter().enumerate() {
            let data_type = SerializedDataType::new(binding.name.as_str())?;
            let is_default = defaults.get(binding.name.as_str()) == Some(&index);
            match binding.codec {
                CodecKind::Json => register(
                    &mut builder,
                    data_type,
                    Arc::new(JsonCodec::with_charset(charset)),
                    is_default,
                ),
                CodecKind::Text => register(
                    &mut builder,
                    data_type,
                    Arc::new(TextCodec::with_charset(charset)),
                    is_default,
                ),
                CodecKind::Binary => {
                    register(&mut builder, data_type, Arc::new(BinaryCodec::new()), is_default)
                }
                CodecKind::TypedJson => register(
                    &mut builder,
                    data_type,
                    Arc::new(TypedJsonCodec::with_charset(data_types.clone(), charset)),
                    is_default,
                ),
                CodecKind::Xml => register(
                    &mut builder,
                    data_type,
                    Arc::new(
                        XmlCodec::new(data_types.clone())
                            .with_charset(charset)
                            .fragment(self.xml_fragment),
                    ),
                    is_default,
                ),
            }
        }

        debug!(
            bindings = self.types.len(),
            encoding = %charset,
            xml_fragment = self.xml_fragment,
            "registry configured"
        );
        Ok(builder.build())
    }

    /// Index of the default binding of every bound type.
    fn resolve_defaults(&self) -> Result<HashMap<&str, usize>, ConfigError> {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, binding) in self.types.iter().enumerate() {
            SerializedDataType::new(binding.name.as_str())?;
            let bindings = by_name.entry(binding.name.as_str()).or_default();
            let base_type = binding.codec.base_type();
            if bindings
                .iter()
                .any(|&other| self.types[other].codec.base_type() == base_type)
            {
                return Err(ConfigError::DuplicateBinding {
                    name: binding.name.clone(),
                    base_type,
                });
            }
            bindings.push(index);
        }

        let mut defaults = HashMap::with_capacity(by_name.len());
        for (name, indices) in by_name {
            let marked: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&index| self.types[index].default)
                .collect();
            let default = match (marked.as_slice(), indices.as_slice()) {
                ([index], _) | ([], [index]) => *index,
                ([], _) => {
                    return Err(ConfigError::MissingDefault {
                        name: name.to_string(),
                    })
                }
                _ => {
                    return Err(ConfigError::ConflictingDefaults {
                        name: name.to_string(),
                    })
                }
            };
            defaults.insert(name, default);
        }
        Ok(defaults)
    }
}

fn register<C>(
    builder: &mut SerDeserializerRegistryBuilder,
    data_type: SerializedDataType,
    codec: Arc<C>,
    is_default: bool,
) where
    C: Serializer + Deserializer + 'static,
{
    if is_default {
        builder.add_default(data_type, codec);
    } else {
        let mime_type = codec.mime_type().clone();
        builder.add_deserializer(data_type, mime_type, codec);
    }
}
