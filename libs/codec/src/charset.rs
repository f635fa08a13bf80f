//! Character sets used by the text-based codecs.

use std::fmt;
use std::str::FromStr;

use crate::error::CharsetError;

/// A character set named by the `encoding` mime type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Iso8859_1,
}

impl Charset {
    /// Canonical IANA name of the charset.
    pub const fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Looks up a charset by name or common alias, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, CharsetError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "us-ascii" | "ascii" => Ok(Charset::UsAscii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Iso8859_1),
            _ => Err(CharsetError::Unsupported(name.to_string())),
        }
    }

    /// Encodes text into bytes.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, CharsetError> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::UsAscii => self.encode_narrow(text, 0x7F),
            Charset::Iso8859_1 => self.encode_narrow(text, 0xFF),
        }
    }

    /// Decodes bytes into text.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, CharsetError> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                CharsetError::InvalidInput {
                    charset: self.name(),
                    position: e.utf8_error().valid_up_to(),
                }
            }),
            Charset::UsAscii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(position) => Err(CharsetError::InvalidInput {
                    charset: self.name(),
                    position,
                }),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            // Every byte maps to the code point of the same value.
            Charset::Iso8859_1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn encode_narrow(&self, text: &str, max: u32) -> Result<Vec<u8>, CharsetError> {
        text.chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .ok()
                    .filter(|b| u32::from(*b) <= max)
                    .ok_or(CharsetError::Unmappable {
                        charset: self.name(),
                        character: c,
                    })
            })
            .collect()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = CharsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
