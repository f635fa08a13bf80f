//! Macros for defining typed name values.

/// Maximum length of a name in bytes.
pub const MAX_NAME_LENGTH: usize = 1024;

/// Macro to define a validated, string-backed name type.
///
/// This generates a newtype wrapper around `String` with:
/// - A `KIND` constant used in error messages
/// - `new()` to validate and wrap a string
/// - `as_str()` and `into_inner()` accessors
/// - `Display`, `FromStr`, `AsRef<str>` and `Borrow<str>` implementations
/// - `Serialize` and `Deserialize` implementations that validate on the way in
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_name!(SerializedDataType, "serialized data type");
///
/// let data_type = SerializedDataType::new("BookAdded")?;
/// let parsed: SerializedDataType = "BookAdded".parse()?;
/// ```
#[macro_export]
macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Human-readable kind used in error messages.
            pub const KIND: &'static str = $kind;

            /// Validates and wraps a name.
            ///
            /// The name must be non-empty, free of control characters and at most
            /// `MAX_NAME_LENGTH` bytes long.
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::IdError> {
                let value = value.into();
                if value.is_empty() {
                    return Err($crate::IdError::Empty { kind: Self::KIND });
                }
                if value.len() > $crate::MAX_NAME_LENGTH {
                    return Err($crate::IdError::TooLong {
                        kind: Self::KIND,
                        max: $crate::MAX_NAME_LENGTH,
                    });
                }
                if let Some(character) = value.chars().find(|c| c.is_control()) {
                    return Err($crate::IdError::InvalidCharacter {
                        kind: Self::KIND,
                        value,
                        character,
                    });
                }
                Ok(Self(value))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the name and returns the owned string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::IdError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}
