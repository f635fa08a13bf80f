//! Versioned, encoded Internet media types.
//!
//! A [`MimeType`] is `primary/sub` plus two reserved parameters, `version` and
//! `encoding`, and any number of extra parameters:
//!
//! ```text
//! application/json; version=1; encoding=utf-8
//! ```
//!
//! Equality is structural: parameter order in the source string is irrelevant.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::charset::Charset;
use crate::error::{CharsetError, MimeTypeError};

/// Reserved parameter carrying the payload schema version.
pub const VERSION_PARAM: &str = "version";

/// Reserved parameter carrying the payload charset.
pub const ENCODING_PARAM: &str = "encoding";

const TSPECIALS: &[char] = &['(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '='];

/// An Internet media type with dedicated `version` and `encoding` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType {
    primary: String,
    sub: String,
    version: Option<String>,
    encoding: Option<String>,
    parameters: BTreeMap<String, String>,
}

impl MimeType {
    /// Base type of JSON payloads.
    pub const APPLICATION_JSON: &'static str = "application/json";
    /// Base type of XML payloads.
    pub const APPLICATION_XML: &'static str = "application/xml";
    /// Legacy base type of XML payloads.
    pub const TEXT_XML: &'static str = "text/xml";
    /// Base type of plain text payloads.
    pub const TEXT_PLAIN: &'static str = "text/plain";
    /// Base type of opaque binary payloads.
    pub const APPLICATION_OCTET_STREAM: &'static str = "application/octet-stream";

    /// Creates a mime type without parameters.
    pub fn new(primary: &str, sub: &str) -> Result<Self, MimeTypeError> {
        Self::with_parameters(primary, sub, None, None, std::iter::empty::<(&str, &str)>())
    }

    /// Creates a mime type from its parts.
    ///
    /// `version` and `encoding` can only be set through their dedicated arguments;
    /// passing either in `parameters` is rejected.
    pub fn with_parameters<I, K, V>(
        primary: &str,
        sub: &str,
        version: Option<&str>,
        encoding: Option<&str>,
        parameters: I,
    ) -> Result<Self, MimeTypeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let primary = validate_token("type", primary.trim())?.to_ascii_lowercase();
        let sub = validate_token("subtype", sub.trim())?.to_ascii_lowercase();

        let mut params = BTreeMap::new();
        for (key, value) in parameters {
            let key = validate_token("parameter name", key.as_ref().trim())?.to_ascii_lowercase();
            if key == VERSION_PARAM || key == ENCODING_PARAM {
                return Err(MimeTypeError::ReservedParameter(key));
            }
            if params.insert(key.clone(), value.into()).is_some() {
                return Err(MimeTypeError::DuplicateParameter(key));
            }
        }

        Ok(Self {
            primary,
            sub,
            version: version.map(str::to_string),
            encoding: encoding.map(str::to_string),
            parameters: params,
        })
    }

    /// Parses a full mime type string.
    pub fn parse(s: &str) -> Result<Self, MimeTypeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MimeTypeError::Empty);
        }

        let segments = split_segments(s)?;
        let (base, rest) = segments
            .split_first()
            .ok_or(MimeTypeError::Empty)?;
        let Some((primary, sub)) = base.split_once('/') else {
            return Err(MimeTypeError::MissingSubtype(base.trim().to_string()));
        };

        let mut version = None;
        let mut encoding = None;
        let mut parameters = Vec::new();
        for segment in rest {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once('=') else {
                return Err(MimeTypeError::MalformedParameter(segment.to_string()));
            };
            let key = key.trim().to_ascii_lowercase();
            let value = unquote(value.trim(), segment)?;
            let slot = if key == VERSION_PARAM {
                &mut version
            } else if key == ENCODING_PARAM {
                &mut encoding
            } else {
                parameters.push((key, value));
                continue;
            };
            if slot.replace(value).is_some() {
                return Err(MimeTypeError::DuplicateParameter(key));
            }
        }

        Self::with_parameters(
            primary,
            sub,
            version.as_deref(),
            encoding.as_deref(),
            parameters,
        )
    }

    /// `application/json` with the given charset.
    pub fn json(charset: Charset) -> Self {
        Self::well_known("application", "json", Some(charset))
    }

    /// `application/xml` with the given charset.
    pub fn xml(charset: Charset) -> Self {
        Self::well_known("application", "xml", Some(charset))
    }

    /// `text/plain` with the given charset.
    pub fn text(charset: Charset) -> Self {
        Self::well_known("text", "plain", Some(charset))
    }

    /// `application/octet-stream`.
    pub fn octet_stream() -> Self {
        Self::well_known("application", "octet-stream", None)
    }

    fn well_known(primary: &str, sub: &str, charset: Option<Charset>) -> Self {
        Self {
            primary: primary.to_string(),
            sub: sub.to_string(),
            version: None,
            encoding: charset.map(|c| c.name().to_string()),
            parameters: BTreeMap::new(),
        }
    }

    /// Returns a copy with the given version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns a copy with the given encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn primary_type(&self) -> &str {
        &self.primary
    }

    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    /// `primary/sub` without any parameters.
    pub fn base_type(&self) -> String {
        format!("{}/{}", self.primary, self.sub)
    }

    /// The `version` parameter, if present.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The `encoding` parameter, if present.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// An extra (non-reserved) parameter by case-insensitive name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Extra parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolves the `encoding` parameter to a supported charset.
    pub fn charset(&self) -> Result<Option<Charset>, CharsetError> {
        self.encoding.as_deref().map(Charset::from_name).transpose()
    }

    pub fn is_json(&self) -> bool {
        self.primary == "application" && self.sub == "json"
    }

    pub fn is_xml(&self) -> bool {
        (self.primary == "application" || self.primary == "text") && self.sub == "xml"
    }

    /// True for `text/*` types other than XML.
    pub fn is_text(&self) -> bool {
        self.primary == "text" && !self.is_xml()
    }

    /// Compares base type and encoding only, ignoring version and extra parameters.
    pub fn match_encoding(&self, other: &MimeType) -> bool {
        let same_encoding = match (&self.encoding, &other.encoding) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        self.primary == other.primary && self.sub == other.sub && same_encoding
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary, self.sub)?;
        if let Some(version) = &self.version {
            write!(f, "; {}={}", VERSION_PARAM, quote(version))?;
        }
        if let Some(encoding) = &self.encoding {
            write!(f, "; {}={}", ENCODING_PARAM, quote(encoding))?;
        }
        for (key, value) in &self.parameters {
            write!(f, "; {}={}", key, quote(value))?;
        }
        Ok(())
    }
}

impl FromStr for MimeType {
    type Err = MimeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for MimeType {
    type Error = MimeTypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl serde::Serialize for MimeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for MimeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_graphic() && !TSPECIALS.contains(&c))
}

fn validate_token<'a>(part: &'static str, value: &'a str) -> Result<&'a str, MimeTypeError> {
    if is_token(value) {
        Ok(value)
    } else {
        Err(MimeTypeError::InvalidToken {
            part,
            value: value.to_string(),
        })
    }
}

/// Splits on `;` outside of quoted strings.
fn split_segments(s: &str) -> Result<Vec<&str>, MimeTypeError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(MimeTypeError::UnterminatedQuote(s.to_string()));
    }
    segments.push(&s[start..]);
    Ok(segments)
}

fn unquote(value: &str, segment: &str) -> Result<String, MimeTypeError> {
    let Some(inner) = value.strip_prefix('"') else {
        return validate_token("parameter value", value)
            .map(str::to_string)
            .map_err(|_| MimeTypeError::MalformedParameter(segment.to_string()));
    };
    let Some(inner) = inner.strip_suffix('"') else {
        return Err(MimeTypeError::UnterminatedQuote(segment.to_string()));
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn quote(value: &str) -> String {
    if is_token(value) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_parse_full() {
        let mime = MimeType::parse("application/json; version=1; encoding=utf-8").unwrap();
        assert_eq!(mime.primary_type(), "application");
        assert_eq!(mime.sub_type(), "json");
        assert_eq!(mime.version(), Some("1"));
        assert_eq!(mime.encoding(), Some("utf-8"));
        assert!(mime.is_json());
        assert!(!mime.is_xml());
    }

    #[test]
    fn test_parameter_order_irrelevant() {
        let a = MimeType::parse("application/json; version=1; encoding=utf-8").unwrap();
        let b = MimeType::parse("application/json; encoding=utf-8; version=1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_version_and_encoding_break_equality() {
        let base = MimeType::parse("application/json; version=1; encoding=utf-8").unwrap();
        let other_version = MimeType::parse("application/json; version=2; encoding=utf-8").unwrap();
        let other_encoding =
            MimeType::parse("application/json; version=1; encoding=iso-8859-1").unwrap();
        assert_ne!(base, other_version);
        assert_ne!(base, other_encoding);
    }

    #[test]
    fn test_missing_reserved_parameters_are_none() {
        let mime = MimeType::parse("text/plain").unwrap();
        assert_eq!(mime.version(), None);
        assert_eq!(mime.encoding(), None);
        assert_eq!(mime.charset().unwrap(), None);
    }

    #[test]
    fn test_display_canonical_form() {
        let mime = MimeType::parse("Application/JSON;encoding=UTF-8;x-schema=book;version=2").unwrap();
        assert_eq!(
            mime.to_string(),
            "application/json; version=2; encoding=UTF-8; x-schema=book"
        );
    }

    #[test]
    fn test_quoted_parameter_roundtrip() {
        let mime = MimeType::parse(r#"text/plain; title="a; b \"c\"""#).unwrap();
        assert_eq!(mime.parameter("title"), Some(r#"a; b "c""#));
        let reparsed = MimeType::parse(&mime.to_string()).unwrap();
        assert_eq!(mime, reparsed);
    }

    #[test]
    fn test_reserved_parameters_rejected_in_map() {
        let result = MimeType::with_parameters(
            "application",
            "json",
            None,
            None,
            [("Version", "1")],
        );
        assert_eq!(
            result.unwrap_err(),
            MimeTypeError::ReservedParameter("version".to_string())
        );
        let result =
            MimeType::with_parameters("application", "json", None, None, [("encoding", "utf-8")]);
        assert!(matches!(result, Err(MimeTypeError::ReservedParameter(_))));
    }

    #[test]
    fn test_with_parameters_sets_reserved_through_arguments() {
        let mime = MimeType::with_parameters(
            "application",
            "xml",
            Some("3"),
            Some("UTF-8"),
            [("schema", "book")],
        )
        .unwrap();
        assert_eq!(
            mime,
            MimeType::parse("application/xml; schema=book; encoding=UTF-8; version=3").unwrap()
        );
    }

    #[rstest]
    #[case("", MimeTypeError::Empty)]
    #[case("application", MimeTypeError::MissingSubtype("application".to_string()))]
    #[case("application/json; version", MimeTypeError::MalformedParameter("version".to_string()))]
    #[case("application/json; version=1; version=2", MimeTypeError::DuplicateParameter("version".to_string()))]
    #[case(r#"text/plain; title="open"#, MimeTypeError::UnterminatedQuote(r#"text/plain; title="open"#.to_string()))]
    fn test_parse_errors(#[case] input: &str, #[case] expected: MimeTypeError) {
        assert_eq!(MimeType::parse(input).unwrap_err(), expected);
    }

    #[rstest]
    #[case("appli cation/json")]
    #[case("appli@cation/json")]
    #[case("application/")]
    fn test_invalid_tokens(#[case] input: &str) {
        assert!(matches!(
            MimeType::parse(input),
            Err(MimeTypeError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_match_encoding_ignores_version_and_extras() {
        let a = MimeType::parse("application/json; version=1; encoding=UTF-8; x=1").unwrap();
        let b = MimeType::parse("application/json; version=7; encoding=utf-8").unwrap();
        let c = MimeType::parse("application/json; encoding=ISO-8859-1").unwrap();
        let d = MimeType::parse("application/xml; encoding=UTF-8").unwrap();
        assert!(a.match_encoding(&b));
        assert!(!a.match_encoding(&c));
        assert!(!a.match_encoding(&d));
    }

    #[test]
    fn test_classification() {
        assert!(MimeType::xml(Charset::Utf8).is_xml());
        assert!(MimeType::parse("text/xml").unwrap().is_xml());
        assert!(!MimeType::parse("text/xml").unwrap().is_text());
        assert!(MimeType::text(Charset::Utf8).is_text());
        assert!(!MimeType::octet_stream().is_json());
    }

    #[test]
    fn test_well_known_constructors() {
        assert_eq!(
            MimeType::json(Charset::Utf8).to_string(),
            "application/json; encoding=UTF-8"
        );
        assert_eq!(MimeType::octet_stream().base_type(), MimeType::APPLICATION_OCTET_STREAM);
        assert_eq!(
            MimeType::text(Charset::UsAscii).charset().unwrap(),
            Some(Charset::UsAscii)
        );
    }

    #[test]
    fn test_serde_as_string() {
        let mime = MimeType::parse("application/json; encoding=utf-8").unwrap();
        let json = serde_json::to_string(&mime).unwrap();
        assert_eq!(json, "\"application/json; encoding=utf-8\"");
        let parsed: MimeType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mime);
        assert!(serde_json::from_str::<MimeType>("\"nonsense\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_parameter_permutation_equal(
            params in proptest::collection::btree_map("[a-z]{1,8}", "[A-Za-z0-9.-]{1,8}", 0..5),
            version in proptest::option::of("[0-9]{1,3}"),
            encoding in proptest::option::of("(UTF-8|US-ASCII)"),
        ) {
            let mut parts: Vec<String> = params
                .iter()
                .filter(|(k, _)| k.as_str() != VERSION_PARAM && k.as_str() != ENCODING_PARAM)
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            if let Some(v) = &version {
                parts.push(format!("version={v}"));
            }
            if let Some(e) = &encoding {
                parts.push(format!("encoding={e}"));
            }
            let forward = format!("application/json; {}", parts.join("; "));
            parts.reverse();
            let backward = format!("application/json; {}", parts.join("; "));

            let a = MimeType::parse(&forward).unwrap();
            let b = MimeType::parse(&backward).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(MimeType::parse(&a.to_string()).unwrap(), a);
        }
    }
}
