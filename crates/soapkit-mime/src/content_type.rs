//! MIME content type handling.

use crate::error::{Error, Result};
use crate::parameter::ParameterList;
use crate::tokenizer::{HeaderTokenizer, Token};
use std::fmt;
use std::str::FromStr;

/// Width of `Content-Type: `, the prefix a rendered value is placed after.
const HEADER_PREFIX_WIDTH: usize = 14;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: ParameterList,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: ParameterList::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/xml content type.
    #[must_use]
    pub fn text_xml() -> Self {
        Self::new("text", "xml").with_parameter("charset", "utf-8")
    }

    /// Creates an application/octet-stream content type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart/related content type with boundary.
    #[must_use]
    pub fn multipart_related(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "related").with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.set(key, value);
        self
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn base_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Matches against a `type/subtype` pattern, ignoring case and
    /// parameters. A `*` subtype (or a pattern without subtype) matches
    /// any subtype.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.split(';').next().unwrap_or_default().trim();
        let (main, sub) = pattern.split_once('/').unwrap_or((pattern, "*"));
        let sub = sub.trim();
        self.main_type.eq_ignore_ascii_case(main.trim())
            && (sub == "*" || self.sub_type.eq_ignore_ascii_case(sub))
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the type or subtype is
    /// missing and [`Error::Parse`] if the parameter list is malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let mut tokenizer = HeaderTokenizer::mime(s);

        let Token::Atom(main_type) = tokenizer.next_token()? else {
            return Err(Error::InvalidContentType(format!("Missing main type: {s}")));
        };

        if !tokenizer.next_token()?.is_special('/') {
            return Err(Error::InvalidContentType(format!("Missing '/': {s}")));
        }

        let Token::Atom(sub_type) = tokenizer.next_token()? else {
            return Err(Error::InvalidContentType(format!("Missing subtype: {s}")));
        };

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());
        let rest = tokenizer.remainder();
        if !rest.trim().is_empty() {
            content_type.parameters = ParameterList::parse(rest)?;
        }

        Ok(content_type)
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base_type();
        let params = self
            .parameters
            .to_string_at(base.len() + HEADER_PREFIX_WIDTH);
        write!(f, "{base}{params}")
    }
}
