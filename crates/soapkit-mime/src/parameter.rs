//! MIME parameter lists (RFC 2045 `; name=value` attribute lists).

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::encoding::{MAX_LINE_LENGTH, fold, quote};
use crate::error::{Error, Result};
use crate::tokenizer::{HeaderTokenizer, MIME_SPECIALS, Token};

/// Columns consumed by the tab that starts a continuation line.
const CONTINUATION_INDENT: usize = 8;

/// Parameters of a structured header field such as `Content-Type`.
///
/// Names are case-insensitive and stored lower-cased. Each name holds at
/// most one value; setting an existing name replaces its value. Entries
/// serialize in insertion order, while equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterList {
    list: IndexMap<String, String>,
}

impl ParameterList {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a parameter-list string such as `; charset=utf-8; format=flowed`.
    ///
    /// An empty string yields an empty list, and a trailing `;` is
    /// tolerated. Comments are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text does not follow the
    /// `*(";" name "=" value)` grammar.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokenizer = HeaderTokenizer::mime(text);
        let mut params = Self::new();

        loop {
            match tokenizer.next_token()? {
                Token::Eof => return Ok(params),
                Token::Special(';') => {}
                token => {
                    return Err(Error::parse(
                        tokenizer.position(),
                        format!("Expected ';', got {token:?}"),
                    ));
                }
            }

            let name = match tokenizer.next_token()? {
                Token::Eof => return Ok(params),
                Token::Atom(name) => name.to_lowercase(),
                token => {
                    return Err(Error::parse(
                        tokenizer.position(),
                        format!("Expected parameter name, got {token:?}"),
                    ));
                }
            };

            let token = tokenizer.next_token()?;
            if !token.is_special('=') {
                return Err(Error::parse(
                    tokenizer.position(),
                    format!("Expected '=' after {name}, got {token:?}"),
                ));
            }

            let value = match tokenizer.next_token()? {
                Token::Atom(value) => value.to_string(),
                Token::QuotedString(value) => value.into_owned(),
                token => {
                    return Err(Error::parse(
                        tokenizer.position(),
                        format!("Expected value for {name}, got {token:?}"),
                    ));
                }
            };

            params.list.insert(name, value);
        }
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the value of a parameter. Names are case-insensitive.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.list.get(&normalize(name)).map(String::as_str)
    }

    /// Sets a parameter, replacing any existing value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.list.insert(normalize(name), value.into());
    }

    /// Removes a parameter, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.list.shift_remove(&normalize(name))
    }

    /// Returns an iterator over the (lower-cased) parameter names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.list.keys().map(String::as_str)
    }

    /// Returns an iterator over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.list.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serializes the list for insertion into a header field.
    ///
    /// `used` is the number of columns already occupied on the current
    /// line. Parameters that would overflow 76 columns start a new line
    /// (CRLF and a tab); values that still overflow are folded at
    /// whitespace. An empty list yields an empty string.
    #[must_use]
    pub fn to_string_at(&self, used: usize) -> String {
        let mut out = String::new();
        let mut used = used;

        for (name, value) in &self.list {
            let value = quote_value(value);
            let name_len = name.chars().count();
            let value_len = value.chars().count();

            out.push_str("; ");
            used += 2;
            if used + name_len + value_len + 1 > MAX_LINE_LENGTH {
                out.push_str("\r\n\t");
                used = CONTINUATION_INDENT;
            }

            out.push_str(name);
            out.push('=');
            used += name_len + 1;

            if used + value_len > MAX_LINE_LENGTH {
                let folded = fold(used, &value);
                match folded.rfind('\n') {
                    Some(lf) => used = folded[lf + 1..].chars().count(),
                    None => used += folded.chars().count(),
                }
                out.push_str(&folded);
            } else {
                out.push_str(&value);
                used += value_len;
            }
        }

        out
    }
}

impl fmt::Display for ParameterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_at(0))
    }
}

impl FromStr for ParameterList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ParameterList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.set(name.as_ref(), value);
        }
        params
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn quote_value(value: &str) -> String {
    if value.is_empty() {
        "\"\"".to_string()
    } else {
        quote(value, MIME_SPECIALS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let params = ParameterList::parse("").unwrap();
        assert!(params.is_empty());
        assert_eq!(params.to_string(), "");
    }

    #[test]
    fn test_parse_simple() {
        let params = ParameterList::parse("; charset=utf-8; format=flowed").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("charset"), Some("utf-8"));
        assert_eq!(params.get("format"), Some("flowed"));
    }

    #[test]
    fn test_parse_quoted_and_comments() {
        let params =
            ParameterList::parse(";Name=\"a \\\"b\\\" c\" (comment) ; Boundary=\"--=_x\"").unwrap();
        assert_eq!(params.get("name"), Some("a \"b\" c"));
        assert_eq!(params.get("BOUNDARY"), Some("--=_x"));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["name", "boundary"]);
    }

    #[test]
    fn test_parse_last_write_wins() {
        let params = ParameterList::parse("; a=1; A=2").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("a"), Some("2"));
    }

    #[test]
    fn test_parse_trailing_semicolon() {
        let params = ParameterList::parse("; a=1;").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("a"), Some("1"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(ParameterList::parse("a").unwrap_err().is_parse_error());
        assert!(ParameterList::parse("; a").unwrap_err().is_parse_error());
        assert!(ParameterList::parse("; a=").unwrap_err().is_parse_error());
        assert!(ParameterList::parse("; =1").unwrap_err().is_parse_error());
        assert!(ParameterList::parse("; a;b").unwrap_err().is_parse_error());
        assert!(ParameterList::parse("; a=\"open").unwrap_err().is_parse_error());
        assert!(ParameterList::parse("; a=1 b=2").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_case_insensitive_access() {
        let mut params = ParameterList::new();
        params.set("Charset", "utf-8");
        assert_eq!(params.get("CHARSET"), Some("utf-8"));
        assert_eq!(params.get("  charset "), Some("utf-8"));

        params.set(" CHARSET", "us-ascii");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("charset"), Some("us-ascii"));

        assert_eq!(params.remove("ChArSeT"), Some("us-ascii".to_string()));
        assert!(params.is_empty());
        assert_eq!(params.remove("charset"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = ParameterList::new();
        original.set("a", "1");
        let mut copy = original.clone();
        copy.set("a", "2");
        copy.set("b", "3");

        assert_eq!(original.get("a"), Some("1"));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.get("a"), Some("2"));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: ParameterList = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: ParameterList = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_to_string_quoting() {
        let mut params = ParameterList::new();
        params.set("charset", "utf-8");
        params.set("name", "my file.txt");
        params.set("empty", "");
        params.set("q", "a\"b");
        assert_eq!(
            params.to_string(),
            "; charset=utf-8; name=\"my file.txt\"; empty=\"\"; q=\"a\\\"b\""
        );
    }

    #[test]
    fn test_to_string_starts_continuation_line() {
        let mut params = ParameterList::new();
        params.set("boundary", "----=_Part_0_123456789.1234567890");
        let s = params.to_string_at(50);
        assert_eq!(s, "; \r\n\tboundary=\"----=_Part_0_123456789.1234567890\"");
    }

    #[test]
    fn test_to_string_folds_long_value() {
        let mut params = ParameterList::new();
        let value = "word ".repeat(30);
        params.set("title", value.trim_end());
        let s = params.to_string_at(0);

        assert!(s.starts_with("; \r\n\ttitle=\"word"));
        for line in s.split("\r\n").skip(2) {
            assert!(line.starts_with(' '), "continuation: {line:?}");
        }
        let reparsed = ParameterList::parse(&s).unwrap();
        assert_eq!(reparsed.get("title"), Some(value.trim_end()));
    }

    #[test]
    fn test_to_string_tracks_columns_across_entries() {
        let params: ParameterList = (0..12).map(|i| (format!("p{i}"), "value")).collect();
        let s = params.to_string_at(14);

        let mut first = true;
        for line in s.split("\r\n") {
            let width = if first { 14 + line.len() } else { line.len() - 1 + 8 };
            assert!(width <= MAX_LINE_LENGTH, "line too wide: {line:?}");
            first = false;
        }
        assert_eq!(ParameterList::parse(&s).unwrap(), params);
    }

    #[test]
    fn test_from_str() {
        let params: ParameterList = "; a=b".parse().unwrap();
        assert_eq!(params.get("a"), Some("b"));
    }
}
