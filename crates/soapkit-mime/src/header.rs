//! MIME header handling.

use crate::error::{Error, Result};
use std::fmt;

/// A single MIME header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Header name as given (e.g., "Content-Type").
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    fn has_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Ordered collection of MIME headers.
///
/// Names are trimmed and matched case-insensitively but keep the spelling
/// they were added with. A name may carry several values, kept in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderSet {
    headers: Vec<Header>,
}

impl HeaderSet {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value after any existing values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is empty.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = validate_name(name.into())?;
        self.headers.push(Header {
            name,
            value: value.into(),
        });
        Ok(())
    }

    /// Sets a header value.
    ///
    /// The first header with this name takes the new value and any later
    /// ones are dropped. If there is none, the header is appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is empty.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = validate_name(name.into())?;
        let value = value.into();

        match self.headers.iter().position(|h| h.has_name(&name)) {
            Some(first) => {
                self.headers[first].value = value;
                let mut index = 0;
                self.headers.retain(|h| {
                    let keep = index <= first || !h.has_name(&name);
                    index += 1;
                    keep
                });
            }
            None => self.headers.push(Header { name, value }),
        }
        Ok(())
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.has_name(name))
            .map(|h| h.value.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.has_name(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Returns true if a header with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.has_name(name))
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|h| !h.has_name(name));
    }

    /// Keeps only the headers for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Header) -> bool) {
        self.headers.retain(keep);
    }

    /// Removes every header.
    pub fn clear(&mut self) {
        self.headers.clear();
    }

    /// Returns the number of header entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Returns the headers whose name is one of `names`.
    pub fn matching<'a>(&'a self, names: &'a [&str]) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers
            .iter()
            .filter(move |h| names.iter().any(|n| h.has_name(n)))
    }

    /// Returns the headers whose name is none of `names`.
    pub fn non_matching<'a>(&'a self, names: &'a [&str]) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers
            .iter()
            .filter(move |h| !names.iter().any(|n| h.has_name(n)))
    }

    /// Returns true if every header in `other` is present here with a value
    /// that matches ignoring ASCII case.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other.headers.iter().all(|wanted| {
            self.headers
                .iter()
                .any(|h| h.has_name(&wanted.name) && h.value.eq_ignore_ascii_case(&wanted.value))
        })
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    /// Continuation: line
    ///   folded onto the next line
    /// ```
    ///
    /// Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if a header line has no `:` or an empty name.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            // Continuation lines start with space or tab
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value.trim().to_string())?;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::InvalidHeader(format!("Missing ':' in {line:?}")))?;
            current = Some((name.trim().to_string(), value.trim().to_string()));
        }

        if let Some((name, value)) = current {
            headers.add(name, value.trim().to_string())?;
        }

        Ok(headers)
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

impl fmt::Display for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.headers {
            write!(f, "{}: {}\r\n", header.name, header.value)?;
        }
        Ok(())
    }
}

/// Trims surrounding whitespace; names are stored and compared trimmed.
fn validate_name(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(Error::InvalidHeader("Header name must not be empty".to_string()))
    } else if trimmed.len() == name.len() {
        Ok(name)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn names<'a>(headers: impl Iterator<Item = &'a Header>) -> Vec<&'a str> {
        headers.map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_headers_new() {
        let headers = HeaderSet::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "text/plain").unwrap();
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.iter().next().unwrap().name, "Content-Type");
    }

    #[test]
    fn test_headers_multiple_values_in_order() {
        let mut headers = HeaderSet::new();
        headers.add("X-Trace", "one").unwrap();
        headers.add("Content-Id", "<a>").unwrap();
        headers.add("x-trace", "two").unwrap();
        assert_eq!(headers.get_all("X-TRACE"), vec!["one", "two"]);
        assert_eq!(headers.get("x-trace"), Some("one"));
    }

    #[test]
    fn test_headers_set_replaces_first_and_drops_rest() {
        let mut headers = HeaderSet::new();
        headers.add("To", "alice").unwrap();
        headers.add("Subject", "hi").unwrap();
        headers.add("to", "bob").unwrap();

        headers.set("TO", "charlie").unwrap();
        assert_eq!(headers.get_all("To"), vec!["charlie"]);
        assert_eq!(names(headers.iter()), vec!["To", "Subject"]);

        headers.set("Content-Id", "<x>").unwrap();
        assert_eq!(names(headers.iter()), vec!["To", "Subject", "Content-Id"]);
    }

    #[test]
    fn test_headers_reject_empty_name() {
        let mut headers = HeaderSet::new();
        assert!(matches!(headers.add("", "v"), Err(Error::InvalidHeader(_))));
        assert!(matches!(headers.set("  ", "v"), Err(Error::InvalidHeader(_))));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_names_are_trimmed() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "text/plain").unwrap();
        headers.set(" content-type\t", "image/png").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get(" CONTENT-TYPE "), Some("image/png"));

        headers.add("  X-Note ", "a").unwrap();
        assert_eq!(names(headers.iter()), vec!["Content-Type", "X-Note"]);
        headers.remove("x-note  ");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_retain() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "text/plain").unwrap();
        headers.add("Content-Id", "<a>").unwrap();
        headers.add("X-Note", "b").unwrap();

        headers.retain(|h| h.name.starts_with("Content-"));
        assert_eq!(names(headers.iter()), vec!["Content-Type", "Content-Id"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = HeaderSet::new();
        headers.add("Subject", "Test").unwrap();
        headers.add("subject", "Again").unwrap();
        assert!(headers.contains("Subject"));

        headers.remove("SUBJECT");
        assert!(headers.get("Subject").is_none());
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn test_headers_matching() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "text/xml").unwrap();
        headers.add("Content-Id", "<root>").unwrap();
        headers.add("X-Custom", "1").unwrap();

        let wanted = ["content-id", "x-custom"];
        assert_eq!(names(headers.matching(&wanted)), vec!["Content-Id", "X-Custom"]);
        assert_eq!(names(headers.non_matching(&wanted)), vec!["Content-Type"]);
    }

    #[test]
    fn test_headers_contains_all() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "Text/XML").unwrap();
        headers.add("Content-Id", "<root>").unwrap();

        let mut subset = HeaderSet::new();
        subset.add("content-type", "text/xml").unwrap();
        assert!(headers.contains_all(&subset));
        assert!(headers.contains_all(&HeaderSet::new()));

        subset.add("Content-Id", "<other>").unwrap();
        assert!(!headers.contains_all(&subset));
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "Content-Id: <part1>\r\n",
            "Content-Transfer-Encoding: binary\r\n",
            "\r\n",
            "body: ignored\r\n"
        );

        let headers = HeaderSet::parse(text).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(headers.get("content-id"), Some("<part1>"));
        assert!(headers.get("body").is_none());
    }

    #[test]
    fn test_headers_parse_rejects_garbage() {
        assert!(HeaderSet::parse("no colon here\r\n").is_err());
    }

    #[test]
    fn test_headers_display() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "text/xml").unwrap();
        headers.add("Content-Id", "<root>").unwrap();

        assert_eq!(
            headers.to_string(),
            "Content-Type: text/xml\r\nContent-Id: <root>\r\n"
        );
    }
}
