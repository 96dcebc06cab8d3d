//! Content converters keyed by MIME type.
//!
//! A converter turns raw attachment bytes into typed [`Content`] and back.
//! The [`ConverterRegistry`] picks a converter for a content type, trying
//! an exact `type/subtype` registration first, then `type/*`, then the
//! binary fallback.

use std::fmt;
use std::rc::Rc;

use bytes::Bytes;
use encoding_rs::{Encoding, REPLACEMENT, UTF_8, UTF_16BE, UTF_16LE};
use soapkit_mime::ContentType;

use crate::content::Content;
use crate::error::{Error, Result};

/// Converts between raw bytes and typed content for some content types.
pub trait ContentConverter: fmt::Debug {
    /// Turns raw bytes into typed content.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be interpreted as `content_type`.
    fn decode(&self, data: Bytes, content_type: &ContentType) -> Result<Content>;

    /// Turns typed content into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be represented as
    /// `content_type`.
    fn encode(&self, content: &Content, content_type: &ContentType) -> Result<Bytes>;
}

/// Character data in any charset known to `encoding_rs`.
///
/// A missing charset parameter is treated as `utf-8`. Bytes or characters
/// the charset cannot represent are errors, not replacements.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl ContentConverter for TextConverter {
    fn decode(&self, data: Bytes, content_type: &ContentType) -> Result<Content> {
        let charset = Charset::of(content_type)?;
        if charset.ascii_only && !data.is_ascii() {
            return Err(Error::content("Non-ASCII byte in us-ascii text"));
        }

        // A byte order mark only picks between the UTF-16 variants
        let encoding = match Encoding::for_bom(&data) {
            Some((bom, _)) if is_utf16(charset.encoding) && is_utf16(bom) => bom,
            _ => charset.encoding,
        };
        let (text, had_errors) = encoding.decode_with_bom_removal(&data);
        if had_errors {
            return Err(Error::content(format!("Invalid {} text", encoding.name())));
        }
        Ok(Content::Text(text.into_owned()))
    }

    fn encode(&self, content: &Content, content_type: &ContentType) -> Result<Bytes> {
        let text = match content {
            Content::Text(text) => text,
            Content::Bytes(data) => return Ok(data.clone()),
            Content::Stream(_) => return Err(unencodable_stream()),
        };

        let charset = Charset::of(content_type)?;
        if charset.ascii_only && !text.is_ascii() {
            return Err(Error::content("Text is not representable in us-ascii"));
        }

        // encoding_rs only encodes UTF-16 as UTF-8
        if charset.encoding == UTF_16LE {
            return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
        }
        if charset.encoding == UTF_16BE {
            return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
        }

        let (bytes, used, had_errors) = charset.encoding.encode(text);
        if had_errors {
            return Err(Error::content(format!(
                "Text is not representable in {}",
                used.name()
            )));
        }
        Ok(Bytes::copy_from_slice(&bytes))
    }
}

/// Opaque binary data, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryConverter;

impl ContentConverter for BinaryConverter {
    fn decode(&self, data: Bytes, _content_type: &ContentType) -> Result<Content> {
        Ok(Content::Bytes(data))
    }

    fn encode(&self, content: &Content, _content_type: &ContentType) -> Result<Bytes> {
        match content {
            Content::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Content::Bytes(data) => Ok(data.clone()),
            Content::Stream(_) => Err(unencodable_stream()),
        }
    }
}

/// Converters registered by MIME type pattern.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    entries: Vec<(String, Rc<dyn ContentConverter>)>,
    fallback: Rc<dyn ContentConverter>,
}

impl ConverterRegistry {
    /// Creates a registry with no registrations; everything is binary.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            fallback: Rc::new(BinaryConverter),
        }
    }

    /// Creates a registry with the built-in converters for text, XML,
    /// images, and octet streams.
    #[must_use]
    pub fn with_defaults() -> Self {
        let text: Rc<dyn ContentConverter> = Rc::new(TextConverter);
        let binary: Rc<dyn ContentConverter> = Rc::new(BinaryConverter);

        let mut registry = Self::empty();
        registry.register("text/plain", Rc::clone(&text));
        registry.register("text/xml", Rc::clone(&text));
        registry.register("application/xml", text);
        registry.register("image/*", Rc::clone(&binary));
        registry.register("application/octet-stream", binary);
        registry
    }

    /// Registers a converter for a `type/subtype` or `type/*` pattern.
    ///
    /// Later registrations take precedence over earlier ones.
    pub fn register(&mut self, pattern: impl Into<String>, converter: Rc<dyn ContentConverter>) {
        self.entries.push((pattern.into(), converter));
    }

    /// Returns the converter for a content type.
    #[must_use]
    pub fn lookup(&self, content_type: &ContentType) -> Rc<dyn ContentConverter> {
        let exact = self
            .entries
            .iter()
            .rev()
            .find(|(pattern, _)| !pattern.ends_with("/*") && content_type.matches(pattern));
        let wildcard = || {
            self.entries
                .iter()
                .rev()
                .find(|(pattern, _)| content_type.matches(pattern))
        };

        exact
            .or_else(wildcard)
            .map_or_else(|| Rc::clone(&self.fallback), |(_, c)| Rc::clone(c))
    }

    /// Decodes raw bytes with the converter for `content_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is malformed or conversion fails.
    pub fn decode(&self, data: Bytes, content_type: &str) -> Result<Content> {
        let content_type = ContentType::parse(content_type)?;
        self.lookup(&content_type).decode(data, &content_type)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A resolved charset parameter.
#[derive(Debug, Clone, Copy)]
struct Charset {
    encoding: &'static Encoding,
    /// `us-ascii` resolves to windows-1252; keep it strict.
    ascii_only: bool,
}

impl Charset {
    fn of(content_type: &ContentType) -> Result<Self> {
        let Some(label) = content_type.charset() else {
            return Ok(Self {
                encoding: UTF_8,
                ascii_only: false,
            });
        };
        let label = label.trim();
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding != REPLACEMENT => Ok(Self {
                encoding,
                ascii_only: label.eq_ignore_ascii_case("us-ascii")
                    || label.eq_ignore_ascii_case("ascii"),
            }),
            _ => Err(Error::Unsupported(format!("charset {label}"))),
        }
    }
}

fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16LE || encoding == UTF_16BE
}

fn unencodable_stream() -> Error {
    Error::Unsupported("Stream content must be read before it can be encoded".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn ct(s: &str) -> ContentType {
        ContentType::parse(s).unwrap()
    }

    #[test]
    fn test_text_decode_charsets() {
        let converter = TextConverter;

        let utf8 = converter
            .decode(Bytes::from("héllo"), &ct("text/plain; charset=UTF-8"))
            .unwrap();
        assert_eq!(utf8.as_text(), Some("héllo"));

        let latin1 = converter
            .decode(Bytes::from_static(&[0x68, 0xE9]), &ct("text/plain; charset=iso-8859-1"))
            .unwrap();
        assert_eq!(latin1.as_text(), Some("hé"));

        let defaulted = converter.decode(Bytes::from("<a/>"), &ct("text/xml")).unwrap();
        assert_eq!(defaulted.as_text(), Some("<a/>"));
    }

    #[test]
    fn test_text_decode_errors() {
        let converter = TextConverter;

        let err = converter
            .decode(Bytes::from_static(&[0xFF, 0xFE]), &ct("text/plain; charset=utf-8"))
            .unwrap_err();
        assert!(err.is_content_error());

        let err = converter
            .decode(Bytes::from("héllo"), &ct("text/plain; charset=us-ascii"))
            .unwrap_err();
        assert!(matches!(err, Error::Content(_)));

        let err = converter
            .decode(Bytes::from("x"), &ct("text/plain; charset=x-no-such-charset"))
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_text_encode() {
        let converter = TextConverter;
        let latin1 = ct("text/plain; charset=iso-8859-1");

        let bytes = converter.encode(&Content::from("hé"), &latin1).unwrap();
        assert_eq!(&bytes[..], &[0x68, 0xE9]);

        assert!(converter.encode(&Content::from("\u{2713}"), &latin1).is_err());
        assert!(
            converter
                .encode(&Content::from("é"), &ct("text/plain; charset=us-ascii"))
                .is_err()
        );
    }

    #[test]
    fn test_text_decode_windows_1252() {
        let text = TextConverter
            .decode(
                Bytes::from_static(&[0x93, b'h', b'i', 0x94]),
                &ct("text/plain; charset=windows-1252"),
            )
            .unwrap();
        assert_eq!(text.as_text(), Some("\u{201C}hi\u{201D}"));
    }

    #[test]
    fn test_text_utf16() {
        let converter = TextConverter;

        let with_bom = converter
            .decode(
                Bytes::from_static(&[0xFF, 0xFE, b'h', 0, b'i', 0]),
                &ct("text/plain; charset=utf-16"),
            )
            .unwrap();
        assert_eq!(with_bom.as_text(), Some("hi"));

        let big_endian = ct("text/xml; charset=UTF-16BE");
        let bytes = converter.encode(&Content::from("<é/>"), &big_endian).unwrap();
        assert_eq!(&bytes[..], &[0, b'<', 0, 0xE9, 0, b'/', 0, b'>']);
        let back = converter.decode(bytes, &big_endian).unwrap();
        assert_eq!(back.as_text(), Some("<é/>"));

        let err = converter
            .decode(Bytes::from_static(&[0x00, 0xD8]), &ct("text/plain; charset=utf-16le"))
            .unwrap_err();
        assert!(err.is_content_error());
    }

    #[test]
    fn test_text_shift_jis_round_trip() {
        let converter = TextConverter;
        let sjis = ct("text/plain; charset=Shift_JIS");

        let bytes = converter.encode(&Content::from("日本"), &sjis).unwrap();
        assert_eq!(&bytes[..], &[0x93, 0xFA, 0x96, 0x7B]);
        assert_eq!(converter.decode(bytes, &sjis).unwrap().as_text(), Some("日本"));

        let err = converter
            .encode(&Content::from("€"), &ct("text/plain; charset=iso-8859-2"))
            .unwrap_err();
        assert!(matches!(err, Error::Content(_)));
    }

    #[test]
    fn test_registry_lookup_order() {
        #[derive(Debug)]
        struct Upper;

        impl ContentConverter for Upper {
            fn decode(&self, data: Bytes, _: &ContentType) -> Result<Content> {
                Ok(Content::Text(String::from_utf8_lossy(&data).to_uppercase()))
            }

            fn encode(&self, content: &Content, ct: &ContentType) -> Result<Bytes> {
                BinaryConverter.encode(content, ct)
            }
        }

        let mut registry = ConverterRegistry::with_defaults();
        registry.register("text/*", Rc::new(Upper));

        // Exact registration beats the later wildcard
        let plain = registry.decode(Bytes::from("abc"), "text/plain").unwrap();
        assert_eq!(plain.as_text(), Some("abc"));

        let html = registry.decode(Bytes::from("abc"), "text/html").unwrap();
        assert_eq!(html.as_text(), Some("ABC"));

        let png = registry.decode(Bytes::from("abc"), "image/png").unwrap();
        assert!(png.as_bytes().is_some());

        let unknown = registry.decode(Bytes::from("abc"), "application/pdf").unwrap();
        assert!(unknown.as_bytes().is_some());
    }

    #[test]
    fn test_registry_rejects_bad_content_type() {
        let registry = ConverterRegistry::default();
        let err = registry.decode(Bytes::new(), "nonsense").unwrap_err();
        assert!(matches!(err, Error::Mime(_)));
    }
}
