//! Typed-content adapters for attachments.
//!
//! A [`DataHandler`] pairs content with its media type and knows how to
//! present it as raw bytes or as typed [`Content`].

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use bytes::Bytes;
use soapkit_mime::ContentType;

use crate::content::Content;
use crate::convert::{ContentConverter, ConverterRegistry};
use crate::error::{Error, Result};
use crate::source::StreamingPart;

/// Content plus its media type, readable as bytes or as typed content.
pub trait DataHandler: fmt::Debug {
    /// Returns the declared media type.
    fn content_type(&self) -> &str;

    /// Returns a descriptive name for the data, if any.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Opens a reader over the raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be produced.
    fn input_stream(&self) -> Result<Box<dyn Read>>;

    /// Opens a writer that replaces the content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] unless the handler is writable.
    fn output_stream(&self) -> Result<Box<dyn Write>> {
        Err(Error::Unsupported(format!(
            "{} content is read-only",
            self.content_type()
        )))
    }

    /// Returns the content in typed form.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be produced or converted.
    fn content(&self) -> Result<Content>;

    /// Returns the byte length if it is known without producing the bytes.
    fn size(&self) -> Option<u64> {
        None
    }

    /// Copies the raw bytes to `out`, returning the number written.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the content or writing to `out` fails.
    fn write_to(&self, out: &mut dyn Write) -> Result<u64> {
        let mut reader = self.input_stream()?;
        Ok(io::copy(&mut reader, out)?)
    }
}

/// A typed value, marshaled by the converter registered for its media type.
#[derive(Debug)]
pub struct ObjectHandler {
    value: Value,
    content_type: String,
    parsed: ContentType,
    converter: Rc<dyn ContentConverter>,
}

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Bytes(Bytes),
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::Text(s) => Self::Text(s),
            Value::Bytes(b) => Self::Bytes(b),
        }
    }
}

impl ObjectHandler {
    /// Wraps `content` declared as `content_type`.
    ///
    /// Stream content is read into memory immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the content type is malformed
    /// and [`Error::Io`] if a stream cannot be read.
    pub fn new(
        content: Content,
        content_type: impl Into<String>,
        registry: &ConverterRegistry,
    ) -> Result<Self> {
        let content_type = content_type.into();
        let parsed = parse_declared(&content_type)?;

        let value = match content {
            Content::Text(s) => Value::Text(s),
            Content::Bytes(b) => Value::Bytes(b),
            stream @ Content::Stream(_) => Value::Bytes(stream.into_bytes()?),
        };

        Ok(Self {
            value,
            converter: registry.lookup(&parsed),
            content_type,
            parsed,
        })
    }

    fn encoded(&self) -> Result<Bytes> {
        self.converter
            .encode(&Content::from(self.value.clone()), &self.parsed)
    }
}

impl DataHandler for ObjectHandler {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn input_stream(&self) -> Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(self.encoded()?)))
    }

    fn content(&self) -> Result<Content> {
        Ok(self.value.clone().into())
    }
}

/// Raw bytes decoded on demand through a converter registry.
#[derive(Debug, Clone)]
pub struct BytesHandler {
    data: Bytes,
    content_type: String,
    converters: Rc<ConverterRegistry>,
}

impl BytesHandler {
    /// Wraps raw bytes declared as `content_type`.
    #[must_use]
    pub fn new(
        data: Bytes,
        content_type: impl Into<String>,
        converters: Rc<ConverterRegistry>,
    ) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            converters,
        }
    }
}

impl DataHandler for BytesHandler {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn input_stream(&self) -> Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(self.data.clone())))
    }

    fn content(&self) -> Result<Content> {
        self.converters.decode(self.data.clone(), &self.content_type)
    }

    fn size(&self) -> Option<u64> {
        u64::try_from(self.data.len()).ok()
    }
}

/// Read-only view of a streaming part.
#[derive(Debug)]
pub struct StreamingHandler {
    part: Rc<RefCell<StreamingPart>>,
    content_type: String,
}

impl StreamingHandler {
    pub(crate) fn new(part: Rc<RefCell<StreamingPart>>, content_type: impl Into<String>) -> Self {
        Self {
            part,
            content_type: content_type.into(),
        }
    }
}

impl DataHandler for StreamingHandler {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn name(&self) -> Option<&str> {
        Some("MIME part wrapper")
    }

    fn input_stream(&self) -> Result<Box<dyn Read>> {
        self.part.borrow_mut().read()
    }

    fn output_stream(&self) -> Result<Box<dyn Write>> {
        Err(Error::Unsupported(
            "Streaming attachment parts cannot be written".to_string(),
        ))
    }

    fn content(&self) -> Result<Content> {
        Ok(Content::Stream(self.input_stream()?))
    }

    fn size(&self) -> Option<u64> {
        self.part.borrow().size()
    }
}

/// Parses a declared media type, rejecting malformed ones as arguments.
pub(crate) fn parse_declared(content_type: &str) -> Result<ContentType> {
    ContentType::parse(content_type)
        .map_err(|e| Error::IllegalArgument(format!("Invalid content type {content_type:?}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::source::MemoryPart;
    use soapkit_mime::HeaderSet;

    #[test]
    fn test_object_handler_marshals_with_charset() {
        let registry = ConverterRegistry::default();
        let handler =
            ObjectHandler::new(Content::from("hé"), "text/plain; charset=iso-8859-1", &registry)
                .unwrap();

        let mut out = Vec::new();
        assert_eq!(handler.write_to(&mut out).unwrap(), 2);
        assert_eq!(out, vec![0x68, 0xE9]);
        assert_eq!(handler.content().unwrap().as_text(), Some("hé"));
        assert!(matches!(handler.output_stream(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_object_handler_materializes_streams() {
        let registry = ConverterRegistry::default();
        let stream = Content::Stream(Box::new(Cursor::new(b"raw".to_vec())));
        let handler = ObjectHandler::new(stream, "application/octet-stream", &registry).unwrap();

        let content = handler.content().unwrap();
        assert_eq!(&content.as_bytes().unwrap()[..], b"raw");
        // Readable more than once
        assert_eq!(handler.content().unwrap().into_bytes().unwrap().len(), 3);
    }

    #[test]
    fn test_object_handler_rejects_bad_type() {
        let registry = ConverterRegistry::default();
        let err = ObjectHandler::new(Content::from("x"), "not a type", &registry).unwrap_err();
        assert!(err.is_illegal_argument());
    }

    #[test]
    fn test_bytes_handler_decodes_by_type() {
        let handler = BytesHandler::new(
            Bytes::from("<a/>"),
            "text/xml",
            Rc::new(ConverterRegistry::default()),
        );

        assert_eq!(handler.size(), Some(4));
        assert_eq!(handler.content().unwrap().as_text(), Some("<a/>"));
        let mut first = String::new();
        handler.input_stream().unwrap().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        handler.input_stream().unwrap().read_to_string(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_streaming_handler_is_read_only() {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", "image/png").unwrap();
        let part = StreamingPart::new(Box::new(MemoryPart::new(headers, vec![1, 2, 3])));
        let handler = StreamingHandler::new(Rc::new(RefCell::new(part)), "image/png");

        assert_eq!(handler.size(), Some(3));
        assert!(handler.content().unwrap().is_stream());
        assert!(matches!(handler.input_stream(), Err(Error::SourceExhausted)));
        let err = handler.output_stream().err().expect("expected error");
        assert!(err.is_content_error());
    }
}
