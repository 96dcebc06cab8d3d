//! Attachment parts.
//!
//! An [`AttachmentPart`] holds exactly one content representation at a
//! time plus its own MIME headers. The declared media type of the active
//! representation is always mirrored as the `Content-Type` header.
//!
//! ```text
//!                 set_raw_content*/set_base64_content
//!          ┌──────────────────────────────────────────────┐
//!          │                                              ▼
//! ┌─────────────┐  set_data_handler/set_content   ┌─────────────┐
//! │ Empty       │ ──────────────────────────────→ │ Handled     │
//! └─────────────┘ ←────── clear_content ───────── └─────────────┘
//!        ▲                                              ▲
//!        │ clear_content   ┌─────────────┐   any setter │
//!        └──────────────── │ Streaming   │ ─────────────┘
//!                          └─────────────┘  (source closed)
//! ```

use std::cell::RefCell;
use std::io::{self, Cursor, Read};
use std::rc::Rc;

use bytes::Bytes;
use soapkit_mime::encoding::{decode_base64_lenient, encode_base64_wrapped};
use soapkit_mime::{Header, HeaderSet};

use crate::config::ContentConfig;
use crate::content::Content;
use crate::error::{Error, Result};
use crate::handler::{BytesHandler, DataHandler, ObjectHandler, StreamingHandler, parse_declared};
use crate::source::{MimePartSource, StreamingPart};

/// Name of the header that mirrors the declared media type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Media type assumed for streaming parts that declare none.
const DEFAULT_STREAMING_TYPE: &str = "application/octet-stream";

/// The active content representation of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// No content.
    Empty,
    /// Lazily read from an external streaming part.
    Streaming,
    /// Fully buffered raw bytes.
    RawBuffered,
    /// Produced by a [`DataHandler`].
    Handled,
}

#[derive(Debug)]
enum Body {
    Empty,
    Streaming {
        part: Rc<RefCell<StreamingPart>>,
        content_type: String,
    },
    Raw {
        data: Bytes,
        content_type: String,
    },
    Handled {
        handler: Rc<dyn DataHandler>,
        content_type: String,
    },
}

impl Body {
    const fn kind(&self) -> ContentKind {
        match self {
            Self::Empty => ContentKind::Empty,
            Self::Streaming { .. } => ContentKind::Streaming,
            Self::Raw { .. } => ContentKind::RawBuffered,
            Self::Handled { .. } => ContentKind::Handled,
        }
    }

    fn content_type(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Streaming { content_type, .. }
            | Self::Raw { content_type, .. }
            | Self::Handled { content_type, .. } => Some(content_type),
        }
    }

    fn set_content_type(&mut self, value: String) {
        match self {
            Self::Empty => {}
            Self::Streaming { content_type, .. }
            | Self::Raw { content_type, .. }
            | Self::Handled { content_type, .. } => *content_type = value,
        }
    }
}

/// A SOAP attachment: one content representation plus MIME headers.
///
/// Attachments compare by identity only; there is no `PartialEq`.
#[derive(Debug)]
pub struct AttachmentPart {
    headers: HeaderSet,
    body: Body,
    config: ContentConfig,
}

impl AttachmentPart {
    /// Creates an empty attachment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: HeaderSet::new(),
            body: Body::Empty,
            config: ContentConfig::default(),
        }
    }

    /// Creates a streaming attachment from a demultiplexed MIME part.
    ///
    /// All headers of the part are copied. A part without `Content-Type`
    /// is declared as `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the part's content type is
    /// malformed.
    pub fn from_source(source: Box<dyn MimePartSource>) -> Result<Self> {
        let part = StreamingPart::new(source);
        let content_type = part
            .content_type()
            .unwrap_or(DEFAULT_STREAMING_TYPE)
            .to_string();
        parse_declared(&content_type)?;

        let mut attachment = Self::new();
        attachment.headers = part.headers().clone();
        attachment.replace_body(Body::Streaming {
            part: Rc::new(RefCell::new(part)),
            content_type,
        })?;
        Ok(attachment)
    }

    /// Creates an attachment holding raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the content type is malformed.
    pub fn from_bytes(data: impl Into<Bytes>, content_type: &str) -> Result<Self> {
        let mut attachment = Self::new();
        attachment.set_raw_bytes(data, content_type)?;
        Ok(attachment)
    }

    /// Creates an attachment whose content comes from a handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the handler's content type is
    /// malformed.
    pub fn from_handler(handler: Rc<dyn DataHandler>) -> Result<Self> {
        let mut attachment = Self::new();
        attachment.set_data_handler(handler)?;
        Ok(attachment)
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ContentConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Returns the active content representation.
    #[must_use]
    pub const fn kind(&self) -> ContentKind {
        self.body.kind()
    }

    /// Returns true if the attachment holds no content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.body, Body::Empty)
    }

    /// Returns the declared media type of the active content.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.body.content_type()
    }

    // ---- Content mutation ----

    /// Sets the content from a data handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the handler declares a
    /// malformed content type; the attachment is left unchanged.
    pub fn set_data_handler(&mut self, handler: Rc<dyn DataHandler>) -> Result<()> {
        let content_type = handler.content_type().to_string();
        parse_declared(&content_type).inspect_err(|e| {
            tracing::error!(%e, "Rejected data handler");
        })?;
        self.replace_body(Body::Handled {
            handler,
            content_type,
        })
    }

    /// Sets typed content, marshaled by the converter for `content_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the content type is malformed
    /// and [`Error::Io`] if stream content cannot be read.
    pub fn set_content(&mut self, content: impl Into<Content>, content_type: &str) -> Result<()> {
        let handler = ObjectHandler::new(content.into(), content_type, &self.config.converters)?;
        self.set_data_handler(Rc::new(handler))
    }

    /// Sets raw content from a slice of `content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if `offset..offset + len` is out
    /// of bounds or the content type is malformed.
    pub fn set_raw_content_bytes(
        &mut self,
        content: &[u8],
        offset: usize,
        len: usize,
        content_type: &str,
    ) -> Result<()> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= content.len())
            .ok_or_else(|| {
                Error::IllegalArgument(format!(
                    "Range {offset}+{len} outside content of {} bytes",
                    content.len()
                ))
            })?;
        self.set_raw_bytes(Bytes::copy_from_slice(&content[offset..end]), content_type)
    }

    /// Sets raw content, taking ownership of the bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the content type is malformed.
    pub fn set_raw_bytes(&mut self, data: impl Into<Bytes>, content_type: &str) -> Result<()> {
        parse_declared(content_type)?;
        self.replace_body(Body::Raw {
            data: data.into(),
            content_type: content_type.to_string(),
        })
    }

    /// Sets raw content by reading `reader` to the end.
    ///
    /// The reader is dropped once read, whether or not reading succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the content type is malformed
    /// and [`Error::Io`] if reading fails; the attachment is left unchanged.
    pub fn set_raw_content(&mut self, reader: impl Read, content_type: &str) -> Result<()> {
        parse_declared(content_type)?;
        let data = self.read_all(reader).inspect_err(|e| {
            tracing::error!(%e, "Failed to read raw content");
        })?;
        self.set_raw_bytes(data, content_type)
    }

    /// Sets raw content by decoding Base64 text read from `reader`.
    ///
    /// Line breaks in the encoded text are ignored. The reader is dropped
    /// once read, whether or not decoding succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if the content type is malformed,
    /// [`Error::Io`] if reading fails, and [`Error::Content`] if the text is
    /// not valid Base64; the attachment is left unchanged.
    pub fn set_base64_content(&mut self, reader: impl Read, content_type: &str) -> Result<()> {
        parse_declared(content_type)?;
        let encoded = self.read_all(reader)?;
        let decoded = decode_base64_lenient(&encoded)
            .map_err(|e| Error::content(format!("Invalid Base64 content: {e}")))
            .inspect_err(|e| tracing::error!(%e, "Failed to set Base64 content"))?;
        self.set_raw_bytes(decoded, content_type)
    }

    /// Discards the content, closing a streaming part if one is held.
    ///
    /// Headers are left untouched.
    pub fn clear_content(&mut self) {
        self.release();
        self.body = Body::Empty;
        tracing::debug!("Attachment content cleared");
    }

    // ---- Content access ----

    /// Returns the content in typed form.
    ///
    /// Streaming parts yield their undecoded stream, handled content is
    /// produced by its handler, and raw bytes are decoded by the converter
    /// for their content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] if empty, [`Error::SourceExhausted`] on
    /// a repeated read of a single-use part, or a conversion error.
    pub fn content(&self) -> Result<Content> {
        let result = match &self.body {
            Body::Empty => Err(Error::NoContent),
            Body::Streaming { part, .. } => part.borrow_mut().read().map(Content::Stream),
            Body::Raw { data, content_type } => {
                self.config.converters.decode(data.clone(), content_type)
            }
            Body::Handled { handler, .. } => handler.content(),
        };
        result.inspect_err(|e| tracing::error!(%e, "Failed to get attachment content"))
    }

    /// Returns a reader over the body bytes as stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] if empty, [`Error::SourceExhausted`] on
    /// a repeated read of a single-use part, or the handler's error.
    pub fn raw_content(&self) -> Result<Box<dyn Read>> {
        let result: Result<Box<dyn Read>> = match &self.body {
            Body::Empty => Err(Error::NoContent),
            Body::Streaming { part, .. } => part.borrow_mut().read(),
            Body::Raw { data, .. } => Ok(Box::new(Cursor::new(data.clone()))),
            Body::Handled { handler, .. } => handler.input_stream(),
        };
        result.inspect_err(|e| tracing::error!(%e, "Failed to get raw attachment content"))
    }

    /// Returns the body bytes as stored.
    ///
    /// # Errors
    ///
    /// Same as [`raw_content`](Self::raw_content), plus read failures.
    pub fn raw_content_bytes(&self) -> Result<Bytes> {
        if let Body::Raw { data, .. } = &self.body {
            return Ok(data.clone());
        }
        let reader = self.raw_content()?;
        self.read_all(reader)
            .inspect_err(|e| tracing::error!(%e, "Failed to read raw attachment content"))
    }

    /// Returns the body Base64-encoded.
    ///
    /// The whole body is materialized and encoded in memory; lines are
    /// wrapped per [`ContentConfig::base64_line_length`].
    ///
    /// # Errors
    ///
    /// Same as [`raw_content_bytes`](Self::raw_content_bytes).
    pub fn base64_content(&self) -> Result<Bytes> {
        let data = self.raw_content_bytes()?;
        let line_length = self.config.base64_line_length.unwrap_or(0);
        Ok(Bytes::from(encode_base64_wrapped(&data, line_length)))
    }

    /// Returns the body size in bytes.
    ///
    /// Raw content reports its exact length and empty attachments zero.
    /// Streaming parts report the length their source knows, or `None`.
    /// Handled content without a size hint is written to a sink to count.
    ///
    /// # Errors
    ///
    /// Returns an error if handled content cannot be produced.
    pub fn size(&self) -> Result<Option<u64>> {
        match &self.body {
            Body::Empty => Ok(Some(0)),
            Body::Streaming { part, .. } => Ok(part.borrow().size()),
            Body::Raw { data, .. } => Ok(u64::try_from(data.len()).ok()),
            Body::Handled { handler, .. } => match handler.size() {
                Some(size) => Ok(Some(size)),
                None => handler
                    .write_to(&mut io::sink())
                    .map(Some)
                    .inspect_err(|e| tracing::error!(%e, "Data handler error")),
            },
        }
    }

    /// Returns a data handler view of the content.
    ///
    /// Streaming parts are exposed read-only; raw bytes through a handler
    /// that decodes them on demand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] if empty.
    pub fn data_handler(&self) -> Result<Rc<dyn DataHandler>> {
        match &self.body {
            Body::Empty => Err(Error::NoContent),
            Body::Streaming { part, content_type } => Ok(Rc::new(StreamingHandler::new(
                Rc::clone(part),
                content_type.clone(),
            ))),
            Body::Raw { data, content_type } => Ok(Rc::new(BytesHandler::new(
                data.clone(),
                content_type.clone(),
                Rc::clone(&self.config.converters),
            ))),
            Body::Handled { handler, .. } => Ok(Rc::clone(handler)),
        }
    }

    // ---- Headers ----

    /// Returns the attachment's headers.
    #[must_use]
    pub const fn mime_headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Returns all values of a header.
    #[must_use]
    pub fn mime_header(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name)
    }

    /// Returns all headers in order.
    pub fn all_mime_headers(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Returns the headers whose name is one of `names`.
    pub fn matching_mime_headers<'a>(
        &'a self,
        names: &'a [&str],
    ) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.matching(names)
    }

    /// Returns the headers whose name is none of `names`.
    pub fn non_matching_mime_headers<'a>(
        &'a self,
        names: &'a [&str],
    ) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.non_matching(names)
    }

    /// Returns true if every header in `headers` is present here.
    #[must_use]
    pub fn has_all_headers(&self, headers: &HeaderSet) -> bool {
        self.headers.contains_all(headers)
    }

    /// Appends a header value.
    ///
    /// `Content-Type` is single-valued while content is present, so adding
    /// it replaces the declared type instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] for an empty name, or for a
    /// malformed `Content-Type` while content is present.
    pub fn add_mime_header(&mut self, name: &str, value: &str) -> Result<()> {
        if self.mirrors(name) {
            return self.set_mime_header(name, value);
        }
        self.headers.add(name, value).map_err(illegal_argument)
    }

    /// Sets a header value, replacing existing values.
    ///
    /// Setting `Content-Type` while content is present also changes the
    /// declared type of the content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] for an empty name, or for a
    /// malformed `Content-Type` while content is present.
    pub fn set_mime_header(&mut self, name: &str, value: &str) -> Result<()> {
        if self.mirrors(name) {
            parse_declared(value)?;
            self.headers.set(name, value).map_err(illegal_argument)?;
            self.body.set_content_type(value.to_string());
            tracing::debug!(content_type = value, "Declared content type changed");
            return Ok(());
        }
        self.headers.set(name, value).map_err(illegal_argument)
    }

    /// Removes all values of a header.
    ///
    /// While content is present the mirrored `Content-Type` is kept.
    pub fn remove_mime_header(&mut self, name: &str) {
        if !self.mirrors(name) {
            self.headers.remove(name);
        }
    }

    /// Removes every header except a mirrored `Content-Type`.
    pub fn remove_all_mime_headers(&mut self) {
        if self.is_empty() {
            self.headers.clear();
        } else {
            self.headers
                .retain(|h| h.name.eq_ignore_ascii_case(CONTENT_TYPE));
        }
    }

    // ---- Internals ----

    fn mirrors(&self, name: &str) -> bool {
        !self.is_empty() && name.trim().eq_ignore_ascii_case(CONTENT_TYPE)
    }

    /// Installs a new body, mirroring its declared type into the headers
    /// and releasing the previous body.
    fn replace_body(&mut self, body: Body) -> Result<()> {
        if let Some(content_type) = body.content_type() {
            self.headers
                .set(CONTENT_TYPE, content_type)
                .map_err(illegal_argument)?;
        }
        self.release();
        self.body = body;
        tracing::debug!(
            kind = ?self.body.kind(),
            content_type = ?self.body.content_type(),
            "Attachment content replaced"
        );
        Ok(())
    }

    /// Closes a held streaming part. Safe to call in any state.
    fn release(&mut self) {
        if let Body::Streaming { part, .. } = &self.body {
            part.borrow_mut().close();
        }
    }

    fn read_all(&self, mut reader: impl Read) -> Result<Bytes> {
        let mut data = Vec::with_capacity(self.config.read_buffer_size);
        reader.read_to_end(&mut data)?;
        Ok(Bytes::from(data))
    }
}

impl Default for AttachmentPart {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AttachmentPart {
    fn drop(&mut self) {
        self.release();
    }
}

fn illegal_argument(e: soapkit_mime::Error) -> Error {
    Error::IllegalArgument(e.to_string())
}
