//! Streaming MIME parts supplied by a multipart demultiplexer.
//!
//! The demultiplexer itself lives outside this crate; it hands each part
//! over as a [`MimePartSource`]. [`StreamingPart`] wraps a source with the
//! bookkeeping the attachment needs: single-use reads are enforced and the
//! source is closed exactly once.

use std::fmt;
use std::io::{Cursor, Read};

use bytes::Bytes;
use soapkit_mime::HeaderSet;

use crate::error::{Error, Result};

/// A MIME part whose body is read lazily from an external source.
pub trait MimePartSource {
    /// Returns the part's headers.
    fn headers(&self) -> &HeaderSet;

    /// Opens a reader over the part body.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the body cannot be read.
    fn read(&mut self) -> std::io::Result<Box<dyn Read>>;

    /// Returns true if [`read`](Self::read) may be called more than once.
    fn is_rewindable(&self) -> bool {
        false
    }

    /// Returns the body length if it is known without reading.
    fn size(&self) -> Option<u64> {
        None
    }

    /// Releases the underlying resources.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if releasing fails.
    fn close(&mut self) -> std::io::Result<()>;

    /// Returns the `Content-Type` header of the part.
    fn content_type(&self) -> Option<&str> {
        self.headers().get("Content-Type")
    }
}

/// Owner of a [`MimePartSource`] for the lifetime of an attachment.
pub struct StreamingPart {
    source: Box<dyn MimePartSource>,
    reads: usize,
    closed: bool,
}

impl StreamingPart {
    /// Takes ownership of a source.
    #[must_use]
    pub fn new(source: Box<dyn MimePartSource>) -> Self {
        Self {
            source,
            reads: 0,
            closed: false,
        }
    }

    /// Returns the part's headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderSet {
        self.source.headers()
    }

    /// Returns the `Content-Type` of the part, if declared.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.source.content_type()
    }

    /// Returns the body length if the source knows it and the body can
    /// still be read.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        if self.closed || self.is_exhausted() {
            None
        } else {
            self.source.size()
        }
    }

    /// Returns true once a single-use source has been read.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.reads > 0 && !self.source.is_rewindable()
    }

    /// Returns true once the part has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Opens the part body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceClosed`] after [`close`](Self::close),
    /// [`Error::SourceExhausted`] on a second read of a single-use source,
    /// and [`Error::Io`] if the source fails.
    pub fn read(&mut self) -> Result<Box<dyn Read>> {
        if self.closed {
            return Err(Error::SourceClosed);
        }
        if self.is_exhausted() {
            return Err(Error::SourceExhausted);
        }
        self.reads += 1;
        Ok(self.source.read()?)
    }

    /// Reads the whole part body into memory.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), plus I/O errors while reading.
    pub fn read_bytes(&mut self) -> Result<Bytes> {
        let mut reader = self.read()?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Bytes::from(data))
    }

    /// Closes the source. Calling this again has no effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.source.close() {
            tracing::warn!(?e, "Failed to close streaming part");
        }
    }
}

impl Drop for StreamingPart {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for StreamingPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingPart")
            .field("content_type", &self.content_type())
            .field("reads", &self.reads)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// An in-memory [`MimePartSource`], either rewindable or single-use.
#[derive(Debug, Clone)]
pub struct MemoryPart {
    headers: HeaderSet,
    body: Bytes,
    rewindable: bool,
    closed: bool,
}

impl MemoryPart {
    /// Creates a single-use part with the given headers and body.
    #[must_use]
    pub fn new(headers: HeaderSet, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
            rewindable: false,
            closed: false,
        }
    }

    /// Sets whether the body can be read more than once.
    #[must_use]
    pub const fn rewindable(mut self, rewindable: bool) -> Self {
        self.rewindable = rewindable;
        self
    }

    /// Returns true once the part has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl MimePartSource for MemoryPart {
    fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    fn read(&mut self) -> std::io::Result<Box<dyn Read>> {
        if self.closed {
            return Err(std::io::Error::other("part is closed"));
        }
        Ok(Box::new(Cursor::new(self.body.clone())))
    }

    fn is_rewindable(&self) -> bool {
        self.rewindable
    }

    fn size(&self) -> Option<u64> {
        u64::try_from(self.body.len()).ok()
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.closed = true;
        Ok(())
    }
}
