//! Error types for attachment operations.

use std::io;

/// Result type alias for attachment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Attachment error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed MIME header data (content type, header name).
    #[error(transparent)]
    Mime(#[from] soapkit_mime::Error),

    /// The attachment holds no content.
    #[error("No data handler/content associated with this attachment")]
    NoContent,

    /// A single-use streaming part was already read.
    #[error("Streaming part was already consumed and cannot be re-read")]
    SourceExhausted,

    /// The streaming part was already released.
    #[error("Streaming part has been closed")]
    SourceClosed,

    /// Content could not be materialized or converted.
    #[error("Content error: {0}")]
    Content(String),

    /// Operation not supported by this content representation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// I/O error while reading or writing content.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument to a mutating operation.
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
}

impl Error {
    /// Creates a content error.
    #[must_use]
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content(message.into())
    }

    /// Returns true for failures to read, write, or locate content.
    #[must_use]
    pub const fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::NoContent
                | Self::SourceExhausted
                | Self::SourceClosed
                | Self::Content(_)
                | Self::Unsupported(_)
                | Self::Io(_)
        )
    }

    /// Returns true for rejected arguments.
    #[must_use]
    pub const fn is_illegal_argument(&self) -> bool {
        matches!(self, Self::IllegalArgument(_))
    }
}
