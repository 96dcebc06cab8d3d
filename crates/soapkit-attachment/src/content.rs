//! Typed attachment content.

use std::fmt;
use std::io::Read;

use bytes::Bytes;

/// Content of an attachment as produced by a converter or a streaming part.
pub enum Content {
    /// Character data (`text/plain`, XML documents).
    Text(String),
    /// Binary data.
    Bytes(Bytes),
    /// Undecoded stream from a streaming part.
    Stream(Box<dyn Read>),
}

impl Content {
    /// Returns the text if this is [`Content::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes if this is [`Content::Bytes`].
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns true if this is an unread stream.
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Reads the content into memory, consuming a stream if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the stream fails.
    pub fn into_bytes(self) -> std::io::Result<Bytes> {
        match self {
            Self::Text(s) => Ok(Bytes::from(s)),
            Self::Bytes(b) => Ok(b),
            Self::Stream(mut reader) => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;
                Ok(Bytes::from(data))
            }
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

impl From<Bytes> for Content {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}
