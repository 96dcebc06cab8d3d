//! # soapkit-attachment
//!
//! Attachment parts for SOAP messages with attachments.
//!
//! An [`AttachmentPart`] carries MIME headers and at most one content
//! representation at a time:
//!
//! - **Streaming**: read lazily from a part handed over by a multipart
//!   demultiplexer ([`MimePartSource`])
//! - **Raw buffered**: bytes held in memory, set directly or decoded from
//!   Base64
//! - **Handled**: produced by a [`DataHandler`], typically typed content
//!   marshaled by a [`ContentConverter`]
//!
//! The declared media type of the content is kept in the `Content-Type`
//! header. Replacing or clearing content releases a held streaming part.
//!
//! ## Quick Start
//!
//! ```
//! use std::io::Cursor;
//! use soapkit_attachment::{AttachmentPart, ContentKind};
//!
//! let mut part = AttachmentPart::new();
//! part.set_content("<note>hi</note>", "text/xml; charset=utf-8")?;
//! assert_eq!(part.kind(), ContentKind::Handled);
//! assert_eq!(part.mime_header("Content-Type"), vec!["text/xml; charset=utf-8"]);
//!
//! let encoded = part.base64_content()?;
//! part.set_base64_content(Cursor::new(encoded), "text/xml")?;
//! assert_eq!(part.content()?.as_text(), Some("<note>hi</note>"));
//! # Ok::<(), soapkit_attachment::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod content;
mod convert;
mod error;
mod handler;
mod part;
mod source;

pub use config::{
    ContentConfig, ContentConfigBuilder, DEFAULT_BASE64_LINE_LENGTH, DEFAULT_READ_BUFFER_SIZE,
};
pub use content::Content;
pub use convert::{BinaryConverter, ContentConverter, ConverterRegistry, TextConverter};
pub use error::{Error, Result};
pub use handler::{BytesHandler, DataHandler, ObjectHandler, StreamingHandler};
pub use part::{AttachmentPart, CONTENT_TYPE, ContentKind};
pub use source::{MemoryPart, MimePartSource, StreamingPart};

pub use soapkit_mime::{Header, HeaderSet};
