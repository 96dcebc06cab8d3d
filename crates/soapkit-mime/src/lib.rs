//! # soapkit-mime
//!
//! Header-level MIME building blocks for SOAP with attachments.
//!
//! ## Features
//!
//! - **Tokenizer**: RFC 822 / RFC 2045 header field lexer with comments
//!   and quoted strings
//! - **Parameter lists**: Parse and render `; name=value` lists with
//!   76-column folding
//! - **Content types**: `type/subtype` plus parameters
//! - **Header sets**: Ordered, case-insensitive, multi-valued headers
//! - **Encoding**: Base64 transfer encoding, header folding and quoting
//!
//! ## Quick Start
//!
//! ### Parameter Lists
//!
//! ```
//! use soapkit_mime::ParameterList;
//!
//! let mut params = ParameterList::parse("; charset=utf-8; name=\"my file.txt\"")?;
//! assert_eq!(params.get("Charset"), Some("utf-8"));
//!
//! params.set("format", "flowed");
//! assert_eq!(
//!     params.to_string(),
//!     "; charset=utf-8; name=\"my file.txt\"; format=flowed"
//! );
//! # Ok::<(), soapkit_mime::Error>(())
//! ```
//!
//! ### Content Types
//!
//! ```
//! use soapkit_mime::ContentType;
//!
//! let ct = ContentType::parse("multipart/related; type=\"text/xml\"; boundary=abc")?;
//! assert!(ct.is_multipart());
//! assert_eq!(ct.boundary(), Some("abc"));
//! # Ok::<(), soapkit_mime::Error>(())
//! ```
//!
//! ### Headers
//!
//! ```
//! use soapkit_mime::HeaderSet;
//!
//! let mut headers = HeaderSet::new();
//! headers.add("Content-Id", "<part1>")?;
//! headers.set("content-type", "image/png")?;
//! assert_eq!(headers.get("Content-Type"), Some("image/png"));
//! # Ok::<(), soapkit_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod parameter;

pub mod encoding;
pub mod tokenizer;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Header, HeaderSet};
pub use parameter::ParameterList;
pub use tokenizer::{HeaderTokenizer, Token};
