//! Integration tests for attachment parts.
//!
//! Streaming parts are simulated with a source that records reads and
//! closes, so resource release can be observed from outside.

use std::cell::Cell;
use std::io::{self, Cursor, Read};
use std::rc::Rc;

use bytes::Bytes;
use proptest::prelude::*;
use soapkit_attachment::{
    AttachmentPart, BytesHandler, Content, ContentConfig, ContentKind, ConverterRegistry,
    DataHandler, Error, HeaderSet, MemoryPart, MimePartSource,
};

/// Mock demultiplexed part that counts how often it is read and closed.
struct TrackedPart {
    inner: MemoryPart,
    closes: Rc<Cell<usize>>,
    reads: Rc<Cell<usize>>,
}

impl TrackedPart {
    fn new(content_type: &str, body: &'static [u8]) -> (Self, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let mut headers = HeaderSet::new();
        headers.add("Content-Type", content_type).unwrap();
        headers.add("Content-Transfer-Encoding", "binary").unwrap();
        headers.add("Content-Id", "<attachment@soapkit>").unwrap();

        let closes = Rc::new(Cell::new(0));
        let reads = Rc::new(Cell::new(0));
        let part = Self {
            inner: MemoryPart::new(headers, body),
            closes: Rc::clone(&closes),
            reads: Rc::clone(&reads),
        };
        (part, closes, reads)
    }
}

impl MimePartSource for TrackedPart {
    fn headers(&self) -> &HeaderSet {
        self.inner.headers()
    }

    fn read(&mut self) -> io::Result<Box<dyn Read>> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read()
    }

    fn size(&self) -> Option<u64> {
        self.inner.size()
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes.set(self.closes.get() + 1);
        self.inner.close()
    }
}

/// A handler declaring a media type that does not parse.
#[derive(Debug)]
struct BadTypeHandler;

impl DataHandler for BadTypeHandler {
    fn content_type(&self) -> &str {
        "no slash here"
    }

    fn input_stream(&self) -> soapkit_attachment::Result<Box<dyn Read>> {
        Ok(Box::new(io::empty()))
    }

    fn content(&self) -> soapkit_attachment::Result<Content> {
        Ok(Content::Bytes(Bytes::new()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_streaming_part_lifecycle() {
    init_tracing();
    let (source, closes, reads) = TrackedPart::new("image/png", b"\x89PNG\r\n");
    let mut part = AttachmentPart::from_source(Box::new(source)).unwrap();

    assert_eq!(part.kind(), ContentKind::Streaming);
    assert_eq!(part.mime_header("content-id"), vec!["<attachment@soapkit>"]);
    assert_eq!(part.size().unwrap(), Some(6));
    assert_eq!(reads.get(), 0);

    let body = part.raw_content_bytes().unwrap();
    assert_eq!(&body[..], b"\x89PNG\r\n");
    assert_eq!(reads.get(), 1);
    assert!(matches!(part.raw_content(), Err(Error::SourceExhausted)));
    assert_eq!(part.size().unwrap(), None);

    part.set_raw_bytes("replacement", "text/plain").unwrap();
    assert_eq!(closes.get(), 1);
    assert_eq!(part.kind(), ContentKind::RawBuffered);

    drop(part);
    assert_eq!(closes.get(), 1);
}

#[test]
fn test_drop_releases_streaming_part_once() {
    let (source, closes, _) = TrackedPart::new("text/plain", b"body");
    let part = AttachmentPart::from_source(Box::new(source)).unwrap();
    let view = part.data_handler().unwrap();

    drop(part);
    assert_eq!(closes.get(), 1);
    assert!(matches!(view.input_stream(), Err(Error::SourceClosed)));

    drop(view);
    assert_eq!(closes.get(), 1);
}

#[test]
fn test_clear_releases_and_empties() {
    let (source, closes, _) = TrackedPart::new("text/plain", b"body");
    let mut part = AttachmentPart::from_source(Box::new(source)).unwrap();

    part.clear_content();
    assert_eq!(closes.get(), 1);
    assert!(part.is_empty());
    assert_eq!(part.size().unwrap(), Some(0));

    for err in [
        part.content().err(),
        part.raw_content().err(),
        part.raw_content_bytes().err(),
        part.base64_content().err(),
        part.data_handler().err(),
    ] {
        let err = err.unwrap();
        assert!(err.is_content_error(), "{err}");
    }

    part.clear_content();
    drop(part);
    assert_eq!(closes.get(), 1);
}

#[test]
fn test_kind_follows_each_mutation() {
    let mut part = AttachmentPart::new();
    assert_eq!(part.kind(), ContentKind::Empty);

    part.set_content("hello", "text/plain").unwrap();
    assert_eq!(part.kind(), ContentKind::Handled);

    part.set_raw_content(Cursor::new(b"raw".to_vec()), "application/octet-stream")
        .unwrap();
    assert_eq!(part.kind(), ContentKind::RawBuffered);

    part.set_base64_content(Cursor::new("aGk="), "text/plain").unwrap();
    assert_eq!(part.kind(), ContentKind::RawBuffered);
    assert_eq!(part.content().unwrap().as_text(), Some("hi"));

    let handler = Rc::new(BytesHandler::new(
        Bytes::from_static(b"xyz"),
        "application/octet-stream",
        Rc::new(ConverterRegistry::default()),
    ));
    part.set_data_handler(handler).unwrap();
    assert_eq!(part.kind(), ContentKind::Handled);
    assert_eq!(part.content_type(), Some("application/octet-stream"));

    part.clear_content();
    assert_eq!(part.kind(), ContentKind::Empty);
}

#[test]
fn test_bad_handler_type_is_illegal_argument() {
    let mut part = AttachmentPart::from_bytes("keep", "text/plain").unwrap();

    let err = part.set_data_handler(Rc::new(BadTypeHandler)).unwrap_err();
    assert!(err.is_illegal_argument());
    assert!(!err.is_content_error());

    assert_eq!(part.kind(), ContentKind::RawBuffered);
    assert_eq!(part.mime_header("Content-Type"), vec!["text/plain"]);
    assert!(AttachmentPart::from_handler(Rc::new(BadTypeHandler)).is_err());
}

#[test]
fn test_failed_setter_keeps_streaming_part_open() {
    let (source, closes, _) = TrackedPart::new("text/plain", b"body");
    let mut part = AttachmentPart::from_source(Box::new(source)).unwrap();

    assert!(part.set_base64_content(Cursor::new("!!"), "text/plain").is_err());
    assert!(part.set_raw_content_bytes(b"abc", 4, 1, "text/plain").is_err());
    assert!(part.set_content("x", "text").is_err());

    assert_eq!(closes.get(), 0);
    assert_eq!(part.kind(), ContentKind::Streaming);
    assert_eq!(&part.raw_content_bytes().unwrap()[..], b"body");
}

#[test]
fn test_base64_without_padding_is_accepted() {
    let mut part = AttachmentPart::new();
    part.set_base64_content(Cursor::new("SGVsbG8\r\n"), "text/plain; charset=us-ascii")
        .unwrap();
    assert_eq!(part.content().unwrap().as_text(), Some("Hello"));
}

#[test]
fn test_base64_wraps_at_configured_width() {
    let data = vec![0xA5u8; 200];
    let part = AttachmentPart::from_bytes(data.clone(), "application/octet-stream").unwrap();
    let encoded = String::from_utf8(part.base64_content().unwrap().to_vec()).unwrap();
    let lines: Vec<&str> = encoded.split("\r\n").collect();
    assert!(lines.len() > 1);
    assert!(lines.iter().all(|l| l.len() <= 76));

    let part = part.with_config(ContentConfig::builder().base64_line_length(64).build());
    let encoded = String::from_utf8(part.base64_content().unwrap().to_vec()).unwrap();
    assert!(encoded.split("\r\n").all(|l| l.len() <= 64));
}

#[test]
fn test_streaming_content_is_undecoded_stream() {
    let (source, _, _) = TrackedPart::new("text/xml", b"<a/>");
    let part = AttachmentPart::from_source(Box::new(source)).unwrap();

    let content = part.content().unwrap();
    assert!(content.is_stream());
    assert_eq!(&content.into_bytes().unwrap()[..], b"<a/>");
}

#[test]
fn test_content_type_header_mirrors_content() {
    let mut part = AttachmentPart::new();
    part.add_mime_header("Content-Id", "<x>").unwrap();
    part.set_content("hello", "text/plain; charset=us-ascii").unwrap();

    let headers: Vec<_> = part
        .all_mime_headers()
        .map(|h| (h.name.as_str(), h.value.as_str()))
        .collect();
    assert_eq!(
        headers,
        vec![
            ("Content-Id", "<x>"),
            ("Content-Type", "text/plain; charset=us-ascii"),
        ]
    );

    part.set_raw_bytes("bytes", "application/octet-stream").unwrap();
    assert_eq!(
        part.mime_header("Content-Type"),
        vec!["application/octet-stream"]
    );
}

proptest! {
    #[test]
    fn raw_bytes_round_trip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut part = AttachmentPart::new();
        part.set_raw_content(Cursor::new(data.clone()), "application/octet-stream").unwrap();
        prop_assert_eq!(&part.raw_content_bytes().unwrap()[..], &data[..]);
        prop_assert_eq!(part.size().unwrap(), Some(data.len() as u64));
    }

    #[test]
    fn base64_round_trip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let source = AttachmentPart::from_bytes(data.clone(), "application/octet-stream").unwrap();
        let encoded = source.base64_content().unwrap();

        let mut part = AttachmentPart::new();
        part.set_base64_content(Cursor::new(encoded), "application/octet-stream").unwrap();
        prop_assert_eq!(&part.raw_content_bytes().unwrap()[..], &data[..]);
    }
}
