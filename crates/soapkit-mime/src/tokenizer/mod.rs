//! Tokenizer for structured MIME header fields.
//!
//! Breaks a header value such as `text/plain; charset="utf-8" (comment)`
//! into atoms, quoted strings, and single-character specials, following the
//! lexical rules of RFC 822 and RFC 2045.

mod token;

pub use token::Token;

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Specials for MIME header fields (RFC 2045 `tspecials` plus whitespace).
pub const MIME_SPECIALS: &str = "()<>@,;:\\\"\t []/?=";

/// Specials for RFC 822 structured fields.
pub const RFC822_SPECIALS: &str = "()<>@,;:\\\"\t .[]";

/// Header field tokenizer.
///
/// Stateful only in its read cursor; cloning it yields an independent
/// cursor over the same input.
#[derive(Debug, Clone)]
pub struct HeaderTokenizer<'a> {
    input: &'a str,
    pos: usize,
    specials: &'a str,
    skip_comments: bool,
}

impl<'a> HeaderTokenizer<'a> {
    /// Creates a tokenizer with the given specials that skips comments.
    #[must_use]
    pub const fn new(input: &'a str, specials: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            specials,
            skip_comments: true,
        }
    }

    /// Creates a tokenizer using [`MIME_SPECIALS`].
    #[must_use]
    pub const fn mime(input: &'a str) -> Self {
        Self::new(input, MIME_SPECIALS)
    }

    /// Sets whether comments are skipped or returned as [`Token::Comment`].
    #[must_use]
    pub const fn skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    /// Returns the current byte position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the unconsumed rest of the input.
    #[must_use]
    pub fn remainder(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Reads the next token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if a quoted string or comment is not
    /// terminated before the end of input.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        self.skip_whitespace();

        let Some(mut c) = self.peek() else {
            return Ok(Token::Eof);
        };

        while c == '(' {
            let comment = self.read_comment()?;
            if !self.skip_comments {
                return Ok(Token::Comment(comment));
            }
            self.skip_whitespace();
            match self.peek() {
                Some(next) => c = next,
                None => return Ok(Token::Eof),
            }
        }

        if c == '"' {
            return self.read_quoted_string();
        }

        if is_ctl(c) || self.specials.contains(c) {
            self.advance();
            return Ok(Token::Special(c));
        }

        Ok(self.read_atom())
    }

    /// Returns the next token without consuming it.
    ///
    /// # Errors
    ///
    /// Same as [`next_token`](Self::next_token).
    pub fn peek_token(&self) -> Result<Token<'a>> {
        self.clone().next_token()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.peek() {
            self.advance();
        }
    }

    /// Reads a comment, handling nesting and escapes. The cursor is on `(`.
    fn read_comment(&mut self) -> Result<Cow<'a, str>> {
        self.advance();
        let start = self.pos;
        let mut depth = 1usize;
        let mut filter = false;

        while depth > 0 {
            match self.advance() {
                Some('\\') => {
                    filter = true;
                    if self.advance().is_none() {
                        break;
                    }
                }
                Some('\r') => filter = true,
                Some('(') => depth += 1,
                Some(')') => depth -= 1,
                Some(_) => {}
                None => break,
            }
        }

        if depth != 0 {
            return Err(self.error("Unbalanced comment"));
        }

        let raw = &self.input[start..self.pos - 1];
        Ok(if filter { unescape(raw) } else { Cow::Borrowed(raw) })
    }

    /// Reads a quoted string. The cursor is on the opening quote.
    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance();
        let start = self.pos;
        let mut filter = false;

        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    filter = true;
                    if self.advance().is_none() {
                        return Err(self.error("Unbalanced quoted string"));
                    }
                }
                Some('\r') => filter = true,
                Some(_) => {}
                None => return Err(self.error("Unbalanced quoted string")),
            }
        }

        let raw = &self.input[start..self.pos - 1];
        Ok(Token::QuotedString(if filter {
            unescape(raw)
        } else {
            Cow::Borrowed(raw)
        }))
    }

    fn read_atom(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ctl(c) || matches!(c, ' ' | '(' | '"') || self.specials.contains(c) {
                break;
            }
            self.advance();
        }
        Token::Atom(&self.input[start..self.pos])
    }

    fn error(&self, message: &str) -> Error {
        Error::parse(self.pos, message)
    }
}

/// Returns true for ASCII control characters and anything outside US-ASCII.
#[must_use]
pub const fn is_ctl(c: char) -> bool {
    (c as u32) < 0x20 || (c as u32) >= 0x7F
}

/// Drops backslash escapes and folding CRLF pairs from a quoted string or
/// comment body.
fn unescape(raw: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    let mut after_cr = false;

    for c in raw.chars() {
        if c == '\n' && after_cr {
            after_cr = false;
            continue;
        }
        after_cr = false;
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '\r' {
            after_cr = true;
        } else {
            out.push(c);
        }
    }

    Cow::Owned(out)
}
