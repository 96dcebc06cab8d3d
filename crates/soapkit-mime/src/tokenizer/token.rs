//! Header token types.

use std::borrow::Cow;

/// Token types produced by the header tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Maximal run of characters that are neither specials, whitespace,
    /// nor control characters.
    Atom(&'a str),
    /// Contents of a quoted string with escapes and folds removed.
    QuotedString(Cow<'a, str>),
    /// Contents of a parenthesized comment. Only produced when the
    /// tokenizer is not skipping comments.
    Comment(Cow<'a, str>),
    /// A single special or control character.
    Special(char),
    /// End of input.
    Eof,
}

impl<'a> Token<'a> {
    /// Returns true for the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns true if this is the given special character.
    #[must_use]
    pub fn is_special(&self, c: char) -> bool {
        matches!(self, Self::Special(s) if *s == c)
    }

    /// Returns the textual value of an atom, quoted string, or comment.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(s),
            Self::QuotedString(s) | Self::Comment(s) => Some(s),
            Self::Special(_) | Self::Eof => None,
        }
    }

    /// Converts the token into an owned string value, if it carries one.
    #[must_use]
    pub fn into_value(self) -> Option<Cow<'a, str>> {
        match self {
            Self::Atom(s) => Some(Cow::Borrowed(s)),
            Self::QuotedString(s) | Self::Comment(s) => Some(s),
            Self::Special(_) | Self::Eof => None,
        }
    }
}
