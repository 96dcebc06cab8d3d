//! MIME encoding helpers.
//!
//! Base64 transfer encoding plus the folding and quoting rules used when
//! rendering structured header fields.

use crate::error::Result;
use crate::tokenizer::is_ctl;
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Maximum header line length before folding (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Accepts padded and unpadded input, as produced by various MIME encoders.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64, breaking the output into CRLF-separated lines
/// of at most `line_length` characters.
///
/// A `line_length` of zero produces a single line.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8], line_length: usize) -> String {
    let encoded = STANDARD.encode(data);
    if line_length == 0 || encoded.len() <= line_length {
        return encoded;
    }

    let mut result = String::with_capacity(encoded.len() + encoded.len() / line_length * 2);
    // Base64 output is ASCII, so byte chunks are valid str boundaries
    for (i, chunk) in encoded.as_bytes().chunks(line_length).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        result.extend(chunk.iter().map(|&b| char::from(b)));
    }
    result
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes a Base64 transfer-encoded body, ignoring line breaks and other
/// ASCII whitespace.
///
/// # Errors
///
/// Returns an error if the remaining characters are not valid Base64.
pub fn decode_base64_lenient(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT.decode(cleaned).map_err(Into::into)
}

/// Folds `text` so that no line exceeds [`MAX_LINE_LENGTH`] columns.
///
/// `used` is the number of columns already taken on the current line.
/// Trailing whitespace is removed. Lines are broken by inserting CRLF in
/// front of a space or tab, which then starts the continuation line. A run
/// without whitespace is never broken.
#[must_use]
pub fn fold(used: usize, text: &str) -> String {
    let mut s = text.trim_end_matches([' ', '\t', '\r', '\n']);

    if used + s.chars().count() <= MAX_LINE_LENGTH {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len() + 4);
    let mut used = used;
    let mut last = '\0';

    while used + s.chars().count() > MAX_LINE_LENGTH {
        let mut break_at = None;
        for (column, (index, c)) in s.char_indices().enumerate() {
            if break_at.is_some() && used + column > MAX_LINE_LENGTH {
                break;
            }
            if matches!(c, ' ' | '\t') && !matches!(last, ' ' | '\t') {
                break_at = Some(index);
            }
            last = c;
        }

        let Some(index) = break_at else {
            break;
        };

        result.push_str(&s[..index]);
        result.push_str("\r\n");
        // Whitespace is single-byte
        last = char::from(s.as_bytes()[index]);
        result.push(last);
        s = &s[index + 1..];
        used = 1;
    }

    result.push_str(s);
    result
}

/// Quotes `word` if it cannot be sent as a bare token.
///
/// Words containing `"`, `\`, CR or LF are quoted with those characters
/// escaped. Words containing control characters, non-ASCII characters, or
/// any of `specials` are quoted as is. Anything else is returned unchanged.
#[must_use]
pub fn quote(word: &str, specials: &str) -> String {
    let mut needs_quoting = false;

    for c in word.chars() {
        if matches!(c, '"' | '\\' | '\r' | '\n') {
            return quote_escaped(word);
        }
        if is_ctl(c) || specials.contains(c) {
            needs_quoting = true;
        }
    }

    if needs_quoting {
        format!("\"{word}\"")
    } else {
        word.to_string()
    }
}

fn quote_escaped(word: &str) -> String {
    let mut result = String::with_capacity(word.len() + 4);
    result.push('"');
    let mut last = '\0';
    for c in word.chars() {
        // An LF following CR is covered by the CR's escape
        let escape = matches!(c, '"' | '\\' | '\r') || (c == '\n' && last != '\r');
        if escape {
            result.push('\\');
        }
        result.push(c);
        last = c;
    }
    result.push('"');
    result
}
