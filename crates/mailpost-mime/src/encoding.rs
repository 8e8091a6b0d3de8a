//! MIME encoding and decoding utilities.
//!
//! Base64 (RFC 2045 §6.8), Quoted-Printable (RFC 2045 §6.7) and RFC 2047
//! encoded words for header values.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length, excluding CRLF.
pub const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as a single line of Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 broken into CRLF-separated lines of at most
/// [`MAX_LINE_LENGTH`] characters, as a message body requires.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    for (i, ch) in encoded.chars().enumerate() {
        if i > 0 && i % MAX_LINE_LENGTH == 0 {
            out.push_str("\r\n");
        }
        out.push(ch);
    }

    out
}

/// Decodes Base64 data, ignoring line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable.
///
/// Line breaks in the input (`\n` or `\r\n`) become CRLF hard breaks; long
/// lines get `=` soft breaks so no encoded line exceeds
/// [`MAX_LINE_LENGTH`]. Whitespace at the end of a line is encoded so
/// transports cannot strip it.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }

        let bytes = line.strip_suffix('\r').unwrap_or(line).as_bytes();
        let mut column = 0;

        for (j, &byte) in bytes.iter().enumerate() {
            let at_end = j + 1 == bytes.len();
            let literal = matches!(byte, b'!'..=b'<' | b'>'..=b'~')
                || (matches!(byte, b' ' | b'\t') && !at_end);
            let width = if literal { 1 } else { 3 };

            // One column stays free for the soft-break '='.
            if column + width > MAX_LINE_LENGTH - 1 {
                out.push_str("=\r\n");
                column = 0;
            }

            if literal {
                out.push(char::from(byte));
            } else {
                let _ = write!(out, "={byte:02X}");
            }
            column += width;
        }
    }

    out
}

/// Decodes Quoted-Printable data into raw bytes.
///
/// Soft line breaks are removed; hard line breaks are kept as they appear.
///
/// # Errors
///
/// Returns an error if the input contains an invalid escape sequence.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        match bytes.get(i + 1..i + 3) {
            Some(b"\r\n") => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some(hex) => {
                let byte = std::str::from_utf8(hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        Error::InvalidEncoding(format!(
                            "Invalid escape sequence at byte {i}"
                        ))
                    })?;
                out.push(byte);
                i += 3;
            }
            // A lone '=' at the very end is a soft break without a newline.
            None if i + 1 == bytes.len() => i += 1,
            None => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(out)
}

/// Longest encoded word RFC 2047 allows.
const MAX_ENCODED_WORD_LENGTH: usize = 75;

/// Encodes a header value as RFC 2047 encoded words when it is not plain
/// ASCII.
///
/// Format: `=?charset?B?encoded-text?=`. Long values are split on character
/// boundaries into several words of at most 75 characters, separated by a
/// space so the header can be folded between them.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    let needs_encoding =
        text.contains("=?") || text.chars().any(|c| !c.is_ascii() || c.is_ascii_control());
    if !needs_encoding {
        return text.to_string();
    }

    let overhead = "=??B??=".len() + charset.len();
    let max_bytes = (MAX_ENCODED_WORD_LENGTH.saturating_sub(overhead) / 4 * 3).max(4);

    let mut words = Vec::new();
    let mut chunk_start = 0;
    for (index, ch) in text.char_indices() {
        if index + ch.len_utf8() - chunk_start > max_bytes {
            words.push(&text[chunk_start..index]);
            chunk_start = index;
        }
    }
    words.push(&text[chunk_start..]);

    words
        .iter()
        .map(|chunk| format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes a header value containing RFC 2047 encoded words.
///
/// Whitespace between two adjacent encoded words is dropped; plain tokens
/// are kept as they are. A value that does not start with an encoded word is
/// returned unchanged.
///
/// # Errors
///
/// Returns an error if an encoded word is malformed.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    if !text.starts_with("=?") {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut previous_encoded = false;
    for token in text.split_whitespace() {
        let encoded = is_encoded_word(token);
        if !out.is_empty() && !(encoded && previous_encoded) {
            out.push(' ');
        }
        if encoded {
            out.push_str(&decode_encoded_word(token)?);
        } else {
            out.push_str(token);
        }
        previous_encoded = encoded;
    }

    Ok(out)
}

fn is_encoded_word(token: &str) -> bool {
    token.len() > 4 && token.starts_with("=?") && token.ends_with("?=")
}

fn decode_encoded_word(word: &str) -> Result<String> {
    let inner = &word[2..word.len() - 2];
    let parts: Vec<&str> = inner.split('?').collect();
    let [_charset, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    let decoded = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        "Q" => decode_quoted_printable(&encoded_text.replace('_', " "))?,
        other => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {other}"
            )));
        }
    };

    String::from_utf8(decoded).map_err(Into::into)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base64_known_value() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn base64_lines_are_wrapped() {
        let data = vec![0xAB_u8; 200];
        let encoded = encode_base64_lines(&data);
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= MAX_LINE_LENGTH));
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn base64_empty() {
        assert_eq!(encode_base64_lines(b""), "");
        assert!(decode_base64("").unwrap().is_empty());
    }

    #[test]
    fn quoted_printable_plain_ascii_is_untouched() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
    }

    #[test]
    fn quoted_printable_escapes() {
        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");
        assert_eq!(encode_quoted_printable("Héllo"), "H=C3=A9llo");
        assert_eq!(encode_quoted_printable("trailing "), "trailing=20");
    }

    #[test]
    fn quoted_printable_keeps_hard_breaks() {
        assert_eq!(encode_quoted_printable("Hello\nWorld"), "Hello\r\nWorld");
        assert_eq!(encode_quoted_printable("a\r\nb"), "a\r\nb");
    }

    #[test]
    fn quoted_printable_soft_breaks_long_lines() {
        let long = "x".repeat(200);
        let encoded = encode_quoted_printable(&long);
        assert!(encoded.split("\r\n").all(|l| l.len() <= MAX_LINE_LENGTH));
        assert_eq!(decode_quoted_printable(&encoded).unwrap(), long.as_bytes());
    }

    #[test]
    fn quoted_printable_decode() {
        assert_eq!(decode_quoted_printable("H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable("Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert!(decode_quoted_printable("bad=ZZ").is_err());
        assert!(decode_quoted_printable("bad=A").is_err());
    }

    #[test]
    fn rfc2047_only_when_needed() {
        assert_eq!(encode_rfc2047("Hi", "utf-8"), "Hi");
        let encoded = encode_rfc2047("Grüße", "utf-8");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert_eq!(decode_rfc2047(&encoded).unwrap(), "Grüße");
    }

    #[test]
    fn rfc2047_q_encoding() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo_there?=").unwrap(), "Héllo there");
        assert_eq!(decode_rfc2047("plain").unwrap(), "plain");
        assert!(decode_rfc2047("=?utf-8?X?abc?=").is_err());
    }

    #[test]
    fn rfc2047_long_values_split_into_short_words() {
        let subject = "Überprüfung der Jahresabrechnung für das Geschäftsjahr 2025 – bitte lesen ✓";
        let encoded = encode_rfc2047(subject, "utf-8");

        let words: Vec<&str> = encoded.split(' ').collect();
        assert!(words.len() > 1);
        assert!(words.iter().all(|w| w.len() <= 75 && w.starts_with("=?utf-8?B?")));
        assert_eq!(decode_rfc2047(&encoded).unwrap(), subject);
    }

    #[test]
    fn rfc2047_decodes_mixed_tokens() {
        assert_eq!(
            decode_rfc2047("=?utf-8?B?SGVs?= =?utf-8?B?bG8=?= world").unwrap(),
            "Hello world"
        );
    }

    proptest! {
        #[test]
        fn rfc2047_words_stay_short(text in "\\PC{1,200}") {
            let encoded = encode_rfc2047(&text, "utf-8");
            if encoded != text {
                prop_assert!(encoded.split(' ').all(|w| w.len() <= 75));
            }
            prop_assert_eq!(decode_rfc2047(&encoded).unwrap(), text);
        }

        #[test]
        fn quoted_printable_lines_stay_short(text in "\\PC{0,300}") {
            let encoded = encode_quoted_printable(&text);
            prop_assert!(encoded.split("\r\n").all(|l| l.len() <= MAX_LINE_LENGTH));
            prop_assert!(encoded.is_ascii());
        }

        #[test]
        fn quoted_printable_preserves_content(text in "[^\r]{0,300}") {
            let decoded = decode_quoted_printable(&encode_quoted_printable(&text)).unwrap();
            let expected = text.replace('\n', "\r\n");
            prop_assert_eq!(decoded, expected.into_bytes());
        }
    }
}
