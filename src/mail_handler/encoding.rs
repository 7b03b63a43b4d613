//! Charset and MIME transfer encodings for log mail.
//!
//! Bodies are converted to the configured charset with `encoding_rs` and then
//! transfer-encoded: pure ASCII goes out as `7bit`, single-byte Latin style
//! charsets as `quoted-printable`, everything else (UTF-8 included) as
//! `base64`. Subjects containing non-ASCII text become RFC 2047 encoded words
//! and are always tagged `utf-8`, whatever the body charset.

use std::fmt::{self, Write as _};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use encoding_rs::{Encoding, UTF_8};

/// Maximum length of an encoded body line, excluding the CRLF.
const MAX_LINE_LEN: usize = 76;
/// Raw bytes per encoded word; keeps each word within the 75 character limit.
const ENCODED_WORD_CHUNK: usize = 45;

/// A validated body charset.
///
/// Keeps the label the caller configured, which is what the `Content-Type`
/// header reports, alongside the encoder `encoding_rs` resolved it to.
#[derive(Clone)]
pub struct Charset {
    label: String,
    encoding: &'static Encoding,
}

impl Charset {
    /// Resolve `label`. Returns `None` for unknown charsets and for charsets
    /// that cannot carry ASCII headers (UTF-16, ISO-2022-JP, ...).
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let encoding = Encoding::for_label(label.as_bytes())?;
        if !encoding.is_ascii_compatible() || encoding.output_encoding() != encoding {
            return None;
        }
        Some(Self {
            label: label.to_owned(),
            encoding,
        })
    }

    /// UTF-8, the default charset.
    pub fn utf8() -> Self {
        Self {
            label: "utf-8".into(),
            encoding: UTF_8,
        }
    }

    /// The label as configured.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn transfer_encoding_for(&self, text: &str) -> TransferEncoding {
        if text.is_ascii() {
            return TransferEncoding::SevenBit;
        }
        let name = self.encoding.name();
        if name.starts_with("ISO-8859-") || name.starts_with("windows-125") || name.starts_with("KOI8")
        {
            TransferEncoding::QuotedPrintable
        } else {
            TransferEncoding::Base64
        }
    }

    /// Encode `text` for use as a message body.
    ///
    /// Line endings are normalised to CRLF. Characters the charset cannot
    /// represent are replaced by `encoding_rs` with numeric character
    /// references rather than failing.
    pub fn encode_body(&self, text: &str) -> EncodedBody {
        let canonical = to_crlf(text);
        let (bytes, _, _) = self.encoding.encode(&canonical);
        let transfer_encoding = self.transfer_encoding_for(text);
        let content = match transfer_encoding {
            TransferEncoding::SevenBit => canonical.clone(),
            TransferEncoding::QuotedPrintable => encode_quoted_printable(&bytes),
            TransferEncoding::Base64 => encode_base64_lines(&bytes),
        };
        EncodedBody {
            content,
            charset: self.label.clone(),
            transfer_encoding,
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Charset")
            .field("label", &self.label)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

/// `Content-Transfer-Encoding` applied to a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferEncoding {
    SevenBit,
    QuotedPrintable,
    Base64,
}

impl TransferEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }
}

/// A body ready to be placed after the header block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBody {
    /// Transfer-encoded text, CRLF line endings, ASCII only.
    pub content: String,
    /// Charset label reported in `Content-Type`.
    pub charset: String,
    pub transfer_encoding: TransferEncoding,
}

fn to_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push_str("\r\n");
        }
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    out
}

/// Base64 encode `bytes`, wrapping at 76 characters per line.
pub fn encode_base64_lines(bytes: &[u8]) -> String {
    let encoded = BASE64_STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LEN * 2 + 2);
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LEN) {
        // base64 output is ASCII, so every chunk is valid UTF-8.
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push_str("\r\n");
    }
    out
}

/// Quoted-printable encode `bytes` (RFC 2045 §6.7).
///
/// Input lines are separated by CRLF, which is kept as a hard line break.
pub fn encode_quoted_printable(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3 / 2);
    let mut lines = bytes.split(|&b| b == b'\n').peekable();
    while let Some(line) = lines.next() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        encode_qp_line(line, &mut out);
        if lines.peek().is_some() {
            out.push_str("\r\n");
        }
    }
    out
}

fn encode_qp_line(line: &[u8], out: &mut String) {
    let mut column = 0;
    for (idx, &byte) in line.iter().enumerate() {
        let is_last = idx + 1 == line.len();
        let literal = match byte {
            b' ' | b'\t' => !is_last,
            b'=' => false,
            33..=126 => true,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };
        // Leave room for the `=` of a soft line break.
        if column + width > MAX_LINE_LEN - 1 {
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

/// Encode `text` as one or more RFC 2047 `utf-8`/base64 encoded words,
/// folded onto continuation lines.
pub fn encode_words(text: &str) -> String {
    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        let next = idx + ch.len_utf8();
        if next - start > ENCODED_WORD_CHUNK && end > start {
            words.push(encoded_word(&text[start..end]));
            start = end;
        }
        end = next;
    }
    if end > start || words.is_empty() {
        words.push(encoded_word(&text[start..end]));
    }
    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?b?{}?=", BASE64_STANDARD.encode(chunk.as_bytes()))
}

/// Replace CR and LF so a value cannot start a new header line.
pub fn sanitize_header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn utf8_body_is_base64() {
        let body = Charset::utf8().encode_body("accentu\u{e9}");
        assert_eq!(body.transfer_encoding, TransferEncoding::Base64);
        assert_eq!(body.content, "YWNjZW50dcOp\r\n");
        assert_eq!(body.charset, "utf-8");
    }

    #[test]
    fn latin1_body_is_quoted_printable() {
        let charset = Charset::for_label("iso-8859-1").expect("known charset");
        let body = charset.encode_body("accentu\u{e9}");
        assert_eq!(body.transfer_encoding, TransferEncoding::QuotedPrintable);
        assert_eq!(body.content, "accentu=E9");
        assert_eq!(body.charset, "iso-8859-1");
    }

    #[test]
    fn ascii_body_stays_seven_bit_with_crlf() {
        let body = Charset::utf8().encode_body("one\ntwo\r\nthree");
        assert_eq!(body.transfer_encoding, TransferEncoding::SevenBit);
        assert_eq!(body.content, "one\r\ntwo\r\nthree");
    }

    #[rstest]
    #[case("utf-16le")]
    #[case("iso-2022-jp")]
    #[case("klingon")]
    fn rejects_unusable_charsets(#[case] label: &str) {
        assert!(Charset::for_label(label).is_none());
    }

    #[test]
    fn quoted_printable_escapes_trailing_space_and_equals() {
        assert_eq!(encode_quoted_printable(b"a=b \r\nc"), "a=3Db=20\r\nc");
    }

    #[test]
    fn quoted_printable_inserts_soft_breaks() {
        let encoded = encode_quoted_printable(&[b'x'; 100]);
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with('='));
        assert!(lines.iter().all(|line| line.len() <= MAX_LINE_LEN));
        assert_eq!(encoded.replace("=\r\n", ""), "x".repeat(100));
    }

    #[test]
    fn base64_lines_are_wrapped() {
        let encoded = encode_base64_lines(&[0u8; 120]);
        assert!(encoded.split("\r\n").all(|line| line.len() <= MAX_LINE_LEN));
        assert_eq!(encoded.matches("\r\n").count(), 3);
    }

    #[test]
    fn short_subject_is_single_encoded_word() {
        assert_eq!(encode_words("accentu\u{e9}"), "=?utf-8?b?YWNjZW50dcOp?=");
    }

    #[test]
    fn long_subject_is_split_on_char_boundaries() {
        let subject = "\u{e9}".repeat(60);
        let encoded = encode_words(&subject);
        let words: Vec<&str> = encoded.split("\r\n ").collect();
        assert!(words.len() > 1);
        for word in &words {
            assert!(word.starts_with("=?utf-8?b?") && word.ends_with("?="));
            assert!(word.len() <= 75, "{word}");
            let payload = &word[10..word.len() - 2];
            let decoded = BASE64_STANDARD.decode(payload).expect("valid base64");
            assert!(String::from_utf8(decoded).is_ok(), "word split a character");
        }
    }

    #[test]
    fn header_values_cannot_inject_lines() {
        assert_eq!(sanitize_header_value("a\r\nBcc: x"), "a  Bcc: x");
    }
}
