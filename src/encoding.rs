//! Turns raw bytes of unknown and possibly misdeclared encoding into
//! Unicode text.
//!
//! Detection is heuristic and deliberately forgiving: a byte-order mark wins,
//! then a BOM-less UTF-16 byte pattern, then an `encoding` label declared
//! inside a leading XML declaration, then plain UTF-8 validation. When every
//! signal fails the bytes are decoded as Windows-1252, which maps all 256
//! byte values and therefore cannot reject anything. [`decode`] consequently
//! never fails.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use memchr::memmem;

/// UTF-8 byte order mark.
pub(crate) const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian byte order mark.
pub(crate) const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
/// UTF-16 big-endian byte order mark.
pub(crate) const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Detects the encoding from a byte-order mark or, for BOM-less UTF-16, from
/// the byte pattern of a leading `<?` pair.
///
/// Returns `None` when the start of `bytes` carries no such signal; the
/// caller then falls back to declared-label sniffing and content heuristics.
pub fn detect_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.starts_with(UTF8_BOM) {
        return Some(UTF_8);
    }
    if bytes.starts_with(UTF16_LE_BOM) {
        return Some(UTF_16LE);
    }
    if bytes.starts_with(UTF16_BE_BOM) {
        return Some(UTF_16BE);
    }
    match bytes {
        [b'<', 0x00, b'?', 0x00, ..] => Some(UTF_16LE),
        [0x00, b'<', 0x00, b'?', ..] => Some(UTF_16BE),
        _ => None,
    }
}

/// Extracts the encoding declared by an `encoding="..."` attribute of a
/// leading `<?xml ...?>` declaration and resolves it against the WHATWG
/// label registry.
///
/// Only works for ASCII-compatible payloads, which is fine: non-ASCII-
/// compatible encodings are recognized by [`detect_encoding`] instead.
pub fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let decl = &bytes[..memmem::find(bytes, b"?>")?];
    for pos in memmem::find_iter(decl, b"encoding") {
        if let Some(label) = quoted_value(&decl[pos + b"encoding".len()..]) {
            return Encoding::for_label(label);
        }
    }
    None
}

/// Matches `\s*=\s*` followed by a quoted value at the start of `bytes` and
/// returns the value. The closing quote is the first following quote of
/// either kind.
fn quoted_value(bytes: &[u8]) -> Option<&[u8]> {
    let mut i = 0;
    while matches!(bytes.get(i), Some(b' ' | b'\t' | b'\r' | b'\n')) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i += 1;
    while matches!(bytes.get(i), Some(b' ' | b'\t' | b'\r' | b'\n')) {
        i += 1;
    }
    if !matches!(bytes.get(i), Some(b'\'' | b'"')) {
        return None;
    }
    i += 1;
    let value = &bytes[i..];
    let end = value.iter().position(|&b| matches!(b, b'\'' | b'"'))?;
    Some(&value[..end])
}

/// Decodes `bytes` to Unicode text, best effort.
///
/// The detection chain is BOM / UTF-16 pattern, then declared label, then
/// strict UTF-8, then Windows-1252. A recognized BOM is consumed and does not
/// appear in the text. Malformed sequences on the BOM paths are substituted
/// with `U+FFFD`; a declared label that does not actually decode the payload
/// is discarded and the chain continues. This function cannot fail.
///
/// # Examples
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sanitize_xml::encoding::decode;
///
/// // Valid UTF-8 is borrowed through unchanged
/// assert_eq!(decode("caf\u{e9}".as_bytes()), "caf\u{e9}");
/// // Anything else falls back to Windows-1252, here `0x80` is the Euro sign
/// assert_eq!(decode(b"hello\x80world"), "hello\u{20AC}world");
/// ```
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    if let Some(encoding) = detect_encoding(bytes) {
        let (text, _, _) = encoding.decode(bytes);
        return text;
    }
    if let Some(encoding) = declared_encoding(bytes) {
        // A UTF-16 label on a byte stream that did not look like UTF-16 is
        // a lie; trust ASCII-compatible declarations only
        if encoding.is_ascii_compatible() {
            if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes)
            {
                return text;
            }
        }
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        // Windows-1252 maps every byte value, this cannot lose data
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
