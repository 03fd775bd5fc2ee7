//! The sanitization pipeline: decode, normalize the prolog, strip disallowed
//! literals, drop disallowed numeric character references, re-encode as
//! UTF-8.
//!
//! The pipeline is strictly linear and total: no stage can fail and no stage
//! revisits an earlier one. The two scanning stages are independent pure
//! functions that share only the resolved [`XmlVersion`] and the
//! "already reported" flag which guarantees that at most one [`Diagnostic`]
//! is emitted per [`sanitize`] call, with the literal scan taking precedence
//! over the reference scan.

use std::borrow::Cow;
use std::fmt;

use memchr::memmem;

use crate::{encoding, prolog, XmlVersion};

/// Raw input of the pipeline: either an opaque byte sequence of unspecified
/// encoding, or text that somebody else already decoded.
///
/// The distinction is resolved exactly once, at the decoder boundary;
/// nothing downstream ever asks again what the input was.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Input<'i> {
    /// Bytes of unknown encoding, subject to encoding detection.
    Bytes(&'i [u8]),
    /// Already-decoded text, passed through the decoder unchanged.
    Text(&'i str),
}

impl<'i> Input<'i> {
    /// Runs the input decoder, turning the input into Unicode text.
    ///
    /// Byte input goes through the heuristic detection chain of
    /// [`encoding::decode`]; text input is passed through untouched. Never
    /// fails.
    pub fn decode(self) -> Cow<'i, str> {
        match self {
            Self::Bytes(bytes) => encoding::decode(bytes),
            Self::Text(text) => Cow::Borrowed(text),
        }
    }
}

impl<'i> From<&'i [u8]> for Input<'i> {
    fn from(bytes: &'i [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'i, const N: usize> From<&'i [u8; N]> for Input<'i> {
    fn from(bytes: &'i [u8; N]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'i> From<&'i Vec<u8>> for Input<'i> {
    fn from(bytes: &'i Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'i> From<&'i str> for Input<'i> {
    fn from(text: &'i str) -> Self {
        Self::Text(text)
    }
}

impl<'i> From<&'i String> for Input<'i> {
    fn from(text: &'i String) -> Self {
        Self::Text(text)
    }
}

/// What kind of disallowed content a [`Diagnostic`] describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// A code point that appeared literally in the text.
    Literal,
    /// A numeric character reference (`&#NNN;` or `&#xHHH;`).
    Reference,
}

/// Description of the first disallowed occurrence found during a
/// [`sanitize`] call.
///
/// At most one diagnostic is reported per call, even when both scans find
/// something; the literal scan reports first. Its [`Display`] form is a
/// ready-made log message:
///
/// ```text
/// Found first disallowed character '\u{0}' at position 44
/// Found first disallowed character reference &#xB; at position 46
/// ```
///
/// [`Display`]: fmt::Display
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Whether a literal character or a numeric reference was found.
    pub kind: DiagnosticKind,
    /// The offending content: the debug rendering of the code point, or the
    /// verbatim reference text.
    pub text: String,
    /// 1-based character offset into the text the scan ran over.
    pub position: usize,
}

impl Diagnostic {
    fn literal(ch: char, position: usize) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Literal,
            text: format!("{:?}", ch),
            position,
        }
    }

    fn reference(text: &str, position: usize) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Reference,
            text: text.to_string(),
            position,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Literal => write!(
                f,
                "Found first disallowed character {} at position {}",
                self.text, self.position
            ),
            DiagnosticKind::Reference => write!(
                f,
                "Found first disallowed character reference {} at position {}",
                self.text, self.position
            ),
        }
    }
}

/// Diagnostics sink. Receives at most one [`Diagnostic`] per [`sanitize`]
/// call; the sink must not block, the caller makes no promise about the
/// thread it runs on.
pub type DiagnosticSink<'s> = dyn FnMut(Diagnostic) + 's;

/// Removes every code point that is disallowed as a literal under `version`.
///
/// If a sink is supplied, nothing has been reported yet for this call and a
/// disallowed code point exists, the first one is reported before any
/// mutation. When the whole text is allowed the input is returned unchanged
/// and the removal pass does not run at all.
pub fn strip_literals<'i>(
    text: Cow<'i, str>,
    version: XmlVersion,
    sink: Option<&mut DiagnosticSink>,
    reported: &mut bool,
) -> Cow<'i, str> {
    let first = text
        .chars()
        .enumerate()
        .find(|&(_, ch)| !version.is_allowed_literal(ch));
    let (position, ch) = match first {
        Some(first) => first,
        None => return text,
    };
    if !*reported {
        if let Some(sink) = sink {
            sink(Diagnostic::literal(ch, position + 1));
            *reported = true;
        }
    }
    Cow::Owned(
        text.chars()
            .filter(|&ch| version.is_allowed_literal(ch))
            .collect(),
    )
}

/// Deletes numeric character references that denote code points disallowed
/// under `version`; every other reference is preserved verbatim. References
/// are only validated here, never expanded: expansion belongs to the
/// downstream parser.
///
/// A disallowed reference is deleted whole, markup and digits, and scanning
/// resumes at the deletion point so that a reference whose text becomes
/// contiguous through the deletion is still found. An allowed reference is
/// skipped over entirely.
///
/// If a sink is supplied and no disallowed occurrence (literal or reference)
/// has been reported yet for this call, the first disallowed reference is
/// reported with its verbatim text and its 1-based character position.
pub fn resolve_references<'i>(
    text: Cow<'i, str>,
    version: XmlVersion,
    mut sink: Option<&mut DiagnosticSink>,
    reported: &mut bool,
) -> Cow<'i, str> {
    let mut text = text;
    let mut pos = 0;
    while let Some(reference) = find_reference(&text, pos) {
        if matches!(reference.value, Some(ch) if version.is_allowed_reference(ch)) {
            pos = reference.end;
            continue;
        }
        if !*reported {
            if let Some(sink) = sink.as_deref_mut() {
                let position = text[..reference.start].chars().count() + 1;
                sink(Diagnostic::reference(
                    &text[reference.start..reference.end],
                    position,
                ));
                *reported = true;
            }
        }
        text.to_mut()
            .replace_range(reference.start..reference.end, "");
        pos = reference.start;
    }
    text
}

/// Repairs arbitrary, possibly malformed input claiming to be XML into a
/// well-formed, UTF-8-encoded document.
///
/// The returned bytes always start with a `<?xml ... encoding="UTF-8"?>`
/// declaration, contain no code point disallowed as a literal under the
/// resolved version, and contain no numeric character reference that
/// resolves to a disallowed code point. The transform is pure, synchronous
/// and total; applying it to its own output returns the output unchanged.
///
/// A request dispatcher would typically pass every inbound payload through
/// this function before handing the result to its deserialization path, with
/// `sink` funneling into its operational log.
///
/// # Examples
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sanitize_xml::sanitize;
///
/// let out = sanitize(b"<?xml encoding='UTF-8'?><hello>hi</hello>", None);
/// assert_eq!(out, b"<?xml encoding=\"UTF-8\"?><hello>hi</hello>".to_vec());
/// ```
///
/// With a diagnostics sink:
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sanitize_xml::sanitize;
///
/// let mut messages = Vec::new();
/// let out = sanitize("<hello>&#xB;</hello>", Some(&mut |d| messages.push(d.to_string())));
/// assert_eq!(out, b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><hello></hello>".to_vec());
/// assert_eq!(
///     messages,
///     ["Found first disallowed character reference &#xB; at position 46"],
/// );
/// ```
pub fn sanitize<'i, I>(input: I, mut sink: Option<&mut DiagnosticSink>) -> Vec<u8>
where
    I: Into<Input<'i>>,
{
    let text = input.into().decode();
    let (text, version) = prolog::normalize(text);
    let mut reported = false;
    let text = strip_literals(text, version, sink.as_deref_mut(), &mut reported);
    let text = resolve_references(text, version, sink, &mut reported);
    // every surviving code point is a Unicode scalar value inside the allowed
    // ranges, so UTF-8 serialization cannot fail
    text.into_owned().into_bytes()
}

/// A numeric character reference located in the text: the byte range of the
/// whole `&#...;` match and the code point it denotes, if the numeric value
/// is a Unicode scalar value at all.
struct Reference {
    start: usize,
    end: usize,
    value: Option<char>,
}

/// Finds the next numeric character reference at or after byte offset
/// `from`.
///
/// A reference is `&#`, an optional lowercase `x`, one or more digits
/// (decimal, or hexadecimal after the `x`; leading zeros permitted) and `;`.
/// Anything else (`&#X41;`, `&#1a;`, `&amp;`) is not a reference and is
/// skipped over.
fn find_reference(text: &str, from: usize) -> Option<Reference> {
    let bytes = text.as_bytes();
    let mut search = from;
    while let Some(found) = memmem::find(&bytes[search..], b"&#") {
        let start = search + found;
        if let Some(reference) = parse_reference(text, start) {
            return Some(reference);
        }
        // `&` cannot reappear before start + 2
        search = start + 2;
    }
    None
}

/// Parses the reference starting exactly at `start`, which points at `&#`.
fn parse_reference(text: &str, start: usize) -> Option<Reference> {
    let bytes = text.as_bytes();
    let mut i = start + 2;
    let hex = bytes.get(i) == Some(&b'x');
    if hex {
        i += 1;
    }
    let digits = i;
    while bytes.get(i).map_or(false, |b| {
        if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        }
    }) {
        i += 1;
    }
    if i == digits || bytes.get(i) != Some(&b';') {
        return None;
    }
    let radix = if hex { 16 } else { 10 };
    // an overflowing value cannot be a scalar value, hence `None` and the
    // reference is treated as disallowed
    let value = u32::from_str_radix(&text[digits..i], radix)
        .ok()
        .and_then(char::from_u32);
    Some(Reference {
        start,
        end: i + 1,
        value,
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////
