//! Locating and rewriting the XML declaration (the "prolog").
//!
//! The sanitizer re-encodes every document as UTF-8, so a declaration that
//! names any other encoding is wrong the moment the pipeline finishes.
//! [`normalize`] rewrites the `encoding` attribute to `UTF-8` (or inserts
//! one), prepends a whole declaration when none is present, and resolves the
//! [`XmlVersion`] that governs the character rules for the rest of the
//! pipeline.
//!
//! Attribute matching is substring-based and quote-insensitive on purpose:
//! the input is by definition not trusted to be well-formed, and a
//! declaration like `<?xml encoding='UTF-16"?>` still deserves repair.

use std::borrow::Cow;
use std::ops::Range;

use memchr::{memchr, memmem};

use crate::XmlVersion;

/// The declaration prepended to documents that have none.
const DEFAULT_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// The encoding attribute every output document ends up with.
const UTF8_ATTR: &str = "encoding=\"UTF-8\"";

/// A borrowed view of an XML declaration found at the very start of a
/// document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct XmlDecl<'i> {
    /// Attribute text between `<?xml` and `?>`, surrounding whitespace
    /// removed.
    attrs: &'i str,
    /// Byte length of the whole declaration including the `?>` terminator.
    len: usize,
}

impl<'i> XmlDecl<'i> {
    /// Matches a declaration only at the very start of `text`: literal
    /// `<?xml`, optional whitespace, a run of attribute text that cannot
    /// contain `?`, optional whitespace, `?>`.
    ///
    /// Returns `None` for anything else, including a `<?xml` whose first `?`
    /// is not immediately followed by `>`; such a document is treated as
    /// having no declaration at all.
    pub fn parse(text: &'i str) -> Option<Self> {
        let rest = text.strip_prefix("<?xml")?;
        let question = memchr(b'?', rest.as_bytes())?;
        if rest.as_bytes().get(question + 1) != Some(&b'>') {
            return None;
        }
        Some(XmlDecl {
            attrs: rest[..question].trim_matches(is_xml_space),
            len: "<?xml".len() + question + 2,
        })
    }

    /// The attribute text of the declaration, as written.
    pub fn attrs(&self) -> &'i str {
        self.attrs
    }

    /// Value of a `version` attribute, if one is present in the attribute
    /// text.
    pub fn version(&self) -> Option<&'i str> {
        find_attr(self.attrs, "version").map(|m| &self.attrs[m.value])
    }

    /// Byte length of the declaration within the source text.
    pub(crate) fn byte_len(&self) -> usize {
        self.len
    }

    /// The attribute text with any `encoding` value replaced by `UTF-8`, or
    /// with `encoding="UTF-8"` appended when there was none.
    fn fixed_attrs(&self) -> String {
        match find_attr(self.attrs, "encoding") {
            Some(m) => format!(
                "{}{}{}",
                &self.attrs[..m.span.start],
                UTF8_ATTR,
                &self.attrs[m.span.end..]
            ),
            None => format!("{} {}", self.attrs, UTF8_ATTR),
        }
    }
}

/// Rewrites the leading XML declaration of `text` so that it declares the
/// UTF-8 encoding, creating the declaration if the document has none, and
/// resolves the character-rule version.
///
/// The version token is inspected in the *rewritten* attribute text, so a
/// `version=` pattern hiding inside a discarded encoding value does not
/// count. Absent token or `1.0` selects [`XmlVersion::V1_0`], any other
/// token selects [`XmlVersion::V1_1`].
///
/// The text after the declaration is passed through byte-for-byte; when the
/// declaration is already in normal form the input is returned unchanged.
///
/// # Examples
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sanitize_xml::prolog::normalize;
/// use sanitize_xml::XmlVersion;
///
/// let (text, version) = normalize("<?xml encoding='koi8-r'?><r/>".into());
/// assert_eq!(text, "<?xml encoding=\"UTF-8\"?><r/>");
/// assert_eq!(version, XmlVersion::V1_0);
///
/// let (text, version) = normalize("<r/>".into());
/// assert_eq!(text, "<?xml version=\"1.0\" encoding=\"UTF-8\"?><r/>");
/// assert_eq!(version, XmlVersion::V1_0);
/// ```
pub fn normalize(text: Cow<'_, str>) -> (Cow<'_, str>, XmlVersion) {
    let (rebuilt, version) = match XmlDecl::parse(&text) {
        None => (
            Some(format!("{}{}", DEFAULT_DECL, text)),
            XmlVersion::V1_0,
        ),
        Some(decl) => {
            let attrs = decl.fixed_attrs();
            let version =
                XmlVersion::from_token(find_attr(&attrs, "version").map(|m| &attrs[m.value]));
            let head = format!("<?xml {}?>", attrs);
            if text[..decl.byte_len()] == head {
                (None, version)
            } else {
                (Some(format!("{}{}", head, &text[decl.byte_len()..])), version)
            }
        }
    };
    match rebuilt {
        Some(rebuilt) => (Cow::Owned(rebuilt), version),
        None => (text, version),
    }
}

/// A located `name = 'value'` attribute: the byte range of the whole match
/// and the byte range of the value between the quotes.
struct AttrMatch {
    span: Range<usize>,
    value: Range<usize>,
}

/// Finds `name`, `=` and a quoted value inside `attrs`.
///
/// `name` is matched as a bare substring and the quotes do not have to pair
/// up; the value ends at the first following quote of either kind. Multiple
/// occurrences of `name` are tried until one completes the pattern.
fn find_attr(attrs: &str, name: &str) -> Option<AttrMatch> {
    let bytes = attrs.as_bytes();
    for start in memmem::find_iter(bytes, name.as_bytes()) {
        let mut i = start + name.len();
        while matches!(bytes.get(i), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while matches!(bytes.get(i), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            i += 1;
        }
        if !matches!(bytes.get(i), Some(b'\'' | b'"')) {
            continue;
        }
        i += 1;
        let close = match bytes[i..].iter().position(|&b| matches!(b, b'\'' | b'"')) {
            Some(close) => i + close,
            None => continue,
        };
        return Some(AttrMatch {
            span: start..close + 1,
            value: i..close,
        });
    }
    None
}

fn is_xml_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

////////////////////////////////////////////////////////////////////////////////////////////////////
