//! Best-effort repair of almost-XML payloads.
//!
//! # Description
//!
//! sanitize-xml turns arbitrary, possibly malformed input claiming to be XML
//! into a well-formed, UTF-8-encoded document that a downstream XML parser
//! will not reject for encoding or character-validity reasons. It is meant to
//! sit in front of a parser/dispatcher that receives payloads from
//! uncontrolled clients, where "almost valid" documents (stray control
//! characters, lying encoding declarations) are common.
//!
//! The transform is a fixed, strictly forward pipeline:
//!
//! 1. *decode*: raw bytes of unknown encoding become Unicode text
//!    (see [`encoding`]);
//! 2. *normalize the prolog*: the XML declaration is located or created and
//!    its encoding forced to `UTF-8`, which also resolves the applicable
//!    [`XmlVersion`] (see [`prolog`]);
//! 3. *strip literals*: code points disallowed under that version are
//!    removed from the text (see [`strip_literals`]);
//! 4. *resolve references*: numeric character references denoting disallowed
//!    code points are removed, others are left untouched as markup
//!    (see [`resolve_references`]);
//! 5. *encode*: the surviving text is serialized as UTF-8.
//!
//! There is no failure outcome: every input produces output, and disallowed
//! content is silently removed rather than rejected. Callers that want
//! operational visibility into malformed input can supply a diagnostics sink
//! which receives at most one [`Diagnostic`] per call, describing the first
//! disallowed occurrence.
//!
//! # Examples
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use sanitize_xml::sanitize;
//!
//! // A missing declaration is created, a present one is rewritten
//! let out = sanitize("<hello>hi</hello>", None);
//! assert_eq!(out, b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><hello>hi</hello>".to_vec());
//!
//! let out = sanitize("<?xml version=\"1.0\" encoding=\"koi8-r\"?><r/>", None);
//! assert_eq!(out, b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><r/>".to_vec());
//! ```
//!
//! Diagnostics report the first disallowed occurrence only:
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use sanitize_xml::sanitize;
//!
//! let mut report = None;
//! let out = sanitize("hello\u{0}world", Some(&mut |d| report = Some(d.to_string())));
//! assert_eq!(out, b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>helloworld".to_vec());
//! assert_eq!(
//!     report.as_deref(),
//!     Some("Found first disallowed character '\\u{0}' at position 44"),
//! );
//! ```
//!
//! # Features
//!
//! `sanitize-xml` supports the following features:
//!
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!(
        feature_label = "<a id=\"{feature}\" href=\"#{feature}\"><strong><code>{feature}</code></strong></a>"
    ))
)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
// Enable feature requirements in the docs
// docs.rs defines `docsrs` when building documentation
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod encoding;
pub mod prolog;
pub mod sanitizer;
pub mod validation;

// reexports
pub use crate::sanitizer::{
    resolve_references, sanitize, strip_literals, Diagnostic, DiagnosticKind, DiagnosticSink,
    Input,
};

/// Version of XML standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum XmlVersion {
    /// [Version 1.0], which is the default version of XML document if XML declaration
    /// is missed. Most documents in the world are still XML 1.0 documents.
    ///
    /// [Version 1.0]: https://www.w3.org/TR/xml/
    V1_0,
    /// [Version 1.1](https://www.w3.org/TR/xml11/)
    V1_1,
}

impl XmlVersion {
    /// Resolves the version from the `version` token of an XML declaration.
    ///
    /// An absent token or exactly `1.0` selects [`V1_0`]; any other explicit
    /// token, including unrecognized future versions such as `1.2`, selects
    /// [`V1_1`], because whatever such a document turns out to be, the
    /// stricter character rules are the safe assumption.
    ///
    /// [`V1_0`]: Self::V1_0
    /// [`V1_1`]: Self::V1_1
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("1.0") => Self::V1_0,
            Some(_) => Self::V1_1,
        }
    }

    /// Checks whether `ch` may appear literally in the body of a document of
    /// this version.
    #[inline]
    pub fn is_allowed_literal(&self, ch: char) -> bool {
        match self {
            Self::V1_0 => validation::is_xml10_literal(ch),
            Self::V1_1 => validation::is_xml11_literal(ch),
        }
    }

    /// Checks whether `ch` may be denoted by a numeric character reference in
    /// a document of this version.
    ///
    /// The reference-allowed set is a superset of the literal-allowed set: in
    /// XML 1.1 the _[restricted characters]_ can be written as references even
    /// though they can never appear literally.
    ///
    /// [restricted characters]: https://www.w3.org/TR/xml11/#NT-RestrictedChar
    #[inline]
    pub fn is_allowed_reference(&self, ch: char) -> bool {
        match self {
            Self::V1_0 => validation::is_xml10_reference(ch),
            Self::V1_1 => validation::is_xml11_reference(ch),
        }
    }
}

impl Default for XmlVersion {
    #[inline]
    fn default() -> Self {
        Self::V1_0
    }
}
