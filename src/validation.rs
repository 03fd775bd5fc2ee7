//! Character-class predicates drawn from the XML 1.0 and 1.1 grammars.
//!
//! Two predicate families exist per version: _literal-allowed_ (the code
//! point may appear directly in the document body) and _reference-allowed_
//! (the code point may be denoted by a numeric character reference such as
//! `&#xB;`). The reference-allowed set is always a superset of the
//! literal-allowed set.
//!
//! Note that unlike the `Char` productions of the specifications, these sets
//! stop at `U+FFFD`: supplementary-plane characters are treated as
//! disallowed and are stripped by the sanitizer.

/// Checks if the character is allowed to appear literally in a document
/// governed by the XML 1.0 character rules.
///
/// Tab, LF, CR, `0x20..=0x7E`, `0xA0..=0xD7FF` and `0xE000..=0xFFFD`,
/// plus the `0x7F..=0x9F` block which [XML 1.0] never singled out.
///
/// [XML 1.0]: https://www.w3.org/TR/xml/#NT-Char
pub fn is_xml10_literal(ch: char) -> bool {
    matches!(ch,
        '\u{09}' | '\u{0A}' | '\u{0D}'
        | '\u{0020}'..='\u{007E}'
        | '\u{007F}'..='\u{009F}'
        | '\u{00A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
    )
}

/// Checks if the character is allowed to appear literally in a document
/// governed by the XML 1.1 character rules.
///
/// Tab, LF, CR, `0x20..=0x7E`, `0xA0..=0xD7FF` and `0xE000..=0xFFFD`, plus
/// NEL (`0x85`). The remaining `0x7F..=0x9F` controls are _[restricted]_ in
/// XML 1.1 and must be escaped, see [`is_xml11_reference`].
///
/// [restricted]: https://www.w3.org/TR/xml11/#NT-RestrictedChar
pub fn is_xml11_literal(ch: char) -> bool {
    matches!(ch,
        '\u{09}' | '\u{0A}' | '\u{0D}'
        | '\u{0020}'..='\u{007E}'
        | '\u{85}'
        | '\u{00A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
    )
}

/// Checks if the character may be denoted by a numeric character reference
/// under the XML 1.0 rules.
///
/// XML 1.0 has no escaping concession: the set is identical to
/// [`is_xml10_literal`].
#[inline]
pub fn is_xml10_reference(ch: char) -> bool {
    is_xml10_literal(ch)
}

/// Checks if the character may be denoted by a numeric character reference
/// under the XML 1.1 rules.
///
/// Everything allowed literally, plus the _[restricted characters]_
/// `0x01..=0x1F` and `0x7F..=0x9F`, which XML 1.1 admits in escaped form
/// only. NUL is excluded even here.
///
/// [restricted characters]: https://www.w3.org/TR/xml11/#NT-RestrictedChar
#[inline]
pub fn is_xml11_reference(ch: char) -> bool {
    is_xml11_literal(ch) || matches!(ch, '\u{01}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
}

////////////////////////////////////////////////////////////////////////////////////////////////////
