//! Utility functions for integration tests
// Not all tests use all helpers
#![allow(dead_code)]

use sanitize_xml::{sanitize, Input};

/// Runs `sanitize` without a sink and returns the output as text. The output
/// is UTF-8 by contract, so the conversion cannot fail.
pub fn sanitize_str<'i>(input: impl Into<Input<'i>>) -> String {
    String::from_utf8(sanitize(input, None)).expect("output is UTF-8 by contract")
}

/// Runs `sanitize` with a sink and returns the output as text together with
/// the rendered diagnostic message, if one was reported.
pub fn sanitize_logged<'i>(input: impl Into<Input<'i>>) -> (String, Option<String>) {
    let mut message = None;
    let out = sanitize(input, Some(&mut |d| message = Some(d.to_string())));
    (
        String::from_utf8(out).expect("output is UTF-8 by contract"),
        message,
    )
}
