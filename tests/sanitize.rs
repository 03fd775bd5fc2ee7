//! End-to-end tests of the whole sanitization pipeline, including the corpus
//! of malformed payloads the crate was written to repair.

use sanitize_xml::{sanitize, XmlVersion};

mod helpers;
use helpers::{sanitize_logged, sanitize_str};

const DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

mod prolog {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quote_style_is_normalized() {
        assert_eq!(
            sanitize_str(b"<?xml encoding='UTF-8'?><hello>hi</hello>"),
            "<?xml encoding=\"UTF-8\"?><hello>hi</hello>"
        );
        // already-decoded text goes the same way
        assert_eq!(
            sanitize_str("<?xml encoding='UTF-8'?><hello>hi</hello>"),
            "<?xml encoding=\"UTF-8\"?><hello>hi</hello>"
        );
    }

    #[test]
    fn foreign_encoding_declarations_are_overwritten() {
        for input in [
            "<?xml encoding='UTF-16'?><hello>hi</hello>",
            "<?xml encoding=\"UTF-16\"?><hello>hi</hello>",
            "<?xml encoding=\"blah\"?><hello>hi</hello>",
            "<?xml encoding=\"blah\" ?><hello>hi</hello>",
        ] {
            assert_eq!(
                sanitize_str(input.as_bytes()),
                "<?xml encoding=\"UTF-8\"?><hello>hi</hello>",
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn version_survives_the_rewrite() {
        assert_eq!(
            sanitize_str(b"<?xml version=\"1.0\" encoding=\"blah\" ?><hello>hi</hello>"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><hello>hi</hello>"
        );
        assert_eq!(
            sanitize_str(b"<?xml version=\"1.1\" encoding=\"blah\" ?><hello>hi</hello>"),
            "<?xml version=\"1.1\" encoding=\"UTF-8\"?><hello>hi</hello>"
        );
    }

    #[test]
    fn missing_declaration_is_created() {
        assert_eq!(
            sanitize_str(b"<hello>hi</hello>"),
            format!("{}<hello>hi</hello>", DECL)
        );
        // even for content that is not XML at all
        assert_eq!(sanitize_str("\u{2026}"), format!("{}\u{2026}", DECL));
        assert_eq!(sanitize_str(""), DECL);
    }
}

mod literals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nul_is_stripped_and_reported() {
        let (out, message) = sanitize_logged(b"hello\x00world");
        assert_eq!(out, format!("{}helloworld", DECL));
        assert_eq!(
            message.as_deref(),
            Some("Found first disallowed character '\\u{0}' at position 44")
        );
    }

    #[test]
    fn del_is_allowed_in_10_but_not_in_11() {
        let (out, message) =
            sanitize_logged(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><hello>\x7f</hello>");
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><hello>\u{7f}</hello>"
        );
        assert_eq!(message, None);

        let (out, message) = sanitize_logged(b"<?xml version=\"1.1\"?><hello>\x7f</hello>");
        assert_eq!(out, "<?xml version=\"1.1\" encoding=\"UTF-8\"?><hello></hello>");
        assert_eq!(
            message.as_deref(),
            Some("Found first disallowed character '\\u{7f}' at position 46")
        );
    }

    /// As *bytes*, `0x80` is not valid UTF-8, so the decoder reads the
    /// payload as Windows-1252 and the byte comes out as a Euro sign, which
    /// is perfectly allowed.
    #[test]
    fn undecodable_byte_becomes_windows_1252() {
        let (out, message) = sanitize_logged(b"hello\x80world");
        assert_eq!(out, format!("{}hello\u{20AC}world", DECL));
        assert_eq!(message, None);
    }

    /// As already-decoded *text*, `U+0080` reaches the ruleset unscathed: a
    /// C1 control that XML 1.0 tolerates and XML 1.1 rejects.
    #[test]
    fn c1_control_as_text_depends_on_version() {
        let (out, message) = sanitize_logged("hello\u{80}world");
        assert_eq!(out, format!("{}hello\u{80}world", DECL));
        assert_eq!(message, None);

        let (out, message) = sanitize_logged("<?xml version=\"1.1\" ?>hello\u{80}world");
        assert_eq!(out, "<?xml version=\"1.1\" encoding=\"UTF-8\"?>helloworld");
        assert_eq!(
            message.as_deref(),
            Some("Found first disallowed character '\\u{80}' at position 44")
        );
    }

    #[test]
    fn astral_characters_are_stripped() {
        let (out, message) = sanitize_logged("<hello>\u{1F600}</hello>");
        assert_eq!(out, format!("{}<hello></hello>", DECL));
        assert!(message.is_some());
    }

    /// Unrecognized version tokens get the stricter 1.1 treatment.
    #[test]
    fn future_versions_use_the_strict_rules() {
        let (out, _) = sanitize_logged("<?xml version=\"1.2\"?><hello>\u{7f}</hello>");
        assert_eq!(out, "<?xml version=\"1.2\" encoding=\"UTF-8\"?><hello></hello>");
    }
}

mod references {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vertical_tab_reference_is_deleted_under_10() {
        let (out, message) = sanitize_logged(b"<hello>&#xB;</hello>");
        assert_eq!(out, format!("{}<hello></hello>", DECL));
        assert_eq!(
            message.as_deref(),
            Some("Found first disallowed character reference &#xB; at position 46")
        );
    }

    #[test]
    fn vertical_tab_reference_is_preserved_under_11() {
        let (out, message) = sanitize_logged("<?xml version=\"1.1\"?><hello>&#xB;</hello>");
        assert_eq!(
            out,
            "<?xml version=\"1.1\" encoding=\"UTF-8\"?><hello>&#xB;</hello>"
        );
        assert_eq!(message, None);
    }

    #[test]
    fn leading_zeros_are_recognized() {
        let (out, message) = sanitize_logged(b"<hello>&#x0;&#x01;&#x007;</hello>");
        assert_eq!(out, format!("{}<hello></hello>", DECL));
        assert_eq!(
            message.as_deref(),
            Some("Found first disallowed character reference &#x0; at position 46")
        );
    }

    #[test]
    fn named_entities_are_not_touched() {
        assert_eq!(
            sanitize_str(b"<a>&amp;&lt;&unknown;</a>"),
            format!("{}<a>&amp;&lt;&unknown;</a>", DECL)
        );
    }

    /// The literal scan wins the single diagnostic slot even when a
    /// disallowed reference appears earlier in the text.
    #[test]
    fn literal_diagnostic_takes_precedence() {
        let (out, message) = sanitize_logged("<a>&#x0;</a>\u{1}");
        assert_eq!(out, format!("{}<a></a>", DECL));
        assert_eq!(
            message.as_deref(),
            Some("Found first disallowed character '\\u{1}' at position 51")
        );
    }
}

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_idempotent(input: &[u8]) {
        let once = sanitize(input, None);
        let twice = sanitize(&once, None);
        assert_eq!(once, twice, "input {:?}", input);
    }

    #[test]
    fn idempotence() {
        for input in [
            &b"<?xml encoding='UTF-8'?><hello>hi</hello>"[..],
            b"<hello>hi</hello>",
            b"<?xml?>",
            b"hello\x00world",
            b"hello\x80world",
            b"\xEF\xBB\xBF<r/>",
            b"\xFF\xFE<\x00r\x00/\x00>\x00",
            b"<?xml version=\"1.1\"?><hello>\x7f&#xB;&#x1;</hello>",
            b"&#1;&#2;&#3;",
            b"<?xml version=\"1.2\"?>&#x85;",
        ] {
            assert_idempotent(input);
        }
    }

    #[test]
    fn output_always_starts_with_a_utf8_declaration() {
        for input in [
            &b""[..],
            b"no xml here",
            b"<?xml",
            b"<?xml version=\"1.0?\"?><r/>",
            b"\x00\x01\x02",
            b"<?xml encoding='UTF-16'?><r/>",
        ] {
            let out = sanitize_str(input);
            assert!(out.starts_with("<?xml "), "input {:?}: {:?}", input, out);
            let decl_end = out.find("?>").expect("declaration is terminated");
            assert!(
                out[..decl_end].contains("encoding=\"UTF-8\""),
                "input {:?}: {:?}",
                input,
                out
            );
        }
    }

    /// Whatever goes in, no disallowed literal survives in the output.
    #[test]
    fn no_disallowed_literals_survive() {
        for i in 0..=0x10FFFFu32 {
            let ch = match char::from_u32(i) {
                Some(ch) => ch,
                None => continue,
            };
            let out = sanitize_str(format!("a{}b", ch).as_str());
            let expected = if XmlVersion::V1_0.is_allowed_literal(ch) {
                format!("{}a{}b", DECL, ch)
            } else {
                format!("{}ab", DECL)
            };
            assert_eq!(out, expected, "character 0x{:x}", i);
        }
    }

    /// References either survive verbatim or disappear without a trace,
    /// strictly according to the reference-allowed set of the version.
    #[test]
    fn references_match_the_reference_allowed_set() {
        // the low controls where the versions disagree, plus the boundaries
        // of every allowed range
        let samples = (0..=0x200u32).chain([
            0xD7FF, 0xD800, 0xDFFF, 0xE000, 0xFFFD, 0xFFFE, 0xFFFF, 0x10000, 0x10FFFF, 0x110000,
        ]);
        for i in samples {
            for (version, decl) in [
                (XmlVersion::V1_0, "<?xml version=\"1.0\"?>"),
                (XmlVersion::V1_1, "<?xml version=\"1.1\"?>"),
            ] {
                let reference = format!("&#x{:X};", i);
                let out = sanitize_str(format!("{}<a>{}</a>", decl, reference).as_str());
                let allowed = matches!(
                    char::from_u32(i), Some(ch) if version.is_allowed_reference(ch)
                );
                assert_eq!(
                    out.contains(&reference),
                    allowed,
                    "reference {} under {:?}: {:?}",
                    reference,
                    version,
                    out
                );
            }
        }
    }

    #[test]
    fn at_most_one_diagnostic_per_call() {
        let mut messages = Vec::new();
        sanitize(
            b"\x00\x01<a>&#x0;&#x1;</a>\x02",
            Some(&mut |d| messages.push(d.to_string())),
        );
        assert_eq!(
            messages,
            ["Found first disallowed character '\\u{0}' at position 39"]
        );
    }
}
