use crate::ParseError;

/// Percent-decode `raw`, refusing anything ambiguous.
///
/// Every `%` must start a two-hex-digit escape and the decoded bytes must be
/// valid UTF-8. Anything else is [`ParseError::MalformedEncoding`]; raw bytes
/// are never passed through.
pub fn decode_strict(raw: &str) -> Result<String, ParseError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape_ok = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !escape_ok {
                return Err(ParseError::MalformedEncoding {
                    reason: format!("'%' at byte {i} is not followed by two hex digits"),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ParseError::MalformedEncoding {
            reason: format!("escapes decode to invalid UTF-8: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(decode_strict("call-mom_by_friday").unwrap(), "call-mom_by_friday");
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(decode_strict("finish%20report").unwrap(), "finish report");
        assert_eq!(decode_strict("caf%C3%A9").unwrap(), "café");
        assert_eq!(decode_strict("100%25").unwrap(), "100%");
    }

    #[test]
    fn plus_is_not_a_space() {
        assert_eq!(decode_strict("a+b").unwrap(), "a+b");
    }

    #[test]
    fn rejects_bad_escapes() {
        for bad in ["foo%bar", "trailing%", "short%4", "%zz", "50%-off"] {
            assert!(
                matches!(decode_strict(bad), Err(ParseError::MalformedEncoding { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            decode_strict("%C3%28"),
            Err(ParseError::MalformedEncoding { .. })
        ));
        assert!(matches!(
            decode_strict("%FF"),
            Err(ParseError::MalformedEncoding { .. })
        ));
    }
}
