use super::Transformer;
use crate::error::TransformError;
use serde::de::IgnoredAny;
use serde_json::Deserializer;

/// ASCII record separator used by `application/json-seq`.
const RECORD_SEPARATOR: u8 = 0x1e;

/// JSON minifier.
///
/// The input is validated with `serde_json` and then stripped of
/// insignificant whitespace. Strings, numbers and member order are copied
/// byte-for-byte, so no precision is lost.
#[derive(Debug, Clone, Default)]
pub struct JsonMinifier {
    _priv: (),
}

impl JsonMinifier {
    /// Creates a new JSON minifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for JsonMinifier {
    fn transform(&self, _media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        for record in input.split(|b| *b == RECORD_SEPARATOR) {
            validate(record)?;
        }
        Ok(strip_whitespace(input))
    }
}

/// Checks that `record` is a sequence of zero or more well-formed JSON values.
fn validate(record: &[u8]) -> Result<(), TransformError> {
    for value in Deserializer::from_slice(record).into_iter::<IgnoredAny>() {
        value.map_err(|err| TransformError::with_source("invalid JSON", err))?;
    }
    Ok(())
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Bytes that can end or start a bare literal (number, `true`, `null`, ...).
fn is_literal_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'+' | b'-')
}

fn strip_whitespace(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_space = false;

    for &b in input {
        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if is_json_whitespace(b) {
            pending_space = true;
            continue;
        }

        // Keep one separator between adjacent top-level literals such as `1 2`.
        if pending_space
            && is_literal_byte(b)
            && out.last().is_some_and(|last| is_literal_byte(*last))
        {
            out.push(b' ');
        }
        pending_space = false;

        if b == b'"' {
            in_string = true;
        }
        out.push(b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(input: &str) -> Result<String, TransformError> {
        JsonMinifier::new()
            .transform("application/json", input.as_bytes())
            .map(|out| String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_object() {
        let input = r#"
            {
                "name": "John Doe",
                "age": 30,
                "isActive": true
            }
        "#;
        assert_eq!(
            minify(input).unwrap(),
            r#"{"name":"John Doe","age":30,"isActive":true}"#
        );
    }

    #[test]
    fn test_strings_untouched() {
        assert_eq!(
            minify(r#"[ "a  b", "q\" x ", "\\" , 1 ]"#).unwrap(),
            r#"["a  b","q\" x ","\\",1]"#
        );
    }

    #[test]
    fn test_numbers_preserved() {
        assert_eq!(
            minify("[ 12345678901234567890123 , 1.50e+10 ]").unwrap(),
            "[12345678901234567890123,1.50e+10]"
        );
    }

    #[test]
    fn test_value_stream() {
        assert_eq!(minify("1 2\n{ }\n[ ]").unwrap(), "1 2{}[]");
    }

    #[test]
    fn test_json_seq() {
        let input = "\u{1e}{ \"a\": 1 }\n\u{1e}{ \"b\": 2 }\n";
        assert_eq!(minify(input).unwrap(), "\u{1e}{\"a\":1}\u{1e}{\"b\":2}");
    }

    #[test]
    fn test_invalid() {
        assert!(minify(r#"{"a": }"#).is_err());
        assert!(minify(r#"{"a": "unterminated}"#).is_err());
    }

    #[test]
    fn test_fixed_point() {
        let once = minify(r#"{ "a" : [ 1, 2 ] }"#).unwrap();
        assert_eq!(minify(&once).unwrap(), once);
    }
}
