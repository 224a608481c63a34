//! Canonical JSON serialization for signed request bodies.
//!
//! The cyou gateway recomputes the signature over the body text it receives,
//! and its reference client serializes with `", "` / `": "` separators and
//! every non-ASCII character escaped as `\uXXXX` (UTF-16 units, lowercase
//! hex). The body is serialized once in this form and the same bytes are
//! both hashed and sent.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// `serde_json` formatter producing the gateway's canonical text.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            if start < i {
                writer.write_all(fragment[start..i].as_bytes())?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize `value` to its canonical JSON text.
pub fn to_canonical_string<T>(value: &T) -> serde_json::Result<String>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value.serialize(&mut serializer)?;
    // Only ASCII is ever written.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_separators() {
        let value = json!({"bodyArray": [{"content": "hi", "role": "user"}], "temperature": 0.7});
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"bodyArray": [{"content": "hi", "role": "user"}], "temperature": 0.7}"#
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(to_canonical_string(&json!([])).unwrap(), "[]");
        assert_eq!(to_canonical_string(&json!({})).unwrap(), "{}");
    }

    #[test]
    fn test_non_ascii_escaped() {
        assert_eq!(to_canonical_string("你是谁").unwrap(), r#""\u4f60\u662f\u8c01""#);
        assert_eq!(to_canonical_string("café").unwrap(), r#""caf\u00e9""#);
    }

    #[test]
    fn test_astral_plane_uses_surrogate_pair() {
        assert_eq!(to_canonical_string("😀").unwrap(), r#""\ud83d\ude00""#);
    }

    #[test]
    fn test_control_characters_keep_short_escapes() {
        assert_eq!(to_canonical_string("a\nb\t\"c\"").unwrap(), r#""a\nb\t\"c\"""#);
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(to_canonical_string(&1.0f64).unwrap(), "1.0");
        assert_eq!(to_canonical_string(&0.7f64).unwrap(), "0.7");
    }
}
