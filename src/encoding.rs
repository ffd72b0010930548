//! # Canonical encoding of claim maps
//!
//! A claim map is serialized as compact JSON with sorted keys and no
//! whitespace, then base64url-encoded without padding. Non-ASCII characters
//! and DEL are written as `\uXXXX` escapes so the text is printable ASCII;
//! any verifier rebuilding the same map gets the same bytes and therefore the
//! same digest.
//!
//! Every `=` is removed from the JSON text before it is base64-encoded. Values
//! containing `=` are altered by this, and existing edge verifiers depend on
//! it, so it stays.

use crate::claims::ClaimsMap;
use crate::error::{Error, Result};
use ct_codecs::{Base64UrlSafeNoPadding, Decoder, Encoder};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// Compact JSON formatter that escapes every non-ASCII character and DEL.
struct AsciiFormatter;

// Control characters below 0x20 never reach the formatter unescaped
fn is_printable_ascii(b: u8) -> bool {
    b < 0x7f
}

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(is_printable_ascii) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() && is_printable_ascii(c as u8) {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize a claim map to canonical JSON.
///
/// # Example
///
/// ```
/// use qsig::{encoding, ClaimValue};
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert("typ".to_string(), ClaimValue::from("all"));
/// map.insert("exp".to_string(), ClaimValue::from(100120));
///
/// let json = encoding::to_canonical_json(&map).unwrap();
/// assert_eq!(json, r#"{"exp":100120,"typ":"all"}"#);
/// ```
pub fn to_canonical_json(map: &ClaimsMap) -> Result<String> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    map.serialize(&mut ser)?;

    String::from_utf8(buf).map_err(|e| Error::Encoding(format!("JSON is not UTF-8: {e}")))
}

/// Base64url-encode bytes without padding
pub fn encode_bytes(bytes: &[u8]) -> Result<String> {
    Ok(Base64UrlSafeNoPadding::encode_to_string(bytes)?)
}

/// Encode a claim map into a token segment.
///
/// # Example
///
/// ```
/// use qsig::{encoding, Header};
///
/// let segment = encoding::encode_segment(Header::new().as_map()).unwrap();
/// assert_eq!(segment, "eyJhbGciOiJIUzI1NiJ9");
/// ```
pub fn encode_segment(map: &ClaimsMap) -> Result<String> {
    let json = to_canonical_json(map)?;
    encode_bytes(json.replace('=', "").as_bytes())
}

/// Decode a token segment back into a claim map.
///
/// Intended for inspecting tokens produced by this crate; it does not check
/// any signature.
pub fn decode_segment(segment: &str) -> Result<ClaimsMap> {
    let bytes = Base64UrlSafeNoPadding::decode_to_vec(segment, None)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimValue;

    fn map(entries: &[(&str, ClaimValue)]) -> ClaimsMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_keys_sorted_and_compact() {
        let claims = map(&[
            ("typ", ClaimValue::from("sgn")),
            ("cnt", ClaimValue::from(3)),
            ("kid", ClaimValue::from(0)),
            ("exp", ClaimValue::from(1_700_000_000i64)),
        ]);

        assert_eq!(
            to_canonical_json(&claims).unwrap(),
            r#"{"cnt":3,"exp":1700000000,"kid":0,"typ":"sgn"}"#
        );
    }

    #[test]
    fn test_non_ascii_escaped_like_legacy_producer() {
        let claims = map(&[("a", ClaimValue::from("é😀"))]);
        assert_eq!(
            to_canonical_json(&claims).unwrap(),
            r#"{"a":"\u00e9\ud83d\ude00"}"#
        );

        let claims = map(&[("a", ClaimValue::from("x\u{7f}y"))]);
        assert_eq!(to_canonical_json(&claims).unwrap(), r#"{"a":"x\u007fy"}"#);
    }

    #[test]
    fn test_control_and_quote_escapes() {
        let claims = map(&[("rgx", ClaimValue::from("a\"b\\d\n\u{1f}"))]);
        assert_eq!(
            to_canonical_json(&claims).unwrap(),
            r#"{"rgx":"a\"b\\d\n\u001f"}"#
        );
    }

    #[test]
    fn test_equals_stripped_before_encoding() {
        let claims = map(&[("q", ClaimValue::from("a=b"))]);
        let segment = encode_segment(&claims).unwrap();
        let decoded = Base64UrlSafeNoPadding::decode_to_vec(&segment, None).unwrap();
        assert_eq!(decoded, br#"{"q":"ab"}"#);
    }

    #[test]
    fn test_segment_has_no_padding() {
        // {"a":1} is 7 bytes, which would need two padding characters
        let segment = encode_segment(&map(&[("a", ClaimValue::from(1))])).unwrap();
        assert_eq!(segment, "eyJhIjoxfQ");
        assert!(!segment.contains('='));
    }

    #[test]
    fn test_decode_segment_round_trip() {
        let claims = map(&[
            ("cip", ClaimValue::from("10.0.0.1")),
            ("exp", ClaimValue::from(100120)),
            ("rgx", ClaimValue::from("/v/(\\d+)/é")),
        ]);
        let decoded = decode_segment(&encode_segment(&claims).unwrap()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_segment_rejects_garbage() {
        assert!(decode_segment("!!!").is_err());
        // valid base64url, not JSON
        assert!(decode_segment("bm90IGpzb24").is_err());
    }
}
