// src/utils/encoding.rs
//! Wire encodings shared by the signing and verification paths.
//!
//! The canonical percent-encoding is part of the wire format: the signer and
//! the verifier must produce byte-identical messages, so every encoded field
//! goes through [`encode_component`] and nothing else.
//!
//! - Unreserved characters (`A-Z a-z 0-9 - . _ ~`) pass through unchanged
//! - Every other byte of the UTF-8 input becomes `%XX` with upper-case hex
//! - Space is `%20`, never `+`

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Bytes left untouched by the canonical encoding (RFC 3986 unreserved set).
const CANONICAL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reasons an inbound encoded value could not be turned back into bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("encoded value is empty")]
    Empty,

    #[error("percent-decoded value is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid base64: {0}")]
    InvalidBase64(String),
}

/// Percent-encodes a single message field with the canonical set.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, CANONICAL).to_string()
}

/// Reverses [`encode_component`].
///
/// Malformed escapes such as `%zz` are passed through literally, matching the
/// behaviour of the `percent-encoding` crate.
pub fn decode_component(value: &str) -> Result<String, EncodingError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| EncodingError::InvalidUtf8)
}

/// Decodes a form-encoded value, where `+` stands for a space.
///
/// A literal plus sign has to arrive as `%2B`.
pub fn decode_form_component(value: &str) -> Result<String, EncodingError> {
    decode_component(&value.replace('+', " "))
}

/// Encodes raw signature bytes for transport inside a URL query value.
///
/// Base64 output may contain `+`, `/` and `=`, so the base64 text is
/// percent-encoded on top.
pub fn encode_signature(signature: &[u8]) -> String {
    encode_component(&base64::encode(signature))
}

/// Turns transported signature text back into raw signature bytes.
///
/// Percent-decoding an already-decoded base64 string is a no-op because the
/// base64 alphabet contains no `%`, so values that went through one layer of
/// query-string decoding upstream are accepted too. ASCII whitespace is
/// ignored to tolerate line-wrapped base64.
pub fn decode_signature(text: &str) -> Result<Vec<u8>, EncodingError> {
    let decoded = decode_component(text)?;
    let compact: String = decoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if compact.is_empty() {
        return Err(EncodingError::Empty);
    }

    base64::decode(&compact).map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_is_percent_twenty() {
        assert_eq!(encode_component("Jane Doe"), "Jane%20Doe");
    }

    #[test]
    fn test_unreserved_pass_through() {
        assert_eq!(encode_component("Comirnaty-1.0_a~b"), "Comirnaty-1.0_a~b");
        assert_eq!(encode_component("2024-03-01"), "2024-03-01");
    }

    #[test]
    fn test_reserved_and_non_ascii_are_escaped() {
        assert_eq!(encode_component("a+b/c=d&e"), "a%2Bb%2Fc%3Dd%26e");
        assert_eq!(encode_component("José"), "Jos%C3%A9");
    }

    #[test]
    fn test_decode_component_reverses_encoding() {
        let original = "Maria José & Co / 50%";
        let encoded = encode_component(original);
        assert_eq!(decode_component(&encoded).unwrap(), original);
    }

    #[test]
    fn test_form_decoding_treats_plus_as_space() {
        assert_eq!(decode_form_component("Jane+Doe").unwrap(), "Jane Doe");
        assert_eq!(decode_form_component("Jane%20Doe").unwrap(), "Jane Doe");
        assert_eq!(decode_form_component("A%2BB").unwrap(), "A+B");
        assert_eq!(
            decode_form_component("%FF%FE"),
            Err(EncodingError::InvalidUtf8)
        );
    }

    #[test]
    fn test_signature_text_is_url_safe() {
        // 0xfb 0xff yields "+/8=" in standard base64
        let encoded = encode_signature(&[0xfb, 0xff]);
        assert_eq!(encoded, "%2B%2F8%3D");
        assert_eq!(decode_signature(&encoded).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_signature_accepts_single_decoded_text() {
        assert_eq!(decode_signature("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_signature_ignores_line_wrapping() {
        let bytes: Vec<u8> = (0u8..96).collect();
        let mut wrapped = base64::encode(&bytes);
        wrapped.insert(60, '\n');
        wrapped.push('\n');
        assert_eq!(decode_signature(&wrapped).unwrap(), bytes);
    }

    #[test]
    fn test_decode_signature_rejects_garbage() {
        assert!(matches!(
            decode_signature("not base64 at all!!"),
            Err(EncodingError::InvalidBase64(_))
        ));
        assert!(matches!(
            decode_signature("%zz%"),
            Err(EncodingError::InvalidBase64(_))
        ));
        assert_eq!(decode_signature(""), Err(EncodingError::Empty));
        assert_eq!(decode_signature("%FF%FE"), Err(EncodingError::InvalidUtf8));
    }
}
