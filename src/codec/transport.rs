//! Base64 encoding of file contents for the hosting API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::StoreError;

pub fn encode_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode API content. GitHub wraps base64 at 60 columns, so whitespace is ignored.
pub fn decode_content(encoded: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

pub fn decode_text(encoded: &str) -> Result<String, StoreError> {
    Ok(String::from_utf8(decode_content(encoded)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_text_survives() {
        let text = "Élan — naïve café ✓";
        let encoded = encode_content(text.as_bytes());
        assert_eq!(decode_text(&encoded).unwrap(), text);
    }

    #[test]
    fn test_decode_line_wrapped_content() {
        let wrapped = "LS0tCnRpdGxlOiAiSGVsbG8iCi0t\nLQpib2R5\n";
        assert_eq!(
            decode_text(wrapped).unwrap(),
            "---\ntitle: \"Hello\"\n---\nbody"
        );
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(matches!(
            decode_content("not base64!!"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let encoded = encode_content(&[0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_text(&encoded),
            Err(StoreError::Serialization(_))
        ));
    }
}
