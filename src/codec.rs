//! Binary ⇄ base64url transcoding used at every protocol boundary

use crate::error::WebAuthnError;
use base64::{engine::general_purpose::URL_SAFE, engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Encode bytes as unpadded URL-safe base64.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64, with or without padding.
///
/// Input is re-padded to a multiple of 4 before decoding, so both the
/// unpadded form browsers send and already-padded strings are accepted.
pub fn decode(input: &str) -> Result<Vec<u8>, WebAuthnError> {
    let s = input.trim();
    if let Ok(bytes) = URL_SAFE_NO_PAD.decode(s) {
        return Ok(bytes);
    }

    let mut padded = s.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE
        .decode(&padded)
        .map_err(|e| WebAuthnError::InvalidEncoding(format!("invalid base64url: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let cases: &[&[u8]] = &[
            b"",
            b"f",
            b"fo",
            b"foo",
            &[0x00, 0xff, 0xfe, 0x80, 0x7f],
            &[0xfb, 0xef, 0xbe],
        ];
        for bytes in cases {
            assert_eq!(decode(&encode(bytes)).unwrap(), *bytes);
        }
    }

    #[test]
    fn encode_is_unpadded_urlsafe() {
        let encoded = encode(&[0xfb, 0xef, 0xff]);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn decode_accepts_padded_input() {
        assert_eq!(decode("Zm9v").unwrap(), b"foo");
        assert_eq!(decode("Zm8=").unwrap(), b"fo");
    }

    #[test]
    fn decode_rejects_invalid_alphabet() {
        assert!(matches!(
            decode("not!valid"),
            Err(WebAuthnError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_length() {
        // 5 chars re-pads to 8 but only 5 payload chars is not a valid
        // base64 quantum.
        assert!(matches!(
            decode("AAAAA"),
            Err(WebAuthnError::InvalidEncoding(_))
        ));
    }
}
