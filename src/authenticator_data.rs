//! Binary authenticator-data parsing
//!
//! Layout (WebAuthn §6.1):
//! - 32 bytes rpIdHash
//! - 1 byte flags
//! - 4 bytes signCount (big-endian)
//! - attested credential data when the AT flag is set:
//!   16 bytes AAGUID, 2-byte credential id length, credential id,
//!   COSE public key (CBOR, length found by parsing)

use crate::error::WebAuthnError;
use ciborium::value::Value as CborValue;
use std::io::Cursor;

/// User present
pub const FLAG_UP: u8 = 0x01;
/// User verified
pub const FLAG_UV: u8 = 0x04;
/// Attested credential data included
pub const FLAG_AT: u8 = 0x40;

#[derive(Debug, Clone)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// Raw COSE key bytes, kept verbatim for storage
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub sign_count: u32,
    pub attested: Option<AttestedCredentialData>,
}

impl AuthenticatorData {
    pub fn user_present(&self) -> bool {
        self.flags & FLAG_UP != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_UV != 0
    }
}

/// Parse raw authenticator data.
///
/// `require_attested` is set on the registration path, where the credential
/// id and public key must be present.
pub fn parse(data: &[u8], require_attested: bool) -> Result<AuthenticatorData, WebAuthnError> {
    if data.len() < 37 {
        return Err(WebAuthnError::InvalidEncoding(
            "authenticator data shorter than 37 bytes".to_string(),
        ));
    }

    let mut rp_id_hash = [0u8; 32];
    rp_id_hash.copy_from_slice(&data[..32]);
    let flags = data[32];
    let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

    let mut attested = None;
    if flags & FLAG_AT != 0 {
        let mut offset = 37usize;
        if data.len() < offset + 18 {
            return Err(WebAuthnError::InvalidEncoding(
                "attested credential data truncated".to_string(),
            ));
        }

        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&data[offset..offset + 16]);
        offset += 16;

        let id_len = u16::from_be_bytes([data[offset], data[offset + 1]]) as usize;
        offset += 2;
        if data.len() < offset + id_len {
            return Err(WebAuthnError::InvalidEncoding(
                "credential id truncated".to_string(),
            ));
        }
        let credential_id = data[offset..offset + id_len].to_vec();
        offset += id_len;

        // The COSE key's length is not encoded in authData; parse the CBOR
        // item and take the cursor position as its byte length.
        let mut cursor = Cursor::new(&data[offset..]);
        let _key: CborValue = ciborium::de::from_reader(&mut cursor).map_err(|_| {
            WebAuthnError::InvalidEncoding("malformed COSE public key".to_string())
        })?;
        let key_len = cursor.position() as usize;
        if key_len == 0 || offset + key_len > data.len() {
            return Err(WebAuthnError::InvalidEncoding(
                "malformed COSE public key".to_string(),
            ));
        }
        let public_key = data[offset..offset + key_len].to_vec();

        attested = Some(AttestedCredentialData {
            aaguid,
            credential_id,
            public_key,
        });
    } else if require_attested {
        return Err(WebAuthnError::InvalidEncoding(
            "attested credential data missing".to_string(),
        ));
    }

    Ok(AuthenticatorData {
        rp_id_hash,
        flags,
        sign_count,
        attested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(flags: u8, sign_count: u32) -> Vec<u8> {
        let mut data = vec![0xaa; 32];
        data.push(flags);
        data.extend_from_slice(&sign_count.to_be_bytes());
        data
    }

    #[test]
    fn parses_header_fields() {
        let data = header(FLAG_UP | FLAG_UV, 42);
        let parsed = parse(&data, false).unwrap();

        assert_eq!(parsed.rp_id_hash, [0xaa; 32]);
        assert_eq!(parsed.sign_count, 42);
        assert!(parsed.user_present());
        assert!(parsed.user_verified());
        assert!(parsed.attested.is_none());
    }

    #[test]
    fn parses_attested_credential_data() {
        let mut data = header(FLAG_UP | FLAG_AT, 0);
        data.extend_from_slice(&[0x11; 16]); // aaguid
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]); // credential id
        let mut cose = Vec::new();
        ciborium::ser::into_writer(
            &CborValue::Map(vec![(
                CborValue::Integer(1.into()),
                CborValue::Integer(2.into()),
            )]),
            &mut cose,
        )
        .unwrap();
        data.extend_from_slice(&cose);

        let parsed = parse(&data, true).unwrap();
        let attested = parsed.attested.unwrap();
        assert_eq!(attested.aaguid, [0x11; 16]);
        assert_eq!(attested.credential_id, vec![1, 2, 3, 4]);
        assert_eq!(attested.public_key, cose);
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(
            parse(&[0u8; 36], false),
            Err(WebAuthnError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn rejects_missing_attested_data_when_required() {
        let data = header(FLAG_UP, 0);
        assert!(matches!(
            parse(&data, true),
            Err(WebAuthnError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn rejects_truncated_credential_id() {
        let mut data = header(FLAG_UP | FLAG_AT, 0);
        data.extend_from_slice(&[0x11; 16]);
        data.extend_from_slice(&100u16.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            parse(&data, true),
            Err(WebAuthnError::InvalidEncoding(_))
        ));
    }
}
