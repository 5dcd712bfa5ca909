//! COSE public-key decoding and signature verification
//!
//! Credentials are stored as raw COSE_Key bytes; this module decodes them
//! into verifying keys and checks assertion signatures. The algorithm
//! allow-list is fixed and ordered by preference; keys tagged with any
//! other algorithm are rejected at verify time, never silently accepted.

use crate::error::WebAuthnError;
use ciborium::value::Value as CborValue;
use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature as P256Signature, VerifyingKey as P256VerifyingKey};
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::signature::Verifier as _;
use rsa::{BigUint, RsaPublicKey};
use sha2::Sha256;
use std::io::Cursor;

// COSE key/curve identifiers (RFC 9053)
const KTY_EC2: i128 = 2;
const KTY_RSA: i128 = 3;
const CRV_P256: i128 = 1;

/// Supported COSE algorithms, ordered by preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlgorithm {
    /// ECDSA P-256 with SHA-256 (COSE -7)
    Es256,
    /// RSASSA-PKCS1-v1_5 with SHA-256 (COSE -257)
    Rs256,
}

pub const ALLOWED_ALGORITHMS: [CoseAlgorithm; 2] = [CoseAlgorithm::Es256, CoseAlgorithm::Rs256];

impl CoseAlgorithm {
    pub fn cose_id(self) -> i64 {
        match self {
            CoseAlgorithm::Es256 => -7,
            CoseAlgorithm::Rs256 => -257,
        }
    }
}

/// A decoded credential public key, ready to verify assertion signatures.
#[derive(Debug, Clone)]
pub enum CredentialPublicKey {
    Es256(P256VerifyingKey),
    Rs256(RsaPublicKey),
}

impl CredentialPublicKey {
    /// Decode raw COSE_Key bytes.
    ///
    /// Fails `UnsupportedAlgorithm` for any kty/alg pair outside the
    /// allow-list and `InvalidEncoding` for structurally broken keys.
    pub fn parse(cose_key: &[u8]) -> Result<(Self, CoseAlgorithm), WebAuthnError> {
        let value: CborValue = ciborium::de::from_reader(Cursor::new(cose_key))
            .map_err(|_| WebAuthnError::InvalidEncoding("COSE key is not CBOR".to_string()))?;
        let map = value
            .as_map()
            .ok_or_else(|| WebAuthnError::InvalidEncoding("COSE key is not a map".to_string()))?;

        let kty = map_get_int(map, 1)
            .ok_or_else(|| WebAuthnError::InvalidEncoding("COSE key missing kty".to_string()))?;
        let alg = map_get_int(map, 3)
            .ok_or_else(|| WebAuthnError::InvalidEncoding("COSE key missing alg".to_string()))?;

        match (kty, alg) {
            (KTY_EC2, -7) => {
                let crv = map_get_int(map, -1).ok_or_else(|| {
                    WebAuthnError::InvalidEncoding("EC2 key missing crv".to_string())
                })?;
                if crv != CRV_P256 {
                    return Err(WebAuthnError::UnsupportedAlgorithm(alg as i64));
                }
                let x = map_get_bytes(map, -2).ok_or_else(|| {
                    WebAuthnError::InvalidEncoding("EC2 key missing x".to_string())
                })?;
                let y = map_get_bytes(map, -3).ok_or_else(|| {
                    WebAuthnError::InvalidEncoding("EC2 key missing y".to_string())
                })?;
                if x.len() != 32 || y.len() != 32 {
                    return Err(WebAuthnError::InvalidEncoding(
                        "EC2 coordinate length".to_string(),
                    ));
                }

                // Uncompressed SEC1 point: 0x04 || x || y
                let mut point = Vec::with_capacity(65);
                point.push(0x04);
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                let key = P256VerifyingKey::from_sec1_bytes(&point).map_err(|_| {
                    WebAuthnError::InvalidEncoding("invalid P-256 point".to_string())
                })?;
                Ok((CredentialPublicKey::Es256(key), CoseAlgorithm::Es256))
            }
            (KTY_RSA, -257) => {
                let n = map_get_bytes(map, -1).ok_or_else(|| {
                    WebAuthnError::InvalidEncoding("RSA key missing n".to_string())
                })?;
                let e = map_get_bytes(map, -2).ok_or_else(|| {
                    WebAuthnError::InvalidEncoding("RSA key missing e".to_string())
                })?;
                let key =
                    RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
                        .map_err(|_| {
                            WebAuthnError::InvalidEncoding("invalid RSA modulus".to_string())
                        })?;
                Ok((CredentialPublicKey::Rs256(key), CoseAlgorithm::Rs256))
            }
            (_, alg) => Err(WebAuthnError::UnsupportedAlgorithm(alg as i64)),
        }
    }

    /// Verify `signature` over `data`.
    ///
    /// ES256 signatures arrive DER-encoded from authenticators; RS256 is
    /// PKCS#1 v1.5 over SHA-256.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<(), WebAuthnError> {
        match self {
            CredentialPublicKey::Es256(key) => {
                let signature = P256Signature::from_der(signature)
                    .map_err(|_| WebAuthnError::SignatureInvalid)?;
                key.verify(data, &signature)
                    .map_err(|_| WebAuthnError::SignatureInvalid)
            }
            CredentialPublicKey::Rs256(key) => {
                let verifying_key = RsaVerifyingKey::<Sha256>::new(key.clone());
                let signature = RsaSignature::try_from(signature)
                    .map_err(|_| WebAuthnError::SignatureInvalid)?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|_| WebAuthnError::SignatureInvalid)
            }
        }
    }
}

fn map_get_int(map: &[(CborValue, CborValue)], key: i128) -> Option<i128> {
    map.iter().find_map(|(k, v)| match (k, v) {
        (CborValue::Integer(k), CborValue::Integer(v)) if i128::from(*k) == key => {
            Some(i128::from(*v))
        }
        _ => None,
    })
}

fn map_get_bytes(map: &[(CborValue, CborValue)], key: i128) -> Option<&[u8]> {
    map.iter().find_map(|(k, v)| match (k, v) {
        (CborValue::Integer(k), CborValue::Bytes(v)) if i128::from(*k) == key => {
            Some(v.as_slice())
        }
        _ => None,
    })
}
