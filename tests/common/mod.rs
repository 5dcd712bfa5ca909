//! Common test utilities: a software authenticator that produces real,
//! correctly signed attestation and assertion payloads.

#![allow(dead_code)]

use ciborium::value::Value as CborValue;
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use passkey_rp::codec;
use passkey_rp::types::{
    AssertionResponse, AttestationResponse, AuthenticatorAssertionResponse,
    AuthenticatorAttestationResponse,
};
use passkey_rp::{RpConfig, RpContext};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Once;

pub const TEST_RP_ID: &str = "example.test";
pub const TEST_ORIGIN: &str = "https://example.test";

pub const FLAG_UP: u8 = 0x01;
pub const FLAG_UV: u8 = 0x04;
pub const FLAG_AT: u8 = 0x40;

static TRACING: Once = Once::new();

/// Install a test subscriber once so ceremony logs are captured per test
/// and respect `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Context configured for the test relying party.
pub fn test_context() -> RpContext {
    init_tracing();
    RpContext::new(
        RpConfig::builder()
            .rp_id(TEST_RP_ID)
            .rp_name("Example")
            .allowed_origins(vec![TEST_ORIGIN])
            .build(),
    )
}

/// A software authenticator holding one ES256 credential.
pub struct TestAuthenticator {
    pub signing_key: SigningKey,
    pub credential_id: Vec<u8>,
    pub aaguid: [u8; 16],
}

impl TestAuthenticator {
    pub fn new() -> Self {
        let mut credential_id = vec![0u8; 16];
        OsRng.fill_bytes(&mut credential_id);
        Self {
            signing_key: SigningKey::random(&mut OsRng),
            credential_id,
            aaguid: [0x42; 16],
        }
    }

    /// COSE_Key map for the credential's public key (EC2, P-256, ES256).
    pub fn cose_public_key(&self) -> Vec<u8> {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let map = CborValue::Map(vec![
            (CborValue::Integer(1.into()), CborValue::Integer(2.into())),
            (CborValue::Integer(3.into()), CborValue::Integer((-7).into())),
            (CborValue::Integer((-1).into()), CborValue::Integer(1.into())),
            (
                CborValue::Integer((-2).into()),
                CborValue::Bytes(point.x().unwrap().to_vec()),
            ),
            (
                CborValue::Integer((-3).into()),
                CborValue::Bytes(point.y().unwrap().to_vec()),
            ),
        ]);
        let mut out = Vec::new();
        ciborium::ser::into_writer(&map, &mut out).unwrap();
        out
    }

    /// Raw authenticator data for the given rp id; appends attested
    /// credential data when `attested` is set.
    pub fn auth_data(&self, rp_id: &str, flags: u8, sign_count: u32, attested: bool) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
        data.push(if attested { flags | FLAG_AT } else { flags });
        data.extend_from_slice(&sign_count.to_be_bytes());
        if attested {
            data.extend_from_slice(&self.aaguid);
            data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
            data.extend_from_slice(&self.credential_id);
            data.extend_from_slice(&self.cose_public_key());
        }
        data
    }

    /// A complete "none"-format attestation response for the given
    /// challenge, shaped exactly as the browser would deliver it.
    pub fn attestation_response(
        &self,
        challenge_b64: &str,
        origin: &str,
        flags: u8,
        sign_count: u32,
    ) -> AttestationResponse {
        let client_data = client_data_json("webauthn.create", challenge_b64, origin);
        let auth_data = self.auth_data(TEST_RP_ID, flags, sign_count, true);

        let attestation_object = CborValue::Map(vec![
            (
                CborValue::Text("fmt".to_string()),
                CborValue::Text("none".to_string()),
            ),
            (
                CborValue::Text("attStmt".to_string()),
                CborValue::Map(Vec::new()),
            ),
            (
                CborValue::Text("authData".to_string()),
                CborValue::Bytes(auth_data),
            ),
        ]);
        let mut attestation_bytes = Vec::new();
        ciborium::ser::into_writer(&attestation_object, &mut attestation_bytes).unwrap();

        AttestationResponse {
            id: codec::encode(&self.credential_id),
            raw_id: codec::encode(&self.credential_id),
            kind: "public-key".to_string(),
            response: AuthenticatorAttestationResponse {
                client_data_json: codec::encode(&client_data),
                attestation_object: codec::encode(&attestation_bytes),
                transports: vec!["internal".to_string()],
            },
        }
    }

    /// A complete, correctly signed assertion response for the given
    /// challenge.
    pub fn assertion_response(
        &self,
        challenge_b64: &str,
        origin: &str,
        flags: u8,
        sign_count: u32,
        user_handle: Option<&[u8]>,
    ) -> AssertionResponse {
        self.assertion_response_for_rp(
            TEST_RP_ID,
            challenge_b64,
            origin,
            flags,
            sign_count,
            user_handle,
        )
    }

    /// Same as [`assertion_response`], but binding the authenticator data
    /// to an arbitrary rp id.
    pub fn assertion_response_for_rp(
        &self,
        rp_id: &str,
        challenge_b64: &str,
        origin: &str,
        flags: u8,
        sign_count: u32,
        user_handle: Option<&[u8]>,
    ) -> AssertionResponse {
        let client_data = client_data_json("webauthn.get", challenge_b64, origin);
        let auth_data = self.auth_data(rp_id, flags, sign_count, false);

        let mut signed = auth_data.clone();
        signed.extend_from_slice(&Sha256::digest(&client_data));
        let signature: Signature = self.signing_key.sign(&signed);

        AssertionResponse {
            id: codec::encode(&self.credential_id),
            raw_id: codec::encode(&self.credential_id),
            kind: "public-key".to_string(),
            response: AuthenticatorAssertionResponse {
                client_data_json: codec::encode(&client_data),
                authenticator_data: codec::encode(&auth_data),
                signature: codec::encode(signature.to_der().as_bytes()),
                user_handle: user_handle.map(codec::encode),
            },
        }
    }
}

pub fn client_data_json(kind: &str, challenge_b64: &str, origin: &str) -> Vec<u8> {
    serde_json::json!({
        "type": kind,
        "challenge": challenge_b64,
        "origin": origin,
        "crossOrigin": false
    })
    .to_string()
    .into_bytes()
}

/// Assert that a result is an error matching a pattern
#[macro_export]
macro_rules! assert_error_matches {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => (),
            Err(e) => panic!(
                "expected error matching {}, got {:?}",
                stringify!($pattern),
                e
            ),
            Ok(_) => panic!("expected error, got Ok"),
        }
    };
}
