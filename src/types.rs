//! Data model and browser-facing wire shapes
//!
//! Wire structs carry binary fields as base64url strings exactly as the
//! browser sends them; field names are bit-exact WebAuthn JSON. Domain
//! structs (`PublicKeyCredentialSource`, `UserIdentity`) carry raw bytes.

use crate::codec;
use crate::config::RelyingParty;
use serde::{Deserialize, Serialize};

/// The user a credential belongs to.
///
/// `handle` is the opaque, stable identifier stored inside credentials. It
/// must never be reassigned to a different human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub handle: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

/// Durable record created by a successful registration.
///
/// `sign_count` is the only field mutated after creation, and only by a
/// successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialSource {
    pub credential_id: Vec<u8>,
    /// COSE-encoded public key, algorithm-tagged
    pub public_key: Vec<u8>,
    pub sign_count: u32,
    pub user_handle: Vec<u8>,
    pub transports: Vec<String>,
    pub attestation_type: String,
    pub aaguid: [u8; 16],
}

/// Reference to an existing credential in allow/exclude lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    /// base64url credential id
    pub id: String,
}

impl CredentialDescriptor {
    pub fn from_id(id: &[u8]) -> Self {
        Self {
            kind: "public-key".to_string(),
            id: codec::encode(id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyCredentialUserEntity {
    /// base64url user handle
    pub id: String,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub kind: String,
    pub alg: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorSelection {
    #[serde(rename = "userVerification")]
    pub user_verification: String,
    #[serde(rename = "residentKey")]
    pub resident_key: String,
    #[serde(rename = "requireResidentKey")]
    pub require_resident_key: bool,
}

/// Server → browser options for `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationOptions {
    pub rp: RelyingParty,
    pub user: PublicKeyCredentialUserEntity,
    pub challenge: String,
    #[serde(rename = "pubKeyCredParams")]
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    #[serde(rename = "excludeCredentials")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    #[serde(rename = "authenticatorSelection")]
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: String,
    pub timeout: u64,
}

/// Server → browser options for `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOptions {
    pub challenge: String,
    #[serde(rename = "rpId")]
    pub rp_id: String,
    #[serde(rename = "allowCredentials")]
    pub allow_credentials: Vec<CredentialDescriptor>,
    #[serde(rename = "userVerification")]
    pub user_verification: String,
    pub timeout: u64,
}

/// Browser → server attestation (registration) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationResponse {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub response: AuthenticatorAttestationResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorAttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
    /// Browser-reported transports from `getTransports()`, when available
    #[serde(default)]
    pub transports: Vec<String>,
}

/// Browser → server assertion (login) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResponse {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub response: AuthenticatorAssertionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorAssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    pub signature: String,
    #[serde(rename = "userHandle")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}
