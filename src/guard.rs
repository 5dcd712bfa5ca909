//! Shared verification checks used by both ceremonies
//!
//! Origin match, rpId-hash match, user-presence/user-verification flags and
//! clientDataJSON binding live here so the two ceremonies stay a thin
//! ordered sequence of the same checks.

use crate::authenticator_data::AuthenticatorData;
use crate::challenge::Challenge;
use crate::codec;
use crate::config::RpConfig;
use crate::error::WebAuthnError;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// The fields of clientDataJSON this core cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectedClientData {
    #[serde(rename = "type")]
    pub kind: String,
    pub challenge: String,
    pub origin: String,
}

/// Decode and parse a base64url clientDataJSON payload, returning the raw
/// bytes alongside (the assertion signature covers their SHA-256).
pub fn parse_client_data(encoded: &str) -> Result<(CollectedClientData, Vec<u8>), WebAuthnError> {
    let bytes = codec::decode(encoded)?;
    let client_data = serde_json::from_slice(&bytes)
        .map_err(|e| WebAuthnError::InvalidEncoding(format!("clientDataJSON: {e}")))?;
    Ok((client_data, bytes))
}

/// Check clientDataJSON type, challenge and origin against the ceremony's
/// expectations, in that order.
pub fn check_client_data(
    client_data: &CollectedClientData,
    expected_type: &str,
    challenge: &Challenge,
    config: &RpConfig,
) -> Result<(), WebAuthnError> {
    if client_data.kind != expected_type {
        return Err(WebAuthnError::CeremonyMismatch);
    }
    if client_data.challenge != codec::encode(&challenge.value) {
        return Err(WebAuthnError::ChallengeMismatch);
    }
    check_origin(&client_data.origin, config)?;
    Ok(())
}

/// Origin policy: exact match against the configured allow-list, or, when
/// enabled, any https origin whose host is a subdomain of the rp id.
pub fn check_origin(origin: &str, config: &RpConfig) -> Result<(), WebAuthnError> {
    let origin = normalize_origin(origin);

    for allowed in &config.allowed_origins {
        if origin == normalize_origin(allowed) {
            return Ok(());
        }
    }

    if config.allow_subdomains {
        if let Some(host) = origin
            .strip_prefix("https://")
            .map(|rest| rest.split(':').next().unwrap_or(rest))
        {
            if host == config.rp.id || host.ends_with(&format!(".{}", config.rp.id)) {
                return Ok(());
            }
        }
    }

    Err(WebAuthnError::OriginMismatch(origin))
}

/// Compare the authenticator's rpIdHash against SHA-256 of the configured
/// rp id.
pub fn check_rp_id_hash(rp_id_hash: &[u8; 32], rp_id: &str) -> Result<(), WebAuthnError> {
    let expected = Sha256::digest(rp_id.as_bytes());
    if expected.as_slice() == rp_id_hash {
        Ok(())
    } else {
        Err(WebAuthnError::RpIdMismatch)
    }
}

/// Enforce user-presence (always) and user-verification (per policy).
pub fn check_flags(data: &AuthenticatorData, config: &RpConfig) -> Result<(), WebAuthnError> {
    if !data.user_present() {
        return Err(WebAuthnError::UserPresenceRequired);
    }
    if config.require_user_verification && !data.user_verified() {
        return Err(WebAuthnError::UserVerificationRequired);
    }
    Ok(())
}

/// SHA-256 of the raw clientDataJSON bytes; the second half of the signed
/// payload `authenticatorData || SHA256(clientDataJSON)`.
pub fn client_data_hash(client_data_bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(client_data_bytes).into()
}

// Lowercases scheme+host and drops a trailing slash so cosmetic variants of
// the same origin compare equal. Default ports are stripped.
fn normalize_origin(origin: &str) -> String {
    let origin = origin.trim().trim_end_matches('/');
    let Some((scheme, rest)) = origin.split_once("://") else {
        return origin.to_ascii_lowercase();
    };
    let scheme = scheme.to_ascii_lowercase();
    let authority = rest.split('/').next().unwrap_or(rest).to_ascii_lowercase();

    let default_port = match scheme.as_str() {
        "http" => Some("80"),
        "https" => Some("443"),
        _ => None,
    };
    let authority = match (default_port, authority.rsplit_once(':')) {
        (Some(default), Some((host, port))) if port == default && !host.contains(':') => {
            host.to_string()
        }
        _ => authority,
    };

    format!("{scheme}://{authority}")
}
