//! Attestation object parsing and format validation
//!
//! The attestation object is CBOR: `{ fmt, attStmt, authData }`. Statement
//! validation is a strategy keyed by the format string so additional
//! formats (packed, tpm, ...) can be registered without touching ceremony
//! control flow. Only "none" ships built in; it is accepted
//! unconditionally, matching a self-attested consumer login trust model.

use crate::error::WebAuthnError;
use ciborium::value::Value as CborValue;
use std::collections::HashMap;
use std::io::Cursor;

#[derive(Debug, Clone)]
pub struct AttestationObject {
    pub format: String,
    /// Raw authenticator data bytes, still to be parsed
    pub auth_data: Vec<u8>,
    pub statement: CborValue,
}

impl AttestationObject {
    /// Parse the CBOR attestation object sent by the browser.
    pub fn parse(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        let value: CborValue = ciborium::de::from_reader(Cursor::new(bytes)).map_err(|_| {
            WebAuthnError::InvalidEncoding("attestation object is not CBOR".to_string())
        })?;
        let map = value.as_map().ok_or_else(|| {
            WebAuthnError::InvalidEncoding("attestation object is not a map".to_string())
        })?;

        let format = map_get(map, "fmt")
            .and_then(|v| v.as_text())
            .ok_or_else(|| WebAuthnError::InvalidEncoding("missing fmt".to_string()))?
            .to_string();
        let auth_data = map_get(map, "authData")
            .and_then(|v| v.as_bytes())
            .ok_or_else(|| WebAuthnError::InvalidEncoding("missing authData".to_string()))?
            .clone();
        let statement = map_get(map, "attStmt")
            .cloned()
            .unwrap_or(CborValue::Map(Vec::new()));

        Ok(Self {
            format,
            auth_data,
            statement,
        })
    }
}

fn map_get<'a>(map: &'a [(CborValue, CborValue)], key: &str) -> Option<&'a CborValue> {
    map.iter().find_map(|(k, v)| match k {
        CborValue::Text(t) if t == key => Some(v),
        _ => None,
    })
}

/// Validates an attestation statement for one format.
pub trait AttestationFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Validate the statement and return the attestation type recorded on
    /// the credential (e.g. "none", "basic").
    fn verify(
        &self,
        statement: &CborValue,
        auth_data: &[u8],
        client_data_hash: &[u8; 32],
    ) -> Result<String, WebAuthnError>;
}

/// The "none" format: no statement to validate.
pub struct NoneFormat;

impl AttestationFormat for NoneFormat {
    fn name(&self) -> &'static str {
        "none"
    }

    fn verify(
        &self,
        _statement: &CborValue,
        _auth_data: &[u8],
        _client_data_hash: &[u8; 32],
    ) -> Result<String, WebAuthnError> {
        Ok("none".to_string())
    }
}

/// Registry of attestation-format strategies keyed by `fmt`.
pub struct AttestationFormatRegistry {
    formats: HashMap<&'static str, Box<dyn AttestationFormat>>,
}

impl Default for AttestationFormatRegistry {
    fn default() -> Self {
        let mut registry = Self {
            formats: HashMap::new(),
        };
        registry.register(Box::new(NoneFormat));
        registry
    }
}

impl AttestationFormatRegistry {
    pub fn register(&mut self, format: Box<dyn AttestationFormat>) {
        self.formats.insert(format.name(), format);
    }

    /// Validate `object.statement` with the strategy for `object.format`.
    pub fn verify(
        &self,
        object: &AttestationObject,
        client_data_hash: &[u8; 32],
    ) -> Result<String, WebAuthnError> {
        let format = self
            .formats
            .get(object.format.as_str())
            .ok_or_else(|| WebAuthnError::UnsupportedAttestationFormat(object.format.clone()))?;
        format.verify(&object.statement, &object.auth_data, client_data_hash)
    }
}
