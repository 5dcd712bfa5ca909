//! Registration ceremony: creation options and attestation verification

use crate::attestation::{AttestationFormatRegistry, AttestationObject};
use crate::authenticator_data;
use crate::challenge::{CeremonyKind, ChallengeManager};
use crate::codec;
use crate::config::RpConfig;
use crate::cose::{CredentialPublicKey, ALLOWED_ALGORITHMS};
use crate::error::WebAuthnError;
use crate::guard;
use crate::types::{
    AttestationResponse, AuthenticatorSelection, CreationOptions, CredentialDescriptor,
    PubKeyCredParam, PublicKeyCredentialSource, PublicKeyCredentialUserEntity, UserIdentity,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RegistrationCeremony {
    config: Arc<RpConfig>,
    challenges: Arc<ChallengeManager>,
    formats: AttestationFormatRegistry,
}

impl RegistrationCeremony {
    pub fn new(config: Arc<RpConfig>, challenges: Arc<ChallengeManager>) -> Self {
        Self {
            config,
            challenges,
            formats: AttestationFormatRegistry::default(),
        }
    }

    /// Replace the attestation-format registry, e.g. to add "packed".
    pub fn with_formats(mut self, formats: AttestationFormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Build `navigator.credentials.create()` options and bind a fresh
    /// Registration challenge to the session.
    pub fn build_options(
        &self,
        user: &UserIdentity,
        excluded: &[CredentialDescriptor],
        session: &str,
    ) -> CreationOptions {
        let challenge = self.challenges.issue(CeremonyKind::Registration, session);
        debug!(session, user = %user.name, "issued registration challenge");

        CreationOptions {
            rp: self.config.rp.clone(),
            user: PublicKeyCredentialUserEntity {
                id: codec::encode(&user.handle),
                name: user.name.clone(),
                display_name: user.display_name.clone(),
            },
            challenge: codec::encode(&challenge.value),
            pub_key_cred_params: ALLOWED_ALGORITHMS
                .iter()
                .map(|alg| PubKeyCredParam {
                    kind: "public-key".to_string(),
                    alg: alg.cose_id(),
                })
                .collect(),
            exclude_credentials: excluded.to_vec(),
            authenticator_selection: AuthenticatorSelection {
                user_verification: self.config.user_verification_policy().to_string(),
                resident_key: "required".to_string(),
                require_resident_key: true,
            },
            attestation: "direct".to_string(),
            timeout: self.config.timeout_ms,
        }
    }

    /// Validate an attestation response against the stored challenge.
    ///
    /// Checks run in order and short-circuit on the first failure; the
    /// session's challenge is consumed either way. The returned source is
    /// not persisted; the caller saves it through `CredentialRepository`,
    /// which enforces credential-id uniqueness.
    pub fn verify(
        &self,
        response: &AttestationResponse,
        user: &UserIdentity,
        session: &str,
    ) -> Result<PublicKeyCredentialSource, WebAuthnError> {
        let result = self.verify_inner(response, user, session);
        if let Err(err) = &result {
            log_ceremony_failure("registration", session, err);
        }
        result
    }

    fn verify_inner(
        &self,
        response: &AttestationResponse,
        user: &UserIdentity,
        session: &str,
    ) -> Result<PublicKeyCredentialSource, WebAuthnError> {
        // 1. Consume the single-slot challenge, then check expiry and kind.
        let challenge = self.challenges.consume(session)?;
        challenge.validate(
            CeremonyKind::Registration,
            Utc::now(),
            self.config.timeout_ms,
        )?;

        // 2. clientDataJSON: type, challenge binding, origin.
        let (client_data, client_data_bytes) =
            guard::parse_client_data(&response.response.client_data_json)?;
        guard::check_client_data(&client_data, "webauthn.create", &challenge, &self.config)?;

        // 3. Attestation object.
        let attestation_bytes = codec::decode(&response.response.attestation_object)?;
        let object = AttestationObject::parse(&attestation_bytes)?;

        // 4. Authenticator data: rpIdHash, UP/UV flags, attested credential.
        let auth_data = authenticator_data::parse(&object.auth_data, true)?;
        guard::check_rp_id_hash(&auth_data.rp_id_hash, &self.config.rp.id)?;
        guard::check_flags(&auth_data, &self.config)?;
        let attested = auth_data.attested.as_ref().ok_or_else(|| {
            WebAuthnError::InvalidEncoding("attested credential data missing".to_string())
        })?;

        // The key must decode and its algorithm must be on the allow-list,
        // regardless of what build_options advertised.
        CredentialPublicKey::parse(&attested.public_key)?;

        // 5. Attestation statement, via the format strategy.
        let attestation_type = self
            .formats
            .verify(&object, &guard::client_data_hash(&client_data_bytes))?;

        debug!(
            session,
            credential = %codec::encode(&attested.credential_id),
            "registration verified"
        );

        // 6. The durable record; sign_count seeds counter monotonicity.
        Ok(PublicKeyCredentialSource {
            credential_id: attested.credential_id.clone(),
            public_key: attested.public_key.clone(),
            sign_count: auth_data.sign_count,
            user_handle: user.handle.clone(),
            transports: response.response.transports.clone(),
            attestation_type,
            aaguid: attested.aaguid,
        })
    }
}

/// Security-relevant failures are logged at elevated severity: they
/// indicate possible attack or cloned hardware, not user error.
pub(crate) fn log_ceremony_failure(ceremony: &str, session: &str, err: &WebAuthnError) {
    match err {
        WebAuthnError::OriginMismatch(_)
        | WebAuthnError::SignatureInvalid
        | WebAuthnError::CounterRegression { .. } => {
            warn!(ceremony, session, error = %err, "ceremony verification failed");
        }
        _ => {
            debug!(ceremony, session, error = %err, "ceremony verification failed");
        }
    }
}
