//! Authentication ceremony: request options and assertion verification

use crate::authenticator_data;
use crate::challenge::{CeremonyKind, ChallengeManager};
use crate::codec;
use crate::config::RpConfig;
use crate::cose::CredentialPublicKey;
use crate::error::WebAuthnError;
use crate::guard;
use crate::registration::log_ceremony_failure;
use crate::store::CredentialRepository;
use crate::types::{AssertionResponse, CredentialDescriptor, PublicKeyCredentialSource, RequestOptions};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

pub struct AuthenticationCeremony {
    config: Arc<RpConfig>,
    challenges: Arc<ChallengeManager>,
}

impl AuthenticationCeremony {
    pub fn new(config: Arc<RpConfig>, challenges: Arc<ChallengeManager>) -> Self {
        Self { config, challenges }
    }

    /// Build `navigator.credentials.get()` options and bind a fresh
    /// Authentication challenge to the session.
    ///
    /// An empty `allow_list` signals a username-less, discoverable-
    /// credential flow.
    pub fn build_options(
        &self,
        allow_list: &[CredentialDescriptor],
        session: &str,
    ) -> RequestOptions {
        let challenge = self
            .challenges
            .issue(CeremonyKind::Authentication, session);
        debug!(session, allow = allow_list.len(), "issued authentication challenge");

        RequestOptions {
            challenge: codec::encode(&challenge.value),
            rp_id: self.config.rp.id.clone(),
            allow_credentials: allow_list.to_vec(),
            user_verification: self.config.user_verification_policy().to_string(),
            timeout: self.config.timeout_ms,
        }
    }

    /// Validate an assertion response, verify its signature, enforce
    /// counter monotonicity and commit the new count via the repository's
    /// CAS update. Returns the matched credential with the updated count.
    pub async fn verify(
        &self,
        response: &AssertionResponse,
        repo: &dyn CredentialRepository,
        session: &str,
    ) -> Result<PublicKeyCredentialSource, WebAuthnError> {
        let result = self.verify_inner(response, repo, session).await;
        if let Err(err) = &result {
            log_ceremony_failure("authentication", session, err);
        }
        result
    }

    async fn verify_inner(
        &self,
        response: &AssertionResponse,
        repo: &dyn CredentialRepository,
        session: &str,
    ) -> Result<PublicKeyCredentialSource, WebAuthnError> {
        // 1. Consume the single-slot challenge, then check expiry and kind.
        let challenge = self.challenges.consume(session)?;
        challenge.validate(
            CeremonyKind::Authentication,
            Utc::now(),
            self.config.timeout_ms,
        )?;

        // 2. clientDataJSON: type, challenge binding, origin.
        let (client_data, client_data_bytes) =
            guard::parse_client_data(&response.response.client_data_json)?;
        guard::check_client_data(&client_data, "webauthn.get", &challenge, &self.config)?;

        // 3. Credential lookup by rawId; read-only, no write path touched.
        let credential_id = codec::decode(&response.raw_id)?;
        let mut source = repo
            .find_by_credential_id(&credential_id)
            .await?
            .ok_or(WebAuthnError::UnknownCredential)?;

        // 4. Authenticator data: rpIdHash and UP/UV flags.
        let auth_data_bytes = codec::decode(&response.response.authenticator_data)?;
        let auth_data = authenticator_data::parse(&auth_data_bytes, false)?;
        guard::check_rp_id_hash(&auth_data.rp_id_hash, &self.config.rp.id)?;
        guard::check_flags(&auth_data, &self.config)?;

        // 5. Signature over authenticatorData || SHA256(clientDataJSON).
        let signature = codec::decode(&response.response.signature)?;
        let (public_key, _alg) = CredentialPublicKey::parse(&source.public_key)?;
        let mut signed = Vec::with_capacity(auth_data_bytes.len() + 32);
        signed.extend_from_slice(&auth_data_bytes);
        signed.extend_from_slice(&guard::client_data_hash(&client_data_bytes));
        public_key.verify(&signed, &signature)?;

        // 6. Counter monotonicity. Both counters zero means the
        // authenticator does not implement one; anything else must
        // strictly increase or it is a clone/replay signal.
        let presented = auth_data.sign_count;
        if (source.sign_count != 0 || presented != 0) && presented <= source.sign_count {
            return Err(WebAuthnError::CounterRegression {
                stored: source.sign_count,
                presented,
            });
        }

        // 7. User handle binding, when the authenticator reports one.
        // Checked before the counter commit so a mismatch persists nothing.
        if let Some(user_handle) = &response.response.user_handle {
            if codec::decode(user_handle)? != source.user_handle {
                return Err(WebAuthnError::UserHandleMismatch);
            }
        }

        // 8. Commit the new count; CAS on the count we verified against.
        repo.update_sign_count(&source.credential_id, source.sign_count, presented)
            .await?;
        source.sign_count = presented;

        debug!(
            session,
            credential = %codec::encode(&source.credential_id),
            sign_count = presented,
            "authentication verified"
        );
        Ok(source)
    }
}
