//! passkey-rp - WebAuthn (FIDO2) relying-party core
//!
//! Challenge issuance, ceremony option building, and validation of
//! attestation (registration) and assertion (login) responses. The host
//! application brings HTTP plumbing, user management and durable
//! credential storage; this crate brings the protocol.

pub mod attestation;
pub mod authentication;
pub mod authenticator_data;
pub mod challenge;
pub mod codec;
pub mod config;
pub mod cose;
pub mod error;
pub mod guard;
pub mod registration;
pub mod store;
pub mod types;

pub use authentication::AuthenticationCeremony;
pub use challenge::{CeremonyKind, Challenge, ChallengeManager};
pub use config::{RelyingParty, RpConfig, CEREMONY_TIMEOUT_MS};
pub use error::WebAuthnError;
pub use registration::RegistrationCeremony;
pub use store::{CredentialRepository, MemoryCredentialStore};
pub use types::{
    AssertionResponse, AttestationResponse, CreationOptions, CredentialDescriptor,
    PublicKeyCredentialSource, RequestOptions, UserIdentity,
};

use std::sync::Arc;

/// Relying-party context shared across the application.
///
/// Both ceremonies draw from the same configuration and the same
/// per-session challenge slots.
#[derive(Clone)]
pub struct RpContext {
    pub config: Arc<RpConfig>,
    pub challenges: Arc<ChallengeManager>,
}

impl RpContext {
    pub fn new(config: RpConfig) -> Self {
        Self {
            config: Arc::new(config),
            challenges: Arc::new(ChallengeManager::new()),
        }
    }

    pub fn registration(&self) -> RegistrationCeremony {
        RegistrationCeremony::new(self.config.clone(), self.challenges.clone())
    }

    pub fn authentication(&self) -> AuthenticationCeremony {
        AuthenticationCeremony::new(self.config.clone(), self.challenges.clone())
    }
}
