//! Ceremony failure taxonomy
//!
//! Every verification failure is returned as a typed value; nothing in this
//! crate panics across the protocol boundary. All variants are terminal for
//! the current ceremony attempt; the caller restarts with a fresh challenge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebAuthnError {
    #[error("No challenge stored for this session")]
    ChallengeNotFound,

    #[error("Challenge expired")]
    ChallengeExpired,

    #[error("Challenge was issued for a different ceremony")]
    CeremonyMismatch,

    #[error("Client data challenge does not match the issued challenge")]
    ChallengeMismatch,

    #[error("Origin '{0}' is not allowed for this relying party")]
    OriginMismatch(String),

    #[error("Authenticator rpIdHash does not match the relying party id")]
    RpIdMismatch,

    #[error("User presence flag not set")]
    UserPresenceRequired,

    #[error("User verification required but UV flag not set")]
    UserVerificationRequired,

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Credential is not registered")]
    UnknownCredential,

    #[error("Signature counter did not increase (stored {stored}, presented {presented})")]
    CounterRegression { stored: u32, presented: u32 },

    #[error("Asserted user handle does not match the stored credential")]
    UserHandleMismatch,

    #[error("Credential id is already registered")]
    DuplicateCredential,

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Unsupported algorithm (COSE {0})")]
    UnsupportedAlgorithm(i64),

    #[error("Unsupported attestation format '{0}'")]
    UnsupportedAttestationFormat(String),

    #[error("Credential not found")]
    NotFound,

    #[error("Concurrent sign count update conflict")]
    ConcurrentUpdateConflict,

    #[error("Storage error: {0}")]
    Storage(String),
}
