//! Per-ceremony challenge issuance and single-use consumption
//!
//! One challenge slot per session: `issue` overwrites any prior challenge
//! for the same session (last-writer-wins, not queue-like: racing two
//! ceremonies on one session silently invalidates the first), and `consume`
//! atomically removes the slot so a challenge can never be redeemed twice.

use crate::error::WebAuthnError;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;

/// Which ceremony a challenge was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

#[derive(Debug, Clone)]
pub struct Challenge {
    pub value: [u8; 32],
    pub issued_at: DateTime<Utc>,
    pub ceremony: CeremonyKind,
}

impl Challenge {
    /// Check expiry and ceremony kind against the caller's policy.
    ///
    /// `consume` deliberately does not perform these checks; expiry is a
    /// single comparison here rather than logic scattered across callers.
    pub fn validate(
        &self,
        expected: CeremonyKind,
        now: DateTime<Utc>,
        timeout_ms: u64,
    ) -> Result<(), WebAuthnError> {
        if now - self.issued_at > Duration::milliseconds(timeout_ms as i64) {
            return Err(WebAuthnError::ChallengeExpired);
        }
        if self.ceremony != expected {
            return Err(WebAuthnError::CeremonyMismatch);
        }
        Ok(())
    }
}

/// Issues and consumes challenges keyed by an opaque session identifier.
#[derive(Debug, Default)]
pub struct ChallengeManager {
    slots: Mutex<HashMap<String, Challenge>>,
}

impl ChallengeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh 32-byte challenge and bind it to the session,
    /// overwriting any prior challenge for that session.
    pub fn issue(&self, ceremony: CeremonyKind, session: &str) -> Challenge {
        self.issue_at(ceremony, session, Utc::now())
    }

    /// Issue with an explicit timestamp.
    pub fn issue_at(
        &self,
        ceremony: CeremonyKind,
        session: &str,
        issued_at: DateTime<Utc>,
    ) -> Challenge {
        let mut value = [0u8; 32];
        OsRng.fill_bytes(&mut value);
        let challenge = Challenge {
            value,
            issued_at,
            ceremony,
        };
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.to_string(), challenge.clone());
        challenge
    }

    /// Atomically read and delete the stored challenge for a session.
    ///
    /// Expiry and ceremony-kind checks are the caller's job via
    /// [`Challenge::validate`].
    pub fn consume(&self, session: &str) -> Result<Challenge, WebAuthnError> {
        // A poisoned lock only means a peer thread panicked while holding
        // it; the map itself is still coherent, so recover the guard.
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session)
            .ok_or(WebAuthnError::ChallengeNotFound)
    }
}
