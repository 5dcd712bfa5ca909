//! Credential storage abstraction
//!
//! The core never owns durable storage; hosts implement
//! [`CredentialRepository`] over their transactional store. The sign-count
//! update is compare-and-swap on the expected prior count so two concurrent
//! logins with a cloned authenticator cannot both commit.

use crate::error::WebAuthnError;
use crate::types::PublicKeyCredentialSource;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Look up a credential by its globally unique id.
    async fn find_by_credential_id(
        &self,
        id: &[u8],
    ) -> Result<Option<PublicKeyCredentialSource>, WebAuthnError>;

    /// All credentials registered to a user handle.
    async fn find_all_by_user_handle(
        &self,
        handle: &[u8],
    ) -> Result<Vec<PublicKeyCredentialSource>, WebAuthnError>;

    /// Persist a new credential; fails `DuplicateCredential` if the id is
    /// already registered, for any user.
    async fn save(&self, source: PublicKeyCredentialSource) -> Result<(), WebAuthnError>;

    /// Atomically set the sign count from `expected` to `new`.
    ///
    /// Fails `NotFound` for unknown ids and `ConcurrentUpdateConflict` when
    /// the stored count no longer equals `expected`.
    async fn update_sign_count(
        &self,
        id: &[u8],
        expected: u32,
        new: u32,
    ) -> Result<(), WebAuthnError>;
}

/// In-memory repository with correct CAS semantics.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<Vec<u8>, PublicKeyCredentialSource>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for MemoryCredentialStore {
    async fn find_by_credential_id(
        &self,
        id: &[u8],
    ) -> Result<Option<PublicKeyCredentialSource>, WebAuthnError> {
        Ok(self.credentials.lock().await.get(id).cloned())
    }

    async fn find_all_by_user_handle(
        &self,
        handle: &[u8],
    ) -> Result<Vec<PublicKeyCredentialSource>, WebAuthnError> {
        Ok(self
            .credentials
            .lock()
            .await
            .values()
            .filter(|source| source.user_handle == handle)
            .cloned()
            .collect())
    }

    async fn save(&self, source: PublicKeyCredentialSource) -> Result<(), WebAuthnError> {
        let mut credentials = self.credentials.lock().await;
        if credentials.contains_key(&source.credential_id) {
            return Err(WebAuthnError::DuplicateCredential);
        }
        credentials.insert(source.credential_id.clone(), source);
        Ok(())
    }

    async fn update_sign_count(
        &self,
        id: &[u8],
        expected: u32,
        new: u32,
    ) -> Result<(), WebAuthnError> {
        let mut credentials = self.credentials.lock().await;
        let source = credentials.get_mut(id).ok_or(WebAuthnError::NotFound)?;
        if source.sign_count != expected {
            return Err(WebAuthnError::ConcurrentUpdateConflict);
        }
        source.sign_count = new;
        Ok(())
    }
}
