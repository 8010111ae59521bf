use std::sync::Arc;

use societas_completion::CompletionClient;
use societas_identity::{IdentityProvider, VerifiedUser};
use societas_store::DocumentStore;

use crate::{services::ServiceError, ApiError};

/// Shared handles for every request. All clients are stateless and built once
/// at process start.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    completion: Arc<dyn CompletionClient>,
    system_instruction: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        completion: Arc<dyn CompletionClient>,
        system_instruction: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            identity,
            completion,
            system_instruction: system_instruction.into(),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub fn completion(&self) -> &dyn CompletionClient {
        self.completion.as_ref()
    }

    /// Persona instruction sent with every chat completion.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub async fn authenticate(&self, token: &str) -> Result<VerifiedUser, ApiError> {
        self.identity
            .verify_token(token)
            .await
            .map_err(|err| ApiError::from(ServiceError::from(err)))
    }
}
