//! Response generation collaborator

use std::fmt::{self, Debug};
use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::signature::PromptSignature;

/// Output of one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub text: String,
    pub token_count: Option<u64>,
    pub model_id: Option<String>,
}

impl GeneratedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token_count: None,
            model_id: None,
        }
    }

    pub fn with_token_count(mut self, token_count: u64) -> Self {
        self.token_count = Some(token_count);
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// The expensive inference backend call
///
/// Must be safe to retry; the coordinator itself never retries. Failures are
/// reported as `DomainError::Generation`.
#[async_trait]
pub trait ResponseGenerator: Send + Sync + Debug {
    async fn generate(&self, signature: &PromptSignature) -> Result<GeneratedResponse, DomainError>;

    /// Model identifier recorded on cached entries
    fn model_id(&self) -> Option<&str> {
        None
    }
}

/// Adapts an async closure into a `ResponseGenerator`
pub struct FnGenerator<F> {
    func: F,
    model_id: Option<String>,
}

impl<F, Fut> FnGenerator<F>
where
    F: Fn(PromptSignature) -> Fut + Send + Sync,
    Fut: Future<Output = Result<GeneratedResponse, DomainError>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            model_id: None,
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

impl<F> Debug for FnGenerator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGenerator")
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ResponseGenerator for FnGenerator<F>
where
    F: Fn(PromptSignature) -> Fut + Send + Sync,
    Fut: Future<Output = Result<GeneratedResponse, DomainError>> + Send + 'static,
{
    async fn generate(&self, signature: &PromptSignature) -> Result<GeneratedResponse, DomainError> {
        let mut response = (self.func)(signature.clone()).await?;

        if response.model_id.is_none() {
            response.model_id = self.model_id.clone();
        }

        Ok(response)
    }

    fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }
}
