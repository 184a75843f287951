use crate::cache::Cache;
use crate::retry::RetryPolicy;
use anyhow::Result;
use async_trait::async_trait;
use extract::{ChatModel, StatusError};
use std::sync::Arc;
use tracing::debug;

/// Wraps a model with the response cache and the retry policy.
///
/// Cache entries are scoped by `scope`, a fingerprint of the caller's
/// credential, so a reply is only reused for the key that paid for it.
pub struct ResilientModel<M> {
    inner: M,
    scope: String,
    cache: Option<Arc<Cache>>,
    retry: Arc<RetryPolicy>,
}

impl<M: ChatModel> ResilientModel<M> {
    pub fn new(
        inner: M,
        scope: impl Into<String>,
        cache: Option<Arc<Cache>>,
        retry: Arc<RetryPolicy>,
    ) -> Self {
        Self {
            inner,
            scope: scope.into(),
            cache,
            retry,
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for ResilientModel<M> {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let label = self.inner.describe();
        let cache_key = format!("{}|{label}|{temperature}|{prompt}", self.scope);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get_llm_response(&cache_key) {
                debug!(model = %label, "Cache hit");
                return Ok(hit);
            }
        }

        let reply = self.retry
            .retry(&label, || self.inner.complete(prompt, temperature), is_transient)
            .await?;

        if let Some(cache) = &self.cache {
            if !reply.trim().is_empty() {
                cache.set_llm_response(&cache_key, reply.clone());
            }
        }

        Ok(reply)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Provider status errors say for themselves; anything else (timeouts,
/// connection resets) is worth another try
fn is_transient(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<StatusError>()
        .is_none_or(StatusError::is_transient)
}
