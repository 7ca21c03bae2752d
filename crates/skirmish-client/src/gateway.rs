//! Cached gateway - conditional reads and invalidating writes
//!
//! Correctness never depends on cache survival: if the cached payload was
//! evicted between attaching the validator and receiving the "unchanged"
//! reply, the read is retried once without the precondition instead of
//! surfacing an error.

use std::sync::Arc;

use serde_json::Value;
use skirmish_cache::{CacheKey, ConditionalCache};
use skirmish_core::{SkirmishError, SkirmishResult};

use crate::{FetchOutcome, FetchStatus, Method, ResourceClient};

/// The collection prefix a mutation under `path` invalidates: the top-level
/// path segment. A mutation under `/characters/42` drops `/characters` and
/// everything below it. Deliberately coarse; correctness over hit rate.
///
/// Cache keys store paths verbatim, so the prefix keeps the path's form:
/// `characters/42` without a leading slash yields `characters`.
pub fn collection_prefix(path: &str) -> Option<String> {
    let (slashed, trimmed) = match path.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, path),
    };
    let first = trimmed.split('/').next()?;
    if first.is_empty() {
        return None;
    }
    if slashed {
        Some(format!("/{first}"))
    } else {
        Some(first.to_string())
    }
}

/// Read/write front over a `ResourceClient`, backed by the shared
/// conditional cache.
pub struct CachedGateway<C> {
    client: C,
    cache: Arc<ConditionalCache>,
}

impl<C: ResourceClient> CachedGateway<C> {
    pub fn new(client: C, cache: Arc<ConditionalCache>) -> Self {
        CachedGateway { client, cache }
    }

    pub fn cache(&self) -> &Arc<ConditionalCache> {
        &self.cache
    }

    /// Read a resource through the cache. An "unchanged" reply is served
    /// from the cached payload as if it were a fresh success.
    pub async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> SkirmishResult<Value> {
        let key = CacheKey::new(path, params);
        let precondition = self.cache.validator(&key);

        let outcome = self
            .client
            .get(path, params, precondition.as_deref())
            .await?;

        match outcome.status {
            FetchStatus::NotModified => {
                if let Some(payload) = self.cache.payload(&key) {
                    return Ok(payload);
                }
                // Payload evicted while the request was in flight; fetch
                // unconditionally rather than surface an error.
                tracing::debug!(path, "cached payload gone after not-modified, refetching");
                let retry = self.client.get(path, params, None).await?;
                self.adopt_fresh(key, path, retry)
            }
            FetchStatus::Fresh => self.adopt_fresh(key, path, outcome),
        }
    }

    /// Issue a mutating call, then drop the exact entry and the whole
    /// collection prefix so no participant observes data older than their
    /// own last write.
    pub async fn mutate(&self, method: Method, path: &str, body: &Value) -> SkirmishResult<Value> {
        let result = self.client.mutate(method, path, body).await?;

        self.cache.invalidate(&CacheKey::bare(path));
        if let Some(prefix) = collection_prefix(path) {
            self.cache.invalidate_prefix(&prefix);
        }

        Ok(result)
    }

    fn adopt_fresh(&self, key: CacheKey, path: &str, outcome: FetchOutcome) -> SkirmishResult<Value> {
        if outcome.status == FetchStatus::NotModified {
            // An unconditional read has nothing to be unchanged against.
            return Err(SkirmishError::Decode(format!(
                "unconditional read of {path} reported not-modified"
            )));
        }
        let payload = outcome
            .payload
            .ok_or_else(|| SkirmishError::Decode(format!("fresh read of {path} had no payload")))?;

        match outcome.validator {
            Some(validator) => self.cache.store(key, validator, payload.clone()),
            // No validator in the response: do not cache.
            None => self.cache.invalidate(&key),
        }

        Ok(payload)
    }
}
