// Copyright 2025 The Drasi Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::adapter::IdempotencyDataAdapter;
use crate::error::{ensure_key, DataAdapterError, Result};
use crate::lifecycle::{AdapterStatus, LifecycleGuard};
use crate::logging::{log_adapter_init, log_adapter_stop};
use crate::models::IdempotencyResource;
use crate::DEFAULT_TTL_SECONDS;

struct MemoryEntry {
    resource: IdempotencyResource,
    created_at: Instant,
}

type Entries = Arc<RwLock<HashMap<String, MemoryEntry>>>;

/// In-memory implementation of IdempotencyDataAdapter.
///
/// Data does not persist across restarts. Expiry is applied lazily: an entry
/// older than the TTL is invisible to every operation and is removed the next
/// time it is touched or when [`MemoryDataAdapter::purge_expired`] runs.
///
/// # Usage
///
/// ```ignore
/// use idempotency_lib::MemoryDataAdapter;
///
/// let adapter = MemoryDataAdapter::with_ttl(Duration::from_secs(30));
/// adapter.init().await?;
/// adapter.create(resource).await?;
/// ```
pub struct MemoryDataAdapter {
    ttl: Duration,
    entries: Entries,
    lifecycle: LifecycleGuard<Entries>,
    // Serializes init() and stop()
    transition: Mutex<()>,
}

impl Default for MemoryDataAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDataAdapter {
    /// Create an adapter with the default TTL of one day.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TTL_SECONDS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
            lifecycle: LifecycleGuard::new(),
            transition: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &MemoryEntry, now: Instant) -> bool {
        now.duration_since(entry.created_at) >= self.ttl
    }

    /// Remove every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let entries = self.lifecycle.require_ready().await?;
        let now = Instant::now();
        let mut map = entries.write().await;
        let before = map.len();
        map.retain(|_, entry| !self.is_expired(entry, now));
        let purged = before - map.len();
        if purged > 0 {
            debug!("Purged {purged} expired idempotency resources");
        }
        Ok(purged)
    }

    /// Number of live (unexpired) resources.
    pub async fn len(&self) -> Result<usize> {
        let entries = self.lifecycle.require_ready().await?;
        let now = Instant::now();
        let map = entries.read().await;
        Ok(map
            .values()
            .filter(|entry| !self.is_expired(entry, now))
            .count())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl IdempotencyDataAdapter for MemoryDataAdapter {
    async fn init(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        if !self.lifecycle.begin_initializing().await? {
            return Ok(());
        }
        log_adapter_init("memory");
        self.lifecycle.mark_ready(self.entries.clone()).await;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        log_adapter_stop("memory");
        self.lifecycle.mark_stopped().await;
        Ok(())
    }

    async fn status(&self) -> AdapterStatus {
        self.lifecycle.status().await
    }

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<IdempotencyResource>> {
        let entries = self.lifecycle.require_ready().await?;
        ensure_key(idempotency_key)?;
        let now = Instant::now();

        {
            let map = entries.read().await;
            match map.get(idempotency_key) {
                None => return Ok(None),
                Some(entry) if !self.is_expired(entry, now) => {
                    return Ok(Some(entry.resource.clone()));
                }
                Some(_) => {}
            }
        }

        let mut map = entries.write().await;
        if map
            .get(idempotency_key)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            map.remove(idempotency_key);
            debug!("Expired idempotency resource '{idempotency_key}'");
        }
        Ok(None)
    }

    async fn create(&self, resource: IdempotencyResource) -> Result<()> {
        let entries = self.lifecycle.require_ready().await?;
        ensure_key(&resource.idempotency_key)?;
        let now = Instant::now();

        let mut map = entries.write().await;
        if let Some(existing) = map.get(&resource.idempotency_key) {
            if !self.is_expired(existing, now) {
                return Err(DataAdapterError::duplicate_key(
                    resource.idempotency_key.clone(),
                ));
            }
        }
        map.insert(
            resource.idempotency_key.clone(),
            MemoryEntry {
                resource,
                created_at: now,
            },
        );
        Ok(())
    }

    async fn update(&self, resource: IdempotencyResource) -> Result<()> {
        let entries = self.lifecycle.require_ready().await?;
        ensure_key(&resource.idempotency_key)?;
        let now = Instant::now();

        let mut map = entries.write().await;
        let live = map
            .get(&resource.idempotency_key)
            .map(|entry| !self.is_expired(entry, now));
        match live {
            Some(true) => {
                map.insert(
                    resource.idempotency_key.clone(),
                    MemoryEntry {
                        resource,
                        created_at: now,
                    },
                );
                Ok(())
            }
            Some(false) => {
                map.remove(&resource.idempotency_key);
                Err(DataAdapterError::not_found(resource.idempotency_key))
            }
            None => Err(DataAdapterError::not_found(resource.idempotency_key)),
        }
    }

    async fn delete(&self, idempotency_key: &str) -> Result<()> {
        let entries = self.lifecycle.require_ready().await?;
        ensure_key(idempotency_key)?;
        entries.write().await.remove(idempotency_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdempotencyRequest, IdempotencyResponse};
    use serde_json::json;

    fn resource(key: &str) -> IdempotencyResource {
        IdempotencyResource::new(key, IdempotencyRequest::new("/x", "GET"))
    }

    async fn ready_adapter() -> MemoryDataAdapter {
        let adapter = MemoryDataAdapter::new();
        adapter.init().await.unwrap();
        adapter
    }

    #[tokio::test]
    async fn test_operations_fail_before_init() {
        let adapter = MemoryDataAdapter::new();

        let err = adapter.find_by_idempotency_key("abc").await.unwrap_err();
        assert!(err.is_not_initialized());
        assert!(adapter.create(resource("abc")).await.unwrap_err().is_not_initialized());
        assert!(adapter.update(resource("abc")).await.unwrap_err().is_not_initialized());
        assert!(adapter.delete("abc").await.unwrap_err().is_not_initialized());
    }

    #[tokio::test]
    async fn test_create_find_update_delete_scenario() {
        let adapter = ready_adapter().await;

        adapter.create(resource("abc")).await.unwrap();

        let found = adapter.find_by_idempotency_key("abc").await.unwrap().unwrap();
        assert_eq!(found, resource("abc"));
        assert!(found.response.is_none());

        let completed = found.with_response(IdempotencyResponse::new(200, json!({})));
        adapter.update(completed).await.unwrap();

        let found = adapter.find_by_idempotency_key("abc").await.unwrap().unwrap();
        assert_eq!(
            found.response,
            Some(IdempotencyResponse::new(200, json!({})))
        );

        adapter.delete("abc").await.unwrap();
        assert_eq!(adapter.find_by_idempotency_key("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_key_keeps_existing_resource() {
        let adapter = ready_adapter().await;
        adapter.create(resource("dup")).await.unwrap();

        let other = IdempotencyResource::new("dup", IdempotencyRequest::new("/other", "POST"));
        let err = adapter.create(other).await.unwrap_err();
        assert!(matches!(err, DataAdapterError::DuplicateKey { ref key } if key == "dup"));

        let found = adapter.find_by_idempotency_key("dup").await.unwrap().unwrap();
        assert_eq!(found.request.url, "/x");
    }

    #[tokio::test]
    async fn test_update_missing_key_is_not_found() {
        let adapter = ready_adapter().await;

        let err = adapter.update(resource("missing")).await.unwrap_err();
        assert!(matches!(err, DataAdapterError::NotFound { .. }));
        assert_eq!(adapter.find_by_idempotency_key("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let adapter = ready_adapter().await;
        assert!(adapter.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let adapter = ready_adapter().await;
        assert!(matches!(
            adapter.find_by_idempotency_key("").await,
            Err(DataAdapterError::InvalidKey)
        ));
        assert!(matches!(
            adapter.create(resource("")).await,
            Err(DataAdapterError::InvalidKey)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_resources_disappear() {
        let adapter = MemoryDataAdapter::with_ttl(Duration::from_secs(30));
        adapter.init().await.unwrap();
        adapter.create(resource("old")).await.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        adapter.create(resource("young")).await.unwrap();
        assert_eq!(adapter.len().await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(25)).await;
        assert_eq!(adapter.find_by_idempotency_key("old").await.unwrap(), None);
        assert!(adapter.find_by_idempotency_key("young").await.unwrap().is_some());

        // The expired key can be reused
        adapter.create(resource("old")).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_refreshes_created_at() {
        let adapter = MemoryDataAdapter::with_ttl(Duration::from_secs(30));
        adapter.init().await.unwrap();
        adapter.create(resource("abc")).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let completed =
            resource("abc").with_response(IdempotencyResponse::new(204, serde_json::Value::Null));
        adapter.update(completed).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let found = adapter.find_by_idempotency_key("abc").await.unwrap();
        assert!(found.is_some_and(|r| r.is_completed()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let adapter = MemoryDataAdapter::with_ttl(Duration::from_secs(5));
        adapter.init().await.unwrap();
        for key in ["a", "b", "c"] {
            adapter.create(resource(key)).await.unwrap();
        }

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(adapter.purge_expired().await.unwrap(), 3);
        assert!(adapter.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_blocks_operations_and_reinit_keeps_data() {
        let adapter = ready_adapter().await;
        adapter.create(resource("abc")).await.unwrap();

        adapter.stop().await.unwrap();
        assert_eq!(adapter.status().await, AdapterStatus::Stopped);
        assert!(adapter
            .find_by_idempotency_key("abc")
            .await
            .unwrap_err()
            .is_not_initialized());

        adapter.init().await.unwrap();
        assert!(adapter.is_initialized().await);
        assert!(adapter.find_by_idempotency_key("abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_transition() {
        let adapter = Arc::new(ready_adapter().await);

        let in_flight = adapter.transition.lock().await;
        let stopping = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.stop().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!stopping.is_finished());
        assert_eq!(adapter.status().await, AdapterStatus::Ready);

        drop(in_flight);
        stopping.await.unwrap().unwrap();
        assert_eq!(adapter.status().await, AdapterStatus::Stopped);
    }

    #[tokio::test]
    async fn test_concurrent_init_and_stop_end_consistent() {
        let adapter = Arc::new(MemoryDataAdapter::new());

        let (first, second) = tokio::join!(adapter.init(), adapter.init());
        first.unwrap();
        second.unwrap();
        assert_eq!(adapter.status().await, AdapterStatus::Ready);

        let (init, stop) = tokio::join!(adapter.init(), adapter.stop());
        init.unwrap();
        stop.unwrap();
        assert_eq!(adapter.status().await, AdapterStatus::Stopped);
    }

    #[tokio::test]
    async fn test_init_twice_is_noop() {
        let adapter = ready_adapter().await;
        adapter.create(resource("abc")).await.unwrap();
        adapter.init().await.unwrap();
        assert!(adapter.find_by_idempotency_key("abc").await.unwrap().is_some());
    }
}
