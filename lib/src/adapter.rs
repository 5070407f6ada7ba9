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

//! Data Adapter Trait
//!
//! This module provides the `IdempotencyDataAdapter` trait that the
//! idempotency middleware uses to persist idempotency resources.
//!
//! # Architecture
//!
//! The adapter system follows dependency inversion:
//! - **Lib** defines the `IdempotencyDataAdapter` trait and provides an
//!   in-memory implementation (`MemoryDataAdapter`)
//! - **External adapters** (in `components/adapters/`) implement this trait
//!   for persistent storage
//! - **Applications** construct an adapter, await `init()`, then hand it to
//!   the middleware
//!
//! # Usage
//!
//! ```ignore
//! use idempotency_adapter_mongodb::MongoAdapter;
//!
//! let adapter = MongoAdapter::builder()
//!     .with_connection_uri("mongodb://localhost:27017/app")
//!     .with_ttl_seconds(3600)
//!     .build()?;
//! adapter.init().await?;
//!
//! let adapter: Arc<dyn IdempotencyDataAdapter> = Arc::new(adapter);
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::lifecycle::AdapterStatus;
use crate::models::IdempotencyResource;

/// Trait defining the storage contract of the idempotency middleware.
///
/// Every CRUD operation requires a successful `init()`; calls made in any
/// other state fail with `DataAdapterError::NotInitialized`.
///
/// # Thread Safety
///
/// Implementations must be safe to call concurrently from multiple request
/// handlers once initialized.
#[async_trait]
pub trait IdempotencyDataAdapter: Send + Sync {
    /// Resolve the backing store and provision it.
    ///
    /// Calling `init()` on a ready adapter is a no-op. A failed `init()`
    /// leaves the adapter uninitialized so it can be retried.
    async fn init(&self) -> Result<()>;

    /// Release owned resources and move to `Stopped`.
    async fn stop(&self) -> Result<()>;

    /// Current lifecycle status.
    async fn status(&self) -> AdapterStatus;

    /// Find the resource stored for a key.
    ///
    /// # Returns
    /// * `Ok(Some(resource))` - The key exists; `response` is present only if stored
    /// * `Ok(None)` - No resource exists for the key
    /// * `Err(e)` - An error occurred
    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<IdempotencyResource>>;

    /// Store a new resource.
    ///
    /// Fails with `DataAdapterError::DuplicateKey` if the key already exists;
    /// the stored resource is left unchanged.
    async fn create(&self, resource: IdempotencyResource) -> Result<()>;

    /// Replace the resource stored for `resource.idempotency_key`.
    ///
    /// Fails with `DataAdapterError::NotFound` if the key does not exist.
    async fn update(&self, resource: IdempotencyResource) -> Result<()>;

    /// Delete the resource stored for a key. Deleting a missing key succeeds.
    async fn delete(&self, idempotency_key: &str) -> Result<()>;

    /// Whether the adapter is ready for CRUD operations.
    async fn is_initialized(&self) -> bool {
        self.status().await == AdapterStatus::Ready
    }
}
