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

//! Lifecycle guard for data adapters
//!
//! Adapters move through `Uninitialized → Initializing → Ready → Stopped`.
//! The guard owns the handle produced by initialization so that a CRUD call
//! either gets a usable handle or a `NotInitialized` error, never a
//! half-initialized one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{DataAdapterError, Result};

/// Observable lifecycle status of a data adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterStatus {
    Uninitialized,
    Initializing,
    Ready,
    Stopped,
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

enum LifecycleState<H> {
    Uninitialized,
    Initializing,
    Ready(H),
    Stopped,
}

impl<H> LifecycleState<H> {
    fn status(&self) -> AdapterStatus {
        match self {
            Self::Uninitialized => AdapterStatus::Uninitialized,
            Self::Initializing => AdapterStatus::Initializing,
            Self::Ready(_) => AdapterStatus::Ready,
            Self::Stopped => AdapterStatus::Stopped,
        }
    }
}

/// Guards adapter operations behind a successful `init()`.
///
/// `H` is the handle produced by initialization (a database handle for
/// persistent adapters). All clones share the same underlying state.
pub struct LifecycleGuard<H> {
    state: Arc<RwLock<LifecycleState<H>>>,
}

impl<H> Clone for LifecycleGuard<H> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<H: Clone> LifecycleGuard<H> {
    /// Create a new guard in the `Uninitialized` state
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LifecycleState::Uninitialized)),
        }
    }

    pub async fn status(&self) -> AdapterStatus {
        self.state.read().await.status()
    }

    pub async fn is_ready(&self) -> bool {
        self.status().await == AdapterStatus::Ready
    }

    /// Move to `Initializing`.
    ///
    /// Returns `Ok(false)` when the adapter is already `Ready` and there is
    /// nothing to do, `Ok(true)` when the caller should run initialization.
    ///
    /// # Errors
    ///
    /// Returns `DataAdapterError::InvalidState` if another initialization is
    /// in progress.
    pub async fn begin_initializing(&self) -> Result<bool> {
        let mut state = self.state.write().await;
        match *state {
            LifecycleState::Ready(_) => Ok(false),
            LifecycleState::Initializing => Err(DataAdapterError::invalid_state(
                "Adapter initialization is already in progress",
            )),
            LifecycleState::Uninitialized | LifecycleState::Stopped => {
                *state = LifecycleState::Initializing;
                Ok(true)
            }
        }
    }

    /// Complete initialization and publish the handle
    pub async fn mark_ready(&self, handle: H) {
        *self.state.write().await = LifecycleState::Ready(handle);
    }

    /// Roll a failed initialization back to `Uninitialized`
    pub async fn mark_failed(&self) {
        *self.state.write().await = LifecycleState::Uninitialized;
    }

    /// Move to `Stopped`, returning the handle if the adapter was ready
    pub async fn mark_stopped(&self) -> Option<H> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, LifecycleState::Stopped) {
            LifecycleState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    /// Require that the adapter is ready and return a clone of its handle.
    ///
    /// # Errors
    ///
    /// Returns `DataAdapterError::NotInitialized` if the adapter is in any
    /// state other than `Ready`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// pub async fn delete(&self, key: &str) -> Result<()> {
    ///     let db = self.lifecycle.require_ready().await?;
    ///     // ... perform operation ...
    ///     Ok(())
    /// }
    /// ```
    pub async fn require_ready(&self) -> Result<H> {
        match &*self.state.read().await {
            LifecycleState::Ready(handle) => Ok(handle.clone()),
            other => Err(DataAdapterError::not_initialized(other.status())),
        }
    }
}

impl<H: Clone> Default for LifecycleGuard<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state_uninitialized() {
        let guard: LifecycleGuard<u32> = LifecycleGuard::new();
        assert_eq!(guard.status().await, AdapterStatus::Uninitialized);
        assert!(!guard.is_ready().await);
    }

    #[tokio::test]
    async fn test_mark_ready_publishes_handle() {
        let guard = LifecycleGuard::new();
        assert!(guard.begin_initializing().await.unwrap());
        assert_eq!(guard.status().await, AdapterStatus::Initializing);

        guard.mark_ready(7u32).await;
        assert!(guard.is_ready().await);
        assert_eq!(guard.require_ready().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_require_ready_fails_while_initializing() {
        let guard: LifecycleGuard<u32> = LifecycleGuard::new();
        guard.begin_initializing().await.unwrap();

        match guard.require_ready().await {
            Err(DataAdapterError::NotInitialized { status }) => {
                assert_eq!(status, AdapterStatus::Initializing);
            }
            _ => panic!("Expected NotInitialized error"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_initialization_rejected() {
        let guard: LifecycleGuard<u32> = LifecycleGuard::new();
        guard.begin_initializing().await.unwrap();

        let result = guard.begin_initializing().await;
        assert!(matches!(result, Err(DataAdapterError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_begin_initializing_when_ready_is_noop() {
        let guard = LifecycleGuard::new();
        guard.begin_initializing().await.unwrap();
        guard.mark_ready(1u32).await;

        assert!(!guard.begin_initializing().await.unwrap());
        assert!(guard.is_ready().await);
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retryable() {
        let guard = LifecycleGuard::new();
        guard.begin_initializing().await.unwrap();
        guard.mark_failed().await;
        assert_eq!(guard.status().await, AdapterStatus::Uninitialized);

        assert!(guard.begin_initializing().await.unwrap());
        guard.mark_ready(2u32).await;
        assert!(guard.is_ready().await);
    }

    #[tokio::test]
    async fn test_stop_returns_handle_and_blocks_operations() {
        let guard = LifecycleGuard::new();
        guard.begin_initializing().await.unwrap();
        guard.mark_ready(3u32).await;

        assert_eq!(guard.mark_stopped().await, Some(3));
        assert_eq!(guard.status().await, AdapterStatus::Stopped);
        assert!(guard.require_ready().await.is_err());

        // Stopping twice yields nothing to release
        assert_eq!(guard.mark_stopped().await, None);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let guard1: LifecycleGuard<u32> = LifecycleGuard::new();
        let guard2 = guard1.clone();

        guard1.begin_initializing().await.unwrap();
        guard1.mark_ready(4).await;

        assert!(guard2.is_ready().await);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&AdapterStatus::Ready).unwrap();
        assert_eq!(json, "\"ready\"");
        assert_eq!(AdapterStatus::Stopped.to_string(), "stopped");
    }
}
