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

//! Error types for idempotency data adapters.
//!
//! Public adapter operations return `crate::error::Result<T>` with structured
//! `DataAdapterError` variants so callers can match on the failure class.
//! Caller-supplied delegates and other internal code use `anyhow::Result<T>`;
//! those errors are preserved through the transparent `Internal` variant.
//!
//! # Example
//!
//! ```ignore
//! use idempotency_lib::error::DataAdapterError;
//!
//! match adapter.create(resource).await {
//!     Err(DataAdapterError::DuplicateKey { key }) => {
//!         println!("'{key}' is already being processed");
//!     }
//!     Err(DataAdapterError::NotInitialized { .. }) => {
//!         adapter.init().await?;
//!     }
//!     Err(e) => return Err(e),
//!     Ok(()) => {}
//! }
//! ```

use thiserror::Error;

use crate::lifecycle::AdapterStatus;

/// Main error type for idempotency data adapters.
#[derive(Error, Debug)]
pub enum DataAdapterError {
    /// A database handle could not be resolved (missing configuration,
    /// unreachable endpoint, failing delegate).
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure
        message: String,
    },

    /// A provisioning step of `init()` failed.
    #[error("Initialization failed: {message}")]
    Initialization {
        /// Description of the provisioning failure
        message: String,
    },

    /// An operation was attempted while the adapter was not ready.
    #[error("Adapter has not been initialized (status: {status})")]
    NotInitialized {
        /// The status the adapter was in when the operation was attempted
        status: AdapterStatus,
    },

    /// A resource with the same idempotency key already exists.
    #[error("Idempotency key '{key}' already exists")]
    DuplicateKey {
        /// The conflicting idempotency key
        key: String,
    },

    /// No resource exists for the idempotency key.
    #[error("Idempotency key '{key}' not found")]
    NotFound {
        /// The missing idempotency key
        key: String,
    },

    /// The idempotency key is empty.
    #[error("Idempotency key cannot be empty")]
    InvalidKey,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error
        message: String,
    },

    /// Operation is not valid in the current state.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the state error
        message: String,
    },

    /// The underlying store rejected or failed an operation.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// Internal error - wraps underlying errors while preserving the error chain.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// ============================================================================
// Constructor helpers for common error patterns
// ============================================================================

impl DataAdapterError {
    /// Create a connection error.
    ///
    /// # Example
    /// ```ignore
    /// DataAdapterError::connection("Server selection timeout")
    /// ```
    pub fn connection(message: impl Into<String>) -> Self {
        DataAdapterError::Connection {
            message: message.into(),
        }
    }

    /// Create an initialization error.
    pub fn initialization(message: impl Into<String>) -> Self {
        DataAdapterError::Initialization {
            message: message.into(),
        }
    }

    /// Create a not initialized error for the given status.
    pub fn not_initialized(status: AdapterStatus) -> Self {
        DataAdapterError::NotInitialized { status }
    }

    /// Create a duplicate key error.
    ///
    /// # Example
    /// ```ignore
    /// DataAdapterError::duplicate_key("5f0c8a3e")
    /// ```
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        DataAdapterError::DuplicateKey { key: key.into() }
    }

    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        DataAdapterError::NotFound { key: key.into() }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        DataAdapterError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        DataAdapterError::InvalidState {
            message: message.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        DataAdapterError::Storage {
            message: message.into(),
        }
    }

    /// Returns `true` when the error reports an idempotency key conflict.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DataAdapterError::DuplicateKey { .. })
    }

    /// Returns `true` when the error reports that the adapter is not ready.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, DataAdapterError::NotInitialized { .. })
    }
}

/// Result type for data adapter operations.
pub type Result<T> = std::result::Result<T, DataAdapterError>;

/// Reject empty idempotency keys before they reach a store.
pub fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(DataAdapterError::InvalidKey);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
