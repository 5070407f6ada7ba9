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

// ============================================================================
// Core Public Modules
// ============================================================================

/// Storage contract consumed by the idempotency middleware
pub mod adapter;

/// Error types for data adapters
pub mod error;

/// Lifecycle states and the guard that enforces them
pub mod lifecycle;

/// Logging helpers shared by adapter implementations
pub mod logging;

/// In-memory data adapter
pub mod memory;

/// Idempotency resource model
pub mod models;

// ============================================================================
// Clean Public API
// ============================================================================

pub use adapter::IdempotencyDataAdapter;
pub use error::{DataAdapterError, Result};
pub use lifecycle::{AdapterStatus, LifecycleGuard};
pub use memory::MemoryDataAdapter;
pub use models::{IdempotencyRequest, IdempotencyResource, IdempotencyResponse};

/// Default time-to-live of stored resources, in seconds (one day).
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;
