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

//! Configuration for the MongoDB idempotency data adapter.

use idempotency_lib::{DataAdapterError, Result, DEFAULT_TTL_SECONDS};
use mongodb::options::{ClientOptions, Credential};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_COLLECTION_PREFIX: &str = "idempotency";
pub const STORE_COLLECTION_SUFFIX: &str = "Store";
pub const SCHEMA_COLLECTION_SUFFIX: &str = "Schema";

// =============================================================================
// Driver Settings
// =============================================================================

/// Driver settings applied over the options parsed from the connection URI.
///
/// Unset fields keep whatever the URI (or the driver default) specifies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub max_pool_size: Option<u32>,
    #[serde(default)]
    pub min_pool_size: Option<u32>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub server_selection_timeout_ms: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ConnectionSettings {
    pub fn apply(&self, options: &mut ClientOptions) {
        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(size) = self.max_pool_size {
            options.max_pool_size = Some(size);
        }
        if let Some(size) = self.min_pool_size {
            options.min_pool_size = Some(size);
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }

        // Credentials override the URI only when both parts are present
        if let (Some(u), Some(p)) = (&self.username, &self.password) {
            let credential = Credential::builder()
                .username(u.clone())
                .password(p.clone())
                .build();
            options.credential = Some(credential);
        }
    }
}

// =============================================================================
// Connection Configuration
// =============================================================================

/// How the adapter opens its own connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MongoConnectionConfig {
    /// MongoDB connection string
    pub uri: String,

    /// Database name; falls back to the URI default database
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub settings: ConnectionSettings,
}

impl MongoConnectionConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            return Err(DataAdapterError::invalid_config(
                "connection uri cannot be empty",
            ));
        }
        if self.database.as_deref() == Some("") {
            return Err(DataAdapterError::invalid_config(
                "database cannot be empty when specified",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Adapter Configuration
// =============================================================================

/// MongoDB idempotency data adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MongoAdapterConfig {
    /// Connection opened and owned by the adapter. Leave unset when the
    /// handle is supplied through a delegate.
    #[serde(default)]
    pub connection: Option<MongoConnectionConfig>,

    /// Prefix of the store and schema collection names
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,

    /// Time-to-live of stored resources, in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_collection_prefix() -> String {
    DEFAULT_COLLECTION_PREFIX.to_string()
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

impl Default for MongoAdapterConfig {
    fn default() -> Self {
        Self {
            connection: None,
            collection_prefix: default_collection_prefix(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl MongoAdapterConfig {
    pub fn store_collection_name(&self) -> String {
        format!("{}{STORE_COLLECTION_SUFFIX}", self.collection_prefix)
    }

    pub fn schema_collection_name(&self) -> String {
        format!("{}{SCHEMA_COLLECTION_SUFFIX}", self.collection_prefix)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_store()?;

        if let Some(connection) = &self.connection {
            connection.validate()?;
        }

        Ok(())
    }

    /// Validate the collection prefix and TTL, ignoring the connection.
    pub fn validate_store(&self) -> Result<()> {
        if self.collection_prefix.is_empty() {
            return Err(DataAdapterError::invalid_config(
                "collection_prefix cannot be empty",
            ));
        }

        if self.ttl_seconds == 0 {
            return Err(DataAdapterError::invalid_config(
                "ttl_seconds must be greater than zero",
            ));
        }

        Ok(())
    }
}
