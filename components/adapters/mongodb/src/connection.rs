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

//! Connection providers that hand the adapter a MongoDB database handle.
//!
//! A provider either owns its connection ([`OwnedConnection`]) or borrows
//! one from the host application through a delegate
//! ([`DelegatedConnection`]). Only owned connections are closed on shutdown.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use idempotency_lib::{DataAdapterError, Result};
use log::{debug, info};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::MongoConnectionConfig;

/// Database used when neither the configuration nor the URI names one.
pub const DEFAULT_DATABASE_NAME: &str = "test";

/// Future returned by a connection delegate.
pub type DatabaseFuture = BoxFuture<'static, anyhow::Result<Database>>;

/// Caller-supplied function returning a database handle it owns.
pub type DatabaseDelegate = Arc<dyn Fn() -> DatabaseFuture + Send + Sync>;

/// Resolves a ready-to-use database handle on demand.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Return a database handle.
    ///
    /// # Errors
    ///
    /// Returns `DataAdapterError::Connection` when no handle can be produced.
    async fn resolve(&self) -> Result<Database>;

    /// Close the connection if this provider owns one.
    ///
    /// # Returns
    /// * `Ok(true)` - An owned connection was closed
    /// * `Ok(false)` - There was nothing to close
    async fn shutdown(&self) -> Result<bool>;

    /// Whether `shutdown()` closes a connection this provider opened.
    fn owns_connection(&self) -> bool;
}

// =============================================================================
// Owned connection
// =============================================================================

/// Opens its own client from configuration on first use and reuses it.
pub struct OwnedConnection {
    config: MongoConnectionConfig,
    client: Mutex<Option<Client>>,
}

impl fmt::Debug for OwnedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connected = self.client.try_lock().map(|c| c.is_some()).unwrap_or(true);
        f.debug_struct("OwnedConnection")
            .field("database", &self.config.database)
            .field("connected", &connected)
            .finish_non_exhaustive()
    }
}

impl OwnedConnection {
    pub fn new(config: MongoConnectionConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// Whether a client is currently open.
    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    fn database_for(&self, client: &Client) -> Database {
        match &self.config.database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE_NAME)),
        }
    }

    async fn connect(&self) -> Result<Client> {
        let mut options = ClientOptions::parse(&self.config.uri).await.map_err(|e| {
            DataAdapterError::connection(format!("Invalid MongoDB connection URI: {e}"))
        })?;
        self.config.settings.apply(&mut options);

        let client = Client::with_options(options).map_err(|e| {
            DataAdapterError::connection(format!("Failed to create MongoDB client: {e}"))
        })?;

        // The driver connects lazily; ping so an unreachable endpoint fails here
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| DataAdapterError::connection(format!("MongoDB is unreachable: {e}")))?;

        Ok(client)
    }
}

#[async_trait]
impl ConnectionProvider for OwnedConnection {
    async fn resolve(&self) -> Result<Database> {
        let mut client = self.client.lock().await;
        if let Some(existing) = client.as_ref() {
            return Ok(self.database_for(existing));
        }

        let opened = self.connect().await?;
        let database = self.database_for(&opened);
        info!("Connected to MongoDB database '{}'", database.name());
        *client = Some(opened);
        Ok(database)
    }

    async fn shutdown(&self) -> Result<bool> {
        let client = self.client.lock().await.take();
        match client {
            Some(client) => {
                client.shutdown().await;
                info!("Closed MongoDB connection");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn owns_connection(&self) -> bool {
        true
    }
}

// =============================================================================
// Delegated connection
// =============================================================================

/// Borrows the database handle from a caller-supplied delegate.
///
/// The delegate is invoked on every `resolve()` and its result is returned
/// verbatim. The caller owns the handle, so `shutdown()` never closes it.
///
/// # Example
///
/// ```ignore
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let shared = client.clone();
/// let provider = DelegatedConnection::new(move || {
///     let client = shared.clone();
///     async move { Ok(client.database("app")) }
/// });
/// ```
#[derive(Clone)]
pub struct DelegatedConnection {
    delegate: DatabaseDelegate,
}

impl fmt::Debug for DelegatedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedConnection").finish_non_exhaustive()
    }
}

impl DelegatedConnection {
    pub fn new<F, Fut>(delegate: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Database>> + Send + 'static,
    {
        Self {
            delegate: Arc::new(move || delegate().boxed()),
        }
    }

    pub fn from_delegate(delegate: DatabaseDelegate) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl ConnectionProvider for DelegatedConnection {
    async fn resolve(&self) -> Result<Database> {
        let database = (self.delegate)().await.map_err(|e| {
            DataAdapterError::connection(format!("Connection delegate failed: {e:#}"))
        })?;
        debug!("Resolved MongoDB database '{}' from delegate", database.name());
        Ok(database)
    }

    async fn shutdown(&self) -> Result<bool> {
        debug!("Delegated MongoDB connection left open for its owner");
        Ok(false)
    }

    fn owns_connection(&self) -> bool {
        false
    }
}

// =============================================================================
// Missing connection
// =============================================================================

/// Placeholder used when neither a connection nor a delegate was configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingConnection;

#[async_trait]
impl ConnectionProvider for MissingConnection {
    async fn resolve(&self) -> Result<Database> {
        Err(DataAdapterError::connection(
            "No MongoDB connection configuration or delegate supplied",
        ))
    }

    async fn shutdown(&self) -> Result<bool> {
        Ok(false)
    }

    fn owns_connection(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const UNREACHABLE_URI: &str =
        "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200";

    #[tokio::test]
    async fn test_missing_connection_fails() {
        let provider = MissingConnection;
        assert!(matches!(
            provider.resolve().await,
            Err(DataAdapterError::Connection { .. })
        ));
        assert!(!provider.shutdown().await.unwrap());
        assert!(!provider.owns_connection());
    }

    #[tokio::test]
    async fn test_owned_connection_invalid_uri() {
        let provider = OwnedConnection::new(MongoConnectionConfig::new("not-a-uri"));
        let err = provider.resolve().await.unwrap_err();
        assert!(err.to_string().contains("Invalid MongoDB connection URI"));
        assert!(!provider.is_connected().await);
    }

    #[tokio::test]
    async fn test_owned_connection_unreachable_endpoint() {
        let provider = OwnedConnection::new(MongoConnectionConfig::new(UNREACHABLE_URI));
        assert!(provider.owns_connection());

        let err = provider.resolve().await.unwrap_err();
        assert!(matches!(err, DataAdapterError::Connection { .. }));
        assert!(!provider.is_connected().await);

        // Nothing was opened, so nothing is closed
        assert!(!provider.shutdown().await.unwrap());
    }

    #[tokio::test]
    async fn test_delegate_invoked_on_every_resolve() {
        let client = Client::with_uri_str(UNREACHABLE_URI).await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let provider = DelegatedConnection::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let client = client.clone();
            async move { Ok(client.database("shared")) }
        });

        assert_eq!(provider.resolve().await.unwrap().name(), "shared");
        assert_eq!(provider.resolve().await.unwrap().name(), "shared");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(!provider.owns_connection());
        assert!(!provider.shutdown().await.unwrap());
    }

    #[tokio::test]
    async fn test_delegate_error_becomes_connection_error() {
        let provider =
            DelegatedConnection::new(|| async { Err(anyhow::anyhow!("pool exhausted")) });

        let err = provider.resolve().await.unwrap_err();
        assert!(matches!(err, DataAdapterError::Connection { .. }));
        assert!(err.to_string().contains("pool exhausted"));
    }
}
