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

use idempotency_lib::{IdempotencyRequest, IdempotencyResource, IdempotencyResponse};
use mongodb::bson::{doc, DateTime, Document};
use mongodb::error::{Error, ErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};

/// Layout version written with every stored resource.
pub const SCHEMA_VERSION: &str = "1.0.0";

pub const SEARCH_BY_KEY_INDEX: &str = "searchByKey";
pub const TTL_INDEX: &str = "ttlKey";

const DUPLICATE_KEY_CODE: i32 = 11000;
const NAMESPACE_EXISTS_CODE: i32 = 48;

/// Persisted representation of an idempotency resource.
///
/// `created_at` must stay a BSON date: the TTL index ignores any other type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredResource {
    pub idempotency_key: String,
    pub request: IdempotencyRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<IdempotencyResponse>,
    pub schema_version: String,
    pub created_at: DateTime,
}

impl StoredResource {
    /// Stamp a resource with the current schema version and time.
    pub fn stamp(resource: IdempotencyResource) -> Self {
        Self::stamp_at(resource, DateTime::now())
    }

    pub fn stamp_at(resource: IdempotencyResource, created_at: DateTime) -> Self {
        Self {
            idempotency_key: resource.idempotency_key,
            request: resource.request,
            response: resource.response,
            schema_version: SCHEMA_VERSION.to_string(),
            created_at,
        }
    }
}

impl From<StoredResource> for IdempotencyResource {
    fn from(stored: StoredResource) -> Self {
        IdempotencyResource {
            idempotency_key: stored.idempotency_key,
            request: stored.request,
            response: stored.response,
        }
    }
}

pub(crate) fn key_filter(idempotency_key: &str) -> Document {
    doc! { "idempotencyKey": idempotency_key }
}

fn server_error_code(err: &Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

/// Whether the server rejected a write because of the unique key index.
pub(crate) fn is_duplicate_key_error(err: &Error) -> bool {
    server_error_code(err) == Some(DUPLICATE_KEY_CODE)
}

/// Whether a collection creation lost a race with another creator.
pub(crate) fn is_namespace_exists_error(err: &Error) -> bool {
    server_error_code(err) == Some(NAMESPACE_EXISTS_CODE)
}
