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

//! Idempotency resource model shared by the middleware and its data adapters.
//!
//! Field names serialize in camelCase to match the documents written by
//! other idempotency middleware implementations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The original HTTP request guarded by an idempotency key.
///
/// The adapter treats the request as an opaque payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdempotencyRequest {
    pub url: String,
    pub method: String,
    /// Arbitrary JSON. BSON-backed adapters reject integers above
    /// `i64::MAX` with a storage error.
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub headers: HashMap<String, Value>,
    #[serde(default)]
    pub query: HashMap<String, Value>,
}

impl IdempotencyRequest {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            body: Value::Null,
            headers: HashMap::new(),
            query: HashMap::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}

/// The response produced once the guarded operation completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyResponse {
    pub status_code: u16,
    /// Same integer range limit as [`IdempotencyRequest::body`].
    #[serde(default)]
    pub body: Value,
}

impl IdempotencyResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }
}

/// A key, the request it guards and, once available, the response.
///
/// A resource without a response is in flight; one with a response is
/// completed. There is no other state field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyResource {
    pub idempotency_key: String,
    pub request: IdempotencyRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<IdempotencyResponse>,
}

impl IdempotencyResource {
    pub fn new(idempotency_key: impl Into<String>, request: IdempotencyRequest) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            request,
            response: None,
        }
    }

    pub fn with_response(mut self, response: IdempotencyResponse) -> Self {
        self.response = Some(response);
        self
    }

    /// Whether the guarded operation has produced a response
    pub fn is_completed(&self) -> bool {
        self.response.is_some()
    }
}
