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

use log::{error, info};

pub fn log_adapter_init(adapter: &str) {
    info!("Initializing {adapter} idempotency data adapter");
}

pub fn log_adapter_ready(adapter: &str, store: &str) {
    info!("{adapter} idempotency data adapter ready (store: {store})");
}

pub fn log_adapter_stop(adapter: &str) {
    info!("Stopping {adapter} idempotency data adapter");
}

pub fn log_adapter_error(adapter: &str, operation: &str, error: &str) {
    error!("Error in {adapter} idempotency data adapter during {operation}: {error}");
}
