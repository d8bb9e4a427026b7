// Copyright 2024 The Shrike Project Developers
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

use std::time::Duration;

use crate::http_client::DEFAULT_REQUEST_TIMEOUT;

/// Configuration for requests the `Client` makes.
///
/// This sets how long a request is allowed to take. Timeout semantics are
/// delegated to the underlying transport; the client does not add a separate
/// timeout layer on top.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use shrike_sdk::config::RequestConfig;
///
/// let request_config = RequestConfig::new().timeout(Duration::from_secs(10));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct RequestConfig {
    pub(crate) timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}

impl RequestConfig {
    /// Create a new default `RequestConfig`.
    #[must_use]
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the timeout duration for all HTTP requests.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
