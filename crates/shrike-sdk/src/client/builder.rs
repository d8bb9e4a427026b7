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

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::warn;
use url::Url;

use super::Client;
use crate::{
    authentication::{AuthCtx, SessionTokens, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
    config::RequestConfig,
    http_client::HttpClient,
    store::{MemoryStore, SessionStore},
};

/// Builder that allows creating and configuring various parts of a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use shrike_sdk::Client;
///
/// # fn main() -> anyhow::Result<()> {
/// let client = Client::builder().base_url("https://intel.example.org/api")?.build()?;
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct ClientBuilder {
    base_url: Option<Url>,
    request_config: RequestConfig,
    session_store: Option<Arc<dyn SessionStore>>,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("request_config", &self.request_config)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self { base_url: None, request_config: Default::default(), session_store: None }
    }

    /// Set the base URL of the platform API.
    ///
    /// This is the only mandatory option.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self, ClientBuildError> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Set the default [`RequestConfig`] to use for requests.
    pub fn request_config(mut self, request_config: RequestConfig) -> Self {
        self.request_config = request_config;
        self
    }

    /// Set the durable store the session tokens are persisted to.
    ///
    /// Defaults to an in-memory store, in which case the session does not
    /// outlive the process.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Create a [`Client`] with the options set on this builder.
    ///
    /// The session is hydrated from the session store: a token pair stored by
    /// a previous process is picked up again, so the user does not have to
    /// re-authenticate. A stored access token that fails to decode is
    /// discarded, store included, and the client starts out anonymous.
    pub fn build(self) -> Result<Client, ClientBuildError> {
        let mut base_url = self.base_url.ok_or(ClientBuildError::MissingBaseUrl)?;
        // Endpoint paths are joined onto the base URL, which only preserves
        // the last path segment of the base if it ends with a slash.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let session_store = self.session_store.unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let http_client = HttpClient::new(reqwest::Client::new(), self.request_config);
        let auth_ctx = AuthCtx::new();

        if let Some(access_token) = session_store.get(ACCESS_TOKEN_KEY) {
            let refresh_token = session_store.get(REFRESH_TOKEN_KEY);
            match SessionTokens::new(access_token, refresh_token) {
                Ok(tokens) => auth_ctx.set_session_tokens_unchecked(tokens),
                Err(error) => {
                    warn!("Discarding stored session, the access token is unusable: {error}");
                    session_store.delete(ACCESS_TOKEN_KEY);
                    session_store.delete(REFRESH_TOKEN_KEY);
                }
            }
        }

        Ok(Client::new(base_url, http_client, auth_ctx, session_store))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can happen when building a `Client`.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// No base URL was configured.
    #[error("no base URL was configured")]
    MissingBaseUrl,

    /// The supplied base URL is invalid.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
