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

use std::{
    fmt::{self, Debug},
    sync::Arc,
};

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use url::Url;

use crate::{
    api::{Events, Users},
    authentication::{Auth, AuthCtx, SessionTokens},
    error::{HttpError, HttpResult},
    http_client::HttpClient,
    store::SessionStore,
};

mod builder;

pub use self::builder::{ClientBuildError, ClientBuilder};

/// A change of the session state, broadcast to subscribers.
///
/// Applications typically subscribe through
/// [`Client::subscribe_to_session_changes`] to persist tokens elsewhere or to
/// navigate: `LoggedOut` is the signal to redirect to the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// The access token (and possibly the refresh token) was replaced by a
    /// successful refresh exchange.
    TokensRefreshed,

    /// The session ended: explicit logout, failed refresh, or a request that
    /// kept being rejected after a refresh. Local and durable state have
    /// been cleared.
    LoggedOut,
}

/// An async client for the Shrike threat-intelligence sharing platform.
///
/// All of the state is held in an `Arc` so the `Client` can be cloned freely
/// and handed to every component that issues requests.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    /// The base URL of the platform API.
    base_url: Url,
    /// The underlying HTTP client.
    http_client: HttpClient,
    /// Authentication state: token pair, refresh lock, change publisher.
    auth_ctx: AuthCtx,
    /// Durable storage for the token pair.
    session_store: Arc<dyn SessionStore>,
}

#[cfg(not(tarpaulin_include))]
impl Debug for Client {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Client").field("base_url", &self.inner.base_url).finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn new(
        base_url: Url,
        http_client: HttpClient,
        auth_ctx: AuthCtx,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self { inner: Arc::new(ClientInner { base_url, http_client, auth_ctx, session_store }) }
    }

    /// The base URL of the platform API this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Access the session management API.
    pub fn auth(&self) -> Auth {
        Auth::new(self.clone())
    }

    /// Access the events API.
    pub fn events(&self) -> Events {
        Events::new(self.clone())
    }

    /// Access the users API.
    pub fn users(&self) -> Users {
        Users::new(self.clone())
    }

    /// Is the client authenticated.
    ///
    /// Shorthand for [`Auth::is_authenticated`].
    pub fn is_authenticated(&self) -> bool {
        self.auth().is_authenticated()
    }

    /// Get the current token pair of this client.
    ///
    /// Will be `None` if the client is anonymous.
    pub fn session_tokens(&self) -> Option<SessionTokens> {
        self.inner.auth_ctx.session_tokens()
    }

    /// Get the current access token for this session.
    pub fn access_token(&self) -> Option<String> {
        self.session_tokens().map(|tokens| tokens.access_token().to_owned())
    }

    /// Get the current refresh token for this session.
    pub fn refresh_token(&self) -> Option<String> {
        self.session_tokens().and_then(|tokens| tokens.refresh_token().map(ToOwned::to_owned))
    }

    /// Subscribe to changes of the session state.
    ///
    /// The receiver yields a [`SessionChange`] whenever the token pair is
    /// refreshed or the session ends.
    pub fn subscribe_to_session_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.inner.auth_ctx.session_change_sender.subscribe()
    }

    pub(crate) fn auth_ctx(&self) -> &AuthCtx {
        &self.inner.auth_ctx
    }

    pub(crate) fn http_client(&self) -> &HttpClient {
        &self.inner.http_client
    }

    pub(crate) fn session_store(&self) -> &dyn SessionStore {
        &*self.inner.session_store
    }

    /// Resolve an endpoint path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> HttpResult<Url> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send an authenticated request to the platform API.
    ///
    /// Before the request goes out the access token is refreshed if it is
    /// about to expire. A `401 Unauthorized` response triggers exactly one
    /// refresh-and-retry, tracked by the explicit `is_retry` flag; a second
    /// `401` is terminal and ends the session.
    pub(crate) async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.auth().ensure_valid().await?;

        let url = self.endpoint(path)?;
        let mut is_retry = false;

        loop {
            let res = self.send_inner(method.clone(), url.clone(), body, is_retry).await;

            match res {
                Err(error) if error.is_unauthorized() => {
                    if is_retry {
                        trace!("Token refresh: request rejected again after refresh, logging out");
                        self.auth().clear_session();
                        return Err(error);
                    }

                    trace!("Token refresh: unauthorized response received");
                    // A failed refresh already cleared the session; surface it.
                    self.auth().refresh_access_token().await.map_err(HttpError::RefreshToken)?;
                    trace!("Token refresh: refresh succeeded, retrying request");
                    is_retry = true;
                }
                _ => return res,
            }
        }
    }

    async fn send_inner<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        is_retry: bool,
    ) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let access_token = self.access_token();
        trace!(%url, is_retry, "Sending API request");
        self.inner.http_client.send(method, url, body, access_token.as_deref()).await
    }
}
