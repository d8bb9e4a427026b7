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

//! Types to manage the authentication session of a [`Client`].
//!
//! The platform authenticates with a short-lived JWT access token and a
//! longer-lived refresh token. The [`Auth`] API owns the token pair: it
//! performs the credential exchange, proactively refreshes the access token
//! before it expires, persists the pair to the client's
//! [`SessionStore`](crate::store::SessionStore) and clears everything again
//! on logout or when a refresh is rejected.

use std::{
    sync::{Arc, RwLock as StdRwLock},
    time::{SystemTime, UNIX_EPOCH},
};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, trace, warn};

use crate::{
    client::SessionChange,
    error::{HttpResult, RefreshTokenError, Result},
    Client,
};

pub mod scope;
pub mod session;

pub use self::{
    scope::has_scope,
    session::{Claims, SessionTokens},
};

/// Refresh the access token when it is this close to its expiry.
///
/// The margin keeps a request from going out with a token that expires while
/// the request is in flight.
pub(crate) const REFRESH_SAFETY_MARGIN_SECS: i64 = 30;

/// Storage key of the access token in the session store.
pub(crate) const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the refresh token in the session store.
pub(crate) const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Seconds since the Unix epoch.
pub(crate) fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Authentication state shared by all clones of a [`Client`].
pub(crate) struct AuthCtx {
    /// The current token pair, `None` while anonymous.
    session_tokens: StdRwLock<Option<SessionTokens>>,

    /// Lock making sure we're only doing one token refresh at a time.
    ///
    /// The slot holds the outcome of the latest exchange so that concurrent
    /// callers waiting on the lock all observe the same result instead of
    /// issuing their own exchange.
    refresh_token_lock: Mutex<Result<(), RefreshTokenError>>,

    /// The path the user meant to reach before being sent to authenticate.
    /// Transient, never persisted.
    return_url: StdRwLock<Option<String>>,

    /// Session change publisher. Lets the application redirect to the login
    /// or landing page when the session state changes under it.
    pub(crate) session_change_sender: broadcast::Sender<SessionChange>,
}

impl AuthCtx {
    pub(crate) fn new() -> Self {
        let (session_change_sender, _) = broadcast::channel(8);
        Self {
            session_tokens: StdRwLock::new(None),
            refresh_token_lock: Mutex::new(Ok(())),
            return_url: StdRwLock::new(None),
            session_change_sender,
        }
    }

    pub(crate) fn session_tokens(&self) -> Option<SessionTokens> {
        self.session_tokens.read().expect("session lock poisoned").clone()
    }

    pub(crate) fn set_session_tokens_unchecked(&self, tokens: SessionTokens) {
        *self.session_tokens.write().expect("session lock poisoned") = Some(tokens);
    }

    fn take_session_tokens(&self) -> Option<SessionTokens> {
        self.session_tokens.write().expect("session lock poisoned").take()
    }
}

/// The JSON body of a credential exchange request.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// The JSON body of a refresh exchange request.
#[derive(Debug, Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

/// The JSON body returned by both token endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// A high-level API to manage the authentication session of a [`Client`].
///
/// To access this API, use [`Client::auth()`].
#[derive(Debug, Clone)]
pub struct Auth {
    client: Client,
}

impl Auth {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    fn ctx(&self) -> &AuthCtx {
        self.client.auth_ctx()
    }

    /// Exchange a username and password for a token pair.
    ///
    /// On success the new session replaces any previous one and both tokens
    /// are persisted to the session store. On failure (wrong credentials, a
    /// network failure, or a malformed token in the response) the error is
    /// surfaced to the caller and the existing session, if any, is left
    /// untouched.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        let url = self.client.endpoint("auth/token")?;
        let request = TokenRequest { username, password };

        let response: TokenResponse =
            self.client.http_client().send(Method::POST, url, Some(&request), None).await?;

        let tokens = SessionTokens::new(response.access_token, response.refresh_token)?;
        self.set_session_tokens(tokens);
        info!("Authenticated as {username:?}");

        Ok(())
    }

    /// Is the client authenticated.
    ///
    /// Returns `true` iff a token pair is present and the access token's
    /// expiry is strictly in the future.
    pub fn is_authenticated(&self) -> bool {
        self.ctx().session_tokens().is_some_and(|tokens| !tokens.claims().is_expired(now()))
    }

    /// The permission scopes granted to the current session.
    ///
    /// Empty while anonymous. Use [`has_scope`](crate::has_scope) to match
    /// them against a required scope.
    pub fn current_scopes(&self) -> Vec<String> {
        self.ctx().session_tokens().map(|tokens| tokens.claims().scopes.clone()).unwrap_or_default()
    }

    /// Make sure the access token is valid for the near future, refreshing
    /// it if it expires within the safety margin.
    ///
    /// Called before every outgoing API request; idempotent and safe to call
    /// redundantly. Does nothing while anonymous. A failed refresh is
    /// terminal for the session (see [`refresh_access_token`]).
    ///
    /// [`refresh_access_token`]: Self::refresh_access_token
    pub async fn ensure_valid(&self) -> Result<(), RefreshTokenError> {
        let Some(tokens) = self.ctx().session_tokens() else {
            return Ok(());
        };

        if !tokens.claims().needs_refresh(now()) {
            return Ok(());
        }

        trace!("Token refresh: access token expires within the safety margin");
        self.refresh_access_token().await
    }

    /// Refresh the access token.
    ///
    /// This method is protected behind a lock, so calling this method several
    /// times at once will only call the endpoint once and all subsequent
    /// calls will wait for the result of the first call.
    ///
    /// On success the new token pair replaces the old one and is persisted.
    /// On failure the session is terminal: local state and durable storage
    /// are cleared, [`SessionChange::LoggedOut`] is broadcast and the user
    /// has to authenticate again.
    pub async fn refresh_access_token(&self) -> Result<(), RefreshTokenError> {
        macro_rules! fail {
            ($lock:expr, $err:expr) => {
                let error = $err;
                *$lock = Err(error.clone());
                return Err(error);
            };
        }

        let refresh_token_lock = &self.ctx().refresh_token_lock;
        let Ok(mut guard) = refresh_token_lock.try_lock() else {
            // Somebody else is already doing a token refresh; wait for it to
            // finish and share its outcome.
            return refresh_token_lock.lock().await.clone();
        };

        let Some(refresh_token) = self.client.refresh_token() else {
            fail!(guard, RefreshTokenError::RefreshTokenRequired);
        };

        let url = match self.client.endpoint("auth/refresh") {
            Ok(url) => url,
            Err(error) => {
                fail!(guard, RefreshTokenError::Http(Arc::new(error)));
            }
        };
        let request = RefreshRequest { refresh_token };

        let res: HttpResult<TokenResponse> =
            self.client.http_client().send(Method::POST, url, Some(&request), None).await;

        match res {
            Ok(response) => {
                // The server may rotate the refresh token; keep the old one
                // when it doesn't.
                let refresh_token =
                    response.refresh_token.or_else(|| self.client.refresh_token());

                match SessionTokens::new(response.access_token, refresh_token) {
                    Ok(tokens) => {
                        *guard = Ok(());
                        self.set_session_tokens(tokens);
                        let _ = self
                            .ctx()
                            .session_change_sender
                            .send(SessionChange::TokensRefreshed);
                        Ok(())
                    }
                    Err(decode_error) => {
                        error!("Token refresh: received a malformed access token");
                        self.clear_session();
                        fail!(guard, RefreshTokenError::TokenDecode(decode_error));
                    }
                }
            }
            Err(error) => {
                debug!("Token refresh: exchange failed: {error}");
                self.clear_session();
                fail!(guard, RefreshTokenError::Http(Arc::new(error)));
            }
        }
    }

    /// Log out the current session.
    ///
    /// The revocation call to the server is best-effort: local and durable
    /// state are cleared even when it fails, and
    /// [`SessionChange::LoggedOut`] is broadcast either way.
    pub async fn logout(&self) {
        if let Some(access_token) = self.client.access_token() {
            match self.client.endpoint("auth/logout") {
                Ok(url) => {
                    let res = self
                        .client
                        .http_client()
                        .send_raw(Method::POST, url, None::<&()>, Some(&access_token))
                        .await;
                    if let Err(error) = res {
                        debug!("Remote token revocation failed: {error}");
                    }
                }
                Err(error) => {
                    warn!("Could not build the logout endpoint URL: {error}");
                }
            }
        }

        self.clear_session();
    }

    /// The path the user meant to reach before being sent to authenticate,
    /// if any. Reading it clears it.
    pub fn take_return_url(&self) -> Option<String> {
        self.ctx().return_url.write().expect("return url lock poisoned").take()
    }

    /// Remember the path to send the user to after the next successful
    /// authentication.
    pub fn set_return_url(&self, url: impl Into<String>) {
        *self.ctx().return_url.write().expect("return url lock poisoned") = Some(url.into());
    }

    /// Replace the current session and persist the token pair.
    ///
    /// Durable-storage writes happen here and only here, immediately after
    /// the in-memory state is set.
    fn set_session_tokens(&self, tokens: SessionTokens) {
        let store = self.client.session_store();
        store.set(ACCESS_TOKEN_KEY, tokens.access_token());
        match tokens.refresh_token() {
            Some(refresh_token) => store.set(REFRESH_TOKEN_KEY, refresh_token),
            None => store.delete(REFRESH_TOKEN_KEY),
        }

        self.ctx().set_session_tokens_unchecked(tokens);
    }

    /// Drop the session and wipe it from durable storage.
    pub(crate) fn clear_session(&self) {
        if self.ctx().take_session_tokens().is_none() {
            // Already anonymous, nothing to clear or announce.
            return;
        }

        let store = self.client.session_store();
        store.delete(ACCESS_TOKEN_KEY);
        store.delete(REFRESH_TOKEN_KEY);

        let _ = self.ctx().session_change_sender.send(SessionChange::LoggedOut);
    }
}
