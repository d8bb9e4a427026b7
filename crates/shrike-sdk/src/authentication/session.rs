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

//! The session token pair and the claims decoded from the access token.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use super::REFRESH_SAFETY_MARGIN_SECS;
use crate::error::TokenDecodeError;

/// The decoded payload carried inside an access token.
///
/// Access tokens are JWTs; like the browser clients of the platform, the SDK
/// decodes the payload segment without verifying the signature. Verification
/// is the server's job, the client only needs the expiry and the granted
/// scopes.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// The subject the token was issued for, usually the user's email.
    #[serde(default)]
    pub sub: Option<String>,

    /// Expiry of the token, in seconds since the Unix epoch.
    pub exp: u64,

    /// The ordered list of permission scopes granted to this session.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Claims {
    /// Decode the claims out of the payload segment of a JWT.
    pub(crate) fn decode(access_token: &str) -> Result<Self, TokenDecodeError> {
        let mut segments = access_token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(TokenDecodeError::NotAJwt),
        };

        let payload = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Number of seconds until this token expires, negative if it already
    /// has.
    ///
    /// Expiries beyond `i64::MAX` saturate instead of wrapping, so a token
    /// with an absurdly large `exp` counts as far in the future.
    pub fn expires_in(&self, now: u64) -> i64 {
        let exp = i64::try_from(self.exp).unwrap_or(i64::MAX);
        let now = i64::try_from(now).unwrap_or(i64::MAX);
        exp.saturating_sub(now)
    }

    /// Whether the token has expired, the boundary being `exp == now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_in(now) <= 0
    }

    /// Whether the token is close enough to its expiry that it should be
    /// proactively refreshed before being used.
    pub(crate) fn needs_refresh(&self, now: u64) -> bool {
        self.expires_in(now) < REFRESH_SAFETY_MARGIN_SECS
    }
}

/// The mutable parts of a session: the token pair and the claims decoded from
/// the access token.
///
/// The claims are always the decoded form of the access token, the two can
/// only be set together through [`SessionTokens::new`].
#[derive(Clone)]
pub struct SessionTokens {
    access_token: String,
    refresh_token: Option<String>,
    claims: Claims,
}

impl SessionTokens {
    /// Create a new `SessionTokens`, decoding the claims out of the access
    /// token.
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<Self, TokenDecodeError> {
        let claims = Claims::decode(&access_token)?;
        Ok(Self { access_token, refresh_token, claims })
    }

    /// The access token used for this session.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The token used for refreshing the access token, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// The claims decoded from the access token.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens").field("claims", &self.claims).finish_non_exhaustive()
    }
}
