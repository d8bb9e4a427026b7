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

//! Error conditions.

use std::sync::Arc;

use reqwest::{Error as ReqwestError, StatusCode};
use thiserror::Error;
use url::ParseError as UrlParseError;

/// Result type of the shrike-sdk.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Result type of a pure HTTP request.
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// An error response from the platform API.
///
/// The server reports errors as a JSON body of the form
/// `{"detail": "..."}`; the detail is carried here verbatim when the
/// response contained one.
#[derive(Error, Debug, Clone)]
#[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no error detail"))]
pub struct ApiError {
    /// The HTTP status code of the response.
    pub status: StatusCode,
    /// The `detail` field of the error body, if there was one.
    pub detail: Option<String>,
}

impl ApiError {
    /// Whether this error is a `401 Unauthorized` response.
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

/// An HTTP error, representing either a connection error or an error response
/// returned by the platform API.
#[derive(Error, Debug)]
pub enum HttpError {
    /// An error at the HTTP layer.
    #[error(transparent)]
    Reqwest(#[from] ReqwestError),

    /// The server answered with a non-success status code.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An error while building the URL of an endpoint.
    #[error(transparent)]
    Url(#[from] UrlParseError),

    /// An error occurred while refreshing the access token.
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
}

impl HttpError {
    /// If `self` is [`Api`](Self::Api), returns the inner [`ApiError`].
    ///
    /// Otherwise, returns `None`.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error is a `401 Unauthorized` response from the server.
    ///
    /// A `401` can potentially be fixed with a token refresh and a retry of
    /// the originating request.
    pub fn is_unauthorized(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_unauthorized)
    }
}

/// Internal representation of errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error doing an HTTP request.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// An error while decoding an access token payload.
    #[error(transparent)]
    TokenDecode(#[from] TokenDecodeError),

    /// An error encountered when trying to parse a URL.
    #[error(transparent)]
    Url(#[from] UrlParseError),
}

impl Error {
    /// Shorthand for
    /// <code>.[as_http_error](Self::as_http_error)().[and_then](Option::and_then)([HttpError::as_api_error])</code>.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        self.as_http_error().and_then(HttpError::as_api_error)
    }

    /// If `self` is [`Http`](Self::Http), returns the inner [`HttpError`].
    ///
    /// Otherwise, returns `None`.
    pub fn as_http_error(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReqwestError> for Error {
    fn from(e: ReqwestError) -> Self {
        Error::Http(HttpError::Reqwest(e))
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Error::Http(HttpError::Api(e))
    }
}

impl From<RefreshTokenError> for Error {
    fn from(e: RefreshTokenError) -> Self {
        Error::Http(HttpError::RefreshToken(e))
    }
}

/// Errors that can happen when refreshing an access token.
///
/// The refresh exchange is protected behind a lock, so several concurrent
/// callers only trigger the exchange once and all of them observe its
/// outcome. This type is `Clone` so the outcome can be handed to every
/// waiter.
#[derive(Debug, Error, Clone)]
pub enum RefreshTokenError {
    /// Tried to send a refresh token request without a refresh token.
    #[error("missing refresh token")]
    RefreshTokenRequired,

    /// The refresh exchange itself failed.
    ///
    /// This is terminal for the session: the local state and the durable
    /// store have been cleared and the user needs to authenticate again.
    #[error(transparent)]
    Http(Arc<HttpError>),

    /// The exchange succeeded but the returned access token was malformed.
    ///
    /// Treated the same as a failed exchange: the session has been cleared.
    #[error(transparent)]
    TokenDecode(#[from] TokenDecodeError),
}

/// Errors that can happen when decoding the claims carried inside an access
/// token.
#[derive(Debug, Error, Clone)]
pub enum TokenDecodeError {
    /// The token does not have the three dot-separated segments of a JWT.
    #[error("the access token is not a three-segment JWT")]
    NotAJwt,

    /// The payload segment is not valid unpadded base64url.
    #[error("the token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload segment is not the expected JSON object.
    #[error("the token payload is not valid JSON: {0}")]
    Json(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for TokenDecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(Arc::new(e))
    }
}
