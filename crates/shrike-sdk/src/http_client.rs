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
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use reqwest::{Method, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};
use url::Url;

use crate::{
    config::RequestConfig,
    error::{ApiError, HttpResult},
};

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The JSON body the platform API sends along with error status codes.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<JsonValue>,
}

#[derive(Clone, Debug)]
pub(crate) struct HttpClient {
    pub(crate) inner: reqwest::Client,
    pub(crate) request_config: RequestConfig,
    next_request_id: Arc<AtomicU64>,
}

impl HttpClient {
    pub(crate) fn new(inner: reqwest::Client, request_config: RequestConfig) -> Self {
        HttpClient { inner, request_config, next_request_id: AtomicU64::new(0).into() }
    }

    fn get_request_id(&self) -> String {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        format!("REQ-{request_id}")
    }

    /// Send a request and deserialize the JSON response body.
    pub(crate) async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access_token: Option<&str>,
    ) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_raw(method, url, body, access_token).await?;
        Ok(response.json().await?)
    }

    /// Send a request, only checking the response status.
    ///
    /// The returned response's body has not been read yet.
    pub(crate) async fn send_raw<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access_token: Option<&str>,
    ) -> HttpResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let request_id = self.get_request_id();
        trace!(request_id, %method, %url, "Sending request");

        let mut builder =
            self.inner.request(method, url).timeout(self.request_config.timeout);
        if let Some(access_token) = access_token {
            builder = builder.bearer_auth(access_token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error = error_from_response(response).await;
            debug!(request_id, %status, "Error while sending request: {error}");
            return Err(error.into());
        }

        debug!(request_id, %status, "Got response");
        Ok(response)
    }
}

/// Build an [`ApiError`] out of an error response, extracting the `detail`
/// field of the body when there is one.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let detail = response.json::<ErrorBody>().await.ok().and_then(|body| body.detail).map(
        |detail| match detail {
            JsonValue::String(detail) => detail,
            other => other.to_string(),
        },
    );

    ApiError { status, detail }
}
