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

//! A high-level client library for the Shrike threat-intelligence sharing
//! platform.
//!
//! The entry point is the [`Client`], built through [`Client::builder`]. The
//! client owns the whole session lifecycle: it authenticates with username
//! and password, keeps the access token fresh by refreshing it shortly
//! before it expires, retries a request exactly once when the server rejects
//! the token, and persists the token pair in a [`SessionStore`] so a session
//! survives a restart.
//!
//! # Example
//!
//! ```no_run
//! use shrike_sdk::{api::EventFilter, Client};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Client::builder().base_url("https://intel.example.org/api")?.build()?;
//! client.auth().authenticate("alice@example.org", "hunter2").await?;
//!
//! for event in client.events().list(&EventFilter::default()).await? {
//!     println!("{}: {}", event.id, event.info);
//! }
//! # Ok(()) }
//! ```
//!
//! Applications that need to react to the session ending, for instance to
//! navigate back to a login screen, can subscribe with
//! [`Client::subscribe_to_session_changes`].

#![warn(missing_debug_implementations, missing_docs)]

pub mod api;
pub mod authentication;
mod client;
pub mod config;
mod error;
mod http_client;
pub mod store;

pub use self::{
    authentication::{has_scope, Auth, Claims, SessionTokens},
    client::{Client, ClientBuildError, ClientBuilder, SessionChange},
    error::{
        ApiError, Error, HttpError, HttpResult, RefreshTokenError, Result, TokenDecodeError,
    },
    store::SessionStore,
};
