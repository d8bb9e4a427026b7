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

//! Durable storage for the authentication session.
//!
//! The [`SessionStore`] is a synchronous, process-local key-value substrate
//! used by the [`Client`](crate::Client) to persist its token pair across
//! restarts, the same way a browser client would use local storage. The
//! session manager is the only writer of the token keys; other components
//! must not touch them.

use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard},
};

/// A synchronous key-value store used as the durability substrate for session
/// tokens.
///
/// Implementations are expected to be cheap: the client reads the token keys
/// once at construction and writes them on every successful authentication or
/// refresh.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove the value stored under `key`, if any.
    fn delete(&self, key: &str);
}

/// An in-memory [`SessionStore`].
///
/// Contents are lost when the process exits; useful for tests and for
/// applications that do not want sessions to outlive them.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // The mutex is only held for single map operations, it can't be
        // poisoned by a panicking holder.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_owned(), value.to_owned());
    }

    fn delete(&self, key: &str) {
        self.lock().remove(key);
    }
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}
