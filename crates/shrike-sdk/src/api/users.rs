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

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{Client, Result};

/// A user account on the platform.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct User {
    /// The numeric ID of the user.
    pub id: u64,
    /// The email address the user signs in with.
    pub email: String,
}

/// The body of a request to create a new [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct UserCreate {
    /// The email address the user will sign in with.
    pub email: String,
    /// The initial password.
    pub password: String,
}

/// A high-level API to manage the user accounts of the platform.
#[derive(Debug, Clone)]
pub struct Users {
    client: Client,
}

impl Users {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// List the user accounts.
    pub async fn list(&self) -> Result<Vec<User>> {
        Ok(self.client.send(Method::GET, "users/", None::<&()>).await?)
    }

    /// Get a single user account by its numeric ID.
    pub async fn get(&self, user_id: u64) -> Result<User> {
        Ok(self.client.send(Method::GET, &format!("users/{user_id}"), None::<&()>).await?)
    }

    /// Create a new user account.
    pub async fn create(&self, user: &UserCreate) -> Result<User> {
        Ok(self.client.send(Method::POST, "users/", Some(user)).await?)
    }
}
