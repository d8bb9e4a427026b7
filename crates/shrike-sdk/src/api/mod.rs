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

//! High-level access to the platform's REST resources.
//!
//! Every request sent from here goes through the authenticated request path
//! of the [`Client`](crate::Client), so tokens are refreshed transparently
//! and a rejected access token is retried once after a forced refresh.

mod events;
mod users;

pub use self::{
    events::{Attribute, Event, EventCreate, EventFilter, Events},
    users::{User, UserCreate, Users},
};
