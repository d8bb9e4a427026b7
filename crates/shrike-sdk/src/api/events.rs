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
use url::form_urlencoded;

use crate::{Client, Result};

/// A threat-intelligence event, the platform's central unit of sharing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Event {
    /// The numeric ID of the event.
    pub id: u64,
    /// The organisation that owns the event locally.
    pub org_id: u64,
    /// A short human-readable description of the event.
    pub info: String,
    /// The user that created the event.
    pub user_id: u64,
    /// The date the event refers to, as `YYYY-MM-DD`.
    pub date: Option<String>,
    /// The globally unique identifier of the event.
    pub uuid: Option<String>,
    /// Whether the event has been published.
    pub published: Option<bool>,
    /// The analysis maturity level of the event.
    pub analysis: Option<u8>,
    /// The number of attributes attached to the event.
    pub attribute_count: Option<u64>,
    /// The organisation that originally created the event.
    pub orgc_id: Option<u64>,
    /// The last-modified timestamp, as Unix seconds.
    pub timestamp: Option<u64>,
    /// The distribution level of the event.
    pub distribution: Option<u8>,
    /// The sharing group of the event, if distribution is group-scoped.
    pub sharing_group_id: Option<u64>,
    /// The threat level of the event.
    pub threat_level_id: Option<u8>,
    /// When the event was published, as Unix seconds.
    pub publish_timestamp: Option<u64>,
    /// Whether correlation is disabled for the whole event.
    pub disable_correlation: Option<bool>,
    /// The UUID of the event this event extends, if any.
    pub extends_uuid: Option<String>,
    /// Whether the event is protected against modification.
    pub protected: Option<bool>,
    /// The attributes attached to the event.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A single piece of data attached to an [`Event`], an IoC in most cases.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Attribute {
    /// The numeric ID of the attribute.
    pub id: u64,
    /// The event the attribute belongs to.
    pub event_id: u64,
    /// The object the attribute belongs to, if any.
    pub object_id: Option<u64>,
    /// The role of the attribute inside its object.
    pub object_relation: Option<String>,
    /// The category of the attribute, e.g. `Network activity`.
    pub category: String,
    /// The attribute type, e.g. `ip-src` or `sha256`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The value of the attribute.
    pub value: String,
    /// Whether the value is usable for automated detection.
    pub to_ids: Option<bool>,
    /// The globally unique identifier of the attribute.
    pub uuid: Option<String>,
    /// The last-modified timestamp, as Unix seconds.
    pub timestamp: Option<u64>,
    /// The distribution level of the attribute.
    pub distribution: Option<u8>,
    /// The sharing group, if distribution is group-scoped.
    pub sharing_group_id: Option<u64>,
    /// A free-form comment.
    pub comment: Option<String>,
    /// Whether the attribute has been soft-deleted.
    pub deleted: Option<bool>,
    /// Whether correlation is disabled for this attribute.
    pub disable_correlation: Option<bool>,
    /// When the value was first observed, as Unix seconds.
    pub first_seen: Option<u64>,
    /// When the value was last observed, as Unix seconds.
    pub last_seen: Option<u64>,
}

/// The body of a request to create a new [`Event`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct EventCreate {
    /// The organisation that will own the event.
    pub org_id: u64,
    /// A short human-readable description of the event.
    pub info: String,
    /// The user creating the event.
    pub user_id: u64,
    /// The date the event refers to, as `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// The distribution level of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<u8>,
    /// The threat level of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_level_id: Option<u8>,
    /// The analysis maturity level of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<u8>,
}

/// Server-side filtering and paging for [`Events::list`].
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// Skip this many events.
    pub skip: Option<u64>,
    /// Return at most this many events.
    pub limit: Option<u64>,
    /// Only return the event with this ID.
    pub id: Option<u64>,
    /// Only return events whose description matches.
    pub info: Option<String>,
}

impl EventFilter {
    /// Render the filter as the query string of the list endpoint.
    fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(skip) = self.skip {
            query.append_pair("skip", &skip.to_string());
        }
        if let Some(limit) = self.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(id) = self.id {
            query.append_pair("id", &id.to_string());
        }
        if let Some(info) = &self.info {
            query.append_pair("info", info);
        }
        query.finish()
    }
}

/// A high-level API to manage the events of the platform.
///
/// All the methods on this struct send requests to the server.
#[derive(Debug, Clone)]
pub struct Events {
    client: Client,
}

impl Events {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// List the events visible to the current user.
    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let query = filter.to_query();
        let path =
            if query.is_empty() { "events/".to_owned() } else { format!("events/?{query}") };
        Ok(self.client.send(Method::GET, &path, None::<&()>).await?)
    }

    /// Get a single event by its numeric ID.
    pub async fn get(&self, event_id: u64) -> Result<Event> {
        Ok(self.client.send(Method::GET, &format!("events/{event_id}"), None::<&()>).await?)
    }

    /// Create a new event.
    pub async fn create(&self, event: &EventCreate) -> Result<Event> {
        Ok(self.client.send(Method::POST, "events/", Some(event)).await?)
    }

    /// Partially update an event.
    ///
    /// Only the fields present in `changes` are touched on the server.
    pub async fn update(&self, event_id: u64, changes: &serde_json::Value) -> Result<Event> {
        Ok(self.client.send(Method::PATCH, &format!("events/{event_id}"), Some(changes)).await?)
    }
}
