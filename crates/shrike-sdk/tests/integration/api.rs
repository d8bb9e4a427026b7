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

use serde_json::json;
use shrike_sdk::api::{EventCreate, EventFilter, UserCreate};
use wiremock::{
    matchers::{body_json, body_partial_json, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::{logged_in_client_with_server, make_jwt, now};

fn event_body(id: u64, info: &str) -> serde_json::Value {
    json!({
        "id": id,
        "org_id": 1,
        "info": info,
        "user_id": 1,
        "date": "2024-03-01",
        "uuid": "0b7ec25c-3f3b-4c4e-9a72-8a4d05f0ad7e",
        "published": false,
        "analysis": 0,
        "attribute_count": 1,
        "threat_level_id": 2,
        "attributes": [{
            "id": 7,
            "event_id": id,
            "category": "Network activity",
            "type": "ip-src",
            "value": "198.51.100.7",
            "to_ids": true,
        }],
    })
}

#[tokio::test]
async fn test_list_events() {
    let access_token = make_jwt(now() + 900, &["events:read"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/events/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([event_body(1, "C2 infrastructure"), event_body(2, "Phishing kit")])),
        )
        .expect(1)
        .named("`GET /events/`")
        .mount(&server)
        .await;

    let events = client.events().list(&EventFilter::default()).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].info, "C2 infrastructure");
    assert_eq!(events[0].attributes[0].kind, "ip-src");
    assert_eq!(events[0].attributes[0].value, "198.51.100.7");
    assert_eq!(events[1].id, 2);
}

#[tokio::test]
async fn test_list_events_with_filter() {
    let access_token = make_jwt(now() + 900, &["events:read"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/events/"))
        .and(query_param("limit", "10"))
        .and(query_param("info", "phishing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_body(2, "Phishing kit")])))
        .expect(1)
        .named("`GET /events/` filtered")
        .mount(&server)
        .await;

    let filter =
        EventFilter { limit: Some(10), info: Some("phishing".to_owned()), ..Default::default() };
    let events = client.events().list(&filter).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, 2);
}

#[tokio::test]
async fn test_get_event_by_id() {
    let access_token = make_jwt(now() + 900, &["events:read"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/events/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body(42, "Watering hole")))
        .expect(1)
        .named("`GET /events/42`")
        .mount(&server)
        .await;

    let event = client.events().get(42).await.unwrap();

    assert_eq!(event.id, 42);
    assert_eq!(event.info, "Watering hole");
}

#[tokio::test]
async fn test_get_event_not_found() {
    let access_token = make_jwt(now() + 900, &["events:read"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/events/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Event not found" })))
        .expect(1)
        .named("`GET /events/404`")
        .mount(&server)
        .await;

    let error = client.events().get(404).await.unwrap_err();
    let api_error = error.as_api_error().expect("the error should be an API error");
    assert_eq!(api_error.status, 404);
    assert_eq!(api_error.detail.as_deref(), Some("Event not found"));
}

#[tokio::test]
async fn test_create_event() {
    let access_token = make_jwt(now() + 900, &["events:create"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("POST"))
        .and(path("/events/"))
        .and(body_json(json!({ "org_id": 1, "info": "New campaign", "user_id": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body(3, "New campaign")))
        .expect(1)
        .named("`POST /events/`")
        .mount(&server)
        .await;

    let event = client
        .events()
        .create(&EventCreate { org_id: 1, info: "New campaign".to_owned(), user_id: 1, ..Default::default() })
        .await
        .unwrap();

    assert_eq!(event.id, 3);
}

#[tokio::test]
async fn test_update_event() {
    let access_token = make_jwt(now() + 900, &["events:update"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    let mut published = event_body(42, "Watering hole");
    published["published"] = json!(true);

    Mock::given(method("PATCH"))
        .and(path("/events/42"))
        .and(body_partial_json(json!({ "published": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(published))
        .expect(1)
        .named("`PATCH /events/42`")
        .mount(&server)
        .await;

    let event = client.events().update(42, &json!({ "published": true })).await.unwrap();

    assert_eq!(event.published, Some(true));
}

#[tokio::test]
async fn test_list_users() {
    let access_token = make_jwt(now() + 900, &["users:read"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "email": "alice@example.org" },
            { "id": 2, "email": "bob@example.org" },
        ])))
        .expect(1)
        .named("`GET /users/`")
        .mount(&server)
        .await;

    let users = client.users().list().await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[1].email, "bob@example.org");
}

#[tokio::test]
async fn test_create_user() {
    let access_token = make_jwt(now() + 900, &["users:create"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("POST"))
        .and(path("/users/"))
        .and(body_json(json!({ "email": "carol@example.org", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 3, "email": "carol@example.org" })),
        )
        .expect(1)
        .named("`POST /users/`")
        .mount(&server)
        .await;

    let user = client
        .users()
        .create(&UserCreate { email: "carol@example.org".to_owned(), password: "hunter2".to_owned() })
        .await
        .unwrap();

    assert_eq!(user.id, 3);
    assert_eq!(user.email, "carol@example.org");
}

#[tokio::test]
async fn test_get_user_by_id() {
    let access_token = make_jwt(now() + 900, &["users:read"]);
    let (client, server, _store) = logged_in_client_with_server(&access_token, "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "email": "alice@example.org" })))
        .expect(1)
        .named("`GET /users/1`")
        .mount(&server)
        .await;

    let user = client.users().get(1).await.unwrap();
    assert_eq!(user.email, "alice@example.org");
}
