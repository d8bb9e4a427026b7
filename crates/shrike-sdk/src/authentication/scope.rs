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

//! Scope matching.

/// Check whether a set of granted scopes satisfies a required scope.
///
/// A scope is a permission string of the form `resource:action`. Access is
/// granted if the scopes contain the global wildcard `*`, the resource
/// wildcard `resource:*`, or the exact required scope.
///
/// This is a pure predicate with no side effects; it can be used to gate UI
/// elements as well as to skip requests the server would reject anyway.
///
/// # Examples
///
/// ```
/// use shrike_sdk::has_scope;
///
/// let scopes = ["events:*".to_owned(), "users:read".to_owned()];
/// assert!(has_scope(&scopes, "events:write"));
/// assert!(!has_scope(&scopes, "users:delete"));
/// ```
pub fn has_scope(scopes: &[String], required: &str) -> bool {
    let resource_wildcard =
        required.split_once(':').map(|(resource, _)| format!("{resource}:*"));

    scopes.iter().any(|scope| {
        scope == "*" || Some(scope.as_str()) == resource_wildcard.as_deref() || scope == required
    })
}
