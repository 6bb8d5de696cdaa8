//! JSON REST API for identity resolution.
//!
//! Exposes an axum [`Router`] backed by any [`ident_core::store::IdentityStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(ident_api::api_router(store.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod identify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ident_core::store::IdentityStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IdentityStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/contacts", get(contacts::list::<S>))
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    .route("/contacts/{id}/identity", get(contacts::identity::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use ident_core::{
    contact::{Contact, LinkPrecedence},
    memory::{MemoryRepository, MemoryStore},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn send(
    store: &Arc<MemoryStore>,
    method: &str,
    uri: &str,
    body: Option<&str>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder
      .body(Body::from(body.unwrap_or_default().to_string()))
      .unwrap();
    let resp = api_router(store.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn identify(store: &Arc<MemoryStore>, body: Value) -> (StatusCode, Value) {
    send(store, "POST", "/identify", Some(&body.to_string())).await
  }

  // ── POST /identify ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn identify_new_email_returns_fresh_primary() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = identify(&store, json!({ "email": "a@x.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({
      "primaryContactId": body["primaryContactId"],
      "emails": ["a@x.com"],
      "phoneNumbers": [],
      "secondaryContactIds": [],
    }));
    assert!(body["primaryContactId"].is_i64());
  }

  #[tokio::test]
  async fn identify_without_identifiers_is_400() {
    let store = Arc::new(MemoryStore::new());
    for body in [json!({}), json!({ "email": null, "phoneNumber": null })] {
      let (status, body) = identify(&store, body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(body["error"], "at least one identifier required");
    }
    assert!(store.snapshot().contacts().is_empty());
  }

  #[tokio::test]
  async fn identify_malformed_body_is_400_json() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(&store, "POST", "/identify", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    for phone in [json!(true), json!(1500.5)] {
      let (status, body) = identify(&store, json!({ "phoneNumber": phone })).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert!(body["error"].is_string());
    }
    assert!(store.snapshot().contacts().is_empty());
  }

  #[tokio::test]
  async fn identify_store_failure_is_500_json() {
    // A secondary whose link target does not exist.
    let orphan: Contact = serde_json::from_value(json!({
      "id": 2,
      "email": "b@x.com",
      "phoneNumber": null,
      "linkPrecedence": "secondary",
      "linkedId": 1,
      "createdAt": "2024-01-01T00:00:00Z",
      "updatedAt": "2024-01-01T00:00:00Z",
    }))
    .unwrap();
    let store = Arc::new(MemoryStore::from_repository(
      MemoryRepository::with_contacts(vec![orphan.clone()]),
    ));

    let (status, body) = identify(&store, json!({ "email": "b@x.com" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert_eq!(store.snapshot().contacts(), [orphan]);

    let (status, body) = send(&store, "GET", "/contacts/2/identity", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn identify_links_and_merges() {
    let store = Arc::new(MemoryStore::new());
    let (_, p1) = identify(&store, json!({ "email": "a@x.com" })).await;
    let (_, p2) = identify(&store, json!({ "phoneNumber": 222 })).await;

    let (status, merged) =
      identify(&store, json!({ "email": "a@x.com", "phoneNumber": "222" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["primaryContactId"], p1["primaryContactId"]);
    assert_eq!(merged["phoneNumbers"], json!(["222"]));
    assert_eq!(merged["secondaryContactIds"], json!([p2["primaryContactId"]]));

    let id = p2["primaryContactId"].as_i64().unwrap();
    let demoted = store.snapshot().contacts().iter().find(|c| c.id == id).cloned().unwrap();
    assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
  }

  // ── GET /contacts ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn contact_endpoints_expose_stored_rows() {
    let store = Arc::new(MemoryStore::new());
    let (_, view) = identify(&store, json!({ "email": "a@x.com", "phoneNumber": "111" })).await;
    identify(&store, json!({ "email": "b@x.com", "phoneNumber": "111" })).await;
    let id = view["primaryContactId"].as_i64().unwrap();

    let (status, list) = send(&store, "GET", "/contacts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, contact) = send(&store, "GET", &format!("/contacts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contact["linkPrecedence"], "primary");
    assert_eq!(contact["linkedId"], Value::Null);

    let secondary = list[1]["id"].as_i64().unwrap();
    let (status, view) =
      send(&store, "GET", &format!("/contacts/{secondary}/identity"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["primaryContactId"], id);
    assert_eq!(view["emails"], json!(["a@x.com", "b@x.com"]));
  }

  #[tokio::test]
  async fn unknown_contact_is_404() {
    let store = Arc::new(MemoryStore::new());
    for uri in ["/contacts/42", "/contacts/42/identity"] {
      let (status, body) = send(&store, "GET", uri, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND);
      assert_eq!(body["error"], "contact 42 not found");
    }
  }
}
