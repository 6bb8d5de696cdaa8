//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | All contacts, ordered by id |
//! | `GET`  | `/contacts/:id` | 404 if not found |
//! | `GET`  | `/contacts/:id/identity` | Consolidated view of the contact's cluster |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use ident_core::{
  contact::{Contact, ContactId},
  identity::ConsolidatedIdentity,
  store::IdentityStore,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: IdentityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contacts = store
    .list_contacts()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(contacts))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError>
where
  S: IdentityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = store
    .get_contact(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(contact))
}

// ─── Identity ─────────────────────────────────────────────────────────────────

/// `GET /contacts/:id/identity`. Read-only; never creates or relinks.
pub async fn identity<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<ConsolidatedIdentity>, ApiError>
where
  S: IdentityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = store
    .identity_of(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(view))
}
