//! The `IdentityStore` trait: the async service boundary used by transports.
//!
//! The trait is implemented by storage backends (e.g. `ident-store-sqlite`,
//! or [`crate::memory::MemoryStore`] in tests). Higher layers (`ident-api`,
//! `ident-server`) depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  contact::{Contact, ContactId},
  identity::{ConsolidatedIdentity, IdentifyRequest},
};

/// Abstraction over an identity store backend.
///
/// Each [`identify`](Self::identify) call must run as one atomic unit: either
/// every write it performs becomes durable, or none does.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve `request` against the stored identity graph, inserting or
  /// relinking contacts as needed, and return the consolidated view.
  fn identify(
    &self,
    request: IdentifyRequest,
  ) -> impl Future<Output = Result<ConsolidatedIdentity, Self::Error>> + Send + '_;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// The consolidated view of the cluster containing contact `id`, without
  /// writing anything. Returns `None` if the contact does not exist.
  fn identity_of(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<ConsolidatedIdentity>, Self::Error>>
  + Send
  + '_;

  /// List every contact, ordered by id.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;
}
