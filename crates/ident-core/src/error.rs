//! Error types for `ident-core`.

use thiserror::Error;

use crate::contact::{ContactId, LinkPrecedence};

#[derive(Debug, Error)]
pub enum Error {
  /// Neither an email nor a phone number was supplied.
  #[error("at least one identifier required")]
  MissingIdentifier,

  #[error("contact not found: {0}")]
  ContactNotFound(ContactId),

  /// A secondary links to a contact that does not exist.
  #[error("contact {from} links to missing contact {to}")]
  DanglingLink { from: ContactId, to: ContactId },

  #[error("link cycle detected at contact {0}")]
  LinkCycle(ContactId),

  #[error("{precedence} contact cannot have linked_id {linked_id:?}")]
  InvalidLink {
    precedence: LinkPrecedence,
    linked_id:  Option<ContactId>,
  },

  #[error("unknown link precedence: {0:?}")]
  UnknownPrecedence(String),
}

impl Error {
  /// `true` for errors caused by the caller's input rather than the store.
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::MissingIdentifier)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
