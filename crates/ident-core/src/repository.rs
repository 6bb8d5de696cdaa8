//! The `ContactRepository` trait: the storage contract the resolver runs
//! against.
//!
//! The contract is synchronous: a backend hands the resolver a
//! repository bound to one transaction (or one locked table), so a whole
//! resolution reads and writes a consistent snapshot. Async access for
//! transports lives one layer up in [`crate::store::IdentityStore`].

use crate::contact::{Contact, ContactId, LinkPrecedence, NewContact};

/// Read/write access to the contacts table within a single unit of work.
///
/// Implementations must provide read-your-writes consistency: a contact
/// returned by [`insert`](Self::insert) or changed by
/// [`update_link`](Self::update_link) is visible to every later read through
/// the same repository.
pub trait ContactRepository {
  /// Backend error. Integrity problems detected by the resolver are raised
  /// through this type, hence the `From<crate::Error>` bound.
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// All contacts whose email equals `email` or whose phone number equals
  /// `phone_number`, ordered by creation time ascending.
  ///
  /// Only the clauses for supplied values apply: with `phone_number = None`
  /// nothing is matched on phone. Both `None` yields an empty list.
  fn find_by_email_or_phone(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error>;

  /// The contact `root` plus every contact whose `linked_id` is `root`,
  /// ordered by creation time ascending.
  fn find_cluster(&self, root: ContactId) -> Result<Vec<Contact>, Self::Error>;

  /// Persist a new contact. The repository assigns `id` (strictly greater
  /// than every existing id) and the timestamps.
  fn insert(&mut self, input: NewContact) -> Result<Contact, Self::Error>;

  /// Change a contact's precedence and link. Used only to demote a primary
  /// or re-parent a secondary during a cluster merge.
  fn update_link(
    &mut self,
    id: ContactId,
    precedence: LinkPrecedence,
    linked_id: Option<ContactId>,
  ) -> Result<(), Self::Error>;
}
