//! In-memory backend: a [`ContactRepository`] over a `Vec` and an
//! [`IdentityStore`] that serialises resolutions behind a mutex.
//!
//! Used as the test fake for the resolver and by transports in tests; it has
//! no durability. [`MemoryStore::identify`] copies the whole table on every
//! call, so each resolution is O(n) in the number of stored contacts. Serve
//! traffic from a durable backend instead.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use crate::{
  Error, Result,
  contact::{Contact, ContactId, LinkPrecedence, NewContact},
  identity::{ConsolidatedIdentity, IdentifyRequest},
  repository::ContactRepository,
  resolver,
  store::IdentityStore,
};

// ─── Repository ──────────────────────────────────────────────────────────────

/// A contacts table held in memory. Cloning takes a full snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
  contacts: Vec<Contact>,
  last_id:  ContactId,
}

impl MemoryRepository {
  pub fn new() -> Self { Self::default() }

  /// Seed the table with pre-built rows, e.g. to reproduce legacy link
  /// shapes. Ids assigned afterwards continue above the largest seeded id.
  pub fn with_contacts(contacts: Vec<Contact>) -> Self {
    let last_id = contacts.iter().map(|c| c.id).max().unwrap_or(0);
    Self { contacts, last_id }
  }

  /// Every stored contact, ordered by id.
  pub fn contacts(&self) -> &[Contact] { &self.contacts }

  fn sorted(mut contacts: Vec<Contact>) -> Vec<Contact> {
    contacts.sort_by_key(|c| (c.created_at, c.id));
    contacts
  }
}

impl ContactRepository for MemoryRepository {
  type Error = Error;

  fn find_by_email_or_phone(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    let matched = self
      .contacts
      .iter()
      .filter(|c| {
        let by_email = email.is_some() && c.email.as_deref() == email;
        let by_phone =
          phone_number.is_some() && c.phone_number.as_deref() == phone_number;
        by_email || by_phone
      })
      .cloned()
      .collect();
    Ok(Self::sorted(matched))
  }

  fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>> {
    Ok(self.contacts.iter().find(|c| c.id == id).cloned())
  }

  fn find_cluster(&self, root: ContactId) -> Result<Vec<Contact>> {
    let members = self
      .contacts
      .iter()
      .filter(|c| c.id == root || c.linked_id == Some(root))
      .cloned()
      .collect();
    Ok(Self::sorted(members))
  }

  fn insert(&mut self, input: NewContact) -> Result<Contact> {
    input.validate()?;
    if let Some(linked) = input.linked_id
      && self.contacts.iter().all(|c| c.id != linked)
    {
      return Err(Error::ContactNotFound(linked));
    }

    self.last_id += 1;
    let now = Utc::now();
    let contact = Contact {
      id:              self.last_id,
      email:           input.email,
      phone_number:    input.phone_number,
      link_precedence: input.link_precedence,
      linked_id:       input.linked_id,
      created_at:      now,
      updated_at:      now,
    };
    self.contacts.push(contact.clone());
    Ok(contact)
  }

  fn update_link(
    &mut self,
    id: ContactId,
    precedence: LinkPrecedence,
    linked_id: Option<ContactId>,
  ) -> Result<()> {
    let contact = self
      .contacts
      .iter_mut()
      .find(|c| c.id == id)
      .ok_or(Error::ContactNotFound(id))?;
    contact.link_precedence = precedence;
    contact.linked_id = linked_id;
    contact.updated_at = Utc::now();
    Ok(())
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An [`IdentityStore`] over a [`MemoryRepository`].
///
/// Each resolution runs against a working copy of the table while holding the
/// lock; the copy replaces the table only if the resolution succeeds. Taking
/// that copy costs O(n) per call.
#[derive(Debug, Default)]
pub struct MemoryStore {
  repo: Mutex<MemoryRepository>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn from_repository(repo: MemoryRepository) -> Self {
    Self { repo: Mutex::new(repo) }
  }

  /// A copy of the current table.
  pub fn snapshot(&self) -> MemoryRepository {
    self.repo.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl IdentityStore for MemoryStore {
  type Error = Error;

  async fn identify(&self, request: IdentifyRequest) -> Result<ConsolidatedIdentity> {
    let mut guard = self.repo.lock().unwrap_or_else(PoisonError::into_inner);
    let mut working = guard.clone();
    let resolution = resolver::resolve(&mut working, &request)?;
    *guard = working;
    Ok(resolution.identity)
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self
      .repo
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .find_by_id(id)
  }

  async fn identity_of(&self, id: ContactId) -> Result<Option<ConsolidatedIdentity>> {
    let guard = self.repo.lock().unwrap_or_else(PoisonError::into_inner);
    resolver::consolidate(&*guard, id)
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    let guard = self.repo.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(guard.contacts().to_vec())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_increase_and_continue_above_seeded_rows() {
    let mut repo = MemoryRepository::new();
    let a = repo.insert(NewContact::primary(Some("a@x.com".into()), None)).unwrap();
    let b = repo.insert(NewContact::primary(None, Some("111".into()))).unwrap();
    assert!(b.id > a.id);

    let mut seeded = MemoryRepository::with_contacts(repo.contacts().to_vec());
    let c = seeded.insert(NewContact::primary(None, Some("222".into()))).unwrap();
    assert!(c.id > b.id);
  }

  #[test]
  fn match_only_uses_supplied_fields() {
    let mut repo = MemoryRepository::new();
    repo.insert(NewContact::primary(None, Some("111".into()))).unwrap();
    assert!(repo.find_by_email_or_phone(Some("a@x.com"), None).unwrap().is_empty());
    assert!(repo.find_by_email_or_phone(None, None).unwrap().is_empty());
    assert_eq!(repo.find_by_email_or_phone(None, Some("111")).unwrap().len(), 1);
  }

  #[test]
  fn insert_rejects_missing_link_target() {
    let mut repo = MemoryRepository::new();
    let err = repo
      .insert(NewContact::secondary(Some("a@x.com".into()), None, 42))
      .unwrap_err();
    assert!(matches!(err, Error::ContactNotFound(42)));
    assert!(repo.contacts().is_empty());
  }

  #[tokio::test]
  async fn failed_resolution_leaves_table_untouched() {
    let store = MemoryStore::new();
    store.identify(IdentifyRequest::email("a@x.com")).await.unwrap();
    let before = store.snapshot().contacts().to_vec();

    assert!(store.identify(IdentifyRequest::default()).await.is_err());
    assert_eq!(store.snapshot().contacts(), before.as_slice());
  }
}
