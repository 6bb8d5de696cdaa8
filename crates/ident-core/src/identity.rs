//! Resolution input and the consolidated identity read model.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  contact::{Contact, ContactId},
};

// ─── Request ─────────────────────────────────────────────────────────────────

/// A normalised (email, phone) pair to resolve.
///
/// Values are trimmed on construction and blank values are dropped, so a
/// present field is always a non-empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifyRequest {
  pub email:        Option<String>,
  pub phone_number: Option<String>,
}

impl IdentifyRequest {
  pub fn new(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email:        normalize(email),
      phone_number: normalize(phone_number),
    }
  }

  pub fn email(email: impl Into<String>) -> Self {
    Self::new(Some(email.into()), None)
  }

  pub fn phone(phone_number: impl Into<String>) -> Self {
    Self::new(None, Some(phone_number.into()))
  }

  pub fn both(email: impl Into<String>, phone_number: impl Into<String>) -> Self {
    Self::new(Some(email.into()), Some(phone_number.into()))
  }

  /// Fails with [`Error::MissingIdentifier`] when no identifier is present.
  pub fn validate(&self) -> Result<()> {
    if self.email.is_none() && self.phone_number.is_none() {
      return Err(Error::MissingIdentifier);
    }
    Ok(())
  }
}

fn normalize(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── Consolidated view ───────────────────────────────────────────────────────

/// The computed view of one identity cluster. Never stored, always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedIdentity {
  pub primary_contact_id:    ContactId,
  /// Distinct emails, primary's first, then in cluster order.
  pub emails:                Vec<String>,
  /// Distinct phone numbers, primary's first, then in cluster order.
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

impl ConsolidatedIdentity {
  /// Build the view for the cluster rooted at `root`.
  ///
  /// `cluster` may arrive in any order; the root is placed first and the
  /// remaining members are ordered by creation time, then id.
  pub fn from_cluster(root: ContactId, cluster: &[Contact]) -> Self {
    let mut members: Vec<&Contact> = cluster.iter().collect();
    members.sort_by_key(|c| (c.id != root, c.created_at, c.id));

    let mut emails: Vec<String> = Vec::new();
    let mut phone_numbers: Vec<String> = Vec::new();
    let mut secondary_contact_ids = Vec::new();

    for c in members {
      if let Some(e) = &c.email
        && !emails.contains(e)
      {
        emails.push(e.clone());
      }
      if let Some(p) = &c.phone_number
        && !phone_numbers.contains(p)
      {
        phone_numbers.push(p.clone());
      }
      if !c.is_primary() {
        secondary_contact_ids.push(c.id);
      }
    }

    Self {
      primary_contact_id: root,
      emails,
      phone_numbers,
      secondary_contact_ids,
    }
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// What a resolution wrote, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// The request carried nothing new; no contact was inserted.
  Existing,
  /// No contact matched; a new primary was inserted.
  CreatedPrimary(ContactId),
  /// The request added a new email or phone to a known cluster.
  CreatedSecondary(ContactId),
}

impl Outcome {
  /// The id of the contact inserted by this resolution, if any.
  pub fn created(self) -> Option<ContactId> {
    match self {
      Self::Existing => None,
      Self::CreatedPrimary(id) | Self::CreatedSecondary(id) => Some(id),
    }
  }
}

/// Full result of a resolution: the view returned to callers plus a record of
/// the writes performed to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
  pub identity: ConsolidatedIdentity,
  pub outcome:  Outcome,
  /// Former primaries demoted to secondary by a cluster merge.
  pub demoted:  Vec<ContactId>,
}
