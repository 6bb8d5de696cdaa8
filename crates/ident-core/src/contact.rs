//! Contact: the sole persisted entity of the identity graph.
//!
//! A contact is one observed (email, phone) pair. Contacts are never deleted;
//! the only mutation ever applied to a stored contact is demotion from
//! `primary` to `secondary` when two clusters merge.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Store-assigned contact identifier. Strictly increasing in creation order,
/// so the smallest id in a cluster is also its oldest member.
pub type ContactId = i64;

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical representative of its cluster.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

impl LinkPrecedence {
  /// The string stored in the `link_precedence` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Primary => "primary",
      Self::Secondary => "secondary",
    }
  }
}

impl fmt::Display for LinkPrecedence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LinkPrecedence {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "primary" => Ok(Self::Primary),
      "secondary" => Ok(Self::Secondary),
      other => Err(Error::UnknownPrecedence(other.to_owned())),
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A stored contact record.
///
/// `linked_id` is `None` exactly when `link_precedence` is
/// [`LinkPrecedence::Primary`]; for secondaries it names the cluster root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
  /// Server-assigned; never changes after creation.
  pub created_at:      DateTime<Utc>,
  /// Bumped only when a merge demotes or re-parents the contact.
  pub updated_at:      DateTime<Utc>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// The id this contact nominates as its cluster root: itself when primary,
  /// otherwise whatever it links to.
  pub fn root_candidate(&self) -> ContactId {
    match self.link_precedence {
      LinkPrecedence::Primary => self.id,
      LinkPrecedence::Secondary => self.linked_id.unwrap_or(self.id),
    }
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::repository::ContactRepository::insert`].
/// `id`, `created_at` and `updated_at` are always assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A new cluster root.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A new member of the cluster rooted at `root`.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    root: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(root),
    }
  }

  /// Check the per-row invariants every stored contact must satisfy.
  pub fn validate(&self) -> crate::Result<()> {
    if self.email.is_none() && self.phone_number.is_none() {
      return Err(Error::MissingIdentifier);
    }
    match (self.link_precedence, self.linked_id) {
      (LinkPrecedence::Primary, None) | (LinkPrecedence::Secondary, Some(_)) => {
        Ok(())
      }
      (precedence, linked_id) => {
        Err(Error::InvalidLink { precedence, linked_id })
      }
    }
  }
}
