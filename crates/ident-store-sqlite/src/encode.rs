//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that `ORDER BY created_at` sorts chronologically.

use chrono::{DateTime, SecondsFormat, Utc};
use ident_core::contact::{Contact, ContactId, LinkPrecedence};

use crate::{Error, Result};

/// Column list matching [`read_contact`].
pub const CONTACT_COLUMNS: &str =
  "id, email, phone_number, link_precedence, linked_id, created_at, updated_at";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// A `contacts` row as read from SQLite, before decoding.
pub struct RawContact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: String,
  pub linked_id:       Option<ContactId>,
  pub created_at:      String,
  pub updated_at:      String,
}

/// Row mapper for queries selecting [`CONTACT_COLUMNS`].
pub fn read_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContact> {
  Ok(RawContact {
    id:              row.get(0)?,
    email:           row.get(1)?,
    phone_number:    row.get(2)?,
    link_precedence: row.get(3)?,
    linked_id:       row.get(4)?,
    created_at:      row.get(5)?,
    updated_at:      row.get(6)?,
  })
}

impl RawContact {
  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:              self.id,
      email:           self.email,
      phone_number:    self.phone_number,
      link_precedence: self.link_precedence.parse::<LinkPrecedence>()?,
      linked_id:       self.linked_id,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}
