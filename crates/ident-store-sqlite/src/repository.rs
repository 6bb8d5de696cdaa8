//! [`SqliteRepository`]: a [`ContactRepository`] over a borrowed connection.

use chrono::{SubsecRound as _, Utc};
use ident_core::{
  Error as CoreError,
  contact::{Contact, ContactId, LinkPrecedence, NewContact},
  repository::ContactRepository,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, read_contact},
};

/// A repository bound to one SQLite connection, usually an open
/// [`rusqlite::Transaction`]. All reads see the repository's own writes.
pub struct SqliteRepository<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> SqliteRepository<'a> {
  pub fn new(conn: &'a rusqlite::Connection) -> Self { Self { conn } }

  /// Every contact, ordered by id.
  pub fn list(&self) -> Result<Vec<Contact>> {
    self.query(
      &format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id"),
      [],
    )
  }

  fn query(
    &self,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Contact>> {
    let mut stmt = self.conn.prepare_cached(sql)?;
    let raws = stmt
      .query_map(params, read_contact)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

impl ContactRepository for SqliteRepository<'_> {
  type Error = crate::Error;

  fn find_by_email_or_phone(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    // A NULL parameter never compares equal, so an absent field matches
    // nothing.
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE email = ?1 OR phone_number = ?2
         ORDER BY created_at, id"
      ),
      rusqlite::params![email, phone_number],
    )
  }

  fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
        rusqlite::params![id],
        read_contact,
      )
      .optional()?;
    raw.map(RawContact::into_contact).transpose()
  }

  fn find_cluster(&self, root: ContactId) -> Result<Vec<Contact>> {
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE id = ?1 OR linked_id = ?1
         ORDER BY created_at, id"
      ),
      rusqlite::params![root],
    )
  }

  fn insert(&mut self, input: NewContact) -> Result<Contact> {
    input.validate()?;

    // Truncated to the stored precision so the returned row equals a re-read.
    let now = Utc::now().trunc_subsecs(6);
    let now_str = encode_dt(now);
    self.conn.execute(
      "INSERT INTO contacts (
         email, phone_number, link_precedence, linked_id, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      rusqlite::params![
        input.email,
        input.phone_number,
        input.link_precedence.as_str(),
        input.linked_id,
        now_str,
      ],
    )?;

    Ok(Contact {
      id:              self.conn.last_insert_rowid(),
      email:           input.email,
      phone_number:    input.phone_number,
      link_precedence: input.link_precedence,
      linked_id:       input.linked_id,
      created_at:      now,
      updated_at:      now,
    })
  }

  fn update_link(
    &mut self,
    id: ContactId,
    precedence: LinkPrecedence,
    linked_id: Option<ContactId>,
  ) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE contacts
         SET link_precedence = ?2, linked_id = ?3, updated_at = ?4
       WHERE id = ?1",
      rusqlite::params![id, precedence.as_str(), linked_id, encode_dt(Utc::now())],
    )?;
    if changed == 0 {
      return Err(CoreError::ContactNotFound(id).into());
    }
    Ok(())
  }
}
