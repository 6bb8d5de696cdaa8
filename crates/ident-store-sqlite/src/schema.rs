//! SQL schema for the identity SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted. The only UPDATE ever issued demotes or re-parents
-- a contact during a cluster merge.
-- AUTOINCREMENT keeps ids strictly increasing and never reused, so the
-- smallest id in a cluster is its oldest member.
CREATE TABLE IF NOT EXISTS contacts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    email           TEXT,
    phone_number    TEXT,
    link_precedence TEXT NOT NULL
                    CHECK (link_precedence IN ('primary', 'secondary')),
    linked_id       INTEGER REFERENCES contacts(id),
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at      TEXT NOT NULL,
    CHECK (email IS NOT NULL OR phone_number IS NOT NULL),
    CHECK ((link_precedence = 'primary') = (linked_id IS NULL))
);

CREATE INDEX IF NOT EXISTS contacts_email_idx  ON contacts(email);
CREATE INDEX IF NOT EXISTS contacts_phone_idx  ON contacts(phone_number);
CREATE INDEX IF NOT EXISTS contacts_linked_idx ON contacts(linked_id);

PRAGMA user_version = 1;
";
