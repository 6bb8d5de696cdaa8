//! [`SqliteStore`]: the SQLite implementation of [`IdentityStore`].

use std::path::Path;

use ident_core::{
  contact::{Contact, ContactId},
  identity::{ConsolidatedIdentity, IdentifyRequest},
  repository::ContactRepository as _,
  resolver,
  store::IdentityStore,
};
use rusqlite::TransactionBehavior;

use crate::{Result, repository::SqliteRepository, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An identity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection thread, so resolutions never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against a repository bound to a read transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&SqliteRepository<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        Ok(f(&SqliteRepository::new(&tx)))
      })
      .await?
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = crate::Error;

  async fn identify(&self, request: IdentifyRequest) -> Result<ConsolidatedIdentity> {
    // Rejected before the connection thread is involved.
    request.validate()?;

    let resolution = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = resolver::resolve(&mut SqliteRepository::new(&tx), &request);
        // Dropping `tx` without committing rolls back every write.
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await??;

    tracing::debug!(
      primary = resolution.identity.primary_contact_id,
      outcome = ?resolution.outcome,
      demoted = ?resolution.demoted,
      "identify committed"
    );
    Ok(resolution.identity)
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self.read(move |repo| repo.find_by_id(id)).await
  }

  async fn identity_of(&self, id: ContactId) -> Result<Option<ConsolidatedIdentity>> {
    self.read(move |repo| resolver::consolidate(repo, id)).await
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    self.read(|repo| repo.list()).await
  }
}
