//! HTTP server wiring for identity resolution.
//!
//! Combines the JSON API from `ident-api` with a health probe and request
//! tracing, and knows how to load [`ServerConfig`] and open the SQLite store
//! it names.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Json, Router, routing::get};
use ident_core::store::IdentityStore;
use ident_store_sqlite::SqliteStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Environment variables with this prefix override file settings,
/// e.g. `IDENT_PORT=8080`.
pub const ENV_PREFIX: &str = "IDENT";

/// `store_path` value that selects a non-durable in-memory store.
pub const IN_MEMORY: &str = ":memory:";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// SQLite file; a leading `~/` expands to `$HOME`.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("ident.sqlite3") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  /// Load from the TOML file at `path` (optional) layered under
  /// `IDENT_`-prefixed environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Open the store named by `cfg.store_path`.
pub async fn open_store(cfg: &ServerConfig) -> ident_store_sqlite::Result<SqliteStore> {
  if cfg.store_path.as_os_str() == IN_MEMORY {
    tracing::warn!("using in-memory store; contacts will not persist");
    return SqliteStore::open_in_memory().await;
  }
  let path = expand_tilde(&cfg.store_path);
  tracing::info!(path = %path.display(), "opening store");
  SqliteStore::open(&path).await
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: IdentityStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(health))
    .merge(ident_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let cfg = ServerConfig {
      store_path: PathBuf::from(IN_MEMORY),
      ..ServerConfig::default()
    };
    router(Arc::new(open_store(&cfg).await.unwrap()))
  }

  async fn oneshot_json(
    app:    Router,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let body = body.map(|b| b.to_string()).unwrap_or_default();
    let resp = app.oneshot(builder.body(Body::from(body)).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  // ── Configuration ────────────────────────────────────────────────────────────

  #[test]
  fn missing_config_file_yields_defaults() {
    let path = std::env::temp_dir().join("ident-server-no-such-config.toml");
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, ServerConfig::default().port);
    assert_eq!(cfg.store_path, ServerConfig::default().store_path);
  }

  #[test]
  fn config_file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!(
      "ident-server-config-{}.toml",
      std::process::id()
    ));
    std::fs::write(&path, "port = 8081\nstore_path = \"/tmp/contacts.db\"\n").unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 8081);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/contacts.db"));
    assert_eq!(cfg.address(), "127.0.0.1:8081");
  }

  #[test]
  fn tilde_expands_to_home() {
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/ident.db")),
        PathBuf::from(home).join("ident.db")
      );
    }
    assert_eq!(expand_tilde(Path::new("/abs/ident.db")), PathBuf::from("/abs/ident.db"));
  }

  // ── Routes ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_returns_ok() {
    let (status, body) = oneshot_json(app().await, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn identify_round_trip_over_sqlite() {
    let app = app().await;

    let (status, first) = oneshot_json(
      app.clone(),
      "POST",
      "/identify",
      Some(json!({ "email": "a@x.com", "phoneNumber": "111" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = oneshot_json(
      app.clone(),
      "POST",
      "/identify",
      Some(json!({ "email": "a@x.com", "phoneNumber": "222" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["primaryContactId"], first["primaryContactId"]);
    assert_eq!(second["phoneNumbers"], json!(["111", "222"]));
    assert_eq!(second["secondaryContactIds"].as_array().unwrap().len(), 1);

    let (status, body) =
      oneshot_json(app, "POST", "/identify", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "at least one identifier required");
  }
}
