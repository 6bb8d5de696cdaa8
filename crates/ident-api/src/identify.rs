//! Handler for `POST /identify`.
//!
//! Body: `{"email"?: string, "phoneNumber"?: string | number}`. Returns the
//! consolidated identity, or 400 when the body carries no identifier.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use ident_core::{
  identity::{ConsolidatedIdentity, IdentifyRequest},
  store::IdentityStore,
};
use serde::{Deserialize, Deserializer, de};

use crate::error::ApiError;

/// JSON body accepted by `POST /identify`. `null` and omission are the same.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default)]
  pub email:        Option<String>,
  /// A JSON integer is accepted and kept as its decimal text. Fractional or
  /// out-of-range numbers are rejected.
  #[serde(default, deserialize_with = "string_or_integer")]
  pub phone_number: Option<String>,
}

impl From<IdentifyBody> for IdentifyRequest {
  fn from(b: IdentifyBody) -> Self { IdentifyRequest::new(b.email, b.phone_number) }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
  String(String),
  Number(serde_json::Number),
}

fn string_or_integer<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<StringOrNumber>::deserialize(d)? {
    None => Ok(None),
    Some(StringOrNumber::String(s)) => Ok(Some(s)),
    Some(StringOrNumber::Number(n)) => n
      .as_u64()
      .map(|v| v.to_string())
      .or_else(|| n.as_i64().map(|v| v.to_string()))
      .map(Some)
      .ok_or_else(|| {
        de::Error::custom(format!(
          "phoneNumber must be a string or an integer, got {n}"
        ))
      }),
  }
}

/// `POST /identify`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<IdentifyBody>, JsonRejection>,
) -> Result<Json<ConsolidatedIdentity>, ApiError>
where
  S: IdentityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  let request = IdentifyRequest::from(body);
  request.validate().map_err(ApiError::Validation)?;

  let identity = store
    .identify(request)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(identity))
}
