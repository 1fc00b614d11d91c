//! Validated JSON extractor
//!
//! Deserializes a JSON body and validates it with the validator crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use contact_relay::extractors::ValidatedJson;
//! use serde::Deserialize;
//! use validator::Validate;
//!
//! #[derive(Debug, Deserialize, Validate)]
//! struct Subscribe {
//!     #[validate(email)]
//!     email: String,
//! }
//!
//! async fn subscribe(ValidatedJson(form): ValidatedJson<Subscribe>) -> String {
//!     // form is guaranteed to be valid here
//!     format!("Subscribed {}", form.email)
//! }
//! ```

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::RelayError;

/// Validated JSON extractor
///
/// Rejects malformed bodies with 400 and invalid ones with 422, both as
/// [`RelayError`] JSON responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync + 'static,
{
    type Rejection = RelayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| RelayError::BadRequest(err.body_text()))?;

        data.validate()?;

        Ok(Self(data))
    }
}

/// Validation errors as a JSON object keyed by field
///
/// ```rust
/// use contact_relay::extractors::validation_errors_json;
///
/// let json = validation_errors_json(&validator::ValidationErrors::new());
/// assert!(json.as_object().unwrap().is_empty());
/// ```
#[must_use]
pub fn validation_errors_json(errors: &validator::ValidationErrors) -> serde_json::Value {
    let mut error_map = serde_json::Map::new();

    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|error| {
                error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string)
            })
            .collect();

        error_map.insert(field.to_string(), serde_json::json!(messages));
    }

    serde_json::Value::Object(error_map)
}
