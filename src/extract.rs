//! Request extractors that report rejections through the API envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Keys a request body may carry. Anything else is rejected with
/// `"<keys> is not a valid field"`.
pub trait FieldMask {
    const FIELDS: &'static [&'static str];
}

/// Top-level keys of `body` that are not in `allowed`, in document order.
pub fn unknown_fields(body: &Value, allowed: &[&str]) -> Vec<String> {
    match body {
        Value::Object(map) => map
            .keys()
            .filter(|key| !allowed.contains(&key.as_str()))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// JSON body checked against its [`FieldMask`] before deserializing.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + FieldMask,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        let unknown = unknown_fields(&body, T::FIELDS);
        if !unknown.is_empty() {
            return Err(AppError::bad_request(format!(
                "{} is not a valid field",
                unknown.join(", ")
            )));
        }

        let payload =
            serde_json::from_value(body).map_err(|err| AppError::bad_request(err.to_string()))?;
        Ok(ValidJson(payload))
    }
}

/// `Query` whose rejection is a 400 in the envelope.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_unknown_keys() {
        let body = json!({ "name": "Mug", "colour": "red", "sku": "M-1" });
        let unknown = unknown_fields(&body, &["name", "price"]);
        assert_eq!(unknown.len(), 2);
        assert!(unknown.contains(&"colour".to_string()));
        assert!(unknown.contains(&"sku".to_string()));
    }

    #[test]
    fn accepts_known_keys_and_non_objects() {
        assert!(unknown_fields(&json!({ "name": "Mug" }), &["name"]).is_empty());
        assert!(unknown_fields(&json!([1, 2]), &["name"]).is_empty());
    }
}
