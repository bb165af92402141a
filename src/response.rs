use serde::{Serialize, Serializer, ser::Error as _, ser::SerializeMap};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct Meta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl Meta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Envelope of responses that carry only a message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageBody {
    pub success: bool,
    pub message: String,
}

/// Response envelope: `{ success, message, ... }`.
///
/// When `nested` is set the payload is written under `data`, otherwise the
/// payload's fields are spread next to `success` and `message`.
#[derive(Debug, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub pagination: Option<Meta>,
    #[schema(ignore)]
    pub nested: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// Payload nested under `data`.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
            nested: true,
        }
    }

    /// Payload fields spread at the top level.
    pub fn spread(message: impl Into<String>, data: T) -> Self {
        Self {
            nested: false,
            ..Self::success(message, data)
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, meta: Meta) -> Self {
        Self {
            pagination: Some(meta),
            ..Self::spread(message, data)
        }
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }
}

impl ApiResponse<Value> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            pagination: None,
            nested: false,
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.success)?;
        map.serialize_entry("message", &self.message)?;

        if let Some(data) = &self.data {
            if self.nested {
                map.serialize_entry("data", data)?;
            } else {
                match serde_json::to_value(data).map_err(S::Error::custom)? {
                    Value::Object(fields) => {
                        for (key, value) in fields {
                            map.serialize_entry(&key, &value)?;
                        }
                    }
                    Value::Null => {}
                    other => map.serialize_entry("data", &other)?,
                }
            }
        }

        if let Some(meta) = &self.pagination {
            map.serialize_entry("pagination", meta)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Tokens {
        #[serde(rename = "accessToken")]
        access_token: String,
    }

    #[test]
    fn nested_payload_goes_under_data() {
        let resp = ApiResponse::success(
            "Created",
            Tokens {
                access_token: "a".into(),
            },
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "message": "Created", "data": { "accessToken": "a" } })
        );
    }

    #[test]
    fn spread_payload_is_flattened_with_pagination() {
        let resp = ApiResponse::paginated(
            "Products fetched successfully",
            json!({ "products": [] }),
            Meta::new(2, 10, 21),
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["products"], json!([]));
        assert_eq!(value["pagination"]["totalPages"], 3);
        assert_eq!(value["pagination"]["page"], 2);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn bare_message_has_no_payload() {
        let value = serde_json::to_value(ApiResponse::message("Deleted")).unwrap();
        assert_eq!(value, json!({ "success": true, "message": "Deleted" }));
    }
}
