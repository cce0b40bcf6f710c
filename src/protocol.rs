use crate::types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Endpoint serving the stream-restore extension on the bridge
pub const ENDPOINT: &str = "stream-restore";

/// API request structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub meta: RequestMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Request metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    pub id: Uuid,
    pub endpoint: String,
    pub method: Method,
}

/// API response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub meta: ResponseMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

/// Response metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub id: Uuid,
    pub method: Method,
}

/// API error structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

/// API methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Announce the client name; answered once the session is usable
    Hello,
    /// Query the extension version
    Test,
    Read,
    Write,
}

/// How a write merges into the database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Replace the written records, keep all others
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloData {
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReply {
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadReply {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteData {
    pub mode: UpdateMode,
    pub apply_immediately: bool,
    pub records: Vec<Record>,
}

impl Request {
    /// Create a new request for the stream-restore endpoint
    pub fn new(method: Method) -> Self {
        Self {
            meta: RequestMeta {
                id: Uuid::new_v4(),
                endpoint: ENDPOINT.to_string(),
                method,
            },
            data: None,
        }
    }

    /// Set the request data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Get the request ID
    pub fn id(&self) -> Uuid {
        self.meta.id
    }
}

impl Response {
    /// Check if the response contains errors
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Get the first error message, if any
    pub fn error_message(&self) -> Option<String> {
        self.errors
            .as_ref()
            .and_then(|e| e.first())
            .map(|e| e.detail.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_request_shape() {
        let data = WriteData {
            mode: UpdateMode::Replace,
            apply_immediately: true,
            records: vec![Record::application("paplay")],
        };
        let request = Request::new(Method::Write).with_data(serde_json::to_value(&data).unwrap());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["meta"]["endpoint"], "stream-restore");
        assert_eq!(json["meta"]["method"], "write");
        assert_eq!(json["data"]["mode"], "replace");
        assert_eq!(
            json["data"]["records"][0]["key"],
            "sink-input-by-application-name:paplay"
        );
    }

    #[test]
    fn test_error_response() {
        let response: Response = serde_json::from_value(json!({
            "meta": { "id": Uuid::nil(), "method": "read" },
            "errors": [{ "detail": "no such extension" }]
        }))
        .unwrap();
        assert!(response.has_errors());
        assert_eq!(response.error_message().as_deref(), Some("no such extension"));
    }
}
