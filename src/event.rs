//! Normalized request/response envelope shared by both handlers.
//!
//! The field names follow the serverless function runtime the handlers were
//! first deployed on (`httpMethod`, `statusCode`, `isBase64Encoded`), so the
//! envelope can be fed straight from that runtime or built from an axum request.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::error;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerEvent {
    #[serde(default = "default_method")]
    pub http_method: String,
    #[serde(default, deserialize_with = "body_from_text")]
    pub body: Option<Bytes>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

fn body_from_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Bytes>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(Bytes::from))
}

impl HandlerEvent {
    #[cfg(test)]
    pub fn new(method: &str, body: Option<String>) -> Self {
        Self {
            http_method: method.to_string(),
            body: body.map(Bytes::from),
            headers: BTreeMap::new(),
        }
    }

    pub fn from_http(method: &Method, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        Self {
            http_method: method.as_str().to_string(),
            body: Some(body),
            headers,
        }
    }

    pub fn method(&self) -> String {
        self.http_method.to_ascii_uppercase()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the JSON body. A missing or blank body reads as `{}`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let text = match self.body.as_deref() {
            None => "",
            Some(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| ApiError::Validation("request body is not valid UTF-8".into()))?,
        };
        let raw = match text.trim() {
            "" => "{}",
            s => s,
        };
        serde_json::from_str(raw).map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl HandlerResponse {
    /// JSON response. A value that fails to serialize becomes a 500.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::json_text(status, body),
            Err(e) => {
                error!(error = %e, "response serialization failed");
                Self::json_text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    r#"{"error":"internal server error","kind":"internal"}"#.into(),
                )
            }
        }
    }

    fn json_text(status: StatusCode, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".into(), "application/json".into());
        headers.insert("Access-Control-Allow-Origin".into(), "*".into());
        Self {
            status_code: status.as_u16(),
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    pub fn preflight(allowed_methods: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Access-Control-Allow-Origin".into(), "*".into());
        headers.insert("Access-Control-Allow-Methods".into(), allowed_methods.into());
        headers.insert("Access-Control-Allow-Headers".into(), "Content-Type".into());
        Self {
            status_code: StatusCode::OK.as_u16(),
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut headers = HeaderMap::new();
        for (k, v) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(name, value);
            }
        }
        (status, headers, self.body).into_response()
    }
}
