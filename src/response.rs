use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppResult, ErrorCode};

/// Wire shape shared by every response the kiosk receives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    pub message: String,
    pub details: String,
    pub row_count: usize,
    pub data: Value,
}

/// A response under construction. `rowCount` is derived when it is sent.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    error_code: Option<ErrorCode>,
    message: String,
    details: String,
    data: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, data: Value) -> Self {
        Self {
            status,
            error_code: None,
            message: String::new(),
            details: String::new(),
            data,
        }
    }

    /// 200 response carrying `data`.
    pub fn ok<T: Serialize>(data: &T) -> AppResult<Self> {
        Ok(Self::new(StatusCode::OK, serde_json::to_value(data)?))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub(crate) fn with_error_code(mut self, code: ErrorCode) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_envelope(self) -> Envelope {
        Envelope {
            status_code: self.status.as_u16(),
            error_code: self.error_code,
            message: self.message,
            details: self.details,
            row_count: row_count(&self.data),
            data: self.data,
        }
    }
}

/// Number of rows in a payload: array length, object key count, 0 for null,
/// 1 for anything else.
pub fn row_count(data: &Value) -> usize {
    match data {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::Null => 0,
        _ => 1,
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.into_envelope())).into_response()
    }
}
