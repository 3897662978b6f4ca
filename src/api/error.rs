use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::records::RecordError;
use crate::store::StoreError;

/// Expected business outcomes. They travel as `200` responses whose
/// `message` the frontend shows and whose `code` clients can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    DuplicateRollNumber,
    DuplicateEmail,
    DuplicateSchool,
    DuplicateClass,
    DuplicateSubjectCode,
    NotFound,
    NothingToDelete,
    InvalidPassword,
    SessionLimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum Reply {
    Data(serde_json::Value),
    Notice(Notice),
}

impl Reply {
    pub fn data<T: Serialize>(value: T) -> Result<Self, HandlerErr> {
        serde_json::to_value(value)
            .map(Reply::Data)
            .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
    }

    pub fn notice(kind: NoticeKind, message: impl Into<String>) -> Self {
        Reply::Notice(Notice::new(kind, message))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Data(value) => (StatusCode::OK, Json(value)).into_response(),
            Reply::Notice(n) => (
                StatusCode::OK,
                Json(json!({
                    "message": n.message,
                    "code": n.kind,
                })),
            )
                .into_response(),
        }
    }
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            "bad_params" => StatusCode::BAD_REQUEST,
            "not_implemented" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Debug for HandlerErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<rusqlite::Error> for HandlerErr {
    fn from(e: rusqlite::Error) -> Self {
        Self::new("db_query_failed", e.to_string())
    }
}

impl IntoResponse for HandlerErr {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let mut error = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(d) = self.details {
            error["details"] = d;
        }
        (status, Json(error)).into_response()
    }
}

/// Splits a store failure into the business message it stands for, or a
/// genuine fault.
pub fn store_outcome(e: StoreError) -> Result<Reply, HandlerErr> {
    match e {
        StoreError::StudentNotFound => Ok(Reply::notice(NoticeKind::NotFound, "Student not found")),
        StoreError::SubjectNotFound => Ok(Reply::notice(NoticeKind::NotFound, "Subject not found")),
        StoreError::Record(err @ RecordError::SessionLimitExceeded { .. }) => Ok(Reply::notice(
            NoticeKind::SessionLimitExceeded,
            err.to_string(),
        )),
        StoreError::Db(e) => Err(HandlerErr::new("db_update_failed", e.to_string())),
    }
}
