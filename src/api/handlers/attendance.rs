use axum::extract::{Path, State};
use axum::routing::put;
use axum::Router;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::api::documents::{student_doc, Populate};
use crate::api::error::{store_outcome, HandlerErr, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::get_required_str;
use crate::api::types::AppState;
use crate::records::{parse_calendar_day, AttendanceStatus};
use crate::store::{self, BulkResult, StudentScope};

fn attendance_mark(conn: &Connection, student_id: &str, params: &Value) -> Result<Reply, HandlerErr> {
    let subject_id = get_required_str(params, "subName")?;
    let status_raw = get_required_str(params, "status")?;
    let date_raw = get_required_str(params, "date")?;

    let status = AttendanceStatus::parse(&status_raw).ok_or_else(|| {
        HandlerErr::bad_params("status must be Present or Absent")
            .with_details(json!({ "status": status_raw }))
    })?;
    let date = parse_calendar_day(&date_raw).ok_or_else(|| {
        HandlerErr::bad_params("date must be YYYY-MM-DD or an ISO 8601 timestamp")
            .with_details(json!({ "date": date_raw }))
    })?;

    match store::record_attendance(conn, student_id, &subject_id, date, status) {
        Ok((doc, change)) => {
            tracing::info!(student_id, subject_id = %subject_id, %date, ?change, "attendance marked");
            Reply::data(student_doc(
                conn,
                &doc.student,
                Some(&doc.record),
                Populate::NONE,
            )?)
        }
        Err(e) => store_outcome(e),
    }
}

fn attendance_clear(
    conn: &Connection,
    scope: StudentScope,
    subject_id: Option<&str>,
) -> Result<Reply, HandlerErr> {
    let BulkResult { matched, modified } = store::clear_attendance(conn, &scope, subject_id)
        .map_err(|e| {
            HandlerErr::new("db_update_failed", e.to_string())
                .with_details(json!({ "table": "student_attendance" }))
        })?;
    tracing::info!(?scope, subject_id, matched, modified, "attendance cleared");
    Ok(Reply::Data(json!({
        "acknowledged": true,
        "matchedCount": matched,
        "modifiedCount": modified,
    })))
}

async fn handle_attendance_mark(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| attendance_mark(conn, &student_id, &params))
        .await
}

/// Removes one subject's attendance from every student on record.
async fn handle_clear_subject_everywhere(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| attendance_clear(conn, StudentScope::Everyone, Some(&subject_id)))
        .await
}

async fn handle_clear_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| attendance_clear(conn, StudentScope::School(school_id), None))
        .await
}

async fn handle_clear_class_subject(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| {
            let subject_id = get_required_str(&params, "subId")?;
            attendance_clear(conn, StudentScope::Class(class_id), Some(&subject_id))
        })
        .await
}

async fn handle_clear_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| attendance_clear(conn, StudentScope::Class(class_id), None))
        .await
}

async fn handle_clear_student_subject(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| {
            let subject_id = get_required_str(&params, "subId")?;
            attendance_clear(conn, StudentScope::Student(student_id), Some(&subject_id))
        })
        .await
}

async fn handle_clear_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| attendance_clear(conn, StudentScope::Student(student_id), None))
        .await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/StudentAttendance/{id}", put(handle_attendance_mark))
        .route(
            "/RemoveAllStudentsSubAtten/{id}",
            put(handle_clear_subject_everywhere),
        )
        .route("/RemoveAllStudentsAtten/{id}", put(handle_clear_school))
        .route("/RemoveClassSubAtten/{id}", put(handle_clear_class_subject))
        .route("/RemoveClassAtten/{id}", put(handle_clear_class))
        .route(
            "/RemoveStudentSubAtten/{id}",
            put(handle_clear_student_subject),
        )
        .route("/RemoveStudentAtten/{id}", put(handle_clear_student))
}
