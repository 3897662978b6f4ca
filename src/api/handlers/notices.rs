use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::api::documents::{complain_doc, NoticeDoc};
use crate::api::error::{HandlerErr, NoticeKind, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{get_required_str, new_id};
use crate::api::types::AppState;
use crate::records::parse_calendar_day;
use crate::store::{self, ComplainRow, NoticeRow, NoticeScope};

fn required_day(params: &Value, key: &str) -> Result<chrono::NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse_calendar_day(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("{} must be YYYY-MM-DD or an ISO 8601 timestamp", key))
            .with_details(json!({ key: raw }))
    })
}

fn notice_create(conn: &Connection, params: &Value) -> Result<Reply, HandlerErr> {
    let notice = NoticeRow {
        id: new_id(),
        title: get_required_str(params, "title")?,
        details: get_required_str(params, "details")?,
        date: required_day(params, "date")?,
        school_id: get_required_str(params, "adminID")?,
    };
    if store::find_admin(conn, &notice.school_id)?.is_none() {
        return Ok(Reply::notice(NoticeKind::NotFound, "School not found"));
    }
    store::insert_notice(conn, &notice).map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string()).with_details(json!({ "table": "notices" }))
    })?;
    tracing::info!(notice_id = %notice.id, school_id = %notice.school_id, "notice posted");
    Reply::data(NoticeDoc::from(&notice))
}

fn school_notices(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let notices = store::notices_in_school(conn, school_id)?;
    if notices.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No notices found"));
    }
    Reply::data(notices.iter().map(NoticeDoc::from).collect::<Vec<_>>())
}

fn notice_delete(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let Some(notice) = store::find_notice(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "No notice found"));
    };
    store::delete_notices(conn, &NoticeScope::Notice(id.to_string()))?;
    tracing::info!(notice_id = %id, "notice deleted");
    Reply::data(NoticeDoc::from(&notice))
}

fn notices_delete(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let deleted = store::delete_notices(conn, &NoticeScope::School(school_id.to_string()))?;
    if deleted == 0 {
        return Ok(Reply::notice(
            NoticeKind::NothingToDelete,
            "No notices found to delete",
        ));
    }
    tracing::info!(school_id, deleted, "notices deleted");
    Ok(Reply::Data(json!({ "acknowledged": true, "deletedCount": deleted })))
}

/// Complaints are filed by a student of the same school.
fn complain_create(conn: &Connection, params: &Value) -> Result<Reply, HandlerErr> {
    let complain = ComplainRow {
        id: new_id(),
        user_id: get_required_str(params, "user")?,
        date: required_day(params, "date")?,
        complaint: get_required_str(params, "complaint")?,
        school_id: get_required_str(params, "school")?,
    };
    match store::find_student(conn, &complain.user_id)? {
        Some(student) if student.school_id == complain.school_id => {}
        _ => return Ok(Reply::notice(NoticeKind::NotFound, "Student not found")),
    }
    store::insert_complain(conn, &complain).map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "complains" }))
    })?;
    tracing::info!(complain_id = %complain.id, user_id = %complain.user_id, "complaint filed");
    Reply::data(complain_doc(conn, &complain)?)
}

fn school_complains(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let complains = store::complains_in_school(conn, school_id)?;
    if complains.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No complains found"));
    }
    let docs = complains
        .iter()
        .map(|c| complain_doc(conn, c))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Reply::data(docs)
}

async fn handle_notice_create(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| notice_create(conn, &params)).await
}

async fn handle_school_notices(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| school_notices(conn, &school_id)).await
}

async fn handle_notice_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| notice_delete(conn, &id)).await
}

async fn handle_notices_delete(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| notices_delete(conn, &school_id)).await
}

async fn handle_complain_create(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| complain_create(conn, &params)).await
}

async fn handle_school_complains(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| school_complains(conn, &school_id)).await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/NoticeCreate", post(handle_notice_create))
        .route("/NoticeList/{id}", get(handle_school_notices))
        .route("/Notice/{id}", delete(handle_notice_delete))
        .route("/Notices/{id}", delete(handle_notices_delete))
        .route("/ComplainCreate", post(handle_complain_create))
        .route("/ComplainList/{id}", get(handle_school_complains))
}
