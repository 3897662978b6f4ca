use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::api::documents::subject_doc;
use crate::api::error::{HandlerErr, NoticeKind, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{get_required_str, get_required_u32, new_id};
use crate::api::types::AppState;
use crate::store::{self, SubjectScope};

const SUBJECT_CODE_TAKEN: &str = "Sorry this subcode must be unique as it already exists";

struct NewSubject {
    name: String,
    code: String,
    sessions: u32,
}

fn parse_new_subjects(params: &Value) -> Result<Vec<NewSubject>, HandlerErr> {
    let Some(items) = params.get("subjects").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing subjects"));
    };
    if items.is_empty() {
        return Err(HandlerErr::bad_params("subjects must not be empty"));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_new_subject(item).map_err(|e| e.with_details(json!({ "index": i }))))
        .collect()
}

fn parse_new_subject(item: &Value) -> Result<NewSubject, HandlerErr> {
    Ok(NewSubject {
        name: get_required_str(item, "subName")?,
        code: get_required_str(item, "subCode")?,
        sessions: get_required_u32(item, "sessions")?,
    })
}

fn subject_create(conn: &Connection, params: &Value) -> Result<Reply, HandlerErr> {
    let class_id = get_required_str(params, "sclassName")?;
    let school_id = get_required_str(params, "adminID")?;
    let subjects = parse_new_subjects(params)?;

    match store::find_class(conn, &class_id)? {
        Some(class) if class.school_id == school_id => {}
        _ => return Ok(Reply::notice(NoticeKind::NotFound, "Class not found")),
    }

    let mut seen = HashSet::new();
    for s in &subjects {
        if !seen.insert(s.code.as_str()) {
            return Ok(Reply::notice(NoticeKind::DuplicateSubjectCode, SUBJECT_CODE_TAKEN));
        }
        let taken = conn
            .query_row(
                "SELECT 1 FROM subjects WHERE school_id = ? AND sub_code = ?",
                (&school_id, &s.code),
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if taken {
            return Ok(Reply::notice(NoticeKind::DuplicateSubjectCode, SUBJECT_CODE_TAKEN));
        }
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    let mut ids = Vec::with_capacity(subjects.len());
    for s in &subjects {
        let id = new_id();
        tx.execute(
            "INSERT INTO subjects(id, sub_name, sub_code, sessions, class_id, school_id)
             VALUES(?, ?, ?, ?, ?, ?)",
            (&id, &s.name, &s.code, s.sessions, &class_id, &school_id),
        )
        .map_err(|e| {
            HandlerErr::new("db_insert_failed", e.to_string())
                .with_details(json!({ "table": "subjects" }))
        })?;
        ids.push(id);
    }
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    let mut docs = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(subject) = store::find_subject(conn, id)? {
            docs.push(subject_doc(conn, &subject, false)?);
        }
    }
    Reply::data(docs)
}

fn subject_list(conn: &Connection, scope: SubjectScope) -> Result<Reply, HandlerErr> {
    let subjects = store::list_subjects(conn, &scope)?;
    if subjects.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No subjects found"));
    }
    let docs = subjects
        .iter()
        .map(|s| subject_doc(conn, s, true))
        .collect::<Result<Vec<_>, _>>()?;
    Reply::data(docs)
}

fn subject_detail(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    match store::find_subject(conn, id)? {
        Some(subject) => Reply::data(subject_doc(conn, &subject, true)?),
        None => Ok(Reply::notice(NoticeKind::NotFound, "No subject found")),
    }
}

fn subject_delete(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let Some(subject) = store::find_subject(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "No subject found"));
    };
    let doc = subject_doc(conn, &subject, false)?;
    store::delete_subjects(conn, &SubjectScope::Subject(id.to_string())).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "subjects" }))
    })?;
    tracing::info!(subject_id = %id, "subject deleted");
    Reply::data(doc)
}

fn subjects_delete(conn: &Connection, scope: SubjectScope) -> Result<Reply, HandlerErr> {
    let deleted = store::delete_subjects(conn, &scope).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "subjects" }))
    })?;
    if deleted == 0 {
        return Ok(Reply::notice(
            NoticeKind::NothingToDelete,
            "No subjects found to delete",
        ));
    }
    Ok(Reply::Data(json!({ "acknowledged": true, "deletedCount": deleted })))
}

async fn handle_subject_create(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| subject_create(conn, &params)).await
}

async fn handle_school_subjects(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| subject_list(conn, SubjectScope::School(school_id)))
        .await
}

async fn handle_class_subjects(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| subject_list(conn, SubjectScope::Class(class_id)))
        .await
}

async fn handle_subject_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| subject_detail(conn, &id)).await
}

async fn handle_subject_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| subject_delete(conn, &id)).await
}

async fn handle_school_subjects_delete(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| subjects_delete(conn, SubjectScope::School(school_id)))
        .await
}

async fn handle_class_subjects_delete(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| subjects_delete(conn, SubjectScope::Class(class_id)))
        .await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/SubjectCreate", post(handle_subject_create))
        .route("/AllSubjects/{id}", get(handle_school_subjects))
        .route("/ClassSubjects/{id}", get(handle_class_subjects))
        .route(
            "/Subject/{id}",
            get(handle_subject_detail).delete(handle_subject_delete),
        )
        .route("/Subjects/{id}", delete(handle_school_subjects_delete))
        .route("/SubjectsClass/{id}", delete(handle_class_subjects_delete))
}
