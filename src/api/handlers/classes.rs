use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{json, Value};

use crate::api::documents::{class_doc, student_doc, Populate};
use crate::api::error::{HandlerErr, NoticeKind, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{get_required_str, new_id};
use crate::api::types::AppState;
use crate::store::{self, ClassScope, StudentScope};

fn class_create(conn: &Connection, params: &Value) -> Result<Reply, HandlerErr> {
    let name = get_required_str(params, "sclassName")?;
    let school_id = get_required_str(params, "adminID")?;

    if store::find_admin(conn, &school_id)?.is_none() {
        return Ok(Reply::notice(NoticeKind::NotFound, "School not found"));
    }
    let exists = conn
        .query_row(
            "SELECT 1 FROM sclasses WHERE school_id = ? AND name = ?",
            (&school_id, &name),
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if exists {
        return Ok(Reply::notice(
            NoticeKind::DuplicateClass,
            "Sorry this class name already exists",
        ));
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO sclasses(id, name, school_id) VALUES(?, ?, ?)",
        (&id, &name, &school_id),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "sclasses" }))
    })?;

    let class = store::find_class(conn, &id)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "class vanished after insert"))?;
    Reply::data(class_doc(conn, &class, false)?)
}

fn class_list(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let classes = store::classes_in_school(conn, school_id)?;
    if classes.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No sclasses found"));
    }
    let docs = classes
        .iter()
        .map(|c| class_doc(conn, c, false))
        .collect::<Result<Vec<_>, _>>()?;
    Reply::data(docs)
}

fn class_detail(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    match store::find_class(conn, id)? {
        Some(class) => Reply::data(class_doc(conn, &class, true)?),
        None => Ok(Reply::notice(NoticeKind::NotFound, "No class found")),
    }
}

fn class_students(conn: &Connection, class_id: &str) -> Result<Reply, HandlerErr> {
    let students = store::list_students(conn, &StudentScope::Class(class_id.to_string()))?;
    if students.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No students found"));
    }
    let mut docs = Vec::with_capacity(students.len());
    for s in &students {
        let record = store::load_record(conn, &s.id)?;
        docs.push(student_doc(conn, s, Some(&record), Populate::NONE)?);
    }
    Reply::data(docs)
}

fn class_delete(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let Some(class) = store::find_class(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "Class not found"));
    };
    store::delete_classes(conn, &ClassScope::Class(id.to_string())).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "sclasses" }))
    })?;
    tracing::info!(class_id = %id, "class deleted");
    Reply::data(class_doc(conn, &class, false)?)
}

fn classes_delete_for_school(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let deleted = store::delete_classes(conn, &ClassScope::School(school_id.to_string()))
        .map_err(|e| {
            HandlerErr::new("db_delete_failed", e.to_string())
                .with_details(json!({ "table": "sclasses" }))
        })?;
    if deleted == 0 {
        return Ok(Reply::notice(
            NoticeKind::NothingToDelete,
            "No classes found to delete",
        ));
    }
    Ok(Reply::Data(json!({ "acknowledged": true, "deletedCount": deleted })))
}

async fn handle_class_create(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| class_create(conn, &params)).await
}

async fn handle_class_list(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| class_list(conn, &school_id)).await
}

async fn handle_class_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| class_detail(conn, &id)).await
}

async fn handle_class_students(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| class_students(conn, &class_id)).await
}

async fn handle_class_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| class_delete(conn, &id)).await
}

async fn handle_classes_delete_for_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| classes_delete_for_school(conn, &school_id))
        .await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/SclassCreate", post(handle_class_create))
        .route("/SclassList/{id}", get(handle_class_list))
        .route(
            "/Sclass/{id}",
            get(handle_class_detail).delete(handle_class_delete),
        )
        .route("/Sclass/Students/{id}", get(handle_class_students))
        .route("/Sclasses/{id}", delete(handle_classes_delete_for_school))
}
