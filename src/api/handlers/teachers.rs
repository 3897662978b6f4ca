use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::api::documents::teacher_doc;
use crate::api::error::{HandlerErr, NoticeKind, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{
    get_optional_str, get_required_secret, get_required_str, hash_password, new_id,
    verify_password,
};
use crate::api::types::AppState;
use crate::store::{self, TeacherScope};

/// The subject must belong to the class the teacher is assigned to.
fn subject_in_class(conn: &Connection, subject_id: &str, class_id: &str) -> Result<bool, HandlerErr> {
    Ok(store::find_subject(conn, subject_id)?.is_some_and(|s| s.class_id == class_id))
}

/// `hashed` is the already-hashed password from the request.
fn teacher_register(conn: &Connection, params: &Value, hashed: &str) -> Result<Reply, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let email = get_required_str(params, "email")?;
    let school_id = get_required_str(params, "school")?;
    let class_id = get_required_str(params, "teachSclass")?;
    let subject_id = get_optional_str(params, "teachSubject")?;

    if store::find_teacher_by_email(conn, &email)?.is_some() {
        return Ok(Reply::notice(NoticeKind::DuplicateEmail, "Email already exists"));
    }
    match store::find_class(conn, &class_id)? {
        Some(class) if class.school_id == school_id => {}
        _ => return Ok(Reply::notice(NoticeKind::NotFound, "Class not found")),
    }
    if let Some(subject_id) = &subject_id {
        if !subject_in_class(conn, subject_id, &class_id)? {
            return Ok(Reply::notice(NoticeKind::NotFound, "Subject not found"));
        }
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO teachers(id, name, email, password, school_id, teach_class_id, teach_subject_id)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (&id, &name, &email, hashed, &school_id, &class_id, &subject_id),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "teachers" }))
    })?;
    tracing::info!(teacher_id = %id, class_id = %class_id, "teacher registered");

    let teacher = store::find_teacher(conn, &id)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "teacher vanished after insert"))?;
    Reply::data(teacher_doc(conn, &teacher, false)?)
}

fn school_teachers(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let teachers = store::list_teachers(conn, &TeacherScope::School(school_id.to_string()))?;
    if teachers.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No teachers found"));
    }
    let docs = teachers
        .iter()
        .map(|t| teacher_doc(conn, t, true))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Reply::data(docs)
}

fn teacher_detail(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    match store::find_teacher(conn, id)? {
        Some(teacher) => Reply::data(teacher_doc(conn, &teacher, true)?),
        None => Ok(Reply::notice(NoticeKind::NotFound, "No teacher found")),
    }
}

fn teacher_assign_subject(conn: &Connection, params: &Value) -> Result<Reply, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    let subject_id = get_required_str(params, "teachSubject")?;

    let Some(mut teacher) = store::find_teacher(conn, &teacher_id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "No teacher found"));
    };
    if !subject_in_class(conn, &subject_id, &teacher.teach_class_id)? {
        return Ok(Reply::notice(NoticeKind::NotFound, "Subject not found"));
    }
    conn.execute(
        "UPDATE teachers SET teach_subject_id = ? WHERE id = ?",
        (&subject_id, &teacher.id),
    )
    .map_err(|e| {
        HandlerErr::new("db_update_failed", e.to_string())
            .with_details(json!({ "table": "teachers" }))
    })?;
    tracing::info!(teacher_id = %teacher.id, subject_id = %subject_id, "teacher subject assigned");
    teacher.teach_subject_id = Some(subject_id);
    Reply::data(teacher_doc(conn, &teacher, false)?)
}

fn teacher_delete(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let Some(teacher) = store::find_teacher(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "No teacher found"));
    };
    store::delete_teachers(conn, &TeacherScope::Teacher(id.to_string())).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "teachers" }))
    })?;
    tracing::info!(teacher_id = %id, "teacher deleted");
    Reply::data(teacher_doc(conn, &teacher, false)?)
}

fn teachers_delete(conn: &Connection, scope: TeacherScope) -> Result<Reply, HandlerErr> {
    let deleted = store::delete_teachers(conn, &scope).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "teachers" }))
    })?;
    if deleted == 0 {
        return Ok(Reply::notice(
            NoticeKind::NothingToDelete,
            "No teachers found to delete",
        ));
    }
    tracing::info!(?scope, deleted, "teachers deleted");
    Ok(Reply::Data(json!({ "acknowledged": true, "deletedCount": deleted })))
}

async fn handle_teacher_register(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let password = get_required_secret(&params, "password")?;
    let hashed = hash_password(password, state.bcrypt_cost).await?;
    state
        .run(move |conn| teacher_register(conn, &params, &hashed))
        .await
}

async fn handle_teacher_login(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let email = get_required_str(&params, "email")?;
    let password = get_required_secret(&params, "password")?;

    let found = state
        .run(move |conn| Ok(store::find_teacher_by_email(conn, &email)?))
        .await?;
    let Some(teacher) = found else {
        return Ok(Reply::notice(NoticeKind::NotFound, "Teacher not found"));
    };
    if !verify_password(password, teacher.password.clone()).await? {
        return Ok(Reply::notice(NoticeKind::InvalidPassword, "Invalid password"));
    }
    state
        .run(move |conn| Reply::data(teacher_doc(conn, &teacher, true)?))
        .await
}

async fn handle_school_teachers(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| school_teachers(conn, &school_id)).await
}

async fn handle_teacher_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| teacher_detail(conn, &id)).await
}

async fn handle_teacher_assign_subject(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| teacher_assign_subject(conn, &params))
        .await
}

async fn handle_teacher_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| teacher_delete(conn, &id)).await
}

async fn handle_school_teachers_delete(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| teachers_delete(conn, TeacherScope::School(school_id)))
        .await
}

async fn handle_class_teachers_delete(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| teachers_delete(conn, TeacherScope::Class(class_id)))
        .await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/TeacherReg", post(handle_teacher_register))
        .route("/TeacherLogin", post(handle_teacher_login))
        .route(
            "/Teachers/{id}",
            get(handle_school_teachers).delete(handle_school_teachers_delete),
        )
        .route(
            "/Teacher/{id}",
            get(handle_teacher_detail).delete(handle_teacher_delete),
        )
        .route("/TeacherSubject", put(handle_teacher_assign_subject))
        .route("/TeachersClass/{id}", delete(handle_class_teachers_delete))
}
