use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::api::documents::{student_doc, Populate};
use crate::api::error::{HandlerErr, NoticeKind, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{
    get_optional_i64, get_optional_secret, get_optional_str, get_required_i64,
    get_required_secret, get_required_str, hash_password, new_id, verify_password,
};
use crate::api::types::AppState;
use crate::records::StudentRecord;
use crate::store::{self, StudentRow, StudentScope};

const ROLL_TAKEN: &str = "Roll Number already exists";

/// `hashed` is the already-hashed password from the request.
fn student_register(conn: &Connection, params: &Value, hashed: &str) -> Result<Reply, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let roll_num = get_required_i64(params, "rollNum")?;
    let class_id = get_required_str(params, "sclassName")?;
    let school_id = get_required_str(params, "adminID")?;

    if store::find_student_by_roll(conn, &school_id, &class_id, roll_num)?.is_some() {
        return Ok(Reply::notice(NoticeKind::DuplicateRollNumber, ROLL_TAKEN));
    }
    match store::find_class(conn, &class_id)? {
        Some(class) if class.school_id == school_id => {}
        _ => return Ok(Reply::notice(NoticeKind::NotFound, "Class not found")),
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO students(id, name, roll_num, password, class_id, school_id, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &name,
            roll_num,
            hashed,
            &class_id,
            &school_id,
            chrono::Utc::now().to_rfc3339(),
        ),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "students" }))
    })?;
    tracing::info!(student_id = %id, class_id = %class_id, roll_num, "student registered");

    let student = store::find_student(conn, &id)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "student vanished after insert"))?;
    Reply::data(student_doc(
        conn,
        &student,
        Some(&StudentRecord::default()),
        Populate::NONE,
    )?)
}

fn login_doc(conn: &Connection, student: &StudentRow) -> Result<Reply, HandlerErr> {
    let populate = Populate {
        school: true,
        class: true,
        subjects: false,
    };
    Reply::data(student_doc(conn, student, None, populate)?)
}

fn school_students(conn: &Connection, school_id: &str) -> Result<Reply, HandlerErr> {
    let students = store::list_students(conn, &StudentScope::School(school_id.to_string()))?;
    if students.is_empty() {
        return Ok(Reply::notice(NoticeKind::NotFound, "No students found"));
    }
    let populate = Populate {
        school: false,
        class: true,
        subjects: false,
    };
    let mut docs = Vec::with_capacity(students.len());
    for s in &students {
        let record = store::load_record(conn, &s.id)?;
        docs.push(student_doc(conn, s, Some(&record), populate)?);
    }
    Reply::data(docs)
}

fn student_detail(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let Some(student) = store::find_student(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "No student found"));
    };
    let record = store::load_record(conn, id)?;
    Reply::data(student_doc(conn, &student, Some(&record), Populate::ALL)?)
}

/// Partial update of identity fields. Attendance and exam results have
/// their own endpoints and are ignored here. A new password arrives
/// already hashed.
fn student_update(
    conn: &Connection,
    id: &str,
    params: &Value,
    new_password: Option<String>,
) -> Result<Reply, HandlerErr> {
    let Some(mut student) = store::find_student(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "Student not found"));
    };

    if let Some(name) = get_optional_str(params, "name")? {
        student.name = name;
    }
    if let Some(roll_num) = get_optional_i64(params, "rollNum")? {
        student.roll_num = roll_num;
    }
    if let Some(class_id) = get_optional_str(params, "sclassName")? {
        match store::find_class(conn, &class_id)? {
            Some(class) if class.school_id == student.school_id => student.class_id = class_id,
            _ => return Ok(Reply::notice(NoticeKind::NotFound, "Class not found")),
        }
    }
    let clash = store::find_student_by_roll(conn, &student.school_id, &student.class_id, student.roll_num)?;
    if clash.is_some_and(|other| other.id != student.id) {
        return Ok(Reply::notice(NoticeKind::DuplicateRollNumber, ROLL_TAKEN));
    }
    if let Some(hashed) = new_password {
        student.password = hashed;
    }

    conn.execute(
        "UPDATE students
         SET name = ?, roll_num = ?, password = ?, class_id = ?, updated_at = ?
         WHERE id = ?",
        (
            &student.name,
            student.roll_num,
            &student.password,
            &student.class_id,
            chrono::Utc::now().to_rfc3339(),
            &student.id,
        ),
    )
    .map_err(|e| {
        HandlerErr::new("db_update_failed", e.to_string())
            .with_details(json!({ "table": "students" }))
    })?;

    let record = store::load_record(conn, id)?;
    Reply::data(student_doc(conn, &student, Some(&record), Populate::NONE)?)
}

fn student_delete(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let deleted = store::delete_student(conn, id).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "students" }))
    })?;
    match deleted {
        Some(doc) => {
            tracing::info!(student_id = %id, "student deleted");
            Reply::data(student_doc(conn, &doc.student, Some(&doc.record), Populate::NONE)?)
        }
        None => Ok(Reply::notice(NoticeKind::NotFound, "No student found")),
    }
}

fn students_delete(conn: &Connection, scope: StudentScope) -> Result<Reply, HandlerErr> {
    let deleted = store::delete_students(conn, &scope).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string())
            .with_details(json!({ "table": "students" }))
    })?;
    if deleted == 0 {
        return Ok(Reply::notice(
            NoticeKind::NothingToDelete,
            "No students found to delete",
        ));
    }
    tracing::info!(?scope, deleted, "students deleted");
    Ok(Reply::Data(json!({ "acknowledged": true, "deletedCount": deleted })))
}

async fn handle_student_register(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let password = get_required_secret(&params, "password")?;
    let hashed = hash_password(password, state.bcrypt_cost).await?;
    state
        .run(move |conn| student_register(conn, &params, &hashed))
        .await
}

async fn handle_student_login(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let roll_num = get_required_i64(&params, "rollNum")?;
    let name = get_required_str(&params, "studentName")?;
    let password = get_required_secret(&params, "password")?;

    let found = state
        .run(move |conn| Ok(store::find_student_for_login(conn, roll_num, &name)?))
        .await?;
    let Some(student) = found else {
        return Ok(Reply::notice(NoticeKind::NotFound, "Student not found"));
    };
    if !verify_password(password, student.password.clone()).await? {
        return Ok(Reply::notice(NoticeKind::InvalidPassword, "Invalid password"));
    }
    state.run(move |conn| login_doc(conn, &student)).await
}

async fn handle_school_students(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| school_students(conn, &school_id)).await
}

async fn handle_student_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| student_detail(conn, &id)).await
}

async fn handle_student_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let new_password = match get_optional_secret(&params, "password")? {
        Some(plain) => Some(hash_password(plain, state.bcrypt_cost).await?),
        None => None,
    };
    state
        .run(move |conn| student_update(conn, &id, &params, new_password))
        .await
}

async fn handle_student_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| student_delete(conn, &id)).await
}

async fn handle_school_students_delete(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| students_delete(conn, StudentScope::School(school_id)))
        .await
}

async fn handle_class_students_delete(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| students_delete(conn, StudentScope::Class(class_id)))
        .await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/StudentReg", post(handle_student_register))
        .route("/StudentLogin", post(handle_student_login))
        .route(
            "/Students/{id}",
            get(handle_school_students).delete(handle_school_students_delete),
        )
        .route(
            "/Student/{id}",
            get(handle_student_detail)
                .put(handle_student_update)
                .delete(handle_student_delete),
        )
        .route("/StudentsClass/{id}", delete(handle_class_students_delete))
}
