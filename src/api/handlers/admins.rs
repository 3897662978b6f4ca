use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{json, Value};

use crate::api::documents::AdminDoc;
use crate::api::error::{HandlerErr, NoticeKind, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{
    get_required_secret, get_required_str, hash_password, new_id, verify_password,
};
use crate::api::types::AppState;
use crate::store;

/// `hashed` is the already-hashed password from the request.
fn admin_register(conn: &Connection, params: &Value, hashed: &str) -> Result<Reply, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let email = get_required_str(params, "email")?;
    let school_name = get_required_str(params, "schoolName")?;

    if store::find_admin_by_email(conn, &email)?.is_some() {
        return Ok(Reply::notice(NoticeKind::DuplicateEmail, "Email already exists"));
    }
    let school_taken = conn
        .query_row(
            "SELECT 1 FROM admins WHERE school_name = ?",
            [&school_name],
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if school_taken {
        return Ok(Reply::notice(
            NoticeKind::DuplicateSchool,
            "School name already exists",
        ));
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO admins(id, name, email, password, school_name) VALUES(?, ?, ?, ?, ?)",
        (&id, &name, &email, hashed, &school_name),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string()).with_details(json!({ "table": "admins" }))
    })?;
    tracing::info!(admin_id = %id, school = %school_name, "school registered");

    let admin = store::find_admin(conn, &id)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "admin vanished after insert"))?;
    Reply::data(AdminDoc::from(&admin))
}

fn admin_detail(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    match store::find_admin(conn, id)? {
        Some(admin) => Reply::data(AdminDoc::from(&admin)),
        None => Ok(Reply::notice(NoticeKind::NotFound, "No admin found")),
    }
}

fn admin_delete(conn: &Connection, id: &str) -> Result<Reply, HandlerErr> {
    let Some(admin) = store::find_admin(conn, id)? else {
        return Ok(Reply::notice(NoticeKind::NotFound, "No admin found"));
    };
    store::delete_school(conn, id).map_err(|e| {
        HandlerErr::new("db_delete_failed", e.to_string()).with_details(json!({ "table": "admins" }))
    })?;
    tracing::info!(admin_id = %id, "school deleted");
    Reply::data(AdminDoc::from(&admin))
}

async fn handle_admin_register(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let password = get_required_secret(&params, "password")?;
    let hashed = hash_password(password, state.bcrypt_cost).await?;
    state
        .run(move |conn| admin_register(conn, &params, &hashed))
        .await
}

async fn handle_admin_login(
    State(state): State<AppState>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    let email = get_required_str(&params, "email")?;
    let password = get_required_secret(&params, "password")?;

    let found = state
        .run(move |conn| Ok(store::find_admin_by_email(conn, &email)?))
        .await?;
    let Some(admin) = found else {
        return Ok(Reply::notice(NoticeKind::NotFound, "User not found"));
    };
    if !verify_password(password, admin.password.clone()).await? {
        return Ok(Reply::notice(NoticeKind::InvalidPassword, "Invalid password"));
    }
    Reply::data(AdminDoc::from(&admin))
}

async fn handle_admin_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| admin_detail(conn, &id)).await
}

async fn handle_admin_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, HandlerErr> {
    state.run(move |conn| admin_delete(conn, &id)).await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/AdminReg", post(handle_admin_register))
        .route("/AdminLogin", post(handle_admin_login))
        .route(
            "/Admin/{id}",
            get(handle_admin_detail).delete(handle_admin_delete),
        )
}
