use axum::extract::{Path, State};
use axum::routing::put;
use axum::Router;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::api::documents::{student_doc, Populate};
use crate::api::error::{store_outcome, HandlerErr, Reply};
use crate::api::extract::JsonParams;
use crate::api::helpers::{get_required_f64, get_required_str};
use crate::api::types::AppState;
use crate::store;

fn exam_result_update(conn: &Connection, student_id: &str, params: &Value) -> Result<Reply, HandlerErr> {
    let subject_id = get_required_str(params, "subName")?;
    let marks = get_required_f64(params, "marksObtained")?;
    if !marks.is_finite() || marks < 0.0 {
        return Err(HandlerErr::bad_params("marksObtained must be a non-negative number")
            .with_details(json!({ "marksObtained": marks })));
    }

    match store::record_exam_result(conn, student_id, &subject_id, marks) {
        Ok((doc, change)) => {
            tracing::info!(student_id, subject_id = %subject_id, marks, ?change, "exam result saved");
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

async fn handle_exam_result_update(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    JsonParams(params): JsonParams,
) -> Result<Reply, HandlerErr> {
    state
        .run(move |conn| exam_result_update(conn, &student_id, &params))
        .await
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/UpdateExamResult/{id}", put(handle_exam_result_update))
}
