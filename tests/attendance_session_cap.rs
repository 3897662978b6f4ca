
use axum::http::StatusCode;
use serde_json::json;
use test_support::{
    attendance_for, create_class, create_subject, expect_notice, mark, register_school,
    register_student, request, request_ok, spawn_app,
};

#[tokio::test]
async fn third_distinct_day_is_rejected_when_two_sessions() {
    let app = spawn_app("schoold-cap");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let math = create_subject(&app, &school, &class, "M1", 2).await;
    let student = register_student(&app, &school, &class, "Ada", 1).await;

    mark(&app, &student, &math, "2024-09-01", "Present").await;
    let doc = mark(&app, &student, &math, "2024-09-02", "Absent").await;
    assert_eq!(attendance_for(&doc, &math).len(), 2);

    let notice = expect_notice(
        &app,
        "PUT",
        &format!("/StudentAttendance/{}", student),
        Some(json!({ "subName": math, "status": "Present", "date": "2024-09-03" })),
        "Maximum attendance limit reached",
    )
    .await;
    assert_eq!(notice["code"], "session_limit_exceeded");

    // Re-marking a day that is already on record is not a new session.
    let doc = mark(&app, &student, &math, "2024-09-01", "Absent").await;
    let entries = attendance_for(&doc, &math);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["date"], "2024-09-01");
    assert_eq!(entries[0]["status"], "Absent");
    assert_eq!(entries[1]["date"], "2024-09-02");
}

#[tokio::test]
async fn timestamps_collapse_to_their_calendar_day() {
    let app = spawn_app("schoold-cap-ts");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let bio = create_subject(&app, &school, &class, "B1", 1).await;
    let student = register_student(&app, &school, &class, "Ada", 1).await;

    mark(&app, &student, &bio, "2024-09-01T08:00:00.000Z", "Present").await;
    let doc = mark(&app, &student, &bio, "2024-09-01T14:30:00Z", "Absent").await;
    let entries = attendance_for(&doc, &bio);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "Absent");
}

#[tokio::test]
async fn cap_counts_each_subject_separately() {
    let app = spawn_app("schoold-cap-subjects");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let math = create_subject(&app, &school, &class, "M1", 1).await;
    let bio = create_subject(&app, &school, &class, "B1", 1).await;
    let student = register_student(&app, &school, &class, "Ada", 1).await;

    mark(&app, &student, &math, "2024-09-01", "Present").await;
    let doc = mark(&app, &student, &bio, "2024-09-02", "Present").await;
    assert_eq!(attendance_for(&doc, &math).len(), 1);
    assert_eq!(attendance_for(&doc, &bio).len(), 1);
}

#[tokio::test]
async fn zero_sessions_refuses_every_new_day() {
    let app = spawn_app("schoold-cap-zero");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let art = create_subject(&app, &school, &class, "A1", 0).await;
    let student = register_student(&app, &school, &class, "Ada", 1).await;

    expect_notice(
        &app,
        "PUT",
        &format!("/StudentAttendance/{}", student),
        Some(json!({ "subName": art, "status": "Present", "date": "2024-09-01" })),
        "Maximum attendance limit reached",
    )
    .await;
    let detail = request_ok(&app, "GET", &format!("/Student/{}", student), None).await;
    assert_eq!(detail["attendance"], json!([]));
}

#[tokio::test]
async fn bad_input_and_missing_targets() {
    let app = spawn_app("schoold-cap-errors");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let math = create_subject(&app, &school, &class, "M1", 3).await;
    let student = register_student(&app, &school, &class, "Ada", 1).await;
    let path = format!("/StudentAttendance/{}", student);

    let (status, body) = request(
        &app,
        "PUT",
        &path,
        Some(json!({ "subName": math, "status": "Late", "date": "2024-09-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_params");

    let (status, _) = request(
        &app,
        "PUT",
        &path,
        Some(json!({ "subName": math, "status": "Present", "date": "yesterday" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    expect_notice(
        &app,
        "PUT",
        "/StudentAttendance/no-such-student",
        Some(json!({ "subName": math, "status": "Present", "date": "2024-09-01" })),
        "Student not found",
    )
    .await;
    expect_notice(
        &app,
        "PUT",
        &path,
        Some(json!({ "subName": "no-such-subject", "status": "Present", "date": "2024-09-01" })),
        "Subject not found",
    )
    .await;
}

#[tokio::test]
async fn detail_carries_an_attendance_summary() {
    let app = spawn_app("schoold-cap-summary");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let math = create_subject(&app, &school, &class, "M1", 3).await;
    let student = register_student(&app, &school, &class, "Ada", 1).await;

    mark(&app, &student, &math, "2024-09-01", "Present").await;
    mark(&app, &student, &math, "2024-09-02", "Absent").await;

    let detail = request_ok(&app, "GET", &format!("/Student/{}", student), None).await;
    let summary = detail["attendanceSummary"].as_array().expect("summary");
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0]["subName"]["_id"], math.as_str());
    assert_eq!(summary[0]["present"], 1);
    assert_eq!(summary[0]["absent"], 1);
    assert_eq!(summary[0]["percentage"], 33.33);
    assert_eq!(detail["attendance"][0]["subName"]["subName"], "M1");
    assert_eq!(detail["attendance"][0]["subName"]["sessions"], 3);
}
