
use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use test_support::{
    attendance_for, create_class, create_subject, mark, register_school, register_student,
    request, request_ok, spawn_app,
};

struct Fixture {
    app: Router,
    school: String,
    class_a: String,
    math: String,
    bio: String,
    chem: String,
    ada: String,
    grace: String,
    alan: String,
}

/// Two classes; Ada and Grace in 7A with math and bio, Alan in 7B with chem.
async fn fixture(prefix: &str) -> Fixture {
    let app = spawn_app(prefix);
    let school = register_school(&app, "North High").await;
    let class_a = create_class(&app, &school, "7A").await;
    let class_b = create_class(&app, &school, "7B").await;
    let math = create_subject(&app, &school, &class_a, "M1", 5).await;
    let bio = create_subject(&app, &school, &class_a, "B1", 5).await;
    let chem = create_subject(&app, &school, &class_b, "C1", 5).await;
    let ada = register_student(&app, &school, &class_a, "Ada", 1).await;
    let grace = register_student(&app, &school, &class_a, "Grace", 2).await;
    let alan = register_student(&app, &school, &class_b, "Alan", 1).await;

    for s in [&ada, &grace] {
        mark(&app, s, &math, "2024-09-01", "Present").await;
        mark(&app, s, &bio, "2024-09-01", "Absent").await;
    }
    mark(&app, &alan, &chem, "2024-09-01", "Present").await;

    Fixture {
        app,
        school,
        class_a,
        math,
        bio,
        chem,
        ada,
        grace,
        alan,
    }
}

async fn detail(app: &Router, id: &str) -> serde_json::Value {
    request_ok(app, "GET", &format!("/Student/{}", id), None).await
}

#[tokio::test]
async fn class_subject_scope_touches_only_that_pair() {
    let f = fixture("schoold-clear-class-sub").await;
    let res = request_ok(
        &f.app,
        "PUT",
        &format!("/RemoveClassSubAtten/{}", f.class_a),
        Some(json!({ "subId": f.math })),
    )
    .await;
    assert_eq!(res["acknowledged"], true);
    assert_eq!(res["matchedCount"], 2);
    assert_eq!(res["modifiedCount"], 2);

    for s in [&f.ada, &f.grace] {
        let d = detail(&f.app, s).await;
        assert!(attendance_for(&d, &f.math).is_empty());
        assert_eq!(attendance_for(&d, &f.bio).len(), 1);
    }
    let d = detail(&f.app, &f.alan).await;
    assert_eq!(attendance_for(&d, &f.chem).len(), 1);
}

#[tokio::test]
async fn class_scope_clears_all_subjects() {
    let f = fixture("schoold-clear-class").await;
    let res = request_ok(
        &f.app,
        "PUT",
        &format!("/RemoveClassAtten/{}", f.class_a),
        None,
    )
    .await;
    assert_eq!(res["modifiedCount"], 2);
    assert_eq!(detail(&f.app, &f.ada).await["attendance"], json!([]));
    assert_eq!(detail(&f.app, &f.alan).await["attendance"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn subject_scope_matches_students_holding_the_subject() {
    let f = fixture("schoold-clear-subject").await;
    let res = request_ok(
        &f.app,
        "PUT",
        &format!("/RemoveAllStudentsSubAtten/{}", f.bio),
        None,
    )
    .await;
    assert_eq!(res["matchedCount"], 2);
    assert_eq!(res["modifiedCount"], 2);
    let d = detail(&f.app, &f.grace).await;
    assert!(attendance_for(&d, &f.bio).is_empty());
    assert_eq!(attendance_for(&d, &f.math).len(), 1);
}

#[tokio::test]
async fn school_scope_clears_everything() {
    let f = fixture("schoold-clear-school").await;
    let res = request_ok(
        &f.app,
        "PUT",
        &format!("/RemoveAllStudentsAtten/{}", f.school),
        None,
    )
    .await;
    assert_eq!(res["matchedCount"], 3);
    assert_eq!(res["modifiedCount"], 3);
    for s in [&f.ada, &f.grace, &f.alan] {
        assert_eq!(detail(&f.app, s).await["attendance"], json!([]));
    }
}

#[tokio::test]
async fn student_scopes() {
    let f = fixture("schoold-clear-student").await;
    let res = request_ok(
        &f.app,
        "PUT",
        &format!("/RemoveStudentSubAtten/{}", f.ada),
        Some(json!({ "subId": f.bio })),
    )
    .await;
    assert_eq!(res["matchedCount"], 1);
    assert_eq!(res["modifiedCount"], 1);
    let d = detail(&f.app, &f.ada).await;
    assert!(attendance_for(&d, &f.bio).is_empty());
    assert_eq!(attendance_for(&d, &f.math).len(), 1);

    let res = request_ok(&f.app, "PUT", &format!("/RemoveStudentAtten/{}", f.ada), None).await;
    assert_eq!(res["modifiedCount"], 1);
    assert_eq!(detail(&f.app, &f.ada).await["attendance"], json!([]));
    assert_eq!(attendance_for(&detail(&f.app, &f.grace).await, &f.bio).len(), 1);

    // Nothing left to clear.
    let res = request_ok(&f.app, "PUT", &format!("/RemoveStudentAtten/{}", f.ada), None).await;
    assert_eq!(res["matchedCount"], 1);
    assert_eq!(res["modifiedCount"], 0);

    let res = request_ok(&f.app, "PUT", "/RemoveStudentAtten/ghost", None).await;
    assert_eq!(res["matchedCount"], 0);
}

#[tokio::test]
async fn subject_id_is_required_in_body() {
    let f = fixture("schoold-clear-bad").await;
    let (status, body) = request(
        &f.app,
        "PUT",
        &format!("/RemoveClassSubAtten/{}", f.class_a),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_params");
}
