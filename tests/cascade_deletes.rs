
use serde_json::json;
use test_support::{
    create_class, create_subject, expect_notice, id_of, mark, register_school, register_student,
    request_ok, spawn_app,
};

#[tokio::test]
async fn deleting_a_class_takes_its_students_and_subjects() {
    let app = spawn_app("schoold-cascade-class");
    let school = register_school(&app, "North High").await;
    let class_a = create_class(&app, &school, "7A").await;
    let class_b = create_class(&app, &school, "7B").await;
    let math = create_subject(&app, &school, &class_a, "M1", 3).await;
    create_subject(&app, &school, &class_b, "C1", 3).await;
    let ada = register_student(&app, &school, &class_a, "Ada", 1).await;
    let alan = register_student(&app, &school, &class_b, "Alan", 1).await;
    mark(&app, &ada, &math, "2024-09-01", "Present").await;

    let deleted = request_ok(&app, "DELETE", &format!("/Sclass/{}", class_a), None).await;
    assert_eq!(id_of(&deleted), class_a);

    expect_notice(&app, "GET", &format!("/Student/{}", ada), None, "No student found").await;
    expect_notice(&app, "GET", &format!("/Subject/{}", math), None, "No subject found").await;
    expect_notice(&app, "DELETE", &format!("/Sclass/{}", class_a), None, "Class not found").await;
    request_ok(&app, "GET", &format!("/Student/{}", alan), None).await;

    let classes = request_ok(&app, "GET", &format!("/SclassList/{}", school), None).await;
    assert_eq!(classes.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn deleting_a_subject_strips_it_from_records() {
    let app = spawn_app("schoold-cascade-subject");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let math = create_subject(&app, &school, &class, "M1", 3).await;
    let bio = create_subject(&app, &school, &class, "B1", 3).await;
    let ada = register_student(&app, &school, &class, "Ada", 1).await;
    mark(&app, &ada, &math, "2024-09-01", "Present").await;
    mark(&app, &ada, &bio, "2024-09-01", "Present").await;
    request_ok(
        &app,
        "PUT",
        &format!("/UpdateExamResult/{}", ada),
        Some(json!({ "subName": math, "marksObtained": 90 })),
    )
    .await;

    let deleted = request_ok(&app, "DELETE", &format!("/Subject/{}", math), None).await;
    assert_eq!(deleted["subCode"], "M1");

    let detail = request_ok(&app, "GET", &format!("/Student/{}", ada), None).await;
    let attendance = detail["attendance"].as_array().expect("attendance");
    assert_eq!(attendance.len(), 1);
    assert_eq!(attendance[0]["subName"]["_id"], bio.as_str());
    assert_eq!(detail["examResult"], json!([]));
}

#[tokio::test]
async fn deleting_a_class_or_subject_reaches_teachers() {
    let app = spawn_app("schoold-cascade-teachers");
    let school = register_school(&app, "North High").await;
    let class_a = create_class(&app, &school, "7A").await;
    let class_b = create_class(&app, &school, "7B").await;
    let math = create_subject(&app, &school, &class_a, "M1", 3).await;
    let bio = create_subject(&app, &school, &class_b, "B1", 3).await;
    let mut teachers = Vec::new();
    for (email, class, subject) in [("a@example.com", &class_a, &math), ("b@example.com", &class_b, &bio)] {
        let doc = request_ok(
            &app,
            "POST",
            "/TeacherReg",
            Some(json!({
                "name": "T",
                "email": email,
                "password": "x",
                "school": school,
                "teachSclass": class,
                "teachSubject": subject,
            })),
        )
        .await;
        teachers.push(id_of(&doc));
    }

    request_ok(&app, "DELETE", &format!("/Subject/{}", bio), None).await;
    let detail = request_ok(&app, "GET", &format!("/Teacher/{}", teachers[1]), None).await;
    assert!(detail["teachSubject"].is_null());

    request_ok(&app, "DELETE", &format!("/Sclass/{}", class_a), None).await;
    expect_notice(&app, "GET", &format!("/Teacher/{}", teachers[0]), None, "No teacher found").await;
    request_ok(&app, "GET", &format!("/Teacher/{}", teachers[1]), None).await;
}

#[tokio::test]
async fn bulk_deletes_report_counts_or_nothing_to_delete() {
    let app = spawn_app("schoold-cascade-bulk");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    create_subject(&app, &school, &class, "M1", 3).await;
    register_student(&app, &school, &class, "Ada", 1).await;
    register_student(&app, &school, &class, "Grace", 2).await;

    let res = request_ok(&app, "DELETE", &format!("/StudentsClass/{}", class), None).await;
    assert_eq!(res["deletedCount"], 2);
    expect_notice(
        &app,
        "DELETE",
        &format!("/Students/{}", school),
        None,
        "No students found to delete",
    )
    .await;

    let res = request_ok(&app, "DELETE", &format!("/SubjectsClass/{}", class), None).await;
    assert_eq!(res["deletedCount"], 1);
    expect_notice(
        &app,
        "DELETE",
        &format!("/Subjects/{}", school),
        None,
        "No subjects found to delete",
    )
    .await;

    let res = request_ok(&app, "DELETE", &format!("/Sclasses/{}", school), None).await;
    assert_eq!(res["deletedCount"], 1);
    expect_notice(
        &app,
        "DELETE",
        &format!("/Sclasses/{}", school),
        None,
        "No classes found to delete",
    )
    .await;
}

#[tokio::test]
async fn deleting_an_admin_removes_the_school() {
    let app = spawn_app("schoold-cascade-admin");
    let school = register_school(&app, "North High").await;
    let class = create_class(&app, &school, "7A").await;
    let math = create_subject(&app, &school, &class, "M1", 3).await;
    let ada = register_student(&app, &school, &class, "Ada", 1).await;
    let teacher = id_of(
        &request_ok(
            &app,
            "POST",
            "/TeacherReg",
            Some(json!({
                "name": "Mr Turing",
                "email": "turing@example.com",
                "password": "chalk",
                "school": school,
                "teachSclass": class,
                "teachSubject": math,
            })),
        )
        .await,
    );
    request_ok(
        &app,
        "POST",
        "/NoticeCreate",
        Some(json!({ "title": "Sports day", "details": "x", "date": "2024-09-01", "adminID": school })),
    )
    .await;
    request_ok(
        &app,
        "POST",
        "/ComplainCreate",
        Some(json!({ "user": ada, "date": "2024-09-02", "complaint": "noise", "school": school })),
    )
    .await;

    let deleted = request_ok(&app, "DELETE", &format!("/Admin/{}", school), None).await;
    assert_eq!(deleted["schoolName"], "North High");
    assert!(deleted.get("password").is_none());

    expect_notice(&app, "GET", &format!("/Admin/{}", school), None, "No admin found").await;
    expect_notice(&app, "GET", &format!("/Student/{}", ada), None, "No student found").await;
    expect_notice(&app, "GET", &format!("/SclassList/{}", school), None, "No sclasses found").await;
    expect_notice(&app, "GET", &format!("/AllSubjects/{}", school), None, "No subjects found").await;
    expect_notice(&app, "GET", &format!("/Teacher/{}", teacher), None, "No teacher found").await;
    expect_notice(&app, "GET", &format!("/NoticeList/{}", school), None, "No notices found").await;
    expect_notice(&app, "GET", &format!("/ComplainList/{}", school), None, "No complains found").await;

    // The school name is free again.
    register_school(&app, "North High").await;
}
