//! JSON shapes returned to the frontend.
//!
//! Field names follow the client's contract (`_id`, `sclassName`, `subName`,
//! ...). References serialize either as a bare id or, when populated, as a
//! small object carrying the referenced name. None of these types has a
//! password field.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

use crate::records::{AttendanceStatus, StudentRecord};
use crate::store::{
    self, AdminRow, ClassRow, ComplainRow, NoticeRow, StudentRow, SubjectRow, TeacherRow,
};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(String),
    Populated(T),
}

#[derive(Debug, Serialize)]
pub struct SchoolName {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "schoolName")]
    pub school_name: String,
}

#[derive(Debug, Serialize)]
pub struct ClassName {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "sclassName")]
    pub sclass_name: String,
}

#[derive(Debug, Serialize)]
pub struct SubjectName {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "subName")]
    pub sub_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub school_name: String,
}

impl From<&AdminRow> for AdminDoc {
    fn from(a: &AdminRow) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            email: a.email.clone(),
            role: "Admin",
            school_name: a.school_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub sclass_name: String,
    pub school: Ref<SchoolName>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub sub_name: String,
    pub sub_code: String,
    pub sessions: u32,
    pub sclass_name: Ref<ClassName>,
    pub school: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDoc {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub sub_name: Ref<SubjectName>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDoc {
    pub sub_name: Ref<SubjectName>,
    pub marks_obtained: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttendanceDoc {
    pub sub_name: Ref<SubjectName>,
    pub sessions: u32,
    pub present: usize,
    pub absent: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub roll_num: i64,
    pub role: &'static str,
    pub school: Ref<SchoolName>,
    pub sclass_name: Ref<ClassName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Vec<AttendanceDoc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_result: Option<Vec<ExamDoc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_summary: Option<Vec<SubjectAttendanceDoc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub school: Ref<SchoolName>,
    pub teach_sclass: Ref<ClassName>,
    pub teach_subject: Option<Ref<SubjectName>>,
}

#[derive(Debug, Serialize)]
pub struct NoticeDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub details: String,
    pub date: NaiveDate,
    pub school: String,
}

impl From<&NoticeRow> for NoticeDoc {
    fn from(n: &NoticeRow) -> Self {
        Self {
            id: n.id.clone(),
            title: n.title.clone(),
            details: n.details.clone(),
            date: n.date,
            school: n.school_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserName {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ComplainDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Ref<UserName>,
    pub date: NaiveDate,
    pub complaint: String,
    pub school: String,
}

/// Which references to expand into named objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Populate {
    pub school: bool,
    pub class: bool,
    pub subjects: bool,
}

impl Populate {
    pub const NONE: Populate = Populate {
        school: false,
        class: false,
        subjects: false,
    };
    pub const ALL: Populate = Populate {
        school: true,
        class: true,
        subjects: true,
    };
}

pub fn school_ref(conn: &Connection, school_id: &str, populate: bool) -> rusqlite::Result<Ref<SchoolName>> {
    if !populate {
        return Ok(Ref::Id(school_id.to_string()));
    }
    Ok(match store::find_admin(conn, school_id)? {
        Some(a) => Ref::Populated(SchoolName {
            id: a.id,
            school_name: a.school_name,
        }),
        None => Ref::Id(school_id.to_string()),
    })
}

pub fn class_ref(conn: &Connection, class_id: &str, populate: bool) -> rusqlite::Result<Ref<ClassName>> {
    if !populate {
        return Ok(Ref::Id(class_id.to_string()));
    }
    Ok(match store::find_class(conn, class_id)? {
        Some(c) => Ref::Populated(ClassName {
            id: c.id,
            sclass_name: c.name,
        }),
        None => Ref::Id(class_id.to_string()),
    })
}

fn subject_ref(
    subjects: Option<&HashMap<String, SubjectRow>>,
    subject_id: &str,
    with_sessions: bool,
) -> Ref<SubjectName> {
    match subjects.and_then(|m| m.get(subject_id)) {
        Some(s) => Ref::Populated(SubjectName {
            id: s.id.clone(),
            sub_name: s.sub_name.clone(),
            sessions: with_sessions.then_some(s.sessions),
        }),
        None => Ref::Id(subject_id.to_string()),
    }
}

pub fn class_doc(conn: &Connection, class: &ClassRow, populate_school: bool) -> rusqlite::Result<ClassDoc> {
    Ok(ClassDoc {
        id: class.id.clone(),
        sclass_name: class.name.clone(),
        school: school_ref(conn, &class.school_id, populate_school)?,
    })
}

pub fn subject_doc(conn: &Connection, subject: &SubjectRow, populate_class: bool) -> rusqlite::Result<SubjectDoc> {
    Ok(SubjectDoc {
        id: subject.id.clone(),
        sub_name: subject.sub_name.clone(),
        sub_code: subject.sub_code.clone(),
        sessions: subject.sessions,
        sclass_name: class_ref(conn, &subject.class_id, populate_class)?,
        school: subject.school_id.clone(),
    })
}

/// Builds a student document. `record: None` leaves attendance and exam
/// results out entirely, as the login response requires.
pub fn student_doc(
    conn: &Connection,
    student: &StudentRow,
    record: Option<&StudentRecord>,
    populate: Populate,
) -> rusqlite::Result<StudentDoc> {
    let mut doc = StudentDoc {
        id: student.id.clone(),
        name: student.name.clone(),
        roll_num: student.roll_num,
        role: "Student",
        school: school_ref(conn, &student.school_id, populate.school)?,
        sclass_name: class_ref(conn, &student.class_id, populate.class)?,
        attendance: None,
        exam_result: None,
        attendance_summary: None,
    };
    let Some(record) = record else {
        return Ok(doc);
    };

    let subjects = if populate.subjects {
        Some(store::subjects_for_record(conn, record)?)
    } else {
        None
    };
    let subjects = subjects.as_ref();

    doc.attendance = Some(
        record
            .attendance_entries()
            .into_iter()
            .map(|a| AttendanceDoc {
                date: a.date,
                status: a.status,
                sub_name: subject_ref(subjects, &a.subject_id, true),
            })
            .collect(),
    );
    doc.exam_result = Some(
        record
            .exam_entries()
            .into_iter()
            .map(|e| ExamDoc {
                sub_name: subject_ref(subjects, &e.subject_id, false),
                marks_obtained: e.marks_obtained,
            })
            .collect(),
    );
    if let Some(subjects) = subjects {
        let sessions: HashMap<String, u32> = subjects
            .iter()
            .map(|(id, s)| (id.clone(), s.sessions))
            .collect();
        doc.attendance_summary = Some(
            record
                .attendance_summary(&sessions)
                .into_iter()
                .map(|s| SubjectAttendanceDoc {
                    sub_name: subject_ref(Some(subjects), &s.subject_id, false),
                    sessions: s.sessions,
                    present: s.present,
                    absent: s.absent,
                    percentage: s.percentage,
                })
                .collect(),
        );
    }
    Ok(doc)
}

/// Teacher document; `populate` expands school, class and subject names.
pub fn teacher_doc(conn: &Connection, teacher: &TeacherRow, populate: bool) -> rusqlite::Result<TeacherDoc> {
    let teach_subject = match &teacher.teach_subject_id {
        Some(id) if populate => Some(match store::find_subject(conn, id)? {
            Some(s) => Ref::Populated(SubjectName {
                id: s.id,
                sub_name: s.sub_name,
                sessions: Some(s.sessions),
            }),
            None => Ref::Id(id.clone()),
        }),
        Some(id) => Some(Ref::Id(id.clone())),
        None => None,
    };
    Ok(TeacherDoc {
        id: teacher.id.clone(),
        name: teacher.name.clone(),
        email: teacher.email.clone(),
        role: "Teacher",
        school: school_ref(conn, &teacher.school_id, populate)?,
        teach_sclass: class_ref(conn, &teacher.teach_class_id, populate)?,
        teach_subject,
    })
}

/// Complaint with the filing student's name expanded.
pub fn complain_doc(conn: &Connection, complain: &ComplainRow) -> rusqlite::Result<ComplainDoc> {
    let user = match store::find_student(conn, &complain.user_id)? {
        Some(s) => Ref::Populated(UserName {
            id: s.id,
            name: s.name,
        }),
        None => Ref::Id(complain.user_id.clone()),
    };
    Ok(ComplainDoc {
        id: complain.id.clone(),
        user,
        date: complain.date,
        complaint: complain.complaint.clone(),
        school: complain.school_id.clone(),
    })
}
