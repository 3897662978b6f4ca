use crate::records::{
    AttendanceChange, AttendanceEntry, AttendanceStatus, ExamChange, ExamEntry, RecordError,
    StudentRecord,
};
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Student not found")]
    StudentNotFound,
    #[error("Subject not found")]
    SubjectNotFound,
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
pub struct AdminRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub school_name: String,
}

#[derive(Debug, Clone)]
pub struct ClassRow {
    pub id: String,
    pub name: String,
    pub school_id: String,
}

#[derive(Debug, Clone)]
pub struct SubjectRow {
    pub id: String,
    pub sub_name: String,
    pub sub_code: String,
    pub sessions: u32,
    pub class_id: String,
    pub school_id: String,
}

#[derive(Debug, Clone)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub roll_num: i64,
    pub password: String,
    pub class_id: String,
    pub school_id: String,
}

#[derive(Debug, Clone)]
pub struct TeacherRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub school_id: String,
    pub teach_class_id: String,
    pub teach_subject_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NoticeRow {
    pub id: String,
    pub title: String,
    pub details: String,
    pub date: NaiveDate,
    pub school_id: String,
}

#[derive(Debug, Clone)]
pub struct ComplainRow {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub complaint: String,
    pub school_id: String,
}

/// Which students a bulk operation touches.
#[derive(Debug, Clone)]
pub enum StudentScope {
    Student(String),
    Class(String),
    School(String),
    Everyone,
}

impl StudentScope {
    fn filter(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::Student(id) => ("id = ?", vec![Value::Text(id.clone())]),
            Self::Class(id) => ("class_id = ?", vec![Value::Text(id.clone())]),
            Self::School(id) => ("school_id = ?", vec![Value::Text(id.clone())]),
            Self::Everyone => ("1 = 1", Vec::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SubjectScope {
    Subject(String),
    Class(String),
    School(String),
}

impl SubjectScope {
    fn filter(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::Subject(id) => ("id = ?", vec![Value::Text(id.clone())]),
            Self::Class(id) => ("class_id = ?", vec![Value::Text(id.clone())]),
            Self::School(id) => ("school_id = ?", vec![Value::Text(id.clone())]),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClassScope {
    Class(String),
    School(String),
}

impl ClassScope {
    fn filter(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::Class(id) => ("id = ?", vec![Value::Text(id.clone())]),
            Self::School(id) => ("school_id = ?", vec![Value::Text(id.clone())]),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TeacherScope {
    Teacher(String),
    Class(String),
    School(String),
}

impl TeacherScope {
    fn filter(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::Teacher(id) => ("id = ?", vec![Value::Text(id.clone())]),
            Self::Class(id) => ("teach_class_id = ?", vec![Value::Text(id.clone())]),
            Self::School(id) => ("school_id = ?", vec![Value::Text(id.clone())]),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NoticeScope {
    Notice(String),
    School(String),
}

impl NoticeScope {
    fn filter(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::Notice(id) => ("id = ?", vec![Value::Text(id.clone())]),
            Self::School(id) => ("school_id = ?", vec![Value::Text(id.clone())]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkResult {
    pub matched: usize,
    pub modified: usize,
}

/// A student document after a record mutation.
#[derive(Debug, Clone)]
pub struct StudentDocument {
    pub student: StudentRow,
    pub record: StudentRecord,
}

fn conversion_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn admin_from_row(r: &Row<'_>) -> rusqlite::Result<AdminRow> {
    Ok(AdminRow {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        password: r.get(3)?,
        school_name: r.get(4)?,
    })
}

fn class_from_row(r: &Row<'_>) -> rusqlite::Result<ClassRow> {
    Ok(ClassRow {
        id: r.get(0)?,
        name: r.get(1)?,
        school_id: r.get(2)?,
    })
}

fn subject_from_row(r: &Row<'_>) -> rusqlite::Result<SubjectRow> {
    Ok(SubjectRow {
        id: r.get(0)?,
        sub_name: r.get(1)?,
        sub_code: r.get(2)?,
        sessions: r.get(3)?,
        class_id: r.get(4)?,
        school_id: r.get(5)?,
    })
}

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: r.get(0)?,
        name: r.get(1)?,
        roll_num: r.get(2)?,
        password: r.get(3)?,
        class_id: r.get(4)?,
        school_id: r.get(5)?,
    })
}

fn teacher_from_row(r: &Row<'_>) -> rusqlite::Result<TeacherRow> {
    Ok(TeacherRow {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        password: r.get(3)?,
        school_id: r.get(4)?,
        teach_class_id: r.get(5)?,
        teach_subject_id: r.get(6)?,
    })
}

fn parse_stored_day(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| conversion_err(idx, format!("bad stored date {raw}: {e}")))
}

fn notice_from_row(r: &Row<'_>) -> rusqlite::Result<NoticeRow> {
    let date: String = r.get(3)?;
    Ok(NoticeRow {
        id: r.get(0)?,
        title: r.get(1)?,
        details: r.get(2)?,
        date: parse_stored_day(3, &date)?,
        school_id: r.get(4)?,
    })
}

fn complain_from_row(r: &Row<'_>) -> rusqlite::Result<ComplainRow> {
    let date: String = r.get(2)?;
    Ok(ComplainRow {
        id: r.get(0)?,
        user_id: r.get(1)?,
        date: parse_stored_day(2, &date)?,
        complaint: r.get(3)?,
        school_id: r.get(4)?,
    })
}

pub fn find_admin(conn: &Connection, id: &str) -> rusqlite::Result<Option<AdminRow>> {
    conn.query_row(
        "SELECT id, name, email, password, school_name FROM admins WHERE id = ?",
        [id],
        admin_from_row,
    )
    .optional()
}

pub fn find_admin_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<AdminRow>> {
    conn.query_row(
        "SELECT id, name, email, password, school_name FROM admins WHERE email = ?",
        [email],
        admin_from_row,
    )
    .optional()
}

pub fn find_class(conn: &Connection, id: &str) -> rusqlite::Result<Option<ClassRow>> {
    conn.query_row(
        "SELECT id, name, school_id FROM sclasses WHERE id = ?",
        [id],
        class_from_row,
    )
    .optional()
}

pub fn classes_in_school(conn: &Connection, school_id: &str) -> rusqlite::Result<Vec<ClassRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, school_id FROM sclasses WHERE school_id = ? ORDER BY name",
    )?;
    let rows = stmt
        .query_map([school_id], class_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_subject(conn: &Connection, id: &str) -> rusqlite::Result<Option<SubjectRow>> {
    conn.query_row(
        "SELECT id, sub_name, sub_code, sessions, class_id, school_id FROM subjects WHERE id = ?",
        [id],
        subject_from_row,
    )
    .optional()
}

pub fn list_subjects(conn: &Connection, scope: &SubjectScope) -> rusqlite::Result<Vec<SubjectRow>> {
    let (filter, params) = scope.filter();
    let sql = format!(
        "SELECT id, sub_name, sub_code, sessions, class_id, school_id
         FROM subjects WHERE {} ORDER BY sub_name, sub_code",
        filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), subject_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_student(conn: &Connection, id: &str) -> rusqlite::Result<Option<StudentRow>> {
    conn.query_row(
        "SELECT id, name, roll_num, password, class_id, school_id FROM students WHERE id = ?",
        [id],
        student_from_row,
    )
    .optional()
}

/// Roll numbers are only unique inside one class of one school.
pub fn find_student_by_roll(
    conn: &Connection,
    school_id: &str,
    class_id: &str,
    roll_num: i64,
) -> rusqlite::Result<Option<StudentRow>> {
    conn.query_row(
        "SELECT id, name, roll_num, password, class_id, school_id
         FROM students
         WHERE school_id = ? AND class_id = ? AND roll_num = ?",
        (school_id, class_id, roll_num),
        student_from_row,
    )
    .optional()
}

/// Login key is (roll number, name); the first registered match wins.
pub fn find_student_for_login(
    conn: &Connection,
    roll_num: i64,
    name: &str,
) -> rusqlite::Result<Option<StudentRow>> {
    conn.query_row(
        "SELECT id, name, roll_num, password, class_id, school_id
         FROM students
         WHERE roll_num = ? AND name = ?
         ORDER BY rowid
         LIMIT 1",
        (roll_num, name),
        student_from_row,
    )
    .optional()
}

pub fn list_students(conn: &Connection, scope: &StudentScope) -> rusqlite::Result<Vec<StudentRow>> {
    let (filter, params) = scope.filter();
    let sql = format!(
        "SELECT id, name, roll_num, password, class_id, school_id
         FROM students WHERE {} ORDER BY roll_num, name",
        filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

const TEACHER_COLUMNS: &str =
    "id, name, email, password, school_id, teach_class_id, teach_subject_id";

pub fn find_teacher(conn: &Connection, id: &str) -> rusqlite::Result<Option<TeacherRow>> {
    conn.query_row(
        &format!("SELECT {} FROM teachers WHERE id = ?", TEACHER_COLUMNS),
        [id],
        teacher_from_row,
    )
    .optional()
}

pub fn find_teacher_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<TeacherRow>> {
    conn.query_row(
        &format!("SELECT {} FROM teachers WHERE email = ?", TEACHER_COLUMNS),
        [email],
        teacher_from_row,
    )
    .optional()
}

pub fn list_teachers(conn: &Connection, scope: &TeacherScope) -> rusqlite::Result<Vec<TeacherRow>> {
    let (filter, params) = scope.filter();
    let sql = format!(
        "SELECT {} FROM teachers WHERE {} ORDER BY name, email",
        TEACHER_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_notice(conn: &Connection, notice: &NoticeRow) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO notices(id, title, details, date, school_id) VALUES(?, ?, ?, ?, ?)",
        (
            &notice.id,
            &notice.title,
            &notice.details,
            notice.date.format(DATE_FORMAT).to_string(),
            &notice.school_id,
        ),
    )?;
    Ok(())
}

pub fn find_notice(conn: &Connection, id: &str) -> rusqlite::Result<Option<NoticeRow>> {
    conn.query_row(
        "SELECT id, title, details, date, school_id FROM notices WHERE id = ?",
        [id],
        notice_from_row,
    )
    .optional()
}

/// Newest first.
pub fn notices_in_school(conn: &Connection, school_id: &str) -> rusqlite::Result<Vec<NoticeRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, details, date, school_id FROM notices
         WHERE school_id = ? ORDER BY date DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map([school_id], notice_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_notices(conn: &Connection, scope: &NoticeScope) -> rusqlite::Result<usize> {
    let (filter, params) = scope.filter();
    conn.execute(
        &format!("DELETE FROM notices WHERE {}", filter),
        params_from_iter(params.iter()),
    )
}

pub fn insert_complain(conn: &Connection, complain: &ComplainRow) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO complains(id, user_id, date, complaint, school_id) VALUES(?, ?, ?, ?, ?)",
        (
            &complain.id,
            &complain.user_id,
            complain.date.format(DATE_FORMAT).to_string(),
            &complain.complaint,
            &complain.school_id,
        ),
    )?;
    Ok(())
}

pub fn complains_in_school(conn: &Connection, school_id: &str) -> rusqlite::Result<Vec<ComplainRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, complaint, school_id FROM complains
         WHERE school_id = ? ORDER BY date DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map([school_id], complain_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_record(conn: &Connection, student_id: &str) -> rusqlite::Result<StudentRecord> {
    let mut stmt = conn.prepare(
        "SELECT subject_id, date, status FROM student_attendance WHERE student_id = ?",
    )?;
    let attendance = stmt
        .query_map([student_id], |r| {
            let date_raw: String = r.get(1)?;
            let status_raw: String = r.get(2)?;
            let date = NaiveDate::parse_from_str(&date_raw, DATE_FORMAT)
                .map_err(|e| conversion_err(1, format!("bad attendance date {date_raw}: {e}")))?;
            let status = AttendanceStatus::parse(&status_raw)
                .ok_or_else(|| conversion_err(2, format!("bad attendance status {status_raw}")))?;
            Ok(AttendanceEntry {
                subject_id: r.get(0)?,
                date,
                status,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT subject_id, marks_obtained FROM exam_results WHERE student_id = ?",
    )?;
    let exams = stmt
        .query_map([student_id], |r| {
            Ok(ExamEntry {
                subject_id: r.get(0)?,
                marks_obtained: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StudentRecord::from_entries(attendance, exams))
}

/// Subject rows for every subject referenced by `record`, keyed by id.
/// References to deleted subjects are simply absent from the map.
pub fn subjects_for_record(
    conn: &Connection,
    record: &StudentRecord,
) -> rusqlite::Result<HashMap<String, SubjectRow>> {
    let mut out = HashMap::new();
    let ids = record
        .attendance_entries()
        .into_iter()
        .map(|a| a.subject_id)
        .chain(record.exam_entries().into_iter().map(|e| e.subject_id));
    for id in ids {
        if out.contains_key(&id) {
            continue;
        }
        if let Some(subject) = find_subject(conn, &id)? {
            out.insert(id, subject);
        }
    }
    Ok(out)
}

fn touch_student(conn: &Connection, student_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE students SET updated_at = ? WHERE id = ?",
        (chrono::Utc::now().to_rfc3339(), student_id),
    )?;
    Ok(())
}

/// Marks attendance for one student. The whole read-check-write runs inside
/// one transaction so the session cap is checked against committed state.
pub fn record_attendance(
    conn: &Connection,
    student_id: &str,
    subject_id: &str,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<(StudentDocument, AttendanceChange), StoreError> {
    let tx = conn.unchecked_transaction()?;
    let student = find_student(&tx, student_id)?.ok_or(StoreError::StudentNotFound)?;
    let subject = find_subject(&tx, subject_id)?.ok_or(StoreError::SubjectNotFound)?;
    let mut record = load_record(&tx, student_id)?;
    let previous = record.status_on(subject_id, date);

    let change = record.record_attendance(subject_id, subject.sessions, date, status)?;
    tx.execute(
        "INSERT INTO student_attendance(student_id, subject_id, date, status)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_id, subject_id, date) DO UPDATE SET
           status = excluded.status",
        (
            student_id,
            subject_id,
            date.format(DATE_FORMAT).to_string(),
            status.as_str(),
        ),
    )?;
    touch_student(&tx, student_id)?;
    tx.commit()?;

    tracing::debug!(student_id, subject_id, %date, ?previous, ?change, "attendance recorded");
    Ok((StudentDocument { student, record }, change))
}

pub fn record_exam_result(
    conn: &Connection,
    student_id: &str,
    subject_id: &str,
    marks_obtained: f64,
) -> Result<(StudentDocument, ExamChange), StoreError> {
    let tx = conn.unchecked_transaction()?;
    let student = find_student(&tx, student_id)?.ok_or(StoreError::StudentNotFound)?;
    if find_subject(&tx, subject_id)?.is_none() {
        return Err(StoreError::SubjectNotFound);
    }
    let mut record = load_record(&tx, student_id)?;
    let previous = record.marks_for(subject_id);

    let change = record.record_exam_result(subject_id, marks_obtained);
    tx.execute(
        "INSERT INTO exam_results(student_id, subject_id, marks_obtained)
         VALUES(?, ?, ?)
         ON CONFLICT(student_id, subject_id) DO UPDATE SET
           marks_obtained = excluded.marks_obtained",
        (student_id, subject_id, marks_obtained),
    )?;
    touch_student(&tx, student_id)?;
    tx.commit()?;

    tracing::debug!(student_id, subject_id, marks_obtained, ?previous, ?change, "exam result recorded");
    Ok((StudentDocument { student, record }, change))
}

/// Clears attendance, for one subject or all, across `scope`.
///
/// A single student goes through its record like any other document edit;
/// wider scopes run as one store-side bulk delete.
pub fn clear_attendance(
    conn: &Connection,
    scope: &StudentScope,
    subject_id: Option<&str>,
) -> rusqlite::Result<BulkResult> {
    if let StudentScope::Student(student_id) = scope {
        let tx = conn.unchecked_transaction()?;
        if find_student(&tx, student_id)?.is_none() {
            return Ok(BulkResult::default());
        }
        let mut record = load_record(&tx, student_id)?;
        let removed = record.clear_attendance(subject_id);
        if removed > 0 {
            delete_attendance_rows(&tx, scope, subject_id)?;
            touch_student(&tx, student_id)?;
        }
        tx.commit()?;
        return Ok(BulkResult {
            matched: 1,
            modified: usize::from(removed > 0),
        });
    }

    let (filter, mut params) = scope.filter();
    let tx = conn.unchecked_transaction()?;
    let matched: i64 = match (scope, subject_id) {
        // Store-wide subject clears match only students holding that subject.
        (StudentScope::Everyone, Some(sid)) => tx.query_row(
            "SELECT COUNT(DISTINCT student_id) FROM student_attendance WHERE subject_id = ?",
            [sid],
            |r| r.get(0),
        )?,
        _ => tx.query_row(
            &format!("SELECT COUNT(*) FROM students WHERE {}", filter),
            params_from_iter(params.iter()),
            |r| r.get(0),
        )?,
    };

    let mut modified_sql = format!(
        "SELECT COUNT(DISTINCT student_id) FROM student_attendance
         WHERE student_id IN (SELECT id FROM students WHERE {})",
        filter
    );
    if let Some(sid) = subject_id {
        modified_sql.push_str(" AND subject_id = ?");
        params.push(Value::Text(sid.to_string()));
    }
    let modified: i64 = tx.query_row(&modified_sql, params_from_iter(params.iter()), |r| {
        r.get(0)
    })?;

    delete_attendance_rows(&tx, scope, subject_id)?;
    tx.commit()?;

    Ok(BulkResult {
        matched: matched as usize,
        modified: modified as usize,
    })
}

fn delete_attendance_rows(
    conn: &Connection,
    scope: &StudentScope,
    subject_id: Option<&str>,
) -> rusqlite::Result<usize> {
    let (filter, mut params) = scope.filter();
    let mut sql = format!(
        "DELETE FROM student_attendance
         WHERE student_id IN (SELECT id FROM students WHERE {})",
        filter
    );
    if let Some(sid) = subject_id {
        sql.push_str(" AND subject_id = ?");
        params.push(Value::Text(sid.to_string()));
    }
    conn.execute(&sql, params_from_iter(params.iter()))
}

fn delete_students_in(conn: &Connection, scope: &StudentScope) -> rusqlite::Result<usize> {
    let (filter, params) = scope.filter();
    conn.execute(
        &format!(
            "DELETE FROM student_attendance
             WHERE student_id IN (SELECT id FROM students WHERE {})",
            filter
        ),
        params_from_iter(params.iter()),
    )?;
    conn.execute(
        &format!(
            "DELETE FROM exam_results
             WHERE student_id IN (SELECT id FROM students WHERE {})",
            filter
        ),
        params_from_iter(params.iter()),
    )?;
    conn.execute(
        &format!(
            "DELETE FROM complains
             WHERE user_id IN (SELECT id FROM students WHERE {})",
            filter
        ),
        params_from_iter(params.iter()),
    )?;
    conn.execute(
        &format!("DELETE FROM students WHERE {}", filter),
        params_from_iter(params.iter()),
    )
}

fn delete_subjects_in(conn: &Connection, scope: &SubjectScope) -> rusqlite::Result<usize> {
    let (filter, params) = scope.filter();
    for table in ["student_attendance", "exam_results"] {
        conn.execute(
            &format!(
                "DELETE FROM {}
                 WHERE subject_id IN (SELECT id FROM subjects WHERE {})",
                table, filter
            ),
            params_from_iter(params.iter()),
        )?;
    }
    conn.execute(
        &format!(
            "UPDATE teachers SET teach_subject_id = NULL
             WHERE teach_subject_id IN (SELECT id FROM subjects WHERE {})",
            filter
        ),
        params_from_iter(params.iter()),
    )?;
    conn.execute(
        &format!("DELETE FROM subjects WHERE {}", filter),
        params_from_iter(params.iter()),
    )
}

fn delete_teachers_in(conn: &Connection, scope: &TeacherScope) -> rusqlite::Result<usize> {
    let (filter, params) = scope.filter();
    conn.execute(
        &format!("DELETE FROM teachers WHERE {}", filter),
        params_from_iter(params.iter()),
    )
}

/// Deletes one student with its attendance and exam results, returning what
/// was removed.
pub fn delete_student(conn: &Connection, id: &str) -> rusqlite::Result<Option<StudentDocument>> {
    let tx = conn.unchecked_transaction()?;
    let Some(student) = find_student(&tx, id)? else {
        return Ok(None);
    };
    let record = load_record(&tx, id)?;
    delete_students_in(&tx, &StudentScope::Student(id.to_string()))?;
    tx.commit()?;
    Ok(Some(StudentDocument { student, record }))
}

pub fn delete_students(conn: &Connection, scope: &StudentScope) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let deleted = delete_students_in(&tx, scope)?;
    tx.commit()?;
    Ok(deleted)
}

/// Deletes subjects and pulls their attendance and exam entries from every
/// student.
pub fn delete_subjects(conn: &Connection, scope: &SubjectScope) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let deleted = delete_subjects_in(&tx, scope)?;
    tx.commit()?;
    Ok(deleted)
}

pub fn delete_teachers(conn: &Connection, scope: &TeacherScope) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let deleted = delete_teachers_in(&tx, scope)?;
    tx.commit()?;
    Ok(deleted)
}

/// Deletes classes together with their students, teachers and subjects.
pub fn delete_classes(conn: &Connection, scope: &ClassScope) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let deleted = delete_classes_in(&tx, scope)?;
    tx.commit()?;
    Ok(deleted)
}

fn delete_classes_in(conn: &Connection, scope: &ClassScope) -> rusqlite::Result<usize> {
    let (filter, params) = scope.filter();
    let mut stmt = conn.prepare(&format!("SELECT id FROM sclasses WHERE {}", filter))?;
    let class_ids = stmt
        .query_map(params_from_iter(params.iter()), |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for class_id in &class_ids {
        delete_students_in(conn, &StudentScope::Class(class_id.clone()))?;
        delete_teachers_in(conn, &TeacherScope::Class(class_id.clone()))?;
        delete_subjects_in(conn, &SubjectScope::Class(class_id.clone()))?;
    }
    conn.execute(
        &format!("DELETE FROM sclasses WHERE {}", filter),
        params_from_iter(params.iter()),
    )
}

/// Deletes a school (its admin row) and everything hanging off it.
pub fn delete_school(conn: &Connection, school_id: &str) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    if find_admin(&tx, school_id)?.is_none() {
        return Ok(false);
    }
    delete_classes_in(&tx, &ClassScope::School(school_id.to_string()))?;
    // Rows whose class was already gone still carry the school reference.
    delete_students_in(&tx, &StudentScope::School(school_id.to_string()))?;
    delete_teachers_in(&tx, &TeacherScope::School(school_id.to_string()))?;
    delete_subjects_in(&tx, &SubjectScope::School(school_id.to_string()))?;
    tx.execute("DELETE FROM complains WHERE school_id = ?", [school_id])?;
    delete_notices(&tx, &NoticeScope::School(school_id.to_string()))?;
    tx.execute("DELETE FROM admins WHERE id = ?", [school_id])?;
    tx.commit()?;
    Ok(true)
}
