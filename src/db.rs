use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database {}", path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // The admin row doubles as the school: every other table references it.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS admins(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            school_name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sclasses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES admins(id),
            UNIQUE(school_id, name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sclasses_school ON sclasses(school_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            sub_name TEXT NOT NULL,
            sub_code TEXT NOT NULL,
            sessions INTEGER NOT NULL,
            class_id TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES sclasses(id),
            FOREIGN KEY(school_id) REFERENCES admins(id),
            UNIQUE(school_id, sub_code)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_class ON subjects(class_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_school ON subjects(school_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            roll_num INTEGER NOT NULL,
            password TEXT NOT NULL,
            class_id TEXT NOT NULL,
            school_id TEXT NOT NULL,
            updated_at TEXT,
            FOREIGN KEY(class_id) REFERENCES sclasses(id),
            FOREIGN KEY(school_id) REFERENCES admins(id),
            UNIQUE(school_id, class_id, roll_num)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_school ON students(school_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_login ON students(roll_num, name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_attendance(
            student_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            PRIMARY KEY(student_id, subject_id, date),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_attendance_subject ON student_attendance(subject_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exam_results(
            student_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            marks_obtained REAL NOT NULL,
            PRIMARY KEY(student_id, subject_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exam_results_subject ON exam_results(subject_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            school_id TEXT NOT NULL,
            teach_class_id TEXT NOT NULL,
            teach_subject_id TEXT,
            FOREIGN KEY(school_id) REFERENCES admins(id),
            FOREIGN KEY(teach_class_id) REFERENCES sclasses(id),
            FOREIGN KEY(teach_subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_school ON teachers(school_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_class ON teachers(teach_class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notices(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            details TEXT NOT NULL,
            date TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES admins(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notices_school ON notices(school_id)",
        [],
    )?;

    // Complaints are filed by students.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS complains(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            complaint TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES students(id),
            FOREIGN KEY(school_id) REFERENCES admins(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_complains_school ON complains(school_id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = open_in_memory().expect("open");
        init_schema(&conn).expect("second init");
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('admins', 'sclasses', 'subjects', 'students', 'student_attendance', 'exam_results',
                 'teachers', 'notices', 'complains')",
                [],
                |r| r.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 9);
    }
}
