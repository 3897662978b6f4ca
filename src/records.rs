use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }
}

/// Reduces a client supplied date to its calendar day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (the day as written in the
/// timestamp's own offset) and naive `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub subject_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExamEntry {
    pub subject_id: String,
    pub marks_obtained: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceChange {
    /// The (subject, day) pair was already marked; only the status changed.
    Updated,
    Appended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamChange {
    Updated,
    Inserted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Maximum attendance limit reached")]
    SessionLimitExceeded { subject_id: String, sessions: u32 },
}

/// One student's attendance and exam results, keyed so that the
/// one-entry-per-(subject, day) and one-result-per-subject rules hold by
/// construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRecord {
    attendance: BTreeMap<String, BTreeMap<NaiveDate, AttendanceStatus>>,
    exam_results: BTreeMap<String, f64>,
}

impl StudentRecord {
    pub fn from_entries<A, E>(attendance: A, exams: E) -> Self
    where
        A: IntoIterator<Item = AttendanceEntry>,
        E: IntoIterator<Item = ExamEntry>,
    {
        let mut record = Self::default();
        for a in attendance {
            record
                .attendance
                .entry(a.subject_id)
                .or_default()
                .insert(a.date, a.status);
        }
        for e in exams {
            record.exam_results.insert(e.subject_id, e.marks_obtained);
        }
        record
    }

    pub fn attendance_count(&self, subject_id: &str) -> usize {
        self.attendance.get(subject_id).map_or(0, |days| days.len())
    }

    pub fn attendance_len(&self) -> usize {
        self.attendance.values().map(|days| days.len()).sum()
    }

    pub fn status_on(&self, subject_id: &str, date: NaiveDate) -> Option<AttendanceStatus> {
        self.attendance
            .get(subject_id)
            .and_then(|days| days.get(&date))
            .copied()
    }

    pub fn marks_for(&self, subject_id: &str) -> Option<f64> {
        self.exam_results.get(subject_id).copied()
    }

    /// Marks `subject_id` on `date`. Re-marking an existing day overwrites the
    /// status and never counts against `sessions`.
    pub fn record_attendance(
        &mut self,
        subject_id: &str,
        sessions: u32,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceChange, RecordError> {
        let days = self.attendance.entry(subject_id.to_string()).or_default();
        if let Some(existing) = days.get_mut(&date) {
            *existing = status;
            return Ok(AttendanceChange::Updated);
        }
        if days.len() >= sessions as usize {
            if days.is_empty() {
                self.attendance.remove(subject_id);
            }
            return Err(RecordError::SessionLimitExceeded {
                subject_id: subject_id.to_string(),
                sessions,
            });
        }
        days.insert(date, status);
        Ok(AttendanceChange::Appended)
    }

    pub fn record_exam_result(&mut self, subject_id: &str, marks_obtained: f64) -> ExamChange {
        match self
            .exam_results
            .insert(subject_id.to_string(), marks_obtained)
        {
            Some(_) => ExamChange::Updated,
            None => ExamChange::Inserted,
        }
    }

    /// Drops attendance for one subject, or all of it. Returns entries removed.
    pub fn clear_attendance(&mut self, subject_id: Option<&str>) -> usize {
        match subject_id {
            Some(sid) => self.attendance.remove(sid).map_or(0, |days| days.len()),
            None => {
                let removed = self.attendance_len();
                self.attendance.clear();
                removed
            }
        }
    }

    /// Attendance flattened chronologically, ties broken by subject id.
    pub fn attendance_entries(&self) -> Vec<AttendanceEntry> {
        let mut out: Vec<AttendanceEntry> = self
            .attendance
            .iter()
            .flat_map(|(sid, days)| {
                days.iter().map(move |(date, status)| AttendanceEntry {
                    subject_id: sid.clone(),
                    date: *date,
                    status: *status,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.subject_id.cmp(&b.subject_id))
        });
        out
    }

    pub fn exam_entries(&self) -> Vec<ExamEntry> {
        self.exam_results
            .iter()
            .map(|(sid, marks)| ExamEntry {
                subject_id: sid.clone(),
                marks_obtained: *marks,
            })
            .collect()
    }

    /// Per-subject attendance totals for every subject the student has at
    /// least one entry for. `sessions` maps subject id to its held sessions.
    pub fn attendance_summary(&self, sessions: &HashMap<String, u32>) -> Vec<SubjectAttendance> {
        self.attendance
            .iter()
            .filter(|(_, days)| !days.is_empty())
            .map(|(sid, days)| {
                let present = days
                    .values()
                    .filter(|s| **s == AttendanceStatus::Present)
                    .count();
                let held = sessions.get(sid).copied().unwrap_or(0);
                SubjectAttendance {
                    subject_id: sid.clone(),
                    sessions: held,
                    present,
                    absent: days.len() - present,
                    percentage: attendance_percentage(present, held),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectAttendance {
    pub subject_id: String,
    pub sessions: u32,
    pub present: usize,
    pub absent: usize,
    pub percentage: f64,
}

/// Present share of held sessions, two decimals. Zero sessions yields 0.
pub fn attendance_percentage(present: usize, sessions: u32) -> f64 {
    if sessions == 0 {
        return 0.0;
    }
    let raw = 100.0 * present as f64 / sessions as f64;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).expect("valid day")
    }

    #[test]
    fn session_cap_rejects_extra_day_and_keeps_count() {
        let mut rec = StudentRecord::default();
        let sessions = 3;
        for d in 1..=3 {
            rec.record_attendance("math", sessions, day(d), AttendanceStatus::Present)
                .expect("within cap");
        }
        let res = rec.record_attendance("math", sessions, day(4), AttendanceStatus::Present);
        assert_eq!(
            res,
            Err(RecordError::SessionLimitExceeded {
                subject_id: "math".to_string(),
                sessions: 3
            })
        );
        assert_eq!(rec.attendance_count("math"), 3);
    }

    #[test]
    fn remarking_same_day_overwrites_status() {
        let mut rec = StudentRecord::default();
        rec.record_attendance("math", 5, day(1), AttendanceStatus::Present)
            .expect("first mark");
        let change = rec
            .record_attendance("math", 5, day(1), AttendanceStatus::Absent)
            .expect("remark");
        assert_eq!(change, AttendanceChange::Updated);
        assert_eq!(rec.attendance_len(), 1);
        assert_eq!(rec.status_on("math", day(1)), Some(AttendanceStatus::Absent));
    }

    #[test]
    fn remark_at_cap_is_still_allowed() {
        let mut rec = StudentRecord::default();
        rec.record_attendance("math", 2, day(1), AttendanceStatus::Present)
            .expect("day 1");
        rec.record_attendance("math", 2, day(2), AttendanceStatus::Absent)
            .expect("day 2");
        assert!(rec
            .record_attendance("math", 2, day(3), AttendanceStatus::Present)
            .is_err());
        assert_eq!(rec.attendance_count("math"), 2);

        rec.record_attendance("math", 2, day(1), AttendanceStatus::Absent)
            .expect("re-mark day 1");
        assert_eq!(rec.attendance_count("math"), 2);
        assert_eq!(rec.status_on("math", day(1)), Some(AttendanceStatus::Absent));
    }

    #[test]
    fn zero_sessions_rejects_without_leaving_empty_subject() {
        let mut rec = StudentRecord::default();
        assert!(rec
            .record_attendance("art", 0, day(1), AttendanceStatus::Present)
            .is_err());
        assert!(rec.attendance_summary(&HashMap::new()).is_empty());
        assert_eq!(rec.attendance_len(), 0);
    }

    #[test]
    fn cap_is_per_subject() {
        let mut rec = StudentRecord::default();
        rec.record_attendance("math", 1, day(1), AttendanceStatus::Present)
            .expect("math");
        rec.record_attendance("bio", 1, day(1), AttendanceStatus::Present)
            .expect("bio same day");
        assert_eq!(rec.attendance_len(), 2);
    }

    #[test]
    fn exam_result_upserts() {
        let mut rec = StudentRecord::default();
        assert_eq!(rec.record_exam_result("math", 40.0), ExamChange::Inserted);
        assert_eq!(rec.record_exam_result("math", 72.5), ExamChange::Updated);
        let entries = rec.exam_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].marks_obtained, 72.5);
    }

    #[test]
    fn clear_one_subject_leaves_others() {
        let mut rec = StudentRecord::default();
        rec.record_attendance("math", 5, day(1), AttendanceStatus::Present)
            .expect("math 1");
        rec.record_attendance("math", 5, day(2), AttendanceStatus::Present)
            .expect("math 2");
        rec.record_attendance("bio", 5, day(1), AttendanceStatus::Absent)
            .expect("bio 1");

        assert_eq!(rec.clear_attendance(Some("math")), 2);
        assert_eq!(rec.attendance_count("math"), 0);
        assert_eq!(rec.attendance_count("bio"), 1);

        assert_eq!(rec.clear_attendance(None), 1);
        assert_eq!(rec.attendance_len(), 0);
    }

    #[test]
    fn entries_are_chronological() {
        let rec = StudentRecord::from_entries(
            vec![
                AttendanceEntry {
                    subject_id: "math".into(),
                    date: day(9),
                    status: AttendanceStatus::Present,
                },
                AttendanceEntry {
                    subject_id: "bio".into(),
                    date: day(9),
                    status: AttendanceStatus::Absent,
                },
                AttendanceEntry {
                    subject_id: "math".into(),
                    date: day(2),
                    status: AttendanceStatus::Absent,
                },
            ],
            Vec::new(),
        );
        let order: Vec<(NaiveDate, String)> = rec
            .attendance_entries()
            .into_iter()
            .map(|e| (e.date, e.subject_id))
            .collect();
        assert_eq!(
            order,
            vec![
                (day(2), "math".to_string()),
                (day(9), "bio".to_string()),
                (day(9), "math".to_string())
            ]
        );
    }

    #[test]
    fn calendar_day_ignores_time_of_day() {
        assert_eq!(parse_calendar_day("2024-03-05"), Some(day(5)));
        assert_eq!(parse_calendar_day("2024-03-05T08:15:00Z"), Some(day(5)));
        assert_eq!(parse_calendar_day("2024-03-05T23:59:59.250+05:30"), Some(day(5)));
        assert_eq!(parse_calendar_day("2024-03-05T10:00:00"), Some(day(5)));
        assert_eq!(parse_calendar_day("05/03/2024"), None);
    }

    #[test]
    fn summary_counts_present_against_sessions() {
        let mut rec = StudentRecord::default();
        rec.record_attendance("math", 3, day(1), AttendanceStatus::Present)
            .expect("1");
        rec.record_attendance("math", 3, day(2), AttendanceStatus::Absent)
            .expect("2");
        let sessions = HashMap::from([("math".to_string(), 3u32)]);
        let summary = rec.attendance_summary(&sessions);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].present, 1);
        assert_eq!(summary[0].absent, 1);
        assert_eq!(summary[0].percentage, 33.33);
        assert_eq!(attendance_percentage(4, 0), 0.0);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(AttendanceStatus::parse("present"), Some(AttendanceStatus::Present));
        assert_eq!(AttendanceStatus::parse(" ABSENT "), Some(AttendanceStatus::Absent));
        assert_eq!(AttendanceStatus::parse("late"), None);
    }
}
