pub mod admins;
pub mod attendance;
pub mod classes;
pub mod core;
pub mod exams;
pub mod notices;
pub mod students;
pub mod subjects;
pub mod teachers;
