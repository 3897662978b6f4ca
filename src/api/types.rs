use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::error::HandlerErr;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(conn: Connection, bcrypt_cost: u32) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            bcrypt_cost,
        }
    }

    /// Runs `f` against the connection on the blocking pool. Requests are
    /// serialized on the connection, so each read-modify-write of a student
    /// sees the previous one's result.
    pub async fn run<T, F>(&self, f: F) -> Result<T, HandlerErr>
    where
        F: FnOnce(&Connection) -> Result<T, HandlerErr> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| HandlerErr::new("db_lock_poisoned", "database lock poisoned"))?;
            f(&conn)
        })
        .await
        .map_err(|e| HandlerErr::new("task_failed", e.to_string()))?
    }
}
