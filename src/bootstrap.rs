use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::GuestAdmin;
use crate::store;

/// Creates the visitor admin account if it does not exist yet. Returns
/// whether a row was inserted.
pub fn seed_guest_admin(conn: &Connection, guest: &GuestAdmin, bcrypt_cost: u32) -> Result<bool> {
    let existing = store::find_admin_by_email(conn, &guest.email)
        .context("failed to check existing guest admin")?;
    if existing.is_some() {
        tracing::info!(email = %guest.email, "guest admin already exists, skipping");
        return Ok(false);
    }
    let school_taken = conn
        .query_row(
            "SELECT 1 FROM admins WHERE school_name = ?",
            [&guest.school_name],
            |r| r.get::<_, i64>(0),
        )
        .optional()
        .context("failed to check guest school name")?
        .is_some();
    if school_taken {
        tracing::warn!(school = %guest.school_name, "guest school name taken by another admin, skipping");
        return Ok(false);
    }

    let hashed = bcrypt::hash(&guest.password, bcrypt_cost).context("failed to hash guest password")?;
    conn.execute(
        "INSERT INTO admins(id, name, email, password, school_name) VALUES(?, ?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            "Guest",
            &guest.email,
            &hashed,
            &guest.school_name,
        ),
    )
    .context("failed to insert guest admin")?;
    tracing::info!(email = %guest.email, school = %guest.school_name, "guest admin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn guest() -> GuestAdmin {
        GuestAdmin {
            email: "guest@example.com".into(),
            password: "visitor".into(),
            school_name: "Demo School".into(),
        }
    }

    #[test]
    fn seeding_runs_once() {
        let conn = open_in_memory().expect("db");
        assert!(seed_guest_admin(&conn, &guest(), 4).expect("first"));
        assert!(!seed_guest_admin(&conn, &guest(), 4).expect("second"));

        let admin = store::find_admin_by_email(&conn, "guest@example.com")
            .expect("query")
            .expect("seeded");
        assert!(bcrypt::verify("visitor", &admin.password).expect("verify"));
    }
}
