use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "schoold", version, about = "School records HTTP service")]
pub struct Config {
    #[arg(long, env, default_value_t = 5000)]
    pub port: u16,

    #[arg(long, env, default_value = "school.sqlite3")]
    pub database_path: PathBuf,

    /// Default tracing filter; `RUST_LOG` wins when set.
    #[arg(long, env, default_value = "info")]
    pub log_level: String,

    /// bcrypt work factor, 4 through 31.
    #[arg(long, env, default_value_t = 10, value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    #[arg(long, env)]
    pub guest_admin_email: Option<String>,

    #[arg(long, env)]
    pub guest_admin_password: Option<String>,

    #[arg(long, env)]
    pub guest_school_name: Option<String>,
}

/// Credentials for the visitor account, present only when all three
/// settings are given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestAdmin {
    pub email: String,
    pub password: String,
    pub school_name: String,
}

impl Config {
    pub fn guest_admin(&self) -> Option<GuestAdmin> {
        Some(GuestAdmin {
            email: self.guest_admin_email.clone()?,
            password: self.guest_admin_password.clone()?,
            school_name: self.guest_school_name.clone()?,
        })
    }
}
