//! Shared setup for the scenario tests in spec.md §8. Gated behind
//! `DATABASE_URL`: every test calls `connect()` first and returns early (via
//! the `require_db!` macro) when no database is configured, so `cargo test`
//! still passes in an environment with no Postgres available.

use diesel::Connection;
use matchcore_db::PgConnection;
use std::sync::Once;

static LOG_INIT: Once = Once::new();

/// Connects to the database named by `DATABASE_URL` and runs pending
/// migrations. Returns `None` (rather than panicking) when the variable is
/// unset, so these tests are opt-in rather than a hard requirement of
/// `cargo test`.
pub fn connect() -> Option<PgConnection> {
    LOG_INIT.call_once(|| {
        let _ = env_logger::try_init();
    });

    let url = std::env::var("DATABASE_URL").ok()?;
    matchcore_db::migrations::run_migrations().expect("failed to run migrations");
    Some(PgConnection::establish(&url).expect("failed to connect to DATABASE_URL"))
}

pub fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    format!("{nanos:x}")
}
