pub mod gate;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
mod schema;
mod url;
pub mod views;

pub use schema::{production_schema, staging_schema};

pub use url::postgres_url_from_environment;

pub use pool::ConnectionPool;

pub use diesel::{Connection, PgConnection};

/// Every query helper in [`queries`] returns this. Diesel's own error type
/// already distinguishes not-found, constraint violations, and connection
/// failures, so there is no value in wrapping it further -- callers that need
/// domain-specific context attach it at the call site instead.
pub type QueryError = diesel::result::Error;
pub type QueryResult<T> = Result<T, QueryError>;
