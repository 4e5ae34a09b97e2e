pub mod production_schema;
pub mod staging_schema;

pub use production_schema::prod;
pub use staging_schema::staging;
