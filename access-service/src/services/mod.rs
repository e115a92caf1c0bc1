//! Service layer for access-service.

mod database;

pub use database::Database;
