//! HTTP handlers translating the REST surface into store operations.

pub mod accesses;
pub mod resources;
pub mod users;
