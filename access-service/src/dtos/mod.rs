//! Request/response types for the REST surface.

pub mod accesses;
pub mod resources;
pub mod users;
