//! Domain models for access-service.

mod access;
mod resource;
mod user;

pub use access::{Access, AccessFilter, AccessStatus, CreateAccess, TransitionError};
pub use resource::{CreateResource, Resource};
pub use user::{CreateUser, User};
