pub mod time;
pub mod validation;

pub use validation::ValidatedJson;
