//! The request object a front end fills in for one send.

mod model;
mod validation;

pub use model::SendRequest;
pub use validation::{ValidationError, ValidationResult, validate_request};
