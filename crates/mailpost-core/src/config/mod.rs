//! SMTP server settings and credentials.

mod model;
mod provider;

pub use model::{Credentials, DEFAULT_HOST, DEFAULT_PORT, Security, ServerConfig};
pub use provider::Provider;
