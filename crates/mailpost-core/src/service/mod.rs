//! Email services: the SMTP Transport Client and the send entry points.

mod send;
mod transport;

pub use send::{blocking, send, send_email};
pub use transport::{DEFAULT_CLIENT_NAME, SmtpTransport, Transport};
