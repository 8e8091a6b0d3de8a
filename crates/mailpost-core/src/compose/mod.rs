//! Message Composer: raw fields in, a multipart message out.

mod message;
mod template;

pub use message::{AttachmentFile, EmailMessage, compose};
pub use template::html_body;
