pub mod sanitize;

pub use sanitize::{reject_unsanitized, sanitize_request};
