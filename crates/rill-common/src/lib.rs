// Rill common -- span, token, and error types shared by every phase.

pub mod error;
pub mod span;
pub mod token;
