//! Core types for stamp
//!
//! The error taxonomy shared by every module lives here:
//! - [`StampError`] - Enumerated failure kinds of a render
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error chain into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, StampError, user_friendly_error};
