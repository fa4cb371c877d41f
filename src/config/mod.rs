//! Configuration for stamp.
//!
//! Only user-wide settings exist: default answers and trusted template
//! locations, stored in [`GlobalConfig`]. Template-specific behaviour is
//! declared by each template's schema (see [`crate::schema`]).

mod global;

pub use global::GlobalConfig;
