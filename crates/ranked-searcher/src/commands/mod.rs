//! Command implementations.
//!
//! Each command returns a serializable output with a text rendering, so
//! `main` can print either the text or a JSON envelope.

pub mod formula;
pub mod install;
pub mod package;
pub mod search;
pub mod smoke;
pub mod version;
