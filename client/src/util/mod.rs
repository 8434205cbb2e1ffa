//! Formatting and validation helpers shared by pages and the CLI.

pub mod format;
pub mod validate;
