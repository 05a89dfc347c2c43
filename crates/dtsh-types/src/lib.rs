//! Foundation types for dtsh.
//!
//! This crate holds what every other dtsh crate shares: the error taxonomy
//! and the shell configuration loaded once at startup.

pub mod config;
pub mod error;

pub use config::ShellConfig;
pub use error::{DtshError, Result};
