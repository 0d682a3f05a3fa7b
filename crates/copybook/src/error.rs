//! Error types for copybook compilation.
//!
//! This module provides the main error type [`CopybookError`] which wraps
//! the conditions that stop a copybook from compiling.

use std::io;

use thiserror::Error;

use copybook_parser::{ConfigError, error::ParseError};

/// The main error type for copybook compilation.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic collected during compilation
/// together with the copybook source, so a report handler can render each
/// finding against the lines it refers to.
#[derive(Debug, Error)]
pub enum CopybookError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid rules: {0}")]
    Config(#[from] ConfigError),

    #[error("{err}")]
    Parse { err: ParseError, src: String },
}

impl CopybookError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
