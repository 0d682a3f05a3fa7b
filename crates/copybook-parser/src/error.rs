//! Error and diagnostic system for the copybook parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, multiple source
//! locations, and help text. Multiple diagnostics are wrapped in [`ParseError`]
//! when compilation fails. Warnings never fail compilation; they are returned
//! alongside the produced layouts.
//!
//! # Example
//!
//! ```
//! # use copybook_parser::error::{Diagnostic, ErrorCode};
//! # use copybook_parser::Span;
//!
//! let span = Span::new(100..120);
//! let target_span = Span::new(50..70);
//!
//! let diag = Diagnostic::warning("REDEFINES level mismatch for `ALT-DATA`")
//!     .with_code(ErrorCode::E301)
//!     .with_label(span, "level 10 here")
//!     .with_secondary_label(target_span, "target declared at level 05")
//!     .with_help("a redefining entry should use the level of its target");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
