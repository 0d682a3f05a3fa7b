//! # Copybook Parser
//!
//! Grammar, record classification and storage computation for COBOL
//! copybooks. This crate turns copybook source lines into placed
//! [`Field`](copybook_core::field::Field) arenas, one per record type:
//!
//! 1. **Interpret** - Validate the rule configuration ([`interpret`])
//! 2. **Classify** - Group lines by record type ([`RecordClassifier`])
//! 3. **Scan** - Parse data description entries ([`grammar`])
//! 4. **Place** - Build the hierarchy and byte positions ([`HierarchyBuilder`])
//!
//! ## Usage
//!
//! ```
//! # use copybook_core::config::RulesConfig;
//! # use copybook_parser::{HierarchyBuilder, RecordClassifier, Source, interpret};
//! let rules = interpret(&RulesConfig::default()).expect("default rules are valid");
//! let source = Source::new(&["01 REC-A.", "   05 FIELD-A PIC X(5).", "   05 FIELD-B PIC 9(2)."]);
//!
//! let classified = RecordClassifier::new(rules.strategy(), rules.fallback()).classify(source.lines());
//! let lines = &classified.records()["DATA"];
//! let record = HierarchyBuilder::new(&rules).build(lines.iter().copied());
//!
//! assert_eq!(record.fields().len(), 3);
//! assert_eq!(record.record_end(), 7);
//! ```

pub mod classify;
pub mod error;
pub mod grammar;
pub mod hierarchy;
pub mod interpret;
pub mod picture;
mod source;
mod span;
pub mod storage;

pub use classify::{ClassificationResult, ClassificationStrategy, RecordClassifier};
pub use hierarchy::{BuiltRecord, HierarchyBuilder};
pub use interpret::{ConfigError, Rules, interpret, validate};
pub use source::{Source, SourceLine};
pub use span::Span;
