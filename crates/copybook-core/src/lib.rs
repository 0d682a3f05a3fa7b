//! Copybook Core Types and Definitions
//!
//! This crate provides the foundational types shared by the copybook layout
//! compiler. It includes:
//!
//! - **Fields**: The field arena entries produced for each data description
//!   entry ([`field::Field`], [`field::FieldIndex`])
//! - **Encodings**: Storage encodings selected by USAGE clauses ([`field::Encoding`])
//! - **Layouts**: Per-record-type layouts with aggregate statistics ([`layout::RecordLayout`])
//! - **Config**: The deserializable rule set driving classification and layout
//!   generation ([`config::RulesConfig`])

pub mod config;
pub mod field;
pub mod layout;
