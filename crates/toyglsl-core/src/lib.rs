#![forbid(unsafe_code)]

//! toyglsl contract vocabulary.
//!
//! This crate is **contract-only**: dialect descriptors, analysis/result value types, errors and
//! configuration. It contains no pattern matching or rewriting; that lives in
//! `toyglsl-transpiler`.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod target;

pub use analysis::{ShaderAnalysis, ShaderConversionResult};
pub use config::{load_typed_json, TranspilerConfig};
pub use error::ToyglslError;
pub use target::{Precision, ShaderTarget, TargetDescriptor};
