//! # Test-description compiler
//!
//! A library for compiling annotation-enriched test descriptions into the
//! normalized instruction units consumed by a downstream validation-test
//! runner. A test description is a YAML document carrying a plan plus
//! `__test` assertion markers and `__yaml` embedded sub-documents; the
//! compiler strips the markers, resolves their positions against a message
//! schema, and emits one JSON test unit (plus side files for the embedded
//! documents).
//!
//! ## Example
//!
//! ```rust,no_run
//! use testplan_compiler::{compiler, schema};
//! use std::path::Path;
//!
//! let root = schema::MessageSchema::from_file(Path::new("plan-schema.yaml")).unwrap();
//! let result = compiler::compile_suite(
//!     Path::new("tests/suite"),
//!     Some(&root as &dyn schema::MessageNode),
//!     &schema::JsonPlanSerializer,
//!     false,
//! );
//! println!("{}", testplan_compiler::output::format_batch_result(
//!     &result,
//!     testplan_compiler::output::OutputFormat::Text,
//! ));
//! ```

pub mod compiler;
pub mod error;
pub mod glob;
pub mod instruction;
pub mod output;
pub mod path;
pub mod resolve;
pub mod schema;
pub mod strip;
pub mod unit;

pub use compiler::{compile_document, compile_file, compile_suite, BatchResult, CompiledTest};
pub use error::{Error, Result};
pub use output::{format_batch_result, OutputFormat};
pub use path::{PathElement, PathSegment};
pub use resolve::resolve_path;
pub use schema::{JsonPlanSerializer, MessageNode, MessageSchema, PlanSerializer};
pub use strip::{strip_document, Event};
pub use unit::{DiagOverride, Instruction, Severity, TestUnit};
