//! # themelint_core
//!
//! Check engine for themelint.
//!
//! This crate provides:
//! - The check contract (`Check`, `VisitorTable`) and per-check context
//! - The `CheckRunner`, which drives all checks over a document in one walk
//! - The docset catalog checks consult
//! - Configuration loading
//! - Built-in checks
//!
//! ## Example
//!
//! ```rust
//! use themelint_core::{
//!     CheckRegistry, CheckRunner, DocsetSnapshot, LinterConfig, ObjectEntry, SourceFile,
//! };
//!
//! let file = SourceFile::parse(
//!     "file:///theme/sections/main.liquid",
//!     "/theme/sections/main.liquid",
//!     "/theme",
//!     "{{ y }}",
//!     1,
//! )?;
//! let docset = DocsetSnapshot::new(
//!     vec![ObjectEntry::new("product")],
//!     Vec::new(),
//!     Vec::new(),
//!     Default::default(),
//! );
//!
//! let runner = CheckRunner::from_config(&CheckRegistry::builtin(), &LinterConfig::new())?;
//! let report = runner.run(&file, Some(&docset));
//! assert_eq!(report.diagnostics[0].message, "Unknown object 'y' used.");
//! # Ok::<(), themelint_core::LinterError>(())
//! ```

mod check;
pub mod checks;
mod config;
mod context;
pub mod dependencies;
mod diagnostic;
mod docset;
mod error;
mod registry;
mod runner;
mod source;

#[cfg(test)]
mod test_utils;

pub use check::{
    Check, CheckMeta, CheckVisitor, EndHandler, HandlerResult, NodeHandler, SchemaProperty,
    SettingKind, VisitorTable,
};
pub use config::{CONFIG_FILE_NAME, CheckOption, IgnoreMatcher, LinterConfig};
pub use context::CheckContext;
pub use dependencies::{DependencyCollector, DerivedNode, collect_dependencies};
pub use diagnostic::{Diagnostic, Severity};
pub use docset::{
    DocsetSnapshot, FilterEntry, FilterParameter, ObjectAccess, ObjectEntry, TagEntry,
    ThemeDocset,
};
pub use error::{CheckError, DocsetError, LinterError};
pub use registry::{ActiveCheck, CheckRegistry};
pub use runner::{CheckFailure, CheckRunner, RunReport};
pub use source::{SourceCodeType, SourceFile};
