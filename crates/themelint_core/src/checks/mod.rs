//! Built-in checks.

mod missing_template;
mod undefined_object;
mod unknown_filter;

pub use missing_template::MissingTemplate;
pub use undefined_object::{Scope, ScopeTable, UndefinedObject};
pub use unknown_filter::UnknownFilter;
