// Template engine: variable store, placeholder scanning, path resolution, substitution.
// Everything here is pure and synchronous.

pub mod path_resolver;
pub mod scanner;
pub mod substitution;
pub mod variables;

pub use scanner::Grammar;
pub use substitution::{substitute_with_data, substitute_with_variables, TemplateError};
pub use variables::{Variable, VariableError, VariableStore};
