//! Parser services - read source text into [`crate::source::SourceTree`]s.

#[cfg(feature = "tree-sitter")]
pub mod grammar;

#[cfg(feature = "tree-sitter")]
pub use grammar::TreeSitterParser;

#[cfg(feature = "read-python")]
pub use grammar::python_parser;
