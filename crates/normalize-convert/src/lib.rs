//! Resilient, provenance-preserving tree conversion between language syntaxes.
//!
//! `normalize-convert` drives a caller-supplied [`RuleTable`] over a parsed
//! source tree and assembles a target tree that keeps the source's comments
//! and blank lines, records where every node came from, and survives
//! constructs the rule table cannot handle.
//!
//! # Architecture
//!
//! ```text
//! SourceTree ─> convert ─────────> carry ──> format ──> repair ──> TargetFile
//!               (isolate + trivia    (file     (blank     (by-ref
//!                + synthesis pools    trivia)   lines)     markers)
//!                + finalize/type)
//! ```
//!
//! - Every member and statement conversion is isolated: a failure becomes a
//!   placeholder carrying a [`DiagnosticMarker`] comment, and siblings keep
//!   converting.
//! - Rules may hoist temporaries ([`ConvertContext::add_temporary`]) and
//!   member initializers ([`ConvertContext::add_initializer`]); the latter
//!   are spliced into constructors once the owning type is complete.
//! - After the whole file is produced, call sites are repaired against
//!   symbol bindings so by-reference arguments carry their marker.
//!
//! # Example
//!
//! ```ignore
//! use normalize_convert::{CSharpWriter, Pipeline, input};
//!
//! let tree = input::python_parser().parse(source)?;
//! let converted = Pipeline::new(&MyRules).convert_tree(&tree)?;
//! println!("{}", CSharpWriter::emit(&converted.file));
//! ```

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod finalize;
pub mod format;
pub mod input;
pub mod isolate;
pub mod output;
pub mod pipeline;
pub mod repair;
pub mod rules;
pub mod source;
pub mod symbols;
pub mod synthesis;
pub mod target;
pub mod trivia;

// Re-exports: core types
pub use context::ConvertContext;
pub use diagnostics::{DiagnosticMarker, NodeCategory, UnitFailure};
pub use error::{ConfigError, ConvertError, ParseError, RunError};
pub use isolate::ConversionOutcome;
pub use rules::RuleTable;
pub use source::{Placement, Role, SourceNode, SourceParser, SourceTree, Span, Trivia};
pub use target::{StructureEq, TargetFile};

// Re-exports: passes
pub use config::ConvertOptions;
pub use finalize::finalize_type;
pub use format::reattach_formatting;
pub use pipeline::{CancellationToken, FileConversion, FileResult, Pass, Pipeline, SourceFile};
pub use repair::{Chained, DeclaredSymbols, RepairReport, repair_call_arguments};
pub use symbols::{Bindings, DataFlow, DataFlowAnalysis, Signature, SymbolResolver};

// Re-exports: writers
pub use output::{CSHARP_WRITER, CSharpWriter, Writer};

#[cfg(feature = "tree-sitter")]
pub use input::TreeSitterParser;
