//! Output writers - render a target tree as source text.

pub mod csharp;

pub use csharp::{CSHARP_WRITER, CSharpWriter, CSharpWriterImpl};

use crate::target::TargetFile;

/// A writer renders a converted tree in its target language.
pub trait Writer: Send + Sync {
    /// Language identifier (e.g., "csharp").
    fn language(&self) -> &'static str;

    /// File extension for output (e.g., "cs").
    fn extension(&self) -> &'static str;

    fn write(&self, file: &TargetFile) -> String;
}
