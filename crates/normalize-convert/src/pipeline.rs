//! The conversion pipeline: an ordered list of named passes run per file.
//!
//! ```text
//! convert (isolated, per unit) -> carry (file trivia) -> format -> repair
//! ```
//!
//! Files are independent and run on the rayon pool when
//! `[run] parallel` is set. Within a file, top-level units convert in order
//! and cancellation is checked between them. Repair waits for the whole
//! file to be produced.

use crate::config::ConvertOptions;
use crate::context::ConvertContext;
use crate::diagnostics::{DiagnosticMarker, UnitFailure};
use crate::error::RunError;
use crate::format::reattach_formatting;
use crate::output::Writer;
use crate::repair::{Chained, DeclaredSymbols, RepairReport, repair_call_arguments};
use crate::rules::RuleTable;
use crate::source::{SourceParser, SourceTree};
use crate::symbols::SymbolResolver;
use crate::target::{Member, TargetFile};
use crate::trivia::SiblingList;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info_span};

/// Passes in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Convert,
    Carry,
    Format,
    Repair,
}

impl Pass {
    pub const ALL: [Pass; 4] = [Pass::Convert, Pass::Carry, Pass::Format, Pass::Repair];

    pub fn name(self) -> &'static str {
        match self {
            Pass::Convert => "convert",
            Pass::Carry => "carry",
            Pass::Format => "format",
            Pass::Repair => "repair",
        }
    }
}

/// Cooperative cancellation shared by every file of a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Output of converting one file.
#[derive(Debug, Clone)]
pub struct FileConversion {
    pub file: TargetFile,
    /// Downgraded nodes, in conversion order.
    pub markers: Vec<DiagnosticMarker>,
    /// Declaring units that hit a unit-fatal error.
    pub failures: Vec<UnitFailure>,
    /// `None` when repair is disabled.
    pub repair: Option<RepairReport>,
    /// False when some source formatting could not be carried over.
    pub formatting_complete: bool,
}

impl FileConversion {
    pub fn render(&self, writer: &dyn Writer) -> String {
        writer.write(&self.file)
    }
}

/// A source file to parse and convert.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub result: Result<FileConversion, RunError>,
}

pub struct Pipeline<'a> {
    rules: &'a dyn RuleTable,
    resolver: Option<&'a dyn SymbolResolver>,
    options: ConvertOptions,
    cancel: CancellationToken,
}

impl<'a> Pipeline<'a> {
    pub fn new(rules: &'a dyn RuleTable) -> Self {
        Self {
            rules,
            resolver: None,
            options: ConvertOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// External symbol-resolution service, consulted alongside the
    /// file's own declarations.
    pub fn with_resolver(mut self, resolver: &'a dyn SymbolResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Run every pass over one source tree.
    pub fn convert_tree(&self, tree: &SourceTree) -> Result<FileConversion, RunError> {
        let _file =
            info_span!("pipeline.file", root = %tree.root.kind, len = tree.text.len()).entered();

        let data_flow = if self.options.synthesis.use_data_flow {
            self.resolver.and_then(|r| r.data_flow())
        } else {
            None
        };
        let mut cx = ConvertContext::new(tree, self.rules, &self.options, data_flow);

        let members = {
            let _pass = info_span!("pipeline.pass", pass = Pass::Convert.name()).entered();
            let mut list: SiblingList<Member> = SiblingList::new();
            for unit in tree.root.items() {
                if self.cancel.is_cancelled() {
                    debug!(unit = %unit.kind, span = %unit.span, "cancelled before unit");
                    return Err(RunError::Cancelled);
                }
                let produced = cx.member(unit);
                list.push(produced, &mut cx.carrier);
            }
            list.finish(&mut cx.carrier)
        };

        let (mut file, markers, failures, formatting_complete) = {
            let _pass = info_span!("pipeline.pass", pass = Pass::Carry.name()).entered();
            cx.finish(members)
        };

        {
            let _pass = info_span!("pipeline.pass", pass = Pass::Format.name()).entered();
            reattach_formatting(&mut file, &self.options.format);
        }

        let repair = self.options.repair.enabled.then(|| {
            let _pass = info_span!("pipeline.pass", pass = Pass::Repair.name()).entered();
            let bindings = match self.resolver {
                Some(external) => Chained::new(&DeclaredSymbols, external).resolve_symbols(&file),
                None => DeclaredSymbols.resolve_symbols(&file),
            };
            let report = repair_call_arguments(&mut file, &bindings);
            debug!(
                rewritten = report.rewritten,
                unresolved = report.unresolved.len(),
                ambiguous = report.ambiguous,
                "repair done"
            );
            report
        });

        debug!(
            markers = markers.len(),
            failures = failures.len(),
            formatting_complete,
            "file converted"
        );
        Ok(FileConversion {
            file,
            markers,
            failures,
            repair,
            formatting_complete,
        })
    }

    /// Convert independent trees; results keep input order.
    pub fn convert_trees(&self, trees: &[SourceTree]) -> Vec<Result<FileConversion, RunError>> {
        if self.options.run.parallel {
            trees.par_iter().map(|tree| self.convert_tree(tree)).collect()
        } else {
            trees.iter().map(|tree| self.convert_tree(tree)).collect()
        }
    }

    /// Parse and convert independent files; results keep input order.
    pub fn convert_sources(
        &self,
        parser: &dyn SourceParser,
        sources: &[SourceFile],
    ) -> Vec<FileResult> {
        let run = |source: &SourceFile| FileResult {
            path: source.path.clone(),
            result: self.convert_source(parser, source),
        };
        if self.options.run.parallel {
            sources.par_iter().map(run).collect()
        } else {
            sources.iter().map(run).collect()
        }
    }

    fn convert_source(
        &self,
        parser: &dyn SourceParser,
        source: &SourceFile,
    ) -> Result<FileConversion, RunError> {
        if self.cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        let _span = info_span!(
            "pipeline.source",
            path = %source.path.display(),
            language = parser.language()
        )
        .entered();
        let tree = parser.parse(&source.text)?;
        self.convert_tree(&tree)
    }
}
