//! Conversion context: the state of one in-flight file conversion and the
//! callbacks the rule table recurses through.

use crate::config::ConvertOptions;
use crate::diagnostics::{DiagnosticMarker, NodeCategory, UnitFailure};
use crate::error::ConvertError;
use crate::finalize::finalize_type;
use crate::rules::RuleTable;
use crate::source::{SourceNode, SourceTree, Span};
use crate::symbols::DataFlowAnalysis;
use crate::synthesis::{
    AdditionalInitializers, AdditionalLocals, InitializersMark, LocalsMark, Temporary,
};
use crate::target::{Expr, Member, Provenance, Statement, TargetFile};
use crate::trivia::{CarrierMark, SiblingList, TriviaCarrier};
use tracing::{debug_span, warn};

/// Everything a discarded conversion must not leave behind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    locals: LocalsMark,
    initializers: InitializersMark,
    carrier: CarrierMark,
    markers: usize,
    failures: usize,
}

/// State of one file's conversion.
///
/// Not shareable: the synthesis pools assume a single, sequential
/// conversion. Independent files get independent contexts.
pub struct ConvertContext<'a> {
    tree: &'a SourceTree,
    rules: &'a dyn RuleTable,
    options: &'a ConvertOptions,
    data_flow: Option<&'a dyn DataFlowAnalysis>,
    locals: AdditionalLocals,
    initializers: AdditionalInitializers,
    pub(crate) carrier: TriviaCarrier,
    pub(crate) markers: Vec<DiagnosticMarker>,
    failures: Vec<UnitFailure>,
}

impl<'a> ConvertContext<'a> {
    pub fn new(
        tree: &'a SourceTree,
        rules: &'a dyn RuleTable,
        options: &'a ConvertOptions,
        data_flow: Option<&'a dyn DataFlowAnalysis>,
    ) -> Self {
        Self {
            tree,
            rules,
            options,
            data_flow,
            locals: AdditionalLocals::new(options.synthesis.temporary_separator.clone()),
            initializers: AdditionalInitializers::default(),
            carrier: TriviaCarrier::new(),
            markers: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'a SourceTree {
        self.tree
    }

    pub fn options(&self) -> &'a ConvertOptions {
        self.options
    }

    /// Source text of a node.
    pub fn text(&self, node: &SourceNode) -> &'a str {
        self.tree.snippet(node.span)
    }

    // ------------------------------------------------------------------------
    // Isolated recursion
    // ------------------------------------------------------------------------

    /// Convert one member. Conversion failures become a marked placeholder;
    /// unit-fatal errors fail this member as a whole.
    pub fn member(&mut self, node: &SourceNode) -> Vec<Member> {
        let checkpoint = self.checkpoint();
        let rules = self.rules;
        match self.isolate(node, NodeCategory::Member, |cx, node| {
            rules.convert_member(node, cx)
        }) {
            Ok(members) => members,
            Err(error) => self.fail_unit(node, checkpoint, error),
        }
    }

    pub fn members<'n>(&mut self, nodes: impl IntoIterator<Item = &'n SourceNode>) -> Vec<Member> {
        let mut list = SiblingList::new();
        for node in nodes {
            let produced = self.member(node);
            list.push(produced, &mut self.carrier);
        }
        list.finish(&mut self.carrier)
    }

    /// Convert one statement, declaring any temporaries it registered
    /// immediately before it. Only unit-fatal errors escape.
    pub fn statement(&mut self, node: &SourceNode) -> Result<Vec<Statement>, ConvertError> {
        let rules = self.rules;
        let mark = self.locals.mark();
        let mut produced = self.isolate(node, NodeCategory::Statement, |cx, node| {
            rules.convert_statement(node, cx)
        })?;

        let temporaries = self.locals.take_undeclared_since(mark);
        if temporaries.is_empty() {
            return Ok(produced);
        }
        let provenance = produced.first().and_then(|s| s.meta.provenance.clone());
        let mut out: Vec<Statement> = temporaries
            .into_iter()
            .map(|temp| {
                let mut decl = Statement::local(temp.id, Some(temp.init));
                decl.meta.provenance = provenance.clone();
                decl
            })
            .collect();
        // Comments above the statement stay above its temporaries
        match produced.first_mut() {
            Some(first) => out[0].meta.leading = std::mem::take(&mut first.meta.leading),
            None => out[0].meta.leading = self.carrier.take_orphans(),
        }
        out.append(&mut produced);
        Ok(out)
    }

    pub fn statements<'n>(
        &mut self,
        nodes: impl IntoIterator<Item = &'n SourceNode>,
    ) -> Result<Vec<Statement>, ConvertError> {
        let mut list = SiblingList::new();
        for node in nodes {
            let produced = self.statement(node)?;
            list.push(produced, &mut self.carrier);
        }
        Ok(list.finish(&mut self.carrier))
    }

    /// Expressions are not isolated: an error fails the enclosing statement.
    pub fn expr(&mut self, node: &SourceNode) -> Result<Expr, ConvertError> {
        let rules = self.rules;
        rules.convert_expr(node, self)
    }

    pub fn exprs<'n>(
        &mut self,
        nodes: impl IntoIterator<Item = &'n SourceNode>,
    ) -> Result<Vec<Expr>, ConvertError> {
        nodes.into_iter().map(|node| self.expr(node)).collect()
    }

    // ------------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------------

    /// Run `f` inside a fresh temporaries scope (a routine or initializer
    /// body). The scope is popped whatever `f` returns.
    pub fn with_scope<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, ConvertError>,
    ) -> Result<R, ConvertError> {
        self.locals.push_scope();
        let result = f(self);
        self.locals.pop_scope();
        result
    }

    /// Convert the members of type `owner`, then splice pending
    /// initializers into its constructors.
    pub fn type_body<'n>(
        &mut self,
        owner: &str,
        nodes: impl IntoIterator<Item = &'n SourceNode>,
    ) -> Result<Vec<Member>, ConvertError> {
        self.initializers.push_scope(owner);
        let members = self.members(nodes);
        let Some(pending) = self.initializers.pop_scope() else {
            return Ok(members);
        };
        let _span = debug_span!("finalize", owner).entered();
        finalize_type(members, pending)
    }

    /// Name of the type whose members are being converted.
    pub fn current_owner(&self) -> Option<&str> {
        self.initializers.current_owner()
    }

    /// Register a synthetic binding for the active scope and return a
    /// reference to it.
    pub fn add_temporary(&mut self, prefix: &str, init: Expr) -> Result<Expr, ConvertError> {
        self.locals.add_temporary(prefix, init).map(Expr::Ident)
    }

    pub fn lookup_temporary(&self, id: &str) -> Result<&Temporary, ConvertError> {
        self.locals.lookup(id)
    }

    /// Register an initializer for `qualified` (`Owner.member`) that the
    /// owning type's constructors must run first.
    pub fn add_initializer(
        &mut self,
        qualified: &str,
        init: Expr,
        is_static: bool,
        origin: &SourceNode,
    ) -> Result<(), ConvertError> {
        let provenance = Provenance {
            node: origin.id,
            kind: origin.kind.clone(),
            span: origin.span,
        };
        self.initializers
            .add_initializer(qualified, init, is_static, Some(provenance))
    }

    /// Whether `name` needs a synthesized initializer over `range`.
    ///
    /// Without a data-flow capability this is always true. With one, the
    /// initializer is skipped when the name is never read in the range, or
    /// is always assigned there (reads before the first assignment are not
    /// detected).
    pub fn needs_initializer(&self, name: &str, range: Span) -> bool {
        if !self.options.synthesis.use_data_flow {
            return true;
        }
        let Some(flow) = self.data_flow.and_then(|df| df.analyze_data_flow(range)) else {
            return true;
        };
        flow.read_inside.contains(name) && !flow.always_assigned.contains(name)
    }

    // ------------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------------

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            locals: self.locals.mark(),
            initializers: self.initializers.mark(),
            carrier: self.carrier.mark(),
            markers: self.markers.len(),
            failures: self.failures.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.locals.rollback(checkpoint.locals);
        self.initializers.rollback(checkpoint.initializers);
        self.carrier.rollback(checkpoint.carrier);
        self.markers.truncate(checkpoint.markers);
        self.failures.truncate(checkpoint.failures);
    }

    fn fail_unit(
        &mut self,
        node: &SourceNode,
        checkpoint: Checkpoint,
        error: ConvertError,
    ) -> Vec<Member> {
        self.restore(checkpoint);
        let unit = if node.text.is_empty() {
            node.kind.clone()
        } else {
            node.text.clone()
        };
        warn!(%unit, span = %node.span, %error, "declaring unit failed");

        let failure = UnitFailure {
            unit,
            span: node.span,
            reason: error.to_string(),
        };
        let mut placeholder = vec![Member::placeholder()];
        self.carrier.attach_placeholder(node, &mut placeholder);
        placeholder[0].meta.trailing.extend(failure.comment_trivia());
        self.failures.push(failure);
        placeholder
    }

    /// Close out the file and hand back what the run produced.
    pub(crate) fn finish(
        mut self,
        members: Vec<Member>,
    ) -> (TargetFile, Vec<DiagnosticMarker>, Vec<UnitFailure>, bool) {
        let mut file = TargetFile::new(members);
        let note = &self.options.trivia.dropped_formatting_note;
        self.carrier.finish(&self.tree.root, &mut file, note);
        let complete = self.carrier.is_complete();
        (file, self.markers, self.failures, complete)
    }
}
