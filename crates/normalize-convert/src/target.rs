//! Target-side tree produced by the converter.
//!
//! Members and statements carry a [`NodeMeta`]: the provenance link back to
//! the source node they came from and the trivia carried over from it.
//! Expressions carry neither; their formatting is hoisted to the enclosing
//! statement.

mod structure_eq;

pub use structure_eq::StructureEq;

use crate::source::{NodeId, Span};
use serde::{Deserialize, Serialize};

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTrivia {
    Comment(String),
    BlankLine,
}

/// Link from a produced node back to the source node it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub node: NodeId,
    pub kind: String,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading: Vec<TargetTrivia>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<TargetTrivia>,
}

impl NodeMeta {
    pub fn source_kind(&self) -> Option<&str> {
        self.provenance.as_ref().map(|p| p.kind.as_str())
    }

    pub fn has_leading_blank_line(&self) -> bool {
        self.leading.first() == Some(&TargetTrivia::BlankLine)
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    /// Numeric literal, kept as its target spelling.
    Number(String),
    Str(String),
}

/// How an argument is passed to its parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassMode {
    #[default]
    Value,
    Ref,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub mode: PassMode,
    pub value: Expr,
}

impl Argument {
    pub fn value(value: Expr) -> Self {
        Self {
            name: None,
            mode: PassMode::Value,
            value,
        }
    }

    pub fn by_ref(value: Expr) -> Self {
        Self {
            name: None,
            mode: PassMode::Ref,
            value,
        }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            mode: PassMode::Value,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Ident(String),
    Literal(Literal),
    Member {
        object: Box<Expr>,
        name: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    New {
        ty: String,
        args: Vec<Argument>,
    },
    Binary {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Default value of a type (`None` lets the target infer it).
    Default(Option<String>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Expr::Literal(Literal::Number(text.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::Str(value.into()))
    }

    pub fn member(object: Expr, name: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(object),
            name: name.into(),
        }
    }

    pub fn call(callee: Expr, args: Vec<Argument>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn binary(left: Expr, op: impl Into<String>, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Whether the expression denotes a storage location.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }
        )
    }

    /// Dotted path of a plain name or member chain (`a.b.c`).
    pub fn path(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member { object, name } => object.path().map(|p| format!("{p}.{name}")),
            _ => None,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    Expr(Expr),
    Local {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    If {
        test: Expr,
        then: Vec<Statement>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Vec<Statement>>,
    },
    While {
        test: Expr,
        body: Vec<Statement>,
    },
    Block(Vec<Statement>),
    /// No-op; the placeholder for a statement that failed to convert.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StmtKind,
    #[serde(default)]
    pub meta: NodeMeta,
}

impl Statement {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            meta: NodeMeta::default(),
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    pub fn empty() -> Self {
        Self::new(StmtKind::Empty)
    }

    pub fn local(name: impl Into<String>, init: Option<Expr>) -> Self {
        Self::new(StmtKind::Local {
            name: name.into(),
            ty: None,
            init,
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::expr(Expr::assign(target, value))
    }

    /// Names declared by `Local` statements anywhere in `body`, with their provenance spans.
    pub fn declared_locals(body: &[Statement]) -> Vec<(&str, Option<Span>)> {
        let mut out = Vec::new();
        for stmt in body {
            stmt.collect_locals(&mut out);
        }
        out
    }

    fn collect_locals<'a>(&'a self, out: &mut Vec<(&'a str, Option<Span>)>) {
        match &self.kind {
            StmtKind::Local { name, .. } => {
                out.push((name.as_str(), self.meta.provenance.as_ref().map(|p| p.span)))
            }
            StmtKind::If {
                then, otherwise, ..
            } => {
                then.iter().for_each(|s| s.collect_locals(out));
                if let Some(otherwise) = otherwise {
                    otherwise.iter().for_each(|s| s.collect_locals(out));
                }
            }
            StmtKind::While { body, .. } | StmtKind::Block(body) => {
                body.iter().for_each(|s| s.collect_locals(out))
            }
            StmtKind::Expr(_) | StmtKind::Return(_) | StmtKind::Empty => {}
        }
    }
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
    /// No modifier written.
    #[default]
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default)]
    pub mode: PassMode,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Option<String>, mode: PassMode) -> Self {
        Self {
            name: name.into(),
            ty,
            mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Method,
    Constructor,
}

/// Constructor initializer call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    /// Delegates to another constructor of the same type.
    This(Vec<Argument>),
    Base(Vec<Argument>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub kind: RoutineKind,
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Chain>,
    #[serde(default)]
    pub body: Vec<Statement>,
}

impl Routine {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            kind: RoutineKind::Method,
            name: name.into(),
            is_static: false,
            visibility: Visibility::Public,
            return_type: None,
            params: Vec::new(),
            chain: None,
            body: Vec::new(),
        }
    }

    pub fn constructor(owner: impl Into<String>, is_static: bool) -> Self {
        Self {
            kind: RoutineKind::Constructor,
            is_static,
            visibility: if is_static {
                Visibility::Implicit
            } else {
                Visibility::Public
            },
            ..Self::method(owner)
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == RoutineKind::Constructor
    }

    /// Whether this constructor delegates to a sibling constructor.
    pub fn is_chaining(&self) -> bool {
        matches!(self.chain, Some(Chain::This(_)))
    }

    /// Short human description used in diagnostics.
    pub fn describe(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        let kind = match (self.kind, self.is_static) {
            (RoutineKind::Constructor, true) => "static constructor",
            (RoutineKind::Constructor, false) => "constructor",
            (RoutineKind::Method, _) => "method",
        };
        format!("{kind} {}({})", self.name, params.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    /// Module-like body; rendered as a static class.
    Module,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    /// Trivia rendered just before the closing brace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub closing: Vec<TargetTrivia>,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            visibility: Visibility::Public,
            bases: Vec::new(),
            members: Vec::new(),
            closing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Import(String),
    Type(TypeDecl),
    Field(Field),
    Routine(Routine),
    /// Stands in for a member that failed to convert; renders as its comments only.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub kind: MemberKind,
    #[serde(default)]
    pub meta: NodeMeta,
}

impl Member {
    pub fn new(kind: MemberKind) -> Self {
        Self {
            kind,
            meta: NodeMeta::default(),
        }
    }

    pub fn placeholder() -> Self {
        Self::new(MemberKind::Placeholder)
    }

    pub fn as_routine(&self) -> Option<&Routine> {
        match &self.kind {
            MemberKind::Routine(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeDecl> {
        match &self.kind {
            MemberKind::Type(t) => Some(t),
            _ => None,
        }
    }
}

impl From<TypeDecl> for Member {
    fn from(decl: TypeDecl) -> Self {
        Member::new(MemberKind::Type(decl))
    }
}

impl From<Field> for Member {
    fn from(field: Field) -> Self {
        Member::new(MemberKind::Field(field))
    }
}

impl From<Routine> for Member {
    fn from(routine: Routine) -> Self {
        Member::new(MemberKind::Routine(routine))
    }
}

/// A fully converted file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetFile {
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<TargetTrivia>,
}

impl TargetFile {
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            members,
            trailing: Vec::new(),
        }
    }

    /// Visit every expression in the file mutably, statement order first.
    pub fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        for member in &mut self.members {
            visit_member(member, f);
        }
    }
}

fn visit_member(member: &mut Member, f: &mut impl FnMut(&mut Expr)) {
    match &mut member.kind {
        MemberKind::Type(decl) => decl.members.iter_mut().for_each(|m| visit_member(m, f)),
        MemberKind::Field(field) => {
            if let Some(init) = &mut field.init {
                f(init);
            }
        }
        MemberKind::Routine(routine) => {
            if let Some(Chain::This(args) | Chain::Base(args)) = &mut routine.chain {
                args.iter_mut().for_each(|a| f(&mut a.value));
            }
            routine.body.iter_mut().for_each(|s| visit_stmt(s, f));
        }
        MemberKind::Import(_) | MemberKind::Placeholder => {}
    }
}

fn visit_stmt(stmt: &mut Statement, f: &mut impl FnMut(&mut Expr)) {
    match &mut stmt.kind {
        StmtKind::Expr(expr) => f(expr),
        StmtKind::Local { init, .. } | StmtKind::Return(init) => {
            if let Some(expr) = init {
                f(expr);
            }
        }
        StmtKind::If {
            test,
            then,
            otherwise,
        } => {
            f(test);
            then.iter_mut().for_each(|s| visit_stmt(s, f));
            if let Some(otherwise) = otherwise {
                otherwise.iter_mut().for_each(|s| visit_stmt(s, f));
            }
        }
        StmtKind::While { test, body } => {
            f(test);
            body.iter_mut().for_each(|s| visit_stmt(s, f));
        }
        StmtKind::Block(body) => body.iter_mut().for_each(|s| visit_stmt(s, f)),
        StmtKind::Empty => {}
    }
}
