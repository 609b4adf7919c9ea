//! C# writer for converted trees.
//!
//! Renders carried trivia as `//` comments and blank lines, by-ref
//! argument markers, and constructor chains. Output is a pure function of
//! the tree.

use super::Writer;
use crate::target::*;

/// Static instance of the C# writer.
pub static CSHARP_WRITER: CSharpWriterImpl = CSharpWriterImpl;

/// C# writer implementing the Writer trait.
pub struct CSharpWriterImpl;

impl Writer for CSharpWriterImpl {
    fn language(&self) -> &'static str {
        "csharp"
    }

    fn extension(&self) -> &'static str {
        "cs"
    }

    fn write(&self, file: &TargetFile) -> String {
        CSharpWriter::emit(file)
    }
}

/// Emits a target tree as C# source code.
pub struct CSharpWriter {
    output: String,
    indent: usize,
}

impl CSharpWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    /// Emit a file to C# source.
    pub fn emit(file: &TargetFile) -> String {
        let mut writer = Self::new();
        for member in &file.members {
            writer.write_member(member);
        }
        writer.write_trivia(&file.trailing);
        writer.output
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn write_line(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn write_trivia(&mut self, trivia: &[TargetTrivia]) {
        for piece in trivia {
            match piece {
                TargetTrivia::BlankLine => self.output.push('\n'),
                TargetTrivia::Comment(text) => {
                    for line in text.lines() {
                        self.write_line(format!("// {line}").trim_end());
                    }
                    if text.is_empty() {
                        self.write_line("//");
                    }
                }
            }
        }
    }

    fn open_block(&mut self) {
        self.write_line("{");
        self.indent += 1;
    }

    fn close_block(&mut self, closing: &[TargetTrivia]) {
        self.write_trivia(closing);
        self.indent -= 1;
        self.write_line("}");
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    fn write_member(&mut self, member: &Member) {
        self.write_trivia(&member.meta.leading);
        match &member.kind {
            MemberKind::Import(path) => self.write_line(&format!("using {path};")),
            MemberKind::Type(decl) => self.write_type(decl),
            MemberKind::Field(field) => self.write_field(field),
            MemberKind::Routine(routine) => self.write_routine(routine),
            MemberKind::Placeholder => {}
        }
        self.write_trivia(&member.meta.trailing);
    }

    fn write_type(&mut self, decl: &TypeDecl) {
        let mut header = modifiers(decl.visibility, decl.kind == TypeKind::Module);
        header.push_str(match decl.kind {
            TypeKind::Class | TypeKind::Module => "class ",
            TypeKind::Struct => "struct ",
            TypeKind::Interface => "interface ",
        });
        header.push_str(&decl.name);
        if !decl.bases.is_empty() {
            header.push_str(" : ");
            header.push_str(&decl.bases.join(", "));
        }
        self.write_line(&header);
        self.open_block();
        for member in &decl.members {
            self.write_member(member);
        }
        self.close_block(&decl.closing);
    }

    fn write_field(&mut self, field: &Field) {
        let mut line = modifiers(field.visibility, field.is_static);
        line.push_str(field.ty.as_deref().unwrap_or("object"));
        line.push(' ');
        line.push_str(&field.name);
        if let Some(init) = &field.init {
            line.push_str(" = ");
            line.push_str(&expr_text(init));
        }
        line.push(';');
        self.write_line(&line);
    }

    fn write_routine(&mut self, routine: &Routine) {
        let mut header = modifiers(routine.visibility, routine.is_static);
        if !routine.is_constructor() {
            header.push_str(routine.return_type.as_deref().unwrap_or("void"));
            header.push(' ');
        }
        header.push_str(&routine.name);
        header.push('(');
        let params: Vec<String> = routine.params.iter().map(param_text).collect();
        header.push_str(&params.join(", "));
        header.push(')');
        match &routine.chain {
            Some(Chain::This(args)) => header.push_str(&format!(" : this({})", args_text(args))),
            Some(Chain::Base(args)) => header.push_str(&format!(" : base({})", args_text(args))),
            None => {}
        }
        self.write_line(&header);
        self.write_body(&routine.body);
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn write_body(&mut self, body: &[Statement]) {
        self.open_block();
        for stmt in body {
            self.write_stmt(stmt);
        }
        self.close_block(&[]);
    }

    fn write_stmt(&mut self, stmt: &Statement) {
        self.write_trivia(&stmt.meta.leading);
        match &stmt.kind {
            StmtKind::Expr(expr) => self.write_line(&format!("{};", expr_text(expr))),
            StmtKind::Local { name, ty, init } => {
                let ty = match (ty, init) {
                    (Some(ty), _) => ty.as_str(),
                    (None, Some(_)) => "var",
                    (None, None) => "object",
                };
                match init {
                    Some(init) => self.write_line(&format!("{ty} {name} = {};", expr_text(init))),
                    None => self.write_line(&format!("{ty} {name};")),
                }
            }
            StmtKind::Return(None) => self.write_line("return;"),
            StmtKind::Return(Some(expr)) => {
                self.write_line(&format!("return {};", expr_text(expr)))
            }
            StmtKind::If {
                test,
                then,
                otherwise,
            } => {
                self.write_line(&format!("if ({})", expr_text(test)));
                self.write_body(then);
                if let Some(otherwise) = otherwise {
                    self.write_line("else");
                    self.write_body(otherwise);
                }
            }
            StmtKind::While { test, body } => {
                self.write_line(&format!("while ({})", expr_text(test)));
                self.write_body(body);
            }
            StmtKind::Block(body) => self.write_body(body),
            StmtKind::Empty => self.write_line(";"),
        }
        self.write_trivia(&stmt.meta.trailing);
    }
}

impl Default for CSharpWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Expressions
// ============================================================================

fn modifiers(visibility: Visibility, is_static: bool) -> String {
    let mut out = String::new();
    out.push_str(match visibility {
        Visibility::Public => "public ",
        Visibility::Protected => "protected ",
        Visibility::Internal => "internal ",
        Visibility::Private => "private ",
        Visibility::Implicit => "",
    });
    if is_static {
        out.push_str("static ");
    }
    out
}

fn mode_prefix(mode: PassMode) -> &'static str {
    match mode {
        PassMode::Value => "",
        PassMode::Ref => "ref ",
        PassMode::Out => "out ",
    }
}

fn param_text(param: &Param) -> String {
    format!(
        "{}{} {}",
        mode_prefix(param.mode),
        param.ty.as_deref().unwrap_or("object"),
        param.name
    )
}

fn args_text(args: &[Argument]) -> String {
    let args: Vec<String> = args
        .iter()
        .map(|arg| {
            let name = arg
                .name
                .as_ref()
                .map(|n| format!("{n}: "))
                .unwrap_or_default();
            format!("{name}{}{}", mode_prefix(arg.mode), expr_text(&arg.value))
        })
        .collect();
    args.join(", ")
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Literal(lit) => literal_text(lit),
        Expr::Member { object, name } => format!("{}.{name}", operand_text(object)),
        Expr::Index { object, index } => {
            format!("{}[{}]", operand_text(object), expr_text(index))
        }
        Expr::Call { callee, args } => format!("{}({})", operand_text(callee), args_text(args)),
        Expr::New { ty, args } => format!("new {ty}({})", args_text(args)),
        Expr::Binary { left, op, right } => {
            format!("{} {op} {}", operand_text(left), operand_text(right))
        }
        Expr::Unary { op, operand } => format!("{op}{}", operand_text(operand)),
        Expr::Assign { target, value } => format!("{} = {}", expr_text(target), expr_text(value)),
        Expr::Default(Some(ty)) => format!("default({ty})"),
        Expr::Default(None) => "default".to_string(),
    }
}

/// Operands that bind looser than member access get parentheses.
fn operand_text(expr: &Expr) -> String {
    match expr {
        Expr::Binary { .. } | Expr::Assign { .. } | Expr::Unary { .. } => {
            format!("({})", expr_text(expr))
        }
        _ => expr_text(expr),
    }
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Number(n) => n.clone(),
        Literal::Str(s) => format!("\"{}\"", escape_string(s)),
    }
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
