//! A toy rule table over a small BASIC-like source grammar, and builders
//! for its trees.
//!
//! Members: `import`, `class` (with `inherits` header and `end` marker),
//! `field`, `static_field`, `sub`, `ctor`, `static_ctor`.
//! Statements: `call_stmt`, `dim`, `assign`, `return`, `if`, `use_temp`,
//! `pragma` (produces nothing), `broken` (always fails).
//! Expressions: `ident`, `number`, `string`, `call`, `with_temp`, `bad_expr`.

#![allow(dead_code)]

use normalize_convert::target::{
    Argument, Chain, Expr, Field, Member, MemberKind, Param, PassMode, Routine, Statement,
    StmtKind, TypeDecl, TypeKind,
};
use normalize_convert::{
    ConvertContext, ConvertError, Role, RuleTable, SourceNode, SourceTree, Span, Trivia,
};

pub struct ToyRules;

impl RuleTable for ToyRules {
    fn convert_member(
        &self,
        node: &SourceNode,
        cx: &mut ConvertContext<'_>,
    ) -> Result<Vec<Member>, ConvertError> {
        match node.kind.as_str() {
            "import" => Ok(vec![Member::new(MemberKind::Import(node.text.clone()))]),
            "class" => {
                let qualified = match cx.current_owner() {
                    Some(owner) => format!("{owner}.{}", node.text),
                    None => node.text.clone(),
                };
                let members = cx.type_body(&qualified, node.items())?;
                let bases = node
                    .children
                    .iter()
                    .filter(|c| c.role == Role::Header)
                    .map(|c| c.text.clone())
                    .collect();
                Ok(vec![
                    TypeDecl {
                        bases,
                        members,
                        ..TypeDecl::new(TypeKind::Class, node.text.clone())
                    }
                    .into(),
                ])
            }
            "field" | "static_field" => {
                let is_static = node.kind == "static_field";
                let owner = cx
                    .current_owner()
                    .ok_or_else(|| ConvertError::node(node.span, "field outside a type"))?
                    .to_string();
                let mut init = match node.children.first() {
                    Some(child) => Some(cx.expr(child)?),
                    None => None,
                };
                // Calls cannot run in a field initializer on the target
                if let Some(value) = init.take_if(|e| matches!(e, Expr::Call { .. })) {
                    cx.add_initializer(&format!("{owner}.{}", node.text), value, is_static, node)?;
                }
                Ok(vec![
                    Field {
                        name: node.text.clone(),
                        ty: Some("int".into()),
                        is_static,
                        visibility: Default::default(),
                        init,
                    }
                    .into(),
                ])
            }
            "sub" | "ctor" | "static_ctor" => {
                let mut routine = match node.kind.as_str() {
                    "sub" => Routine::method(node.text.clone()),
                    kind => {
                        let owner = cx
                            .current_owner()
                            .ok_or_else(|| ConvertError::node(node.span, "constructor outside a type"))?;
                        let simple = owner.rsplit('.').next().unwrap_or(owner).to_string();
                        Routine::constructor(simple, kind == "static_ctor")
                    }
                };
                for param in &node.children {
                    let mode = match param.kind.as_str() {
                        "param" => PassMode::Value,
                        "byref_param" => PassMode::Ref,
                        _ => continue,
                    };
                    routine.params.push(Param::new(param.text.clone(), Some("int".into()), mode));
                }
                if let Some(chain) = node.child("chain_this") {
                    let args = cx.exprs(&chain.children)?;
                    routine.chain = Some(Chain::This(args.into_iter().map(Argument::value).collect()));
                }
                if let Some(body) = node.child("body") {
                    routine.body = cx.with_scope(|cx| cx.statements(body.items()))?;
                }
                Ok(vec![routine.into()])
            }
            _ => Err(ConvertError::Unsupported {
                kind: node.kind.clone(),
                span: node.span,
            }),
        }
    }

    fn convert_statement(
        &self,
        node: &SourceNode,
        cx: &mut ConvertContext<'_>,
    ) -> Result<Vec<Statement>, ConvertError> {
        let stmt = match node.kind.as_str() {
            "call_stmt" => Statement::expr(cx.expr(first(node)?)?),
            "dim" => {
                let init = match node.children.first() {
                    Some(child) => Some(cx.expr(child)?),
                    None if cx.needs_initializer(&node.text, node.span) => Some(Expr::Default(None)),
                    None => None,
                };
                Statement::new(StmtKind::Local {
                    name: node.text.clone(),
                    ty: Some("int".into()),
                    init,
                })
            }
            "assign" => {
                let target = cx.expr(first(node)?)?;
                let value = cx.expr(second(node)?)?;
                Statement::assign(target, value)
            }
            "return" => {
                let value = match node.children.first() {
                    Some(child) => Some(cx.expr(child)?),
                    None => None,
                };
                Statement::new(StmtKind::Return(value))
            }
            "if" => {
                let test = cx.expr(first(node)?)?;
                let then = match node.child("then") {
                    Some(then) => cx.statements(then.items())?,
                    None => Vec::new(),
                };
                let otherwise = match node.child("else") {
                    Some(otherwise) => Some(cx.statements(otherwise.items())?),
                    None => None,
                };
                Statement::new(StmtKind::If {
                    test,
                    then,
                    otherwise,
                })
            }
            "use_temp" => {
                let id = cx.lookup_temporary(&node.text)?.id.clone();
                Statement::expr(Expr::call(Expr::ident("Use"), vec![Argument::value(Expr::Ident(id))]))
            }
            "pragma" => return Ok(Vec::new()),
            "hoist_only" => {
                let value = cx.expr(first(node)?)?;
                cx.add_temporary("t", value)?;
                return Ok(Vec::new());
            }
            "broken" => return Err(ConvertError::node(node.span, "no rule for this construct")),
            _ => {
                return Err(ConvertError::Unsupported {
                    kind: node.kind.clone(),
                    span: node.span,
                });
            }
        };
        Ok(vec![stmt])
    }

    fn convert_expr(
        &self,
        node: &SourceNode,
        cx: &mut ConvertContext<'_>,
    ) -> Result<Expr, ConvertError> {
        match node.kind.as_str() {
            "ident" => Ok(Expr::ident(node.text.clone())),
            "number" => Ok(Expr::number(node.text.clone())),
            "string" => Ok(Expr::string(node.text.clone())),
            "call" => {
                let mut parts = node.text.split('.');
                let head = parts.next().unwrap_or_default();
                let callee = parts.fold(Expr::ident(head), |object, name| Expr::member(object, name));
                let args = cx.exprs(&node.children)?;
                Ok(Expr::call(callee, args.into_iter().map(Argument::value).collect()))
            }
            "with_temp" => {
                let value = cx.expr(first(node)?)?;
                cx.add_temporary("tmp", value)
            }
            "bad_expr" => Err(ConvertError::node(node.span, "expression has no translation")),
            _ => Err(ConvertError::Unsupported {
                kind: node.kind.clone(),
                span: node.span,
            }),
        }
    }
}

fn first(node: &SourceNode) -> Result<&SourceNode, ConvertError> {
    node.children
        .first()
        .ok_or_else(|| ConvertError::node(node.span, "missing operand"))
}

fn second(node: &SourceNode) -> Result<&SourceNode, ConvertError> {
    node.children
        .get(1)
        .ok_or_else(|| ConvertError::node(node.span, "missing operand"))
}

// ============================================================================
// Tree builders
// ============================================================================

pub fn n(kind: &str) -> SourceNode {
    SourceNode::new(kind, Span::default())
}

pub fn named(kind: &str, text: &str) -> SourceNode {
    n(kind).with_text(text)
}

pub fn file(members: Vec<SourceNode>) -> SourceTree {
    SourceTree::new("", n("file").with_children(members))
}

pub fn class(name: &str, members: Vec<SourceNode>) -> SourceNode {
    named("class", name).with_children(members)
}

pub fn sub(name: &str, params: Vec<SourceNode>, body: Vec<SourceNode>) -> SourceNode {
    named("sub", name)
        .with_children(params)
        .with_child(n("body").with_children(body))
}

pub fn ctor(params: Vec<SourceNode>, body: Vec<SourceNode>) -> SourceNode {
    n("ctor")
        .with_children(params)
        .with_child(n("body").with_children(body))
}

pub fn field(name: &str, init: Option<SourceNode>) -> SourceNode {
    named("field", name).with_children(init)
}

pub fn ident(name: &str) -> SourceNode {
    named("ident", name)
}

pub fn number(text: &str) -> SourceNode {
    named("number", text)
}

pub fn call(callee: &str, args: Vec<SourceNode>) -> SourceNode {
    named("call", callee).with_children(args)
}

pub fn call_stmt(callee: &str, args: Vec<SourceNode>) -> SourceNode {
    n("call_stmt").with_child(call(callee, args))
}

pub fn comment(text: &str) -> Trivia {
    Trivia::comment(text)
}
