// ABOUTME: Class declaration lowering: fields, constructor, methods, self rewriting

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::CompileError;
use crate::hir::{
    sanitize_identifier, ClassConstructor, ClassField, ClassMethod, Hir,
};
use crate::lower::forms::expect_symbol;
use crate::lower::forms::functions::parse_params;
use crate::lower::{lower, Lowered, LoweringCtx};

/// Rewrite `self` to `this` throughout a lowered tree
pub(crate) fn rewrite_self(node: Hir) -> Hir {
    match node {
        Hir::Identifier {
            name,
            js_namespaced,
        } => {
            let name = if name == "self" {
                "this".to_string()
            } else {
                name
            };
            Hir::Identifier {
                name,
                js_namespaced,
            }
        }
        Hir::Array(items) => Hir::Array(items.into_iter().map(rewrite_self).collect()),
        Hir::Object(props) => Hir::Object(
            props
                .into_iter()
                .map(|mut p| {
                    if let crate::hir::PropertyKey::Computed(key) = p.key {
                        p.key = crate::hir::PropertyKey::Computed(Box::new(rewrite_self(*key)));
                    }
                    p.value = rewrite_self(p.value);
                    p
                })
                .collect(),
        ),
        Hir::New { callee, args } => Hir::New {
            callee: Box::new(rewrite_self(*callee)),
            args: args.into_iter().map(rewrite_self).collect(),
        },
        Hir::Member {
            object,
            property,
            computed,
        } => Hir::Member {
            object: Box::new(rewrite_self(*object)),
            property: Box::new(rewrite_self(*property)),
            computed,
        },
        Hir::Call { callee, args } => Hir::Call {
            callee: Box::new(rewrite_self(*callee)),
            args: args.into_iter().map(rewrite_self).collect(),
        },
        Hir::CallMember {
            object,
            method,
            args,
        } => Hir::CallMember {
            object: Box::new(rewrite_self(*object)),
            method,
            args: args.into_iter().map(rewrite_self).collect(),
        },
        Hir::GetAndCall {
            object,
            method,
            args,
        } => Hir::GetAndCall {
            object: Box::new(rewrite_self(*object)),
            method,
            args: args.into_iter().map(rewrite_self).collect(),
        },
        Hir::JsMethodAccess { object, method } => Hir::JsMethodAccess {
            object: Box::new(rewrite_self(*object)),
            method,
        },
        Hir::InteropIIFE { object, property } => Hir::InteropIIFE {
            object: Box::new(rewrite_self(*object)),
            property: Box::new(rewrite_self(*property)),
        },
        Hir::Binary { op, left, right } => Hir::Binary {
            op,
            left: Box::new(rewrite_self(*left)),
            right: Box::new(rewrite_self(*right)),
        },
        Hir::Unary { op, operand } => Hir::Unary {
            op,
            operand: Box::new(rewrite_self(*operand)),
        },
        Hir::Assign { target, value } => Hir::Assign {
            target: Box::new(rewrite_self(*target)),
            value: Box::new(rewrite_self(*value)),
        },
        Hir::Conditional {
            test,
            consequent,
            alternate,
        } => Hir::Conditional {
            test: Box::new(rewrite_self(*test)),
            consequent: Box::new(rewrite_self(*consequent)),
            alternate: Box::new(rewrite_self(*alternate)),
        },
        Hir::VarDecl { kind, declarators } => Hir::VarDecl {
            kind,
            declarators: declarators
                .into_iter()
                .map(|mut d| {
                    d.init = d.init.map(rewrite_self);
                    d
                })
                .collect(),
        },
        Hir::ExprStmt(expr) => Hir::ExprStmt(Box::new(rewrite_self(*expr))),
        Hir::Block(statements) => {
            Hir::Block(statements.into_iter().map(rewrite_self).collect())
        }
        Hir::If {
            test,
            consequent,
            alternate,
        } => Hir::If {
            test: Box::new(rewrite_self(*test)),
            consequent: Box::new(rewrite_self(*consequent)),
            alternate: alternate.map(|alt| Box::new(rewrite_self(*alt))),
        },
        Hir::Return(value) => Hir::Return(Box::new(rewrite_self(*value))),
        Hir::FunctionExpr { params, body } => Hir::FunctionExpr {
            params,
            body: body.into_iter().map(rewrite_self).collect(),
        },
        other => other,
    }
}

fn class_field(
    ctx: &mut LoweringCtx,
    member: &List,
    mutable: bool,
) -> Result<ClassField, CompileError> {
    if member.items.len() < 2 || member.items.len() > 3 {
        return Err(CompileError::validation(
            "class",
            "malformed field declarator",
            "(var name init?) or (let name init?)",
            format!("{} items", member.items.len()),
        )
        .at(member.loc.clone()));
    }
    let name = expect_symbol("class", &member.items[1])?;
    let init = match member.items.get(2) {
        Some(node) => Some(rewrite_self(lower(ctx, node)?)),
        None => None,
    };
    Ok(ClassField {
        name: sanitize_identifier(&name.name),
        mutable,
        init,
    })
}

/// Constructor body: one expression, or a (do ...) whose children become
/// the constructor's statements. An implicit `return this` is appended when
/// no return is present.
fn class_constructor(
    ctx: &mut LoweringCtx,
    member: &List,
) -> Result<ClassConstructor, CompileError> {
    let Some(params_node) = member.items.get(1).and_then(|n| n.as_list()) else {
        return Err(CompileError::validation(
            "class",
            "constructor needs a parameter list",
            "(constructor (params) body)",
            member
                .items
                .get(1)
                .map(|n| n.kind_name())
                .unwrap_or("nothing"),
        )
        .at(member.loc.clone()));
    };
    let params = parse_params(ctx, "constructor", params_node)?;

    let mut statements = Vec::new();
    for node in &member.items[2..] {
        if let Some(inner) = node.as_list() {
            if inner.items.first().is_some_and(|h| h.is_symbol("do")) {
                for child in &inner.items[1..] {
                    let lowered = rewrite_self(lower(ctx, child)?);
                    statements.push(lowered.into_statement());
                }
                continue;
            }
        }
        let lowered = rewrite_self(lower(ctx, node)?);
        statements.push(lowered.into_statement());
    }

    let has_return = statements.iter().any(|s| matches!(s, Hir::Return(_)));
    if !has_return {
        statements.push(Hir::ret(Hir::identifier("this")));
    }

    Ok(ClassConstructor {
        params,
        body: statements,
    })
}

fn class_method(
    ctx: &mut LoweringCtx,
    member: &List,
    typed: bool,
) -> Result<ClassMethod, CompileError> {
    let context = if typed { "class fx method" } else { "class fn method" };
    let name = expect_symbol(context, member.items.get(1).unwrap_or(&Sexp::Null))?;
    let Some(params_node) = member.items.get(2).and_then(|n| n.as_list()) else {
        return Err(CompileError::validation(
            context,
            "missing parameter list",
            "list",
            member
                .items
                .get(2)
                .map(|n| n.kind_name())
                .unwrap_or("nothing"),
        )
        .at(member.loc.clone()));
    };
    let params = parse_params(ctx, context, params_node)?;

    let (return_type, body_start) = if typed {
        let clause = member.items.get(3).and_then(|n| n.as_list());
        let ty = clause
            .filter(|c| c.items.len() == 2 && c.items[0].is_symbol("->"))
            .and_then(|c| c.items[1].as_symbol())
            .map(|s| s.name.clone())
            .ok_or_else(|| {
                CompileError::validation(
                    context,
                    "missing return type clause",
                    "(-> Type)",
                    member
                        .items
                        .get(3)
                        .map(|n| n.kind_name())
                        .unwrap_or("nothing"),
                )
                .at(member.loc.clone())
            })?;
        (Some(ty), 4)
    } else {
        (None, 3)
    };

    let mut body = Vec::with_capacity(member.items.len().saturating_sub(body_start));
    for node in &member.items[body_start..] {
        body.push(rewrite_self(lower(ctx, node)?));
    }

    Ok(ClassMethod {
        name: sanitize_identifier(&name.name),
        params,
        return_type,
        body: Hir::function_body(body),
    })
}

#[special_form(name = "class", category = "Classes", signature = "(class Name members...)", related("new", "enum"))]
/// Class declaration with fields, a constructor, and methods.
///
/// Members are `(var name init?)` / `(let name init?)` fields,
/// one `(constructor (params) body)`, and `(fn ...)` / `(fx ...)` methods.
/// `self` in member bodies refers to the instance.
///
/// # Examples
///
/// ```hql
/// (class Point
///   (var x 0)
///   (var y 0)
///   (constructor (x y)
///     (do (set! self.x x) (set! self.y y)))
///   (fn dist () (+ self.x self.y)))
/// ```
pub fn lower_class(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let name = expect_symbol("class", list.items.get(1).unwrap_or(&Sexp::Null))?;

    let mut fields = Vec::new();
    let mut constructor = None;
    let mut methods = Vec::new();

    for member in &list.items[2..] {
        let Some(member_list) = member.as_list() else {
            return Err(CompileError::validation(
                "class",
                "class members must be lists",
                "list",
                member.kind_name(),
            )
            .at(member.loc().cloned()));
        };
        let head = expect_symbol("class", member_list.items.first().unwrap_or(&Sexp::Null))?;

        match head.name.as_str() {
            "var" => fields.push(class_field(ctx, member_list, true)?),
            "let" => fields.push(class_field(ctx, member_list, false)?),
            "constructor" => constructor = Some(class_constructor(ctx, member_list)?),
            "fn" => methods.push(class_method(ctx, member_list, false)?),
            "fx" => methods.push(class_method(ctx, member_list, true)?),
            other => {
                return Err(CompileError::validation(
                    "class",
                    format!("unknown member form '{}'", other),
                    "var, let, constructor, fn, or fx",
                    other.to_string(),
                )
                .at(head.loc.clone()));
            }
        }
    }

    Ok(Lowered::Node(Hir::ClassDecl {
        name: sanitize_identifier(&name.name),
        fields,
        constructor,
        methods,
    }))
}
