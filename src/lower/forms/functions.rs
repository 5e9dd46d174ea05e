// ABOUTME: Function declaration forms: fn, fx, lambda, and the parameter grammar

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::CompileError;
use crate::hir::{sanitize_identifier, Hir, Param};
use crate::lower::forms::expect_symbol;
use crate::lower::registry::FunctionSignature;
use crate::lower::{lower, Lowered, LoweringCtx};

// ============================================================================
// Parameter Grammar
// ============================================================================
//
// Positional:      (x y)
// Defaulted:       (x = 1 y = 2)
// Variadic:        (x & rest)
// Typed (fx only): (n: Int m: Double = 0.5)

/// Parse a parameter list. Typed annotations are collected here and policed
/// by the calling form (only `fx` accepts them).
pub(crate) fn parse_params(
    ctx: &mut LoweringCtx,
    context: &str,
    list: &List,
) -> Result<Vec<Param>, CompileError> {
    let items = &list.items;
    let mut params: Vec<Param> = Vec::new();
    let mut index = 0;
    let mut saw_rest = false;

    while index < items.len() {
        let sym = expect_symbol(context, &items[index])?;

        // `& rest` marks the trailing variadic parameter
        if sym.name == "&" {
            if saw_rest {
                return Err(CompileError::validation(
                    context,
                    "only one rest parameter is allowed",
                    "a single & marker",
                    "a second one",
                )
                .at(sym.loc.clone()));
            }
            index += 1;
            let Some(rest_node) = items.get(index) else {
                return Err(CompileError::validation(
                    context,
                    "& must be followed by a parameter name",
                    "symbol",
                    "nothing",
                )
                .at(sym.loc.clone()));
            };
            let rest_sym = expect_symbol(context, rest_node)?;
            params.push(Param {
                name: sanitize_identifier(&rest_sym.name),
                ty: None,
                default: None,
                rest: true,
            });
            saw_rest = true;
            index += 1;
            continue;
        }

        if saw_rest {
            return Err(CompileError::validation(
                context,
                "the rest parameter must be last",
                "nothing after the rest parameter",
                sym.name.clone(),
            )
            .at(sym.loc.clone()));
        }

        // Typed forms: `name:` followed by a type symbol, or `name:Type`
        let (raw_name, ty) = if let Some(stripped) = sym.name.strip_suffix(':') {
            index += 1;
            let Some(ty_node) = items.get(index) else {
                return Err(CompileError::validation(
                    context,
                    format!("parameter '{}' is missing its type", stripped),
                    "a type name",
                    "nothing",
                )
                .at(sym.loc.clone()));
            };
            let ty_sym = expect_symbol(context, ty_node)?;
            (stripped.to_string(), Some(ty_sym.name.clone()))
        } else if let Some((name, ty)) = sym.name.split_once(':') {
            (name.to_string(), Some(ty.to_string()))
        } else {
            (sym.name.clone(), None)
        };
        index += 1;

        // `= default`
        let mut default = None;
        if items.get(index).is_some_and(|n| n.is_symbol("=")) {
            index += 1;
            let Some(value) = items.get(index) else {
                return Err(CompileError::validation(
                    context,
                    format!("parameter '{}' is missing its default value", raw_name),
                    "an expression after =",
                    "nothing",
                )
                .at(sym.loc.clone()));
            };
            default = Some(lower(ctx, value)?);
            index += 1;
        }

        params.push(Param {
            name: sanitize_identifier(&raw_name),
            ty,
            default,
            rest: false,
        });
    }

    Ok(params)
}

fn reject_typed_params(context: &str, params: &[Param]) -> Result<(), CompileError> {
    if let Some(param) = params.iter().find(|p| p.ty.is_some()) {
        return Err(CompileError::validation(
            context,
            format!(
                "parameter '{}' carries a type annotation; only fx declares types",
                param.name
            ),
            "untyped parameters",
            "a typed one",
        ));
    }
    Ok(())
}

fn lower_function_body(
    ctx: &mut LoweringCtx,
    body: &[Sexp],
) -> Result<Vec<Hir>, CompileError> {
    let mut lowered = Vec::with_capacity(body.len());
    for node in body {
        lowered.push(lower(ctx, node)?);
    }
    Ok(Hir::function_body(lowered))
}

fn params_list<'a>(context: &str, node: Option<&'a Sexp>) -> Result<&'a List, CompileError> {
    let Some(node) = node else {
        return Err(CompileError::validation(
            context,
            "missing parameter list",
            "a list of parameters",
            "nothing",
        ));
    };
    node.as_list().ok_or_else(|| {
        CompileError::validation(
            context,
            "malformed parameter list",
            "list",
            node.kind_name(),
        )
        .at(node.loc().cloned())
    })
}

// ============================================================================
// Forms
// ============================================================================

#[special_form(name = "fn", category = "Functions", signature = "(fn name (params) body...)", related("fx", "lambda"))]
/// Untyped function declaration.
///
/// Parameters may be positional, defaulted with `=`, or variadic with a
/// trailing `& rest`. The declaration is registered so later call sites can
/// bind named arguments, fill defaults, and check arity.
///
/// # Examples
///
/// ```hql
/// (fn add (x = 1 y = 2) (+ x y))
/// (fn log-all (& items) (.forEach items js/console.log))
/// ```
///
/// # See Also
///
/// fx, lambda
pub fn lower_fn(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let name = expect_symbol("fn", list.items.get(1).unwrap_or(&Sexp::Null))?;
    let params = parse_params(ctx, "fn", params_list("fn", list.items.get(2))?)?;
    reject_typed_params("fn", &params)?;

    let body = lower_function_body(ctx, &list.items[3..])?;

    ctx.functions.register_untyped(FunctionSignature {
        name: name.name.clone(),
        params: params.clone(),
        typed: false,
    });

    Ok(Lowered::Node(Hir::FnDecl {
        name: sanitize_identifier(&name.name),
        params,
        body,
    }))
}

#[special_form(name = "fx", category = "Functions", signature = "(fx name (params: Types) (-> Type) body...)", related("fn", "lambda"))]
/// Typed pure function declaration.
///
/// Every parameter carries a `name: Type` annotation with an optional
/// `= default`; the `(-> Type)` return clause is mandatory. Purity of the
/// body is the caller's concern; the emitted function clones object-typed
/// arguments on entry so callers never observe mutation.
///
/// # Examples
///
/// ```hql
/// (fx square (n: Int) (-> Int) (* n n))
/// ```
///
/// # See Also
///
/// fn
pub fn lower_fx(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let name = expect_symbol("fx", list.items.get(1).unwrap_or(&Sexp::Null))?;
    let params = parse_params(ctx, "fx", params_list("fx", list.items.get(2))?)?;

    if let Some(param) = params.iter().find(|p| p.ty.is_none() && !p.rest) {
        return Err(CompileError::validation(
            "fx",
            format!("parameter '{}' is missing a type annotation", param.name),
            "name: Type",
            "an untyped parameter",
        )
        .at(list.loc.clone()));
    }
    if params.iter().any(|p| p.rest) {
        return Err(CompileError::validation(
            "fx",
            "typed functions take a fixed parameter list",
            "no rest parameter",
            "a & marker",
        )
        .at(list.loc.clone()));
    }

    let return_type = parse_return_clause(list.items.get(3))?;
    let body = lower_function_body(ctx, &list.items[4..])?;

    ctx.functions.register_typed(FunctionSignature {
        name: name.name.clone(),
        params: params.clone(),
        typed: true,
    });

    Ok(Lowered::Node(Hir::FxDecl {
        name: sanitize_identifier(&name.name),
        params,
        return_type,
        body,
    }))
}

/// The mandatory `(-> Type)` clause of an fx declaration
fn parse_return_clause(node: Option<&Sexp>) -> Result<String, CompileError> {
    let err = || {
        CompileError::validation(
            "fx",
            "missing return type clause",
            "(-> Type)",
            node.map(|n| n.kind_name()).unwrap_or("nothing"),
        )
        .at(node.and_then(|n| n.loc()).cloned())
    };

    let Some(list) = node.and_then(|n| n.as_list()) else {
        return Err(err());
    };
    if list.items.len() != 2 || !list.items[0].is_symbol("->") {
        return Err(err());
    }
    let ty = expect_symbol("fx", &list.items[1])?;
    Ok(ty.name.clone())
}

#[special_form(name = "lambda", category = "Functions", signature = "(lambda (params) body...)", related("fn"))]
/// Anonymous function expression.
///
/// Same parameter grammar as fn, minus the name; the declaration is not
/// registered, so call sites treat it like any other expression.
///
/// # Examples
///
/// ```hql
/// (.map items (lambda (x) (* x 2)))
/// ```
pub fn lower_lambda(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let params = parse_params(ctx, "lambda", params_list("lambda", list.items.get(1))?)?;
    reject_typed_params("lambda", &params)?;

    let body = lower_function_body(ctx, &list.items[2..])?;

    Ok(Lowered::Node(Hir::FunctionExpr { params, body }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_form;

    fn lower_one(source: &str) -> Result<Hir, CompileError> {
        let form = parse_form(source, "<test>").unwrap();
        let mut ctx = LoweringCtx::new();
        lower(&mut ctx, &form)
    }

    #[test]
    fn test_fn_declaration_registers_and_shapes_body() {
        let form = parse_form("(fn add (x = 1 y = 2) (+ x y))", "<test>").unwrap();
        let mut ctx = LoweringCtx::new();
        let hir = lower(&mut ctx, &form).unwrap();

        match hir {
            Hir::FnDecl { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].default, Some(Hir::Number(1.0)));
                assert!(matches!(body.last(), Some(Hir::Return(_))));
            }
            other => panic!("Expected fn declaration, got {:?}", other),
        }

        let sig = ctx.functions.lookup("add").unwrap();
        assert!(!sig.typed);
        assert_eq!(sig.params[1].default, Some(Hir::Number(2.0)));
    }

    #[test]
    fn test_fn_rest_parameter() {
        let hir = lower_one("(fn collect (first & rest) rest)").unwrap();
        match hir {
            Hir::FnDecl { params, .. } => {
                assert!(!params[0].rest);
                assert!(params[1].rest);
                assert_eq!(params[1].name, "rest");
            }
            other => panic!("Expected fn declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_fn_rejects_typed_params() {
        assert!(lower_one("(fn bad (n: Int) n)").is_err());
    }

    #[test]
    fn test_fn_rest_must_be_last() {
        assert!(lower_one("(fn bad (& rest more) rest)").is_err());
    }

    #[test]
    fn test_fx_declaration() {
        let form = parse_form("(fx square (n: Int) (-> Int) (* n n))", "<test>").unwrap();
        let mut ctx = LoweringCtx::new();
        let hir = lower(&mut ctx, &form).unwrap();

        match hir {
            Hir::FxDecl {
                name,
                params,
                return_type,
                body,
            } => {
                assert_eq!(name, "square");
                assert_eq!(params[0].ty.as_deref(), Some("Int"));
                assert_eq!(return_type, "Int");
                assert!(matches!(body.last(), Some(Hir::Return(_))));
            }
            other => panic!("Expected fx declaration, got {:?}", other),
        }

        assert!(ctx.functions.is_typed("square"));
    }

    #[test]
    fn test_fx_accepts_compact_type_annotation() {
        let hir = lower_one("(fx half (n:Double = 1.0) (-> Double) (/ n 2))").unwrap();
        match hir {
            Hir::FxDecl { params, .. } => {
                assert_eq!(params[0].name, "n");
                assert_eq!(params[0].ty.as_deref(), Some("Double"));
                assert_eq!(params[0].default, Some(Hir::Number(1.0)));
            }
            other => panic!("Expected fx declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_fx_requires_return_clause() {
        assert!(lower_one("(fx square (n: Int) (* n n))").is_err());
    }

    #[test]
    fn test_fx_requires_types() {
        assert!(lower_one("(fx square (n) (-> Int) (* n n))").is_err());
    }

    #[test]
    fn test_lambda_is_expression() {
        let hir = lower_one("(lambda (x) (* x 2))").unwrap();
        match hir {
            Hir::FunctionExpr { params, body } => {
                assert_eq!(params.len(), 1);
                assert!(matches!(body.last(), Some(Hir::Return(_))));
            }
            other => panic!("Expected function expression, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_head_in_call_position() {
        let hir = lower_one("((lambda (x) (* x 2)) 5)").unwrap();
        match hir {
            Hir::Call { callee, args } => {
                assert!(matches!(*callee, Hir::FunctionExpr { .. }));
                assert_eq!(args, vec![Hir::Number(5.0)]);
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_stays_empty() {
        let hir = lower_one("(fn noop ())").unwrap();
        match hir {
            Hir::FnDecl { body, .. } => assert!(body.is_empty()),
            other => panic!("Expected fn declaration, got {:?}", other),
        }
    }
}
