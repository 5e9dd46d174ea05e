// ABOUTME: Core special forms: quoting, conditionals, sequencing, bindings

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::{CompileError, ARITY_ONE, ARITY_TWO, ARITY_TWO_OR_THREE};
use crate::hir::{DeclKind, Declarator, Hir};
use crate::lower::forms::{expect_arity, expect_symbol, iife};
use crate::lower::{lower, Lowered, LoweringCtx};

// ============================================================================
// Quoting
// ============================================================================

/// Quote a node without evaluating it: literals stay literals, a symbol
/// becomes the string of its name, and a list becomes an array of its
/// recursively quoted elements.
fn quote_node(node: &Sexp) -> Hir {
    match node {
        Sexp::Null => Hir::Null,
        Sexp::Bool(b) => Hir::Bool(*b),
        Sexp::Number(n) => Hir::Number(*n),
        Sexp::Str(s) => Hir::Str(s.clone()),
        Sexp::Symbol(sym) => Hir::Str(sym.name.clone()),
        Sexp::List(list) => Hir::Array(list.items.iter().map(quote_node).collect()),
    }
}

#[special_form(name = "quote", category = "Quoting", signature = "(quote form)", related("quasiquote", "unquote"))]
/// Returns its argument as data instead of evaluating it.
///
/// # Examples
///
/// ```hql
/// (quote x)
/// '(1 2 3)
/// ```
///
/// # See Also
///
/// quasiquote, unquote
pub fn lower_quote(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("quote", &list.items, 1, ARITY_ONE)?;
    Ok(Lowered::Node(quote_node(&list.items[1])))
}

#[special_form(name = "quasiquote", category = "Quoting", signature = "(quasiquote form)", related("quote", "unquote"))]
/// Passthrough lowering of a quasiquoted form.
///
/// Macro expansion has already resolved template semantics by the time the
/// compiler sees this form.
pub fn lower_quasiquote(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("quasiquote", &list.items, 1, ARITY_ONE)?;
    lower(ctx, &list.items[1]).map(Lowered::Node)
}

#[special_form(name = "unquote", category = "Quoting", signature = "(unquote form)", related("quasiquote"))]
/// Passthrough lowering of an unquoted form.
pub fn lower_unquote(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("unquote", &list.items, 1, ARITY_ONE)?;
    lower(ctx, &list.items[1]).map(Lowered::Node)
}

#[special_form(name = "unquote-splicing", category = "Quoting", signature = "(unquote-splicing form)", related("quasiquote"))]
/// Passthrough lowering of a splice form.
pub fn lower_unquote_splicing(
    ctx: &mut LoweringCtx,
    list: &List,
) -> Result<Lowered, CompileError> {
    expect_arity("unquote-splicing", &list.items, 1, ARITY_ONE)?;
    lower(ctx, &list.items[1]).map(Lowered::Node)
}

// ============================================================================
// Conditionals
// ============================================================================

#[special_form(name = "if", category = "Control Flow", signature = "(if test then else?)", related("cond"))]
/// Two- or three-armed conditional.
///
/// Lowers to a ternary expression, or to an if statement inside a loop body
/// so that recur can appear in a branch.
///
/// # Examples
///
/// ```hql
/// (if (< x 3) "small" "big")
/// ```
///
/// # See Also
///
/// cond
pub fn lower_if(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    if args.len() != 2 && args.len() != 3 {
        return Err(CompileError::arity("if", ARITY_TWO_OR_THREE, args.len())
            .at(list.loc.clone()));
    }

    let test = lower(ctx, &args[0])?;

    if ctx.in_loop() {
        let consequent = lower(ctx, &args[1])?.into_statement();
        let alternate = match args.get(2) {
            Some(node) => Some(Box::new(lower(ctx, node)?.into_statement())),
            None => None,
        };
        return Ok(Lowered::Node(Hir::If {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        }));
    }

    let consequent = lower(ctx, &args[1])?;
    let alternate = match args.get(2) {
        Some(node) => lower(ctx, node)?,
        None => Hir::Null,
    };
    Ok(Lowered::Node(Hir::conditional(test, consequent, alternate)))
}

/// A clause test of `else` or literal `true` is a tautology
fn is_tautology(test: &Sexp) -> bool {
    test.is_symbol("else") || matches!(test, Sexp::Bool(true))
}

#[special_form(name = "cond", category = "Control Flow", signature = "(cond (test expr)... (else expr)?)", related("if"))]
/// Multi-clause conditional, right-folded into a ternary chain.
///
/// A trailing else (or literal true) clause becomes the final alternate;
/// without one the chain ends in null.
///
/// # Examples
///
/// ```hql
/// (cond ((< n 0) "negative") ((= n 0) "zero") (else "positive"))
/// ```
pub fn lower_cond(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let mut chain = Hir::Null;

    for clause in list.items[1..].iter().rev() {
        let Some(pair) = clause.as_list() else {
            return Err(CompileError::validation(
                "cond",
                "each clause must be a (test expr) list",
                "list",
                clause.kind_name(),
            )
            .at(clause.loc().cloned()));
        };
        if pair.items.len() != 2 {
            return Err(CompileError::arity("cond clause", ARITY_TWO, pair.items.len())
                .at(pair.loc.clone()));
        }

        let body = lower(ctx, &pair.items[1])?;
        if is_tautology(&pair.items[0]) {
            chain = body;
        } else {
            let test = lower(ctx, &pair.items[0])?;
            chain = Hir::conditional(test, body, chain);
        }
    }

    Ok(Lowered::Node(chain))
}

// ============================================================================
// Sequencing
// ============================================================================

#[special_form(name = "do", category = "Control Flow", signature = "(do expr...)", related("let"))]
/// Evaluates forms in order and yields the last.
///
/// Zero forms lower to null, one form lowers to itself, and more become an
/// immediately-invoked function whose body returns the final expression.
///
/// # Examples
///
/// ```hql
/// (do (log "step") (+ 1 2))
/// ```
pub fn lower_do(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    match args.len() {
        0 => Ok(Lowered::Node(Hir::Null)),
        1 => lower(ctx, &args[0]).map(Lowered::Node),
        _ => {
            let mut body = Vec::with_capacity(args.len());
            for node in args {
                body.push(lower(ctx, node)?);
            }
            Ok(Lowered::Node(iife(Hir::function_body(body))))
        }
    }
}

// ============================================================================
// Bindings
// ============================================================================

fn lower_binding_form(
    ctx: &mut LoweringCtx,
    list: &List,
    form: &str,
    kind: DeclKind,
) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];

    // Single-binding shape: (let name value)
    if let Some(sym) = args.first().and_then(|a| a.as_symbol()) {
        expect_arity(form, &list.items, 2, ARITY_TWO)?;
        let init = lower(ctx, &args[1])?;
        return Ok(Lowered::Node(Hir::VarDecl {
            kind,
            declarators: vec![Declarator {
                name: crate::hir::sanitize_identifier(&sym.name),
                init: Some(init),
            }],
        }));
    }

    // Scoped shape: (let (n1 v1 n2 v2 ...) body...)
    let Some(bindings) = args.first().and_then(|a| a.as_list()) else {
        return Err(CompileError::validation(
            form,
            "expected a name or a binding list",
            "symbol or list",
            args.first().map(|a| a.kind_name()).unwrap_or("nothing"),
        )
        .at(list.loc.clone()));
    };

    if bindings.items.len() % 2 != 0 {
        return Err(CompileError::validation(
            form,
            "binding list must hold name/value pairs",
            "an even number of items",
            bindings.items.len().to_string(),
        )
        .at(bindings.loc.clone()));
    }

    let mut statements = Vec::new();
    for pair in bindings.items.chunks(2) {
        let name = expect_symbol(form, &pair[0])?;
        let init = lower(ctx, &pair[1])?;
        statements.push(Hir::VarDecl {
            kind,
            declarators: vec![Declarator {
                name: crate::hir::sanitize_identifier(&name.name),
                init: Some(init),
            }],
        });
    }

    let mut body = Vec::new();
    for node in &args[1..] {
        body.push(lower(ctx, node)?);
    }
    statements.extend(Hir::function_body(body));

    Ok(Lowered::Node(iife(statements)))
}

#[special_form(name = "let", category = "Bindings", signature = "(let name value) | (let (bindings) body...)", related("var", "set!"))]
/// Immutable binding.
///
/// The two-element shape declares one constant; the binding-list shape
/// introduces a scope as an immediately-invoked function enclosing the
/// declarations and body.
///
/// # Examples
///
/// ```hql
/// (let x 10)
/// (let (a 1 b 2) (+ a b))
/// ```
///
/// # See Also
///
/// var, set!
pub fn lower_let(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    lower_binding_form(ctx, list, "let", DeclKind::Const)
}

#[special_form(name = "var", category = "Bindings", signature = "(var name value) | (var (bindings) body...)", related("let", "set!"))]
/// Mutable binding; same shapes as let but reassignable.
///
/// # Examples
///
/// ```hql
/// (var counter 0)
/// (set! counter (+ counter 1))
/// ```
pub fn lower_var(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    lower_binding_form(ctx, list, "var", DeclKind::Let)
}

#[special_form(name = "set!", category = "Bindings", signature = "(set! target value)", related("var"))]
/// Assignment to an existing binding or member target.
///
/// # Examples
///
/// ```hql
/// (set! counter 5)
/// ```
pub fn lower_set(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("set!", &list.items, 2, ARITY_TWO)?;
    let target = lower(ctx, &list.items[1])?;
    let value = lower(ctx, &list.items[2])?;
    Ok(Lowered::Node(Hir::assign(target, value)))
}

#[special_form(name = "return", category = "Control Flow", signature = "(return value)")]
/// Explicit return from the enclosing function.
pub fn lower_return(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("return", &list.items, 1, ARITY_ONE)?;
    let value = lower(ctx, &list.items[1])?;
    Ok(Lowered::Node(Hir::ret(value)))
}
