// ABOUTME: Verbatim JS-interop forms and runtime-safe member access

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::{CompileError, ARITY_AT_LEAST_ONE, ARITY_AT_LEAST_TWO, ARITY_THREE, ARITY_TWO};
use crate::hir::Hir;
use crate::lower::forms::{expect_arity, expect_symbol};
use crate::lower::{is_js_identifier, lower, lower_args, Lowered, LoweringCtx};

/// Member access for `(js-get-invoke obj prop)`.
///
/// A bare-identifier property (symbol or string) gets direct dot access; a
/// non-identifier literal gets computed access; a dynamic key keeps the
/// runtime typeof choice between bound method and plain value.
pub(crate) fn get_invoke_member(
    ctx: &mut LoweringCtx,
    object: Hir,
    prop: &Sexp,
) -> Result<Hir, CompileError> {
    match prop {
        Sexp::Str(s) if is_js_identifier(s) => {
            Ok(Hir::member(object, Hir::identifier(s), false))
        }
        Sexp::Symbol(sym) if is_js_identifier(&sym.name) => {
            Ok(Hir::member(object, Hir::identifier(&sym.name), false))
        }
        Sexp::Str(s) => Ok(Hir::member(object, Hir::Str(s.clone()), true)),
        Sexp::Number(n) => Ok(Hir::member(object, Hir::Number(*n), true)),
        other => {
            let property = lower(ctx, other)?;
            Ok(Hir::InteropIIFE {
                object: Box::new(object),
                property: Box::new(property),
            })
        }
    }
}

/// A property operand may be a string literal or a bare symbol; anything
/// else is lowered as a computed key expression
fn lower_property_key(ctx: &mut LoweringCtx, node: &Sexp) -> Result<Hir, CompileError> {
    match node {
        Sexp::Str(s) => Ok(Hir::Str(s.clone())),
        Sexp::Symbol(sym) => Ok(Hir::Str(sym.name.clone())),
        other => lower(ctx, other),
    }
}

fn method_name(context: &str, node: &Sexp) -> Result<String, CompileError> {
    match node {
        Sexp::Str(s) => Ok(s.clone()),
        Sexp::Symbol(sym) => Ok(sym.name.clone()),
        other => Err(CompileError::validation(
            context,
            "method name must be a symbol or string",
            "symbol or string",
            other.kind_name(),
        )
        .at(other.loc().cloned())),
    }
}

// ============================================================================
// Import / Export
// ============================================================================

#[special_form(name = "js-import", category = "JS Interop", signature = "(js-import name \"path\")", related("import", "js-export"))]
/// Namespace import binding a module object to a name.
///
/// # Examples
///
/// ```hql
/// (js-import path "node:path")
/// ```
pub fn lower_js_import(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("js-import", &list.items, 2, ARITY_TWO)?;
    let name = expect_symbol("js-import", &list.items[1])?;
    let Sexp::Str(source) = &list.items[2] else {
        return Err(CompileError::Import {
            message: format!(
                "js-import source must be a string, got {}",
                list.items[2].kind_name()
            ),
            location: list.loc.clone(),
        });
    };
    Ok(Lowered::Node(Hir::JsImportRef {
        name: crate::hir::sanitize_identifier(&name.name),
        source: source.clone(),
    }))
}

#[special_form(name = "js-export", category = "JS Interop", signature = "(js-export \"name\" value)", related("export", "js-import"))]
/// Export a value under a name.
///
/// # Examples
///
/// ```hql
/// (js-export "version" version)
/// ```
pub fn lower_js_export(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("js-export", &list.items, 2, ARITY_TWO)?;
    let name = method_name("js-export", &list.items[1])?;
    let value = lower(ctx, &list.items[2])?;
    Ok(Lowered::Node(Hir::ExportVarDecl {
        name: crate::hir::sanitize_identifier(&name),
        value: Box::new(value),
    }))
}

// ============================================================================
// Object Construction and Access
// ============================================================================

#[special_form(name = "js-new", category = "JS Interop", signature = "(js-new Ctor args...)", related("new"))]
/// Constructor invocation on a verbatim JS constructor.
pub fn lower_js_new(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    if args.is_empty() {
        return Err(CompileError::arity("js-new", ARITY_AT_LEAST_ONE, 0).at(list.loc.clone()));
    }
    let callee = lower(ctx, &args[0])?;
    let ctor_args = lower_args(ctx, &args[1..])?;
    Ok(Lowered::Node(Hir::New {
        callee: Box::new(callee),
        args: ctor_args,
    }))
}

#[special_form(name = "js-get", category = "JS Interop", signature = "(js-get obj prop)", related("js-set", "get"))]
/// Computed property read.
///
/// # Examples
///
/// ```hql
/// (js-get config "port")
/// ```
pub fn lower_js_get(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("js-get", &list.items, 2, ARITY_TWO)?;
    let object = lower(ctx, &list.items[1])?;
    let key = lower_property_key(ctx, &list.items[2])?;
    Ok(Lowered::Node(Hir::member(object, key, true)))
}

#[special_form(name = "js-set", category = "JS Interop", signature = "(js-set obj prop value)", related("js-get"))]
/// Computed property write.
///
/// # Examples
///
/// ```hql
/// (js-set config "port" 8080)
/// ```
pub fn lower_js_set(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("js-set", &list.items, 3, ARITY_THREE)?;
    let object = lower(ctx, &list.items[1])?;
    let key = lower_property_key(ctx, &list.items[2])?;
    let value = lower(ctx, &list.items[3])?;
    Ok(Lowered::Node(Hir::assign(
        Hir::member(object, key, true),
        value,
    )))
}

#[special_form(name = "js-call", category = "JS Interop", signature = "(js-call obj method args...)", related("method-call"))]
/// Direct method invocation.
///
/// # Examples
///
/// ```hql
/// (js-call console "log" "ready")
/// ```
pub fn lower_js_call(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    if args.len() < 2 {
        return Err(
            CompileError::arity("js-call", ARITY_AT_LEAST_TWO, args.len()).at(list.loc.clone())
        );
    }
    let object = lower(ctx, &args[0])?;
    let method = method_name("js-call", &args[1])?;
    let call_args = lower_args(ctx, &args[2..])?;
    Ok(Lowered::Node(Hir::CallMember {
        object: Box::new(object),
        method,
        args: call_args,
    }))
}

#[special_form(name = "js-get-invoke", category = "JS Interop", signature = "(js-get-invoke obj prop)", related("js-get", "method-call"))]
/// Property access that may resolve to a bound method.
///
/// A literal property becomes plain member access; a dynamic property keeps
/// a runtime typeof choice between calling and reading.
pub fn lower_js_get_invoke(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("js-get-invoke", &list.items, 2, ARITY_TWO)?;
    let object = lower(ctx, &list.items[1])?;
    get_invoke_member(ctx, object, &list.items[2]).map(Lowered::Node)
}

#[special_form(name = "method-call", category = "JS Interop", signature = "(method-call obj method args...)", related("js-call"))]
/// Runtime-safe method invocation.
///
/// Looks the method up on the receiver at runtime and either calls it bound
/// to the receiver or yields the property value when it is not callable.
pub fn lower_method_call(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    if args.len() < 2 {
        return Err(CompileError::arity("method-call", ARITY_AT_LEAST_TWO, args.len())
            .at(list.loc.clone()));
    }
    let object = lower(ctx, &args[0])?;
    let method = method_name("method-call", &args[1])?;
    let call_args = lower_args(ctx, &args[2..])?;
    Ok(Lowered::Node(Hir::GetAndCall {
        object: Box::new(object),
        method,
        args: call_args,
    }))
}
