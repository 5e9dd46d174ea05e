// ABOUTME: Collection construction and data-access forms

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::{CompileError, ARITY_AT_LEAST_ONE, ARITY_TWO};
use crate::hir::{Hir, ObjectProperty, PropertyKey};
use crate::lower::forms::expect_arity;
use crate::lower::{lower, lower_args, Lowered, LoweringCtx};

#[special_form(name = "vector", category = "Collections", signature = "(vector items...) | [items...]", related("hash-map", "hash-set"))]
/// Array literal. Bracket syntax desugars to this form.
///
/// # Examples
///
/// ```hql
/// [1 2 3]
/// (vector "a" "b")
/// ```
pub fn lower_vector(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let elements = lower_args(ctx, &list.items[1..])?;
    Ok(Lowered::Node(Hir::Array(elements)))
}

/// Symbol and literal keys become string keys; anything else is a computed
/// key expression
fn lower_map_key(ctx: &mut LoweringCtx, key: &Sexp) -> Result<PropertyKey, CompileError> {
    match key {
        Sexp::Symbol(sym) => Ok(PropertyKey::Str(
            sym.name.trim_end_matches(':').to_string(),
        )),
        Sexp::Str(s) => Ok(PropertyKey::Str(s.clone())),
        Sexp::Null | Sexp::Bool(_) | Sexp::Number(_) => Ok(PropertyKey::Str(key.to_string())),
        Sexp::List(_) => Ok(PropertyKey::Computed(Box::new(lower(ctx, key)?))),
    }
}

#[special_form(name = "hash-map", category = "Collections", signature = "(hash-map k1 v1 k2 v2 ...)", related("vector", "empty-map"))]
/// Object literal from alternating keys and values.
///
/// # Examples
///
/// ```hql
/// (hash-map name: "hql" major 0)
/// ```
pub fn lower_hash_map(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    if args.len() % 2 != 0 {
        return Err(CompileError::validation(
            "hash-map",
            "expected alternating keys and values",
            "an even number of arguments",
            args.len().to_string(),
        )
        .at(list.loc.clone()));
    }

    let mut props = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks(2) {
        props.push(ObjectProperty {
            key: lower_map_key(ctx, &pair[0])?,
            value: lower(ctx, &pair[1])?,
        });
    }
    Ok(Lowered::Node(Hir::Object(props)))
}

#[special_form(name = "hash-set", category = "Collections", signature = "(hash-set items...)", related("empty-set"))]
/// Set literal; lowers to a Set constructed from an array.
///
/// # Examples
///
/// ```hql
/// (hash-set 1 2 3)
/// ```
pub fn lower_hash_set(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let elements = lower_args(ctx, &list.items[1..])?;
    Ok(Lowered::Node(Hir::New {
        callee: Box::new(Hir::identifier("Set")),
        args: vec![Hir::Array(elements)],
    }))
}

#[special_form(name = "empty-array", category = "Collections", signature = "(empty-array)", related("vector"))]
/// A fresh empty array.
pub fn lower_empty_array(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("empty-array", &list.items, 0, "0")?;
    Ok(Lowered::Node(Hir::Array(Vec::new())))
}

#[special_form(name = "empty-map", category = "Collections", signature = "(empty-map)", related("hash-map"))]
/// A fresh empty object.
pub fn lower_empty_map(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("empty-map", &list.items, 0, "0")?;
    Ok(Lowered::Node(Hir::Object(Vec::new())))
}

#[special_form(name = "empty-set", category = "Collections", signature = "(empty-set)", related("hash-set"))]
/// A fresh empty Set.
pub fn lower_empty_set(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("empty-set", &list.items, 0, "0")?;
    Ok(Lowered::Node(Hir::New {
        callee: Box::new(Hir::identifier("Set")),
        args: Vec::new(),
    }))
}

#[special_form(name = "get", category = "Data Access", signature = "(get obj key)", related("js-get"))]
/// Polymorphic read.
///
/// Lowers to a call of the runtime `get` helper, which decides at runtime
/// between indexing into a collection and invoking a callable. A literal
/// key may later be folded into direct element access.
///
/// # Examples
///
/// ```hql
/// (get user "name")
/// ```
pub fn lower_get(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    expect_arity("get", &list.items, 2, ARITY_TWO)?;
    let object = lower(ctx, &list.items[1])?;
    let key = lower(ctx, &list.items[2])?;
    Ok(Lowered::Node(Hir::call(
        Hir::identifier("get"),
        vec![object, key],
    )))
}

#[special_form(name = "new", category = "Collections", signature = "(new Ctor args...)", related("js-new"))]
/// Constructor invocation.
///
/// # Examples
///
/// ```hql
/// (new Date)
/// ```
pub fn lower_new(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let args = &list.items[1..];
    if args.is_empty() {
        return Err(CompileError::arity("new", ARITY_AT_LEAST_ONE, 0).at(list.loc.clone()));
    }
    let callee = lower(ctx, &args[0])?;
    let ctor_args = lower_args(ctx, &args[1..])?;
    Ok(Lowered::Node(Hir::New {
        callee: Box::new(callee),
        args: ctor_args,
    }))
}
