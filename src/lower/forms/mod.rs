// ABOUTME: Special-form transformers, grouped by category
//
// Each submodule defines `#[special_form]`-annotated transformer functions;
// the attribute submits an inventory registration that lands the form in the
// dispatch table together with its help entry.

pub mod classes;
pub mod collections;
pub mod core;
pub mod enums;
pub mod functions;
pub mod interop;
pub mod loops;
pub mod modules;
pub mod operators;

use crate::ast::{Sexp, Symbol};
use crate::error::CompileError;
use crate::hir::Hir;

/// Wrap a shaped statement body in an immediately-invoked function
/// expression
pub(crate) fn iife(body: Vec<Hir>) -> Hir {
    Hir::call(
        Hir::FunctionExpr {
            params: Vec::new(),
            body,
        },
        Vec::new(),
    )
}

/// Require a node to be a symbol, with a uniform error shape
pub(crate) fn expect_symbol<'a>(
    context: &str,
    node: &'a Sexp,
) -> Result<&'a Symbol, CompileError> {
    node.as_symbol().ok_or_else(|| {
        CompileError::validation(context, "expected a symbol", "symbol", node.kind_name())
            .at(node.loc().cloned())
    })
}

/// Require a form to carry exactly `expected` arguments after the head
pub(crate) fn expect_arity(
    context: &str,
    items: &[Sexp],
    expected: usize,
    expected_label: &str,
) -> Result<(), CompileError> {
    let actual = items.len() - 1;
    if actual != expected {
        return Err(CompileError::arity(context, expected_label, actual)
            .at(items.first().and_then(|h| h.loc()).cloned()));
    }
    Ok(())
}
