// ABOUTME: Arithmetic, comparison, and logical operator forms

use hql_macros::special_form;

use crate::ast::List;
use crate::error::{CompileError, ARITY_AT_LEAST_ONE, ARITY_AT_LEAST_TWO, ARITY_ONE, ARITY_TWO};
use crate::hir::{BinaryOp, Hir, UnaryOp};
use crate::lower::{lower, Lowered, LoweringCtx};

/// Fold `(op a b c)` into the left-associated chain `(a op b) op c`
fn fold_binary(
    ctx: &mut LoweringCtx,
    list: &List,
    op: BinaryOp,
) -> Result<Hir, CompileError> {
    let args = &list.items[1..];
    let mut chain = lower(ctx, &args[0])?;
    for arg in &args[1..] {
        chain = Hir::binary(op, chain, lower(ctx, arg)?);
    }
    Ok(chain)
}

fn variadic_arithmetic(
    ctx: &mut LoweringCtx,
    list: &List,
    name: &str,
    op: BinaryOp,
) -> Result<Lowered, CompileError> {
    let argc = list.items.len() - 1;
    if argc < 2 {
        return Err(CompileError::arity(name, ARITY_AT_LEAST_TWO, argc).at(list.loc.clone()));
    }
    fold_binary(ctx, list, op).map(Lowered::Node)
}

fn binary_pair(
    ctx: &mut LoweringCtx,
    list: &List,
    name: &str,
    op: BinaryOp,
) -> Result<Lowered, CompileError> {
    let argc = list.items.len() - 1;
    if argc != 2 {
        return Err(CompileError::arity(name, ARITY_TWO, argc).at(list.loc.clone()));
    }
    let left = lower(ctx, &list.items[1])?;
    let right = lower(ctx, &list.items[2])?;
    Ok(Lowered::Node(Hir::binary(op, left, right)))
}

fn logical(
    ctx: &mut LoweringCtx,
    list: &List,
    name: &str,
    op: BinaryOp,
) -> Result<Lowered, CompileError> {
    let argc = list.items.len() - 1;
    if argc == 0 {
        return Err(CompileError::arity(name, ARITY_AT_LEAST_ONE, argc).at(list.loc.clone()));
    }
    fold_binary(ctx, list, op).map(Lowered::Node)
}

// ============================================================================
// Arithmetic
// ============================================================================

#[special_form(name = "+", category = "Operators", signature = "(+ a b ...)", related("-", "*", "/"))]
/// Addition (or string concatenation, as in the target language).
///
/// With one argument yields the argument itself.
///
/// # Examples
///
/// ```hql
/// (+ 1 2 3)
/// ```
pub fn lower_add(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let argc = list.items.len() - 1;
    match argc {
        0 => Err(CompileError::arity("+", ARITY_AT_LEAST_ONE, 0).at(list.loc.clone())),
        1 => lower(ctx, &list.items[1]).map(Lowered::Node),
        _ => fold_binary(ctx, list, BinaryOp::Add).map(Lowered::Node),
    }
}

#[special_form(name = "-", category = "Operators", signature = "(- a b ...)", related("+", "*", "/"))]
/// Subtraction; with one argument, negation.
///
/// # Examples
///
/// ```hql
/// (- 10 3 2)
/// (- x)
/// ```
pub fn lower_sub(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let argc = list.items.len() - 1;
    match argc {
        0 => Err(CompileError::arity("-", ARITY_AT_LEAST_ONE, 0).at(list.loc.clone())),
        1 => {
            let operand = lower(ctx, &list.items[1])?;
            Ok(Lowered::Node(Hir::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(operand),
            }))
        }
        _ => fold_binary(ctx, list, BinaryOp::Sub).map(Lowered::Node),
    }
}

#[special_form(name = "*", category = "Operators", signature = "(* a b ...)", related("+", "-", "/"))]
/// Multiplication.
pub fn lower_mul(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    variadic_arithmetic(ctx, list, "*", BinaryOp::Mul)
}

#[special_form(name = "/", category = "Operators", signature = "(/ a b ...)", related("*", "%"))]
/// Division.
pub fn lower_div(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    variadic_arithmetic(ctx, list, "/", BinaryOp::Div)
}

#[special_form(name = "%", category = "Operators", signature = "(% a b)", related("/"))]
/// Remainder.
pub fn lower_mod(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, "%", BinaryOp::Mod)
}

// ============================================================================
// Comparison
// ============================================================================

#[special_form(name = "=", category = "Operators", signature = "(= a b)", related("!=", "<", ">"))]
/// Strict equality.
pub fn lower_eq(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, "=", BinaryOp::Eq)
}

#[special_form(name = "!=", category = "Operators", signature = "(!= a b)", related("="))]
/// Strict inequality.
pub fn lower_not_eq(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, "!=", BinaryOp::NotEq)
}

#[special_form(name = "<", category = "Operators", signature = "(< a b)", related("<=", ">"))]
/// Less than.
pub fn lower_lt(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, "<", BinaryOp::Lt)
}

#[special_form(name = "<=", category = "Operators", signature = "(<= a b)", related("<"))]
/// Less than or equal.
pub fn lower_lt_eq(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, "<=", BinaryOp::LtEq)
}

#[special_form(name = ">", category = "Operators", signature = "(> a b)", related(">=", "<"))]
/// Greater than.
pub fn lower_gt(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, ">", BinaryOp::Gt)
}

#[special_form(name = ">=", category = "Operators", signature = "(>= a b)", related(">"))]
/// Greater than or equal.
pub fn lower_gt_eq(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    binary_pair(ctx, list, ">=", BinaryOp::GtEq)
}

// ============================================================================
// Logic
// ============================================================================

#[special_form(name = "and", category = "Operators", signature = "(and a b ...)", related("or", "not"))]
/// Short-circuit conjunction.
pub fn lower_and(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    logical(ctx, list, "and", BinaryOp::And)
}

#[special_form(name = "or", category = "Operators", signature = "(or a b ...)", related("and", "not"))]
/// Short-circuit disjunction.
pub fn lower_or(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    logical(ctx, list, "or", BinaryOp::Or)
}

#[special_form(name = "not", category = "Operators", signature = "(not a)", related("and", "or"))]
/// Logical negation.
pub fn lower_not(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let argc = list.items.len() - 1;
    if argc != 1 {
        return Err(CompileError::arity("not", ARITY_ONE, argc).at(list.loc.clone()));
    }
    let operand = lower(ctx, &list.items[1])?;
    Ok(Lowered::Node(Hir::Unary {
        op: UnaryOp::Not,
        operand: Box::new(operand),
    }))
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
    fn test_addition_folds_left() {
        let hir = lower_one("(+ 1 2 3)").unwrap();
        match hir {
            Hir::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::Add);
                assert_eq!(*right, Hir::Number(3.0));
                assert!(matches!(*left, Hir::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("Expected binary chain, got {:?}", other),
        }
    }

    #[test]
    fn test_single_argument_shapes() {
        assert_eq!(lower_one("(+ x)").unwrap(), Hir::identifier("x"));
        assert_eq!(
            lower_one("(- x)").unwrap(),
            Hir::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(Hir::identifier("x")),
            }
        );
        assert!(lower_one("(* x)").is_err());
    }

    #[test]
    fn test_no_argument_arithmetic_is_rejected() {
        assert!(lower_one("(+)").is_err());
        assert!(lower_one("(*)").is_err());
    }

    #[test]
    fn test_equality_maps_to_strict_operators() {
        match lower_one("(= a b)").unwrap() {
            Hir::Binary { op, .. } => assert_eq!(op.js_symbol(), "==="),
            other => panic!("Expected binary, got {:?}", other),
        }
        match lower_one("(!= a b)").unwrap() {
            Hir::Binary { op, .. } => assert_eq!(op.js_symbol(), "!=="),
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_arity_is_exactly_two() {
        assert!(lower_one("(< 1 2 3)").is_err());
        assert!(lower_one("(< 1)").is_err());
    }

    #[test]
    fn test_logic_forms() {
        match lower_one("(and a b c)").unwrap() {
            Hir::Binary { op, .. } => assert_eq!(op, BinaryOp::And),
            other => panic!("Expected binary, got {:?}", other),
        }
        assert_eq!(lower_one("(or a)").unwrap(), Hir::identifier("a"));
        assert!(matches!(
            lower_one("(not x)").unwrap(),
            Hir::Unary { op: UnaryOp::Not, .. }
        ));
    }
}
