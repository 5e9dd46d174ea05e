// ABOUTME: Tail-recursive loop encoding: loop and recur forms

use hql_macros::special_form;

use crate::ast::List;
use crate::error::CompileError;
use crate::hir::{sanitize_identifier, Hir, Param};
use crate::lower::forms::{expect_symbol, iife};
use crate::lower::{lower, lower_args, Lowered, LoweringCtx};

/// Force the terminal position of a control path to be a return.
/// `recur` has already lowered to `return loop_N(...)`, so it passes
/// through; conditionals get both arms rewritten (a missing else becomes
/// `return null`); plain expressions are wrapped.
fn ensure_terminal(node: Hir) -> Hir {
    match node {
        ret @ Hir::Return(_) => ret,
        Hir::If {
            test,
            consequent,
            alternate,
        } => Hir::If {
            test,
            consequent: Box::new(ensure_terminal(*consequent)),
            alternate: Some(Box::new(match alternate {
                Some(alt) => ensure_terminal(*alt),
                None => Hir::ret(Hir::Null),
            })),
        },
        Hir::Conditional {
            test,
            consequent,
            alternate,
        } => Hir::If {
            test,
            consequent: Box::new(ensure_terminal(*consequent)),
            alternate: Some(Box::new(ensure_terminal(*alternate))),
        },
        Hir::Block(mut statements) => {
            if let Some(last) = statements.pop() {
                statements.push(ensure_terminal(last));
            }
            Hir::Block(statements)
        }
        Hir::ExprStmt(expr) => ensure_terminal(*expr),
        stmt if stmt.is_statement() => {
            Hir::Block(vec![stmt, Hir::ret(Hir::Null)])
        }
        expr => Hir::ret(expr),
    }
}

#[special_form(name = "loop", category = "Loops", signature = "(loop (bindings) body...)", related("recur"))]
/// Tail-recursive loop over rebindable loop variables.
///
/// Lowers to an immediately-invoked function declaring a synthesized inner
/// function; recur tail-calls it with the next iteration's values. Every
/// control path of the body ends in a return or a recur.
///
/// # Examples
///
/// ```hql
/// (loop (i 0)
///   (if (< i 3)
///     (recur (+ i 1))
///     i))
/// ```
///
/// # See Also
///
/// recur
pub fn lower_loop(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let Some(bindings) = list.items.get(1).and_then(|n| n.as_list()) else {
        return Err(CompileError::validation(
            "loop",
            "expected a binding list",
            "list",
            list.items
                .get(1)
                .map(|n| n.kind_name())
                .unwrap_or("nothing"),
        )
        .at(list.loc.clone()));
    };

    if bindings.items.len() % 2 != 0 {
        return Err(CompileError::validation(
            "loop",
            "binding list must hold name/value pairs",
            "an even number of items",
            bindings.items.len().to_string(),
        )
        .at(bindings.loc.clone()));
    }

    // Initial argument values are lowered outside the loop context
    let mut params = Vec::new();
    let mut init_args = Vec::new();
    for pair in bindings.items.chunks(2) {
        let name = expect_symbol("loop", &pair[0])?;
        params.push(Param::simple(sanitize_identifier(&name.name)));
        init_args.push(lower(ctx, &pair[1])?);
    }

    let loop_name = ctx.push_loop();
    let mut body = Vec::new();
    let mut body_result: Result<(), CompileError> = Ok(());
    for node in &list.items[2..] {
        match lower(ctx, node) {
            Ok(hir) => body.push(hir),
            Err(err) => {
                body_result = Err(err);
                break;
            }
        }
    }
    ctx.pop_loop();
    body_result?;

    let shaped = match body.pop() {
        Some(last) => {
            let mut statements: Vec<Hir> =
                body.into_iter().map(Hir::into_statement).collect();
            statements.push(ensure_terminal(last));
            statements
        }
        None => vec![Hir::ret(Hir::Null)],
    };

    let inner = Hir::FunctionDecl {
        name: loop_name.clone(),
        params,
        body: shaped,
    };
    let kickoff = Hir::ret(Hir::call(Hir::identifier(&loop_name), init_args));

    Ok(Lowered::Node(iife(vec![inner, kickoff])))
}

#[special_form(name = "recur", category = "Loops", signature = "(recur values...)", related("loop"))]
/// Rebind the enclosing loop's variables and continue from its top.
///
/// Only valid inside a loop body; lowers to a return of a tail call to the
/// synthesized loop function.
///
/// # See Also
///
/// loop
pub fn lower_recur(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let Some(target) = ctx.current_loop().map(str::to_string) else {
        return Err(CompileError::validation(
            "recur",
            "recur used outside any loop",
            "an enclosing (loop ...) form",
            "top level",
        )
        .at(list.loc.clone()));
    };

    let args = lower_args(ctx, &list.items[1..])?;
    Ok(Lowered::Node(Hir::ret(Hir::call(
        Hir::identifier(&target),
        args,
    ))))
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

    /// Dig the synthesized loop function out of the IIFE
    fn loop_parts(hir: Hir) -> (String, Vec<Param>, Vec<Hir>, Hir) {
        let Hir::Call { callee, .. } = hir else {
            panic!("Expected IIFE call");
        };
        let Hir::FunctionExpr { body, .. } = *callee else {
            panic!("Expected IIFE function");
        };
        let mut body = body.into_iter();
        let Some(Hir::FunctionDecl {
            name,
            params,
            body: loop_body,
        }) = body.next()
        else {
            panic!("Expected inner loop function");
        };
        let kickoff = body.next().expect("Expected kickoff return");
        (name, params, loop_body, kickoff)
    }

    #[test]
    fn test_loop_with_if_terminal() {
        let hir = lower_one("(loop (i 0) (if (< i 3) (recur (+ i 1)) i))").unwrap();
        let (name, params, body, kickoff) = loop_parts(hir);

        assert_eq!(name, "loop_0");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "i");

        // Both arms of the terminal if end in a return
        match &body[0] {
            Hir::If {
                consequent,
                alternate,
                ..
            } => {
                assert!(matches!(**consequent, Hir::Return(_)));
                assert!(matches!(
                    alternate.as_deref(),
                    Some(Hir::Return(_))
                ));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }

        match kickoff {
            Hir::Return(value) => match *value {
                Hir::Call { args, .. } => assert_eq!(args, vec![Hir::Number(0.0)]),
                other => panic!("Expected kickoff call, got {:?}", other),
            },
            other => panic!("Expected return, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_else_returns_null() {
        let hir = lower_one("(loop (i 0) (if (< i 3) (recur (+ i 1))))").unwrap();
        let (_, _, body, _) = loop_parts(hir);
        match &body[0] {
            Hir::If { alternate, .. } => {
                assert_eq!(alternate.as_deref(), Some(&Hir::ret(Hir::Null)));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_binding_loop() {
        let hir = lower_one("(loop () (if done (return 1) (recur)))").unwrap();
        let (_, params, _, _) = loop_parts(hir);
        assert!(params.is_empty());
    }

    #[test]
    fn test_plain_terminal_expression_is_returned() {
        let hir = lower_one("(loop (i 0) i)").unwrap();
        let (_, _, body, _) = loop_parts(hir);
        assert_eq!(body, vec![Hir::ret(Hir::identifier("i"))]);
    }

    #[test]
    fn test_recur_outside_loop_is_rejected() {
        let err = lower_one("(recur 1)").unwrap_err();
        assert!(err.to_string().contains("outside any loop"));
    }

    #[test]
    fn test_nested_loops_get_distinct_names() {
        let hir = lower_one("(loop (i 0) (loop (j 0) (recur (+ j 1))) (recur (+ i 1)))").unwrap();
        let (outer_name, _, body, _) = loop_parts(hir);
        assert_eq!(outer_name, "loop_0");

        // The inner loop is a statement before the terminal recur
        let inner = body
            .iter()
            .find_map(|stmt| match stmt {
                Hir::ExprStmt(expr) => Some((**expr).clone()),
                _ => None,
            })
            .expect("inner loop statement");
        let (inner_name, _, _, _) = loop_parts(inner);
        assert_eq!(inner_name, "loop_1");
    }
}
