// ABOUTME: Enum declaration lowering: simple raw-value enums and associated-value enums

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::CompileError;
use crate::hir::{sanitize_identifier, EnumAssociatedValue, EnumCase, Hir};
use crate::lower::forms::expect_symbol;
use crate::lower::{lower, Lowered, LoweringCtx};

/// The declared raw type may ride on the enum name (`Name:Type`) or stand
/// alone as a bare token before the first case; both parse identically.
fn enum_header(list: &List) -> Result<(String, Option<String>, usize), CompileError> {
    let name_sym = expect_symbol("enum", list.items.get(1).unwrap_or(&Sexp::Null))?;

    if let Some((name, raw_type)) = name_sym.name.split_once(':') {
        return Ok((name.to_string(), Some(raw_type.to_string()), 2));
    }

    // Trailing bare type token: (enum Name Type (case ...) ...)
    if let Some(Sexp::Symbol(token)) = list.items.get(2) {
        return Ok((name_sym.name.clone(), Some(token.name.clone()), 3));
    }

    Ok((name_sym.name.clone(), None, 2))
}

/// Associated values are `name: Type` pairs (or compact `name:Type` tokens)
fn parse_associated_values(
    context: &str,
    tokens: &[Sexp],
) -> Result<Vec<EnumAssociatedValue>, CompileError> {
    let mut values = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let sym = expect_symbol(context, &tokens[index])?;

        if let Some(name) = sym.name.strip_suffix(':') {
            index += 1;
            let Some(ty_node) = tokens.get(index) else {
                return Err(CompileError::validation(
                    context,
                    format!("associated value '{}' is missing its type", name),
                    "a type name",
                    "nothing",
                )
                .at(sym.loc.clone()));
            };
            let ty = expect_symbol(context, ty_node)?;
            values.push(EnumAssociatedValue {
                name: name.to_string(),
                type_name: ty.name.clone(),
            });
        } else if let Some((name, ty)) = sym.name.split_once(':') {
            values.push(EnumAssociatedValue {
                name: name.to_string(),
                type_name: ty.to_string(),
            });
        } else {
            return Err(CompileError::validation(
                context,
                format!("expected 'name: Type', got '{}'", sym.name),
                "name: Type",
                sym.name.clone(),
            )
            .at(sym.loc.clone()));
        }
        index += 1;
    }

    Ok(values)
}

fn parse_case(ctx: &mut LoweringCtx, node: &Sexp) -> Result<EnumCase, CompileError> {
    let Some(case) = node.as_list() else {
        return Err(CompileError::validation(
            "enum",
            "expected a (case ...) form",
            "list",
            node.kind_name(),
        )
        .at(node.loc().cloned()));
    };
    if !case.items.first().is_some_and(|h| h.is_symbol("case")) {
        return Err(CompileError::validation(
            "enum",
            "enum members must start with case",
            "(case id ...)",
            case.items
                .first()
                .map(|h| h.to_string())
                .unwrap_or_default(),
        )
        .at(case.loc.clone()));
    }

    let id = expect_symbol("enum case", case.items.get(1).unwrap_or(&Sexp::Null))?;
    let rest = &case.items[2..];

    // A trailing-colon symbol marks an associated-value list
    let has_associated = rest.iter().any(|t| {
        t.as_symbol()
            .is_some_and(|s| s.name.contains(':'))
    });

    if has_associated {
        let values = parse_associated_values("enum case", rest)?;
        return Ok(EnumCase {
            id: sanitize_identifier(&id.name),
            raw_value: None,
            associated_values: Some(values),
        });
    }

    let raw_value = match rest {
        [] => None,
        [value] => Some(lower(ctx, value)?),
        _ => {
            return Err(CompileError::validation(
                "enum case",
                "a raw-value case takes a single value",
                "one value",
                rest.len().to_string(),
            )
            .at(case.loc.clone()))
        }
    };

    Ok(EnumCase {
        id: sanitize_identifier(&id.name),
        raw_value,
        associated_values: None,
    })
}

#[special_form(name = "enum", category = "Enums", signature = "(enum Name:Type? (case id value?)... )", related("class"))]
/// Enum declaration.
///
/// Without associated values the cases freeze into a plain object; with
/// them the enum becomes a class of tagged factory constructors.
///
/// # Examples
///
/// ```hql
/// (enum Status:Int (case ok 200) (case err 500))
/// (enum Result (case ok value: Any) (case err message: String))
/// ```
pub fn lower_enum(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let (name, raw_type, cases_start) = enum_header(list)?;

    let mut cases = Vec::new();
    for node in &list.items[cases_start..] {
        cases.push(parse_case(ctx, node)?);
    }

    Ok(Lowered::Node(Hir::EnumDecl {
        name: sanitize_identifier(&name),
        raw_type,
        cases,
    }))
}
