// ABOUTME: Call-site binding of named, defaulted, placeholder, and variadic arguments

use crate::ast::{Sexp, SourceLoc, Symbol};
use crate::error::CompileError;
use crate::hir::{Hir, ObjectProperty, PropertyKey};
use crate::lower::registry::FunctionSignature;
use crate::lower::{lower, lower_args, member_chain, LoweringCtx};

/// Lower `(f arg...)` where `f` is a plain symbol and no special-form rule
/// fired. Dispatches between named and positional binding.
pub fn lower_call(
    ctx: &mut LoweringCtx,
    head: &Symbol,
    args: &[Sexp],
) -> Result<Hir, CompileError> {
    // js/-namespaced callees are verbatim JS names
    if head.name.starts_with("js/") {
        let callee = crate::lower::lower_symbol(head);
        let args = lower_args(ctx, args)?;
        return Ok(Hir::call(callee, args));
    }

    // Dotted callees are property-access sugar; with arguments this is a
    // member call on the chain prefix
    if head.name.contains('.') && !head.name.starts_with('.') {
        return lower_member_call(ctx, head, args);
    }

    if let Some(named) = collect_named_args(head, args)? {
        return lower_named_call(ctx, head, &named);
    }

    lower_positional_call(ctx, head, args)
}

fn lower_member_call(
    ctx: &mut LoweringCtx,
    head: &Symbol,
    args: &[Sexp],
) -> Result<Hir, CompileError> {
    let Some((prefix, method)) = head.name.rsplit_once('.') else {
        let args = lower_args(ctx, args)?;
        return Ok(Hir::call(Hir::identifier(&head.name), args));
    };
    let object = member_chain(prefix);
    let args = lower_args(ctx, args)?;
    Ok(Hir::CallMember {
        object: Box::new(object),
        method: method.to_string(),
        args,
    })
}

// ============================================================================
// Named Calls
// ============================================================================

/// One `key: value` pair at a call site
struct NamedArg<'a> {
    name: String,
    key_loc: Option<SourceLoc>,
    value: &'a Sexp,
}

/// A symbol ending in `:` (and longer than the bare colon) is a named
/// argument key
fn is_named_key(node: &Sexp) -> Option<&Symbol> {
    node.as_symbol()
        .filter(|sym| sym.name.len() > 1 && sym.name.ends_with(':'))
}

/// Scan a call's arguments for named keys. Returns None for purely
/// positional calls; rejects calls mixing the two styles.
fn collect_named_args<'a>(
    head: &Symbol,
    args: &'a [Sexp],
) -> Result<Option<Vec<NamedArg<'a>>>, CompileError> {
    if !args.iter().any(|a| is_named_key(a).is_some()) {
        return Ok(None);
    }

    let mut named = Vec::new();
    let mut iter = args.iter();
    while let Some(item) = iter.next() {
        let Some(key) = is_named_key(item) else {
            return Err(CompileError::validation(
                &head.name,
                "cannot mix positional and named arguments",
                "all arguments in name: value form",
                item.kind_name(),
            )
            .at(item.loc().or(head.loc.as_ref()).cloned()));
        };
        let Some(value) = iter.next() else {
            return Err(CompileError::validation(
                &head.name,
                format!("named argument '{}' has no value", key.name),
                "a value after the key",
                "nothing",
            )
            .at(key.loc.clone()));
        };
        named.push(NamedArg {
            name: key.name.trim_end_matches(':').to_string(),
            key_loc: key.loc.clone(),
            value,
        });
    }

    Ok(Some(named))
}

fn lower_named_call(
    ctx: &mut LoweringCtx,
    head: &Symbol,
    named: &[NamedArg],
) -> Result<Hir, CompileError> {
    let Some(signature) = ctx.functions.lookup(&head.name).cloned() else {
        // Unregistered callee: collapse the pairs into one object argument
        let mut props = Vec::new();
        for arg in named {
            props.push(ObjectProperty {
                key: PropertyKey::Str(arg.name.clone()),
                value: lower(ctx, arg.value)?,
            });
        }
        return Ok(Hir::call(
            Hir::identifier(&head.name),
            vec![Hir::Object(props)],
        ));
    };

    // Registered callee: reorder to the declaration's parameter order
    let mut bound: Vec<Option<Hir>> = vec![None; signature.params.len()];
    for arg in named {
        let Some(index) = signature
            .params
            .iter()
            .position(|p| !p.rest && p.name == arg.name)
        else {
            return Err(CompileError::validation(
                &head.name,
                format!("unknown parameter '{}'", arg.name),
                format!("one of: {}", param_names(&signature)),
                arg.name.clone(),
            )
            .at(arg.key_loc.clone()));
        };
        if bound[index].is_some() {
            return Err(CompileError::validation(
                &head.name,
                format!("duplicate binding for parameter '{}'", arg.name),
                "each parameter bound once",
                "a repeated key",
            )
            .at(arg.key_loc.clone()));
        }

        let value = if arg.value.is_symbol("_") {
            default_for(&signature, index, &head.name, arg.value.loc(), true)?
        } else {
            lower(ctx, arg.value)?
        };
        bound[index] = Some(value);
    }

    let mut ordered = Vec::with_capacity(signature.params.len());
    for (index, slot) in bound.into_iter().enumerate() {
        if signature.params[index].rest {
            continue;
        }
        match slot {
            Some(value) => ordered.push(value),
            None => ordered.push(default_for(
                &signature,
                index,
                &head.name,
                head.loc.as_ref(),
                false,
            )?),
        }
    }

    Ok(Hir::call(Hir::identifier(&head.name), ordered))
}

// ============================================================================
// Positional Calls
// ============================================================================

fn lower_positional_call(
    ctx: &mut LoweringCtx,
    head: &Symbol,
    args: &[Sexp],
) -> Result<Hir, CompileError> {
    let Some(signature) = ctx.functions.lookup(&head.name).cloned() else {
        // Unknown callee: always a CallExpression. Whether a single
        // argument means "index into a collection" or "invoke a callable"
        // is resolved at runtime by get/getNumeric, never here.
        let callee = Hir::identifier(&head.name);
        let args = lower_args(ctx, args)?;
        return Ok(Hir::call(callee, args));
    };

    let fixed = signature.fixed_arity();

    if args.len() > fixed && !signature.is_variadic() {
        let extras: Vec<String> = args[fixed..].iter().map(|a| a.to_string()).collect();
        return Err(CompileError::validation(
            &head.name,
            format!("too many arguments: extra {}", extras.join(" ")),
            fixed.to_string(),
            args.len().to_string(),
        )
        .at(args[fixed].loc().cloned()));
    }

    let mut ordered = Vec::with_capacity(args.len().max(fixed));
    for index in 0..fixed {
        match args.get(index) {
            Some(arg) if arg.is_symbol("_") => {
                ordered.push(default_for(&signature, index, &head.name, arg.loc(), true)?);
            }
            Some(arg) => ordered.push(lower(ctx, arg)?),
            None => {
                let loc = args.first().and_then(|a| a.loc()).or(head.loc.as_ref());
                ordered.push(default_for(&signature, index, &head.name, loc, false)?);
            }
        }
    }

    // Variadic surplus passes through as extra positional arguments
    if args.len() > fixed {
        for arg in &args[fixed..] {
            ordered.push(lower(ctx, arg)?);
        }
    }

    Ok(Hir::call(Hir::identifier(&head.name), ordered))
}

// ============================================================================
// Shared Helpers
// ============================================================================

fn default_for(
    signature: &FunctionSignature,
    index: usize,
    context: &str,
    loc: Option<&SourceLoc>,
    via_placeholder: bool,
) -> Result<Hir, CompileError> {
    let param = &signature.params[index];
    match &param.default {
        Some(default) => Ok(default.clone()),
        None => {
            let message = if via_placeholder {
                format!(
                    "Placeholder used for parameter '{}' but no default value is defined",
                    param.name
                )
            } else {
                format!(
                    "Missing argument for parameter '{}' and no default value is defined",
                    param.name
                )
            };
            Err(CompileError::validation(
                context,
                message,
                "an argument or a declared default",
                "nothing",
            )
            .at(loc.cloned()))
        }
    }
}

fn param_names(signature: &FunctionSignature) -> String {
    signature
        .params
        .iter()
        .filter(|p| !p.rest)
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
