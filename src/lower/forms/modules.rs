// ABOUTME: Surface import/export forms

use hql_macros::special_form;

use crate::ast::{List, Sexp};
use crate::error::CompileError;
use crate::hir::{sanitize_identifier, ExportSpec, Hir, ImportSpec};
use crate::lower::{Lowered, LoweringCtx};

/// Debug-level note for import/export shapes that are consumed elsewhere.
/// Kept behind HQL_DEBUG so normal runs stay quiet.
fn debug_skip(form: &str, list: &List) {
    if std::env::var_os("HQL_DEBUG").is_some() {
        eprintln!("hql: skipping {} form without a known shape: {}", form, Sexp::List(list.clone()));
    }
}

/// Parse `[a b as c ...]` (already desugared to a vector list) into
/// imported/local or local/exported name pairs
fn parse_alias_vector(
    context: &str,
    vector: &List,
) -> Result<Vec<(String, String)>, CompileError> {
    let mut specs = Vec::new();
    // Skip the synthetic `vector` head
    let mut index = 1;
    let items = &vector.items;

    while index < items.len() {
        let Some(name) = items[index].as_symbol() else {
            return Err(CompileError::Import {
                message: format!(
                    "{}: expected a symbol in the binding vector, got {}",
                    context,
                    items[index].kind_name()
                ),
                location: items[index].loc().cloned(),
            });
        };

        // `name as alias`
        if items.get(index + 1).is_some_and(|n| n.is_symbol("as")) {
            let Some(alias) = items.get(index + 2).and_then(|n| n.as_symbol()) else {
                return Err(CompileError::Import {
                    message: format!("{}: 'as' must be followed by a name", context),
                    location: name.loc.clone(),
                });
            };
            specs.push((name.name.clone(), alias.name.clone()));
            index += 3;
        } else {
            specs.push((name.name.clone(), name.name.clone()));
            index += 1;
        }
    }

    Ok(specs)
}

fn source_path(context: &str, node: Option<&Sexp>) -> Result<String, CompileError> {
    match node {
        Some(Sexp::Str(path)) => Ok(path.clone()),
        other => Err(CompileError::Import {
            message: format!(
                "{}: expected a string module path, got {}",
                context,
                other.map(|n| n.kind_name()).unwrap_or("nothing")
            ),
            location: other.and_then(|n| n.loc()).cloned(),
        }),
    }
}

#[special_form(name = "import", category = "Modules", signature = "(import [names] from \"path\") | (import name from \"path\")", related("export", "js-import"))]
/// Module import.
///
/// The vector form binds named exports (with optional `as` aliases); the
/// symbol form binds the whole module to a namespace name. Any other shape
/// is consumed by the module loader before lowering and skipped here.
///
/// # Examples
///
/// ```hql
/// (import [join dirname as dir] from "node:path")
/// (import utils from "./utils.hql")
/// ```
///
/// # See Also
///
/// export, js-import
pub fn lower_import(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let items = &list.items;

    // Vector form: (import [a b as c] from "path")
    if let Some(vector) = items.get(1).and_then(|n| n.as_list()) {
        if vector.items.first().is_some_and(|h| h.is_symbol("vector"))
            && items.get(2).is_some_and(|n| n.is_symbol("from"))
        {
            let source = source_path("import", items.get(3))?;
            let specifiers = parse_alias_vector("import", vector)?
                .into_iter()
                .map(|(imported, local)| ImportSpec {
                    imported,
                    local: sanitize_identifier(&local),
                })
                .collect();
            return Ok(Lowered::Node(Hir::ImportDecl { specifiers, source }));
        }
    }

    // Namespace form: (import name from "path")
    if let Some(name) = items.get(1).and_then(|n| n.as_symbol()) {
        if items.get(2).is_some_and(|n| n.is_symbol("from")) {
            let source = source_path("import", items.get(3))?;
            return Ok(Lowered::Node(Hir::JsImportRef {
                name: sanitize_identifier(&name.name),
                source,
            }));
        }
    }

    debug_skip("import", list);
    Ok(Lowered::Skip)
}

#[special_form(name = "export", category = "Modules", signature = "(export [names])", related("import", "js-export"))]
/// Named export of existing bindings, with optional `as` aliases.
///
/// Shapes other than the vector form are consumed by the module loader and
/// skipped here.
///
/// # Examples
///
/// ```hql
/// (export [parse compile as translate])
/// ```
pub fn lower_export(_ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    if let Some(vector) = list.items.get(1).and_then(|n| n.as_list()) {
        if vector.items.first().is_some_and(|h| h.is_symbol("vector")) {
            let specifiers = parse_alias_vector("export", vector)?
                .into_iter()
                .map(|(local, exported)| ExportSpec {
                    local: sanitize_identifier(&local),
                    exported,
                })
                .collect();
            return Ok(Lowered::Node(Hir::ExportNamed { specifiers }));
        }
    }

    debug_skip("export", list);
    Ok(Lowered::Skip)
}
