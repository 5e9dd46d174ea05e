// ABOUTME: AST-to-HIR lowering: dispatch table, compilation context, and the top-level driver
//
// Each reserved head symbol is handled by a transformer registered through
// the `#[special_form]` attribute (see hql-macros). Registrations are
// collected with inventory and frozen into a process-wide dispatch table on
// first use; all mutable lowering state (function registries, the loop
// context stack) lives in a per-compilation `LoweringCtx`.

pub mod calls;
pub mod forms;
pub mod registry;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::ast::{List, Sexp, Symbol};
use crate::error::CompileError;
use crate::hir::Hir;
use registry::FunctionRegistry;

// ============================================================================
// Form Registration
// ============================================================================

/// Result of lowering one form: a HIR node, or a signal that the form has
/// no runtime effect (macro definitions, bare import/export placeholders)
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Node(Hir),
    Skip,
}

pub type FormHandler = fn(&mut LoweringCtx, &List) -> Result<Lowered, CompileError>;

/// One dispatch-table entry, submitted via `#[special_form]` and collected
/// with inventory. The help fields feed the REPL documentation system.
pub struct FormRegistration {
    pub name: &'static str,
    pub category: &'static str,
    pub signature: &'static str,
    pub description: &'static str,
    pub examples: &'static [&'static str],
    pub related: &'static [&'static str],
    pub handler: FormHandler,
}

inventory::collect!(FormRegistration);

/// The head-symbol dispatch table. Built lazily on first use, immutable
/// afterwards, shared across compilations.
pub fn dispatch_table() -> &'static HashMap<&'static str, &'static FormRegistration> {
    static TABLE: OnceLock<HashMap<&'static str, &'static FormRegistration>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        for registration in inventory::iter::<FormRegistration> {
            table.insert(registration.name, registration);
        }
        table
    })
}

/// All registered forms, for the help system and the REPL highlighter
pub fn registered_forms() -> impl Iterator<Item = &'static FormRegistration> {
    inventory::iter::<FormRegistration>.into_iter()
}

// ============================================================================
// Lowering Context
// ============================================================================

/// Per-compilation mutable state. Created at the start of a program
/// lowering and discarded with it, so nothing leaks between compilations.
pub struct LoweringCtx {
    pub functions: FunctionRegistry,
    loop_stack: Vec<String>,
    loop_counter: u32,
}

impl Default for LoweringCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl LoweringCtx {
    pub fn new() -> Self {
        LoweringCtx {
            functions: FunctionRegistry::new(),
            loop_stack: Vec::new(),
            loop_counter: 0,
        }
    }

    /// Enter a `loop` form: synthesize a unique function name and push it
    pub fn push_loop(&mut self) -> String {
        let name = format!("loop_{}", self.loop_counter);
        self.loop_counter += 1;
        self.loop_stack.push(name.clone());
        name
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    /// The loop a `recur` in the current position must tail-call
    pub fn current_loop(&self) -> Option<&str> {
        self.loop_stack.last().map(|s| s.as_str())
    }

    pub fn in_loop(&self) -> bool {
        !self.loop_stack.is_empty()
    }
}

// ============================================================================
// Identifier Helpers
// ============================================================================

/// True when `name` can be emitted verbatim as a JS identifier
pub(crate) fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Lower a symbol into an expression, applying the identifier
/// post-processing rules:
/// - `_` is a value (the placeholder string), never an identifier
/// - `js/` prefixes mark verbatim JS names (`-` rewritten to `_`)
/// - dot-containing names are property-access sugar
/// - everything else is identifier-sanitized
pub fn lower_symbol(sym: &Symbol) -> Hir {
    let name = sym.name.as_str();

    if name == "_" {
        return Hir::Str("_".to_string());
    }

    if let Some(stripped) = name.strip_prefix("js/") {
        return Hir::js_identifier(stripped);
    }

    if name.contains('.') && !name.starts_with('.') {
        return member_chain(name);
    }

    Hir::identifier(name)
}

/// Build `Member(Member(obj, a), b)` from `obj.a.b`
pub(crate) fn member_chain(dotted: &str) -> Hir {
    let mut segments = dotted.split('.');
    let mut node = match segments.next() {
        Some(first) => Hir::identifier(first),
        None => Hir::identifier(dotted),
    };
    for segment in segments {
        node = Hir::member(node, Hir::identifier(segment), false);
    }
    node
}

// ============================================================================
// Dispatch
// ============================================================================

/// Lower one node to an expression-or-statement HIR node.
/// A `Skip` signal from a list form becomes Null.
pub fn lower(ctx: &mut LoweringCtx, node: &Sexp) -> Result<Hir, CompileError> {
    match node {
        Sexp::Null => Ok(Hir::Null),
        Sexp::Bool(b) => Ok(Hir::Bool(*b)),
        Sexp::Number(n) => Ok(Hir::Number(*n)),
        Sexp::Str(s) => Ok(Hir::Str(s.clone())),
        Sexp::Symbol(sym) => Ok(lower_symbol(sym)),
        Sexp::List(list) => match lower_list(ctx, list)? {
            Lowered::Node(hir) => Ok(hir),
            Lowered::Skip => Ok(Hir::Null),
        },
    }
}

/// Lower each node of an argument sequence
pub fn lower_args(ctx: &mut LoweringCtx, args: &[Sexp]) -> Result<Vec<Hir>, CompileError> {
    args.iter().map(|arg| lower(ctx, arg)).collect()
}

/// Lower a list form, following the dispatch order:
/// empty list, interop shortcut, dot-prefix method call, reserved head
/// symbol, nested-list head, then the standard call path.
pub fn lower_list(ctx: &mut LoweringCtx, list: &List) -> Result<Lowered, CompileError> {
    let items = &list.items;

    // 1. Empty list
    if items.is_empty() {
        return Ok(Lowered::Node(Hir::Array(Vec::new())));
    }

    // 2. Interop shortcut: (js-get-invoke obj prop)
    if items.len() == 3 && items[0].is_symbol("js-get-invoke") {
        let object = lower(ctx, &items[1])?;
        return Ok(Lowered::Node(forms::interop::get_invoke_member(
            ctx, object, &items[2],
        )?));
    }

    // 3. Dot-prefix method call: (.method receiver args...)
    if let Some(sym) = items[0].as_symbol() {
        if let Some(method) = sym.name.strip_prefix('.') {
            if !method.is_empty() {
                return lower_dot_call(ctx, sym, method, &items[1..]).map(Lowered::Node);
            }
        }
    }

    // 4. Head is a symbol
    if let Some(sym) = items[0].as_symbol() {
        // 4a. Macro-definition forms are expansion artifacts; skip them
        if sym.name == "macro" || sym.name == "defmacro" {
            return Ok(Lowered::Skip);
        }

        // 4b. Reserved forms
        if let Some(registration) = dispatch_table().get(sym.name.as_str()) {
            let result = (registration.handler)(ctx, list);
            return result.map_err(|e| {
                CompileError::transform_context(&format!("lowering ({} ...)", sym.name), e)
            });
        }

        // Standard call
        return calls::lower_call(ctx, sym, &items[1..]).map(Lowered::Node);
    }

    // 5. Head is a list (computed callee)
    if let Some(inner) = items[0].as_list() {
        return lower_nested_head(ctx, inner, &items[1..]).map(Lowered::Node);
    }

    // 6. Default: standard call on a lowered head
    let callee = lower(ctx, &items[0])?;
    let args = lower_args(ctx, &items[1..])?;
    Ok(Lowered::Node(Hir::call(callee, args)))
}

/// Dot-prefix method call (dispatch rule 3). With arguments this is a plain
/// member call; with none, the property may be a value or a bound method,
/// so the runtime-safe access form is emitted instead.
fn lower_dot_call(
    ctx: &mut LoweringCtx,
    head: &Symbol,
    method: &str,
    rest: &[Sexp],
) -> Result<Hir, CompileError> {
    if rest.is_empty() {
        return Err(CompileError::validation(
            "method call",
            format!("(.{} ...) needs a receiver", method),
            "a receiver expression",
            "nothing",
        )
        .at(head.loc.clone()));
    }

    let receiver = lower(ctx, &rest[0])?;
    let args = lower_args(ctx, &rest[1..])?;

    if args.is_empty() {
        return Ok(Hir::JsMethodAccess {
            object: Box::new(receiver),
            method: method.to_string(),
        });
    }

    Ok(Hir::call(
        Hir::member(receiver, Hir::identifier(method), false),
        args,
    ))
}

/// Nested-list head (a computed callee expression)
fn lower_nested_head(
    ctx: &mut LoweringCtx,
    inner: &List,
    rest: &[Sexp],
) -> Result<Hir, CompileError> {
    let inner_expr = lower(ctx, &Sexp::List(inner.clone()))?;

    if rest.is_empty() {
        return Ok(inner_expr);
    }

    if let Some(sym) = rest[0].as_symbol() {
        if let Some(method) = sym.name.strip_prefix('.') {
            if !method.is_empty() {
                let args = lower_args(ctx, &rest[1..])?;
                return Ok(Hir::call(
                    Hir::member(inner_expr, Hir::identifier(method), false),
                    args,
                ));
            }
        }

        if rest.len() == 1 {
            return Ok(Hir::member(inner_expr, Hir::identifier(&sym.name), false));
        }
    }

    let args = lower_args(ctx, rest)?;
    Ok(Hir::call(inner_expr, args))
}

// ============================================================================
// Program Lowering
// ============================================================================

/// A per-form failure collected during resilient program lowering
#[derive(Debug, Clone)]
pub struct LoweringWarning {
    pub form: String,
    pub error: CompileError,
}

impl std::fmt::Display for LoweringWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to lower {}: {}", self.form, self.error)
    }
}

/// Lower an array of top-level forms. A failure on one form is collected
/// rather than aborting; the lowering succeeds if at least one form
/// lowered. If every form failed, the first error is returned.
pub fn lower_program(
    ctx: &mut LoweringCtx,
    forms: &[Sexp],
) -> Result<(Vec<Hir>, Vec<LoweringWarning>), CompileError> {
    let mut lowered = Vec::new();
    let mut warnings = Vec::new();
    let mut first_error: Option<CompileError> = None;
    let mut attempted = 0usize;

    for form in forms {
        match form {
            Sexp::List(list) => {
                attempted += 1;
                match lower_list(ctx, list) {
                    Ok(Lowered::Node(hir)) => lowered.push(hir.into_statement()),
                    Ok(Lowered::Skip) => {}
                    Err(err) => {
                        if first_error.is_none() {
                            first_error = Some(err.clone());
                        }
                        warnings.push(LoweringWarning {
                            form: truncate_form(form),
                            error: err,
                        });
                    }
                }
            }
            other => {
                attempted += 1;
                match lower(ctx, other) {
                    Ok(hir) => lowered.push(hir.into_statement()),
                    Err(err) => {
                        if first_error.is_none() {
                            first_error = Some(err.clone());
                        }
                        warnings.push(LoweringWarning {
                            form: truncate_form(other),
                            error: err,
                        });
                    }
                }
            }
        }
    }

    if lowered.is_empty() && attempted > 0 {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    Ok((lowered, warnings))
}

fn truncate_form(form: &Sexp) -> String {
    let printed = form.to_string();
    if printed.chars().count() > 60 {
        let head: String = printed.chars().take(57).collect();
        format!("{}...", head)
    } else {
        printed
    }
}
