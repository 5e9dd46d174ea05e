// ABOUTME: HIR to JavaScript AST conversion
//
// Structural, one variant per target node, with a handful of synthesized
// shapes: interop IIFEs for runtime method/property choice, the fx calling
// convention (rest-args with named-object support and the purity clone),
// enum objects and classes, and remote-import namespace bindings.

use crate::error::CompileError;
use crate::hir::{
    ClassConstructor, ClassField, ClassMethod, DeclKind, EnumCase, Hir, Param, PropertyKey,
};
use crate::js_ast::{
    JsClass, JsClassMember, JsExpr, JsParam, JsPropKey, JsProperty, JsStmt, MemberProp,
};

/// Types whose fx parameters never need the purity clone
const PRIMITIVE_TYPES: [&str; 4] = ["Int", "Double", "String", "Bool"];

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Rewrite `get(obj, "k")` / `get(obj, 3)` into direct element access
    pub fold_literal_get: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            fold_literal_get: true,
        }
    }
}

pub struct Codegen {
    options: CodegenOptions,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Codegen {
            options: CodegenOptions::default(),
        }
    }

    pub fn with_options(options: CodegenOptions) -> Self {
        Codegen { options }
    }

    /// Convert a lowered top-level program into target statements
    pub fn module(&self, nodes: &[Hir]) -> Result<Vec<JsStmt>, CompileError> {
        self.block(nodes)
            .map_err(|e| CompileError::codegen_context("converting module", e))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Convert a statement sequence, dropping placeholder reads that can
    /// never be observed
    fn block(&self, nodes: &[Hir]) -> Result<Vec<JsStmt>, CompileError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            if is_discarded_stmt(node) {
                continue;
            }
            self.emit_stmt(node, &mut out)?;
        }
        Ok(out)
    }

    /// A statement-position HIR node as a statement list (If branches take
    /// lists on the target side)
    fn stmt_block(&self, node: &Hir) -> Result<Vec<JsStmt>, CompileError> {
        match node {
            Hir::Block(statements) => self.block(statements),
            other => {
                let mut out = Vec::with_capacity(1);
                self.emit_stmt(other, &mut out)?;
                Ok(out)
            }
        }
    }

    fn emit_stmt(&self, node: &Hir, out: &mut Vec<JsStmt>) -> Result<(), CompileError> {
        match node {
            Hir::ExprStmt(expr) => out.push(JsStmt::Expr(self.expr(expr)?)),
            Hir::VarDecl { kind, declarators } => {
                let mut decls = Vec::with_capacity(declarators.len());
                for declarator in declarators {
                    let init = declarator
                        .init
                        .as_ref()
                        .map(|init| self.expr(init))
                        .transpose()?;
                    decls.push((declarator.name.clone(), init));
                }
                out.push(JsStmt::VarDecl {
                    kind: kind.keyword(),
                    declarators: decls,
                });
            }
            Hir::Block(statements) => out.push(JsStmt::Block(self.block(statements)?)),
            Hir::If {
                test,
                consequent,
                alternate,
            } => {
                let alternate = match alternate {
                    Some(alt) => Some(self.stmt_block(alt)?),
                    None => None,
                };
                out.push(JsStmt::If {
                    test: self.expr(test)?,
                    consequent: self.stmt_block(consequent)?,
                    alternate,
                });
            }
            Hir::Return(value) => out.push(JsStmt::Return(Some(self.expr(value)?))),
            Hir::FunctionDecl { name, params, body } | Hir::FnDecl { name, params, body } => {
                out.push(JsStmt::FunctionDecl {
                    name: name.clone(),
                    params: self.params(params)?,
                    body: self.block(body)?,
                });
            }
            Hir::FxDecl {
                name, params, body, ..
            } => out.push(self.fx_function(name, params, body)?),
            Hir::ClassDecl {
                name,
                fields,
                constructor,
                methods,
            } => out.push(JsStmt::ClassDecl(self.class_decl(
                name,
                fields,
                constructor.as_ref(),
                methods,
            )?)),
            Hir::EnumDecl {
                name,
                raw_type,
                cases,
            } => self.enum_decl(name, raw_type.as_deref(), cases, out)?,
            Hir::ImportDecl { specifiers, source } => {
                if is_remote_specifier(source) {
                    // Remote modules may lack static named exports; bind a
                    // namespace and read the names off it
                    let ns = module_identifier(source);
                    out.push(JsStmt::ImportStar {
                        name: ns.clone(),
                        source: source.clone(),
                    });
                    for spec in specifiers {
                        out.push(JsStmt::const_decl(
                            spec.local.clone(),
                            member_by_name(JsExpr::ident(ns.clone()), &spec.imported),
                        ));
                    }
                } else {
                    out.push(JsStmt::ImportNamed {
                        specifiers: specifiers
                            .iter()
                            .map(|s| (s.imported.clone(), s.local.clone()))
                            .collect(),
                        source: source.clone(),
                    });
                }
            }
            Hir::JsImportRef { name, source } => out.push(JsStmt::ImportDefault {
                name: name.clone(),
                source: source.clone(),
            }),
            Hir::ExportNamed { specifiers } => out.push(JsStmt::ExportNamed {
                specifiers: specifiers
                    .iter()
                    .map(|s| (s.local.clone(), s.exported.clone()))
                    .collect(),
            }),
            Hir::ExportVarDecl { name, value } => out.push(JsStmt::ExportDecl(Box::new(
                JsStmt::const_decl(name.clone(), self.expr(value)?),
            ))),
            Hir::CommentBlock(text) => out.push(JsStmt::Comment(text.clone())),
            Hir::Raw(text) => out.push(JsStmt::Raw(text.clone())),
            // Defensive: an expression in statement position
            expr => out.push(JsStmt::Expr(self.expr(expr)?)),
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn expr(&self, node: &Hir) -> Result<JsExpr, CompileError> {
        match node {
            Hir::Null => Ok(JsExpr::Null),
            Hir::Bool(b) => Ok(JsExpr::Bool(*b)),
            Hir::Number(n) => {
                // A parsed negative literal round-trips through an explicit
                // prefix minus
                if *n < 0.0 {
                    Ok(JsExpr::Unary {
                        op: "-",
                        operand: Box::new(JsExpr::Number(-n)),
                    })
                } else {
                    Ok(JsExpr::Number(*n))
                }
            }
            Hir::Str(s) => Ok(JsExpr::Str(s.clone())),
            Hir::Identifier { name, .. } => Ok(JsExpr::Ident(name.clone())),
            Hir::Array(items) => Ok(JsExpr::Array(
                items.iter().map(|i| self.expr(i)).collect::<Result<_, _>>()?,
            )),
            Hir::Object(props) => {
                let mut out = Vec::with_capacity(props.len());
                for prop in props {
                    let key = match &prop.key {
                        PropertyKey::Str(s) if is_identifier(s) => JsPropKey::Ident(s.clone()),
                        PropertyKey::Str(s) => JsPropKey::Str(s.clone()),
                        PropertyKey::Computed(expr) => JsPropKey::Computed(self.expr(expr)?),
                    };
                    out.push(JsProperty {
                        key,
                        value: self.expr(&prop.value)?,
                    });
                }
                Ok(JsExpr::Object(out))
            }
            Hir::New { callee, args } => Ok(JsExpr::New {
                callee: Box::new(self.expr(callee)?),
                args: args.iter().map(|a| self.expr(a)).collect::<Result<_, _>>()?,
            }),
            Hir::Member {
                object,
                property,
                computed,
            } => {
                let object = self.expr(object)?;
                if *computed {
                    return Ok(JsExpr::index(object, self.expr(property)?));
                }
                match property.as_ref() {
                    Hir::Identifier { name, .. } => Ok(JsExpr::Member {
                        object: Box::new(object),
                        property: MemberProp::Ident(name.clone()),
                    }),
                    other => Ok(JsExpr::index(object, self.expr(other)?)),
                }
            }
            Hir::Call { callee, args } => {
                if let Some(folded) = self.fold_get(callee, args)? {
                    return Ok(folded);
                }
                Ok(JsExpr::call(
                    self.expr(callee)?,
                    args.iter().map(|a| self.expr(a)).collect::<Result<_, _>>()?,
                ))
            }
            Hir::CallMember {
                object,
                method,
                args,
            } => {
                let callee = member_by_name(self.expr(object)?, method);
                Ok(JsExpr::call(
                    callee,
                    args.iter().map(|a| self.expr(a)).collect::<Result<_, _>>()?,
                ))
            }
            Hir::GetAndCall {
                object,
                method,
                args,
            } => self.interop_iife(object, name_prop(method), Some(args)),
            Hir::JsMethodAccess { object, method } => {
                self.interop_iife(object, name_prop(method), None)
            }
            Hir::InteropIIFE { object, property } => {
                let key = MemberProp::Computed(Box::new(self.expr(property)?));
                self.interop_iife(object, key, None)
            }
            Hir::Binary { op, left, right } => Ok(JsExpr::binary(
                op.js_symbol(),
                self.expr(left)?,
                self.expr(right)?,
            )),
            Hir::Unary { op, operand } => Ok(JsExpr::Unary {
                op: op.js_symbol(),
                operand: Box::new(self.expr(operand)?),
            }),
            Hir::Assign { target, value } => Ok(JsExpr::Assign {
                target: Box::new(self.expr(target)?),
                value: Box::new(self.expr(value)?),
            }),
            Hir::Conditional {
                test,
                consequent,
                alternate,
            } => Ok(JsExpr::Cond {
                test: Box::new(self.expr(test)?),
                consequent: Box::new(self.expr(consequent)?),
                alternate: Box::new(self.expr(alternate)?),
            }),
            Hir::FunctionExpr { params, body } => Ok(JsExpr::Function {
                name: None,
                params: self.params(params)?,
                body: self.block(body)?,
            }),
            statement => Err(CompileError::codegen(
                "expression conversion",
                format!("statement in expression position: {:?}", statement),
            )),
        }
    }

    /// The literal-get fold: `get(obj, "k")` becomes `obj["k"]` when the key
    /// is a literal and the object is a real expression
    fn fold_get(&self, callee: &Hir, args: &[Hir]) -> Result<Option<JsExpr>, CompileError> {
        if !self.options.fold_literal_get || args.len() != 2 {
            return Ok(None);
        }
        let Hir::Identifier { name, js_namespaced } = callee else {
            return Ok(None);
        };
        if name != "get" || *js_namespaced {
            return Ok(None);
        }
        if matches!(&args[0], Hir::Str(_)) {
            return Ok(None);
        }
        match &args[1] {
            Hir::Str(_) | Hir::Number(_) => {
                let object = self.expr(&args[0])?;
                let key = self.expr(&args[1])?;
                Ok(Some(JsExpr::index(object, key)))
            }
            _ => Ok(None),
        }
    }

    /// The runtime typeof choice shared by GetAndCall, JsMethodAccess, and
    /// InteropIIFE: bind the receiver, look the property up once, and either
    /// call it bound to the receiver or yield it as a value.
    fn interop_iife(
        &self,
        object: &Hir,
        property: MemberProp,
        args: Option<&[Hir]>,
    ) -> Result<JsExpr, CompileError> {
        let lookup = JsExpr::Member {
            object: Box::new(JsExpr::ident("_obj")),
            property,
        };

        let mut call_args = vec![JsExpr::ident("_obj")];
        if let Some(args) = args {
            for arg in args {
                call_args.push(self.expr(arg)?);
            }
        }

        let is_function = JsExpr::binary(
            "===",
            JsExpr::Unary {
                op: "typeof",
                operand: Box::new(JsExpr::ident("_prop")),
            },
            JsExpr::str("function"),
        );

        let body = vec![
            JsStmt::const_decl("_prop", lookup),
            JsStmt::Return(Some(JsExpr::Cond {
                test: Box::new(is_function),
                consequent: Box::new(JsExpr::call(
                    JsExpr::member(JsExpr::ident("_prop"), "call"),
                    call_args,
                )),
                alternate: Box::new(JsExpr::ident("_prop")),
            })),
        ];

        Ok(JsExpr::iife(
            vec![JsParam::simple("_obj")],
            body,
            vec![self.expr(object)?],
        ))
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn params(&self, params: &[Param]) -> Result<Vec<JsParam>, CompileError> {
        params
            .iter()
            .map(|param| {
                Ok(JsParam {
                    name: param.name.clone(),
                    default: param.default.as_ref().map(|d| self.expr(d)).transpose()?,
                    rest: param.rest,
                })
            })
            .collect()
    }

    /// The fx calling convention. The emitted function takes rest args,
    /// initializes each parameter from its declared default (or a
    /// type-derived one), honors a single-object call as named arguments,
    /// then clones object-typed parameters so the body cannot mutate the
    /// caller's data.
    fn fx_function(
        &self,
        name: &str,
        params: &[Param],
        body: &[Hir],
    ) -> Result<JsStmt, CompileError> {
        let args_len = JsExpr::member(JsExpr::ident("args"), "length");
        let first_arg = JsExpr::index(JsExpr::ident("args"), JsExpr::Number(0.0));

        let mut stmts = Vec::new();

        // Parameter initialization
        let mut initials = Vec::with_capacity(params.len());
        for param in params {
            let initial = match &param.default {
                Some(default) => self.expr(default)?,
                None => type_default(param.ty.as_deref()),
            };
            initials.push(initial.clone());
            stmts.push(JsStmt::let_decl(param.name.clone(), initial));
        }

        // Named-argument branch: one argument, an object, not an array
        let named_test = JsExpr::binary(
            "&&",
            JsExpr::binary(
                "&&",
                JsExpr::binary(
                    "&&",
                    JsExpr::binary("===", args_len.clone(), JsExpr::Number(1.0)),
                    JsExpr::binary(
                        "===",
                        JsExpr::Unary {
                            op: "typeof",
                            operand: Box::new(first_arg.clone()),
                        },
                        JsExpr::str("object"),
                    ),
                ),
                JsExpr::binary("!==", first_arg.clone(), JsExpr::Null),
            ),
            JsExpr::Unary {
                op: "!",
                operand: Box::new(JsExpr::call(
                    JsExpr::member(JsExpr::ident("Array"), "isArray"),
                    vec![first_arg.clone()],
                )),
            },
        );

        let mut named_branch = vec![JsStmt::const_decl("_named", first_arg.clone())];
        for param in params {
            named_branch.push(JsStmt::If {
                test: JsExpr::binary(
                    "in",
                    JsExpr::str(param.name.clone()),
                    JsExpr::ident("_named"),
                ),
                consequent: vec![JsStmt::Expr(JsExpr::Assign {
                    target: Box::new(JsExpr::ident(param.name.clone())),
                    value: Box::new(JsExpr::index(
                        JsExpr::ident("_named"),
                        JsExpr::str(param.name.clone()),
                    )),
                })],
                alternate: None,
            });
        }
        // The whole object falls back to the first parameter when nothing
        // claimed it
        if let Some(first_param) = params.first() {
            named_branch.push(JsStmt::If {
                test: JsExpr::binary(
                    "&&",
                    JsExpr::binary(
                        "===",
                        JsExpr::ident(first_param.name.clone()),
                        initials[0].clone(),
                    ),
                    JsExpr::binary(">", args_len.clone(), JsExpr::Number(0.0)),
                ),
                consequent: vec![JsStmt::Expr(JsExpr::Assign {
                    target: Box::new(JsExpr::ident(first_param.name.clone())),
                    value: Box::new(first_arg.clone()),
                })],
                alternate: None,
            });
        }

        // Positional branch
        let mut positional_branch = Vec::with_capacity(params.len());
        for (index, param) in params.iter().enumerate() {
            positional_branch.push(JsStmt::If {
                test: JsExpr::binary(">", args_len.clone(), JsExpr::Number(index as f64)),
                consequent: vec![JsStmt::Expr(JsExpr::Assign {
                    target: Box::new(JsExpr::ident(param.name.clone())),
                    value: Box::new(JsExpr::index(
                        JsExpr::ident("args"),
                        JsExpr::Number(index as f64),
                    )),
                })],
                alternate: None,
            });
        }

        if !params.is_empty() {
            stmts.push(JsStmt::If {
                test: named_test,
                consequent: named_branch,
                alternate: Some(positional_branch),
            });
        }

        // Purity clone for parameters that can hold objects
        for param in params {
            if param
                .ty
                .as_deref()
                .is_some_and(|ty| PRIMITIVE_TYPES.contains(&ty))
            {
                continue;
            }
            stmts.push(JsStmt::Expr(JsExpr::Assign {
                target: Box::new(JsExpr::ident(param.name.clone())),
                value: Box::new(deep_clone(&param.name)),
            }));
        }

        stmts.extend(self.block(body)?);

        Ok(JsStmt::FunctionDecl {
            name: name.to_string(),
            params: vec![JsParam::rest("args")],
            body: stmts,
        })
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn class_decl(
        &self,
        name: &str,
        fields: &[ClassField],
        constructor: Option<&ClassConstructor>,
        methods: &[ClassMethod],
    ) -> Result<JsClass, CompileError> {
        let mut members = Vec::new();

        for field in fields {
            members.push(JsClassMember::Field {
                name: field.name.clone(),
                is_static: false,
                init: field.init.as_ref().map(|init| self.expr(init)).transpose()?,
            });
        }

        if let Some(ctor) = constructor {
            members.push(JsClassMember::Constructor {
                params: self.params(&ctor.params)?,
                body: self.block(&ctor.body)?,
            });
        }

        for method in methods {
            members.push(JsClassMember::Method {
                name: method.name.clone(),
                is_static: false,
                params: self.params(&method.params)?,
                body: self.block(&method.body)?,
            });
        }

        Ok(JsClass {
            name: name.to_string(),
            members,
        })
    }

    // ========================================================================
    // Enums
    // ========================================================================

    fn enum_decl(
        &self,
        name: &str,
        raw_type: Option<&str>,
        cases: &[EnumCase],
        out: &mut Vec<JsStmt>,
    ) -> Result<(), CompileError> {
        if let Some(raw_type) = raw_type {
            out.push(JsStmt::Comment(format!(
                "{} raw value type: {}",
                name, raw_type
            )));
        }

        if cases.iter().any(EnumCase::has_associated_values) {
            out.push(JsStmt::ClassDecl(self.associated_enum_class(name, cases)?));
            return Ok(());
        }

        // Simple enum: a frozen object of case names to raw values (or the
        // case name itself)
        let mut props = Vec::with_capacity(cases.len());
        for case in cases {
            let value = match &case.raw_value {
                Some(raw) => self.expr(raw)?,
                None => JsExpr::str(case.id.clone()),
            };
            props.push(JsProperty {
                key: JsPropKey::Ident(case.id.clone()),
                value,
            });
        }
        out.push(JsStmt::const_decl(
            name.to_string(),
            JsExpr::call(
                JsExpr::member(JsExpr::ident("Object"), "freeze"),
                vec![JsExpr::Object(props)],
            ),
        ));
        Ok(())
    }

    fn associated_enum_class(
        &self,
        name: &str,
        cases: &[EnumCase],
    ) -> Result<JsClass, CompileError> {
        let this = || JsExpr::ident("this");
        let mut members = vec![
            JsClassMember::Constructor {
                params: vec![JsParam::simple("type"), JsParam::simple("values")],
                body: vec![
                    JsStmt::Expr(JsExpr::Assign {
                        target: Box::new(JsExpr::member(this(), "type")),
                        value: Box::new(JsExpr::ident("type")),
                    }),
                    JsStmt::Expr(JsExpr::Assign {
                        target: Box::new(JsExpr::member(this(), "values")),
                        value: Box::new(JsExpr::ident("values")),
                    }),
                ],
            },
            JsClassMember::Method {
                name: "is".to_string(),
                is_static: false,
                params: vec![JsParam::simple("t")],
                body: vec![JsStmt::Return(Some(JsExpr::binary(
                    "===",
                    JsExpr::member(this(), "type"),
                    JsExpr::ident("t"),
                )))],
            },
            JsClassMember::Method {
                name: "getValue".to_string(),
                is_static: false,
                params: vec![JsParam::simple("k")],
                body: vec![JsStmt::Return(Some(JsExpr::index(
                    JsExpr::member(this(), "values"),
                    JsExpr::ident("k"),
                )))],
            },
        ];

        for case in cases {
            let associated = case
                .associated_values
                .as_deref()
                .filter(|values| !values.is_empty());
            if let Some(values) = associated {
                let props = values
                    .iter()
                    .map(|value| JsProperty {
                        key: JsPropKey::Ident(value.name.clone()),
                        value: JsExpr::index(
                            JsExpr::ident("options"),
                            JsExpr::str(value.name.clone()),
                        ),
                    })
                    .collect();
                members.push(JsClassMember::Method {
                    name: case.id.clone(),
                    is_static: true,
                    params: vec![JsParam {
                        name: "options".to_string(),
                        default: Some(JsExpr::Object(Vec::new())),
                        rest: false,
                    }],
                    body: vec![
                        JsStmt::const_decl("values", JsExpr::Object(props)),
                        JsStmt::Return(Some(JsExpr::New {
                            callee: Box::new(JsExpr::ident(name.to_string())),
                            args: vec![JsExpr::str(case.id.clone()), JsExpr::ident("values")],
                        })),
                    ],
                });
            } else {
                members.push(JsClassMember::Field {
                    name: case.id.clone(),
                    is_static: true,
                    init: Some(JsExpr::New {
                        callee: Box::new(JsExpr::ident(name.to_string())),
                        args: vec![JsExpr::str(case.id.clone()), JsExpr::Object(Vec::new())],
                    }),
                });
            }
        }

        Ok(JsClass {
            name: name.to_string(),
            members,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn name_prop(name: &str) -> MemberProp {
    if is_identifier(name) {
        MemberProp::Ident(name.to_string())
    } else {
        MemberProp::Computed(Box::new(JsExpr::str(name)))
    }
}

fn member_by_name(object: JsExpr, name: &str) -> JsExpr {
    if is_identifier(name) {
        JsExpr::member(object, name)
    } else {
        JsExpr::index(object, JsExpr::str(name))
    }
}

/// `typeof p === "object" && p !== null ? JSON.parse(JSON.stringify(p)) : p`
fn deep_clone(name: &str) -> JsExpr {
    let p = || JsExpr::ident(name.to_string());
    JsExpr::Cond {
        test: Box::new(JsExpr::binary(
            "&&",
            JsExpr::binary(
                "===",
                JsExpr::Unary {
                    op: "typeof",
                    operand: Box::new(p()),
                },
                JsExpr::str("object"),
            ),
            JsExpr::binary("!==", p(), JsExpr::Null),
        )),
        consequent: Box::new(JsExpr::call(
            JsExpr::member(JsExpr::ident("JSON"), "parse"),
            vec![JsExpr::call(
                JsExpr::member(JsExpr::ident("JSON"), "stringify"),
                vec![p()],
            )],
        )),
        alternate: Box::new(p()),
    }
}

/// The type-derived default for an fx parameter with no declared one
fn type_default(ty: Option<&str>) -> JsExpr {
    match ty {
        Some("Int") | Some("Double") => JsExpr::Number(0.0),
        Some("String") => JsExpr::str(""),
        Some("Bool") => JsExpr::Bool(false),
        _ => JsExpr::Undefined,
    }
}

/// `get(_, ...)` in statement position reads the placeholder and is never
/// observable; drop it
fn is_discarded_stmt(node: &Hir) -> bool {
    let Hir::ExprStmt(expr) = node else {
        return false;
    };
    let Hir::Call { callee, args } = expr.as_ref() else {
        return false;
    };
    matches!(callee.as_ref(), Hir::Identifier { name, .. } if name == "get")
        && args.first() == Some(&Hir::Str("_".to_string()))
}

fn is_remote_specifier(source: &str) -> bool {
    source.starts_with("npm:")
        || source.starts_with("jsr:")
        || source.starts_with("http:")
        || source.starts_with("https:")
}

/// Deterministic module identifier for an import specifier: strip
/// npm:/jsr: prefixes and path segments, drop the extension, camel-case
/// non-alphanumeric runs, keep the first character identifier-safe, and
/// append "Module".
pub fn module_identifier(specifier: &str) -> String {
    let stripped = specifier
        .strip_prefix("npm:")
        .or_else(|| specifier.strip_prefix("jsr:"))
        .unwrap_or(specifier);
    let last = stripped.rsplit('/').next().unwrap_or(stripped);
    let stem = match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => last,
    };

    let mut out = String::with_capacity(stem.len() + 6);
    let mut upper_next = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if upper_next && !out.is_empty() {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    if !out
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
    {
        out.insert(0, '_');
    }

    out.push_str("Module");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::Declarator;

    fn make() -> Codegen {
        Codegen::new()
    }

    #[test]
    fn test_negative_number_emits_prefix_minus() {
        let js = make().expr(&Hir::Number(-42.0)).unwrap();
        assert_eq!(
            js,
            JsExpr::Unary {
                op: "-",
                operand: Box::new(JsExpr::Number(42.0)),
            }
        );
    }

    #[test]
    fn test_literal_get_folds_to_element_access() {
        let call = Hir::call(
            Hir::identifier("get"),
            vec![Hir::identifier("obj"), Hir::Str("key".to_string())],
        );
        let js = make().expr(&call).unwrap();
        assert_eq!(js, JsExpr::index(JsExpr::ident("obj"), JsExpr::str("key")));
    }

    #[test]
    fn test_dynamic_get_stays_a_call() {
        let call = Hir::call(
            Hir::identifier("get"),
            vec![Hir::identifier("obj"), Hir::identifier("key")],
        );
        let js = make().expr(&call).unwrap();
        assert!(matches!(js, JsExpr::Call { .. }));
    }

    #[test]
    fn test_fold_can_be_disabled() {
        let call = Hir::call(
            Hir::identifier("get"),
            vec![Hir::identifier("obj"), Hir::Str("key".to_string())],
        );
        let codegen = Codegen::with_options(CodegenOptions {
            fold_literal_get: false,
        });
        assert!(matches!(codegen.expr(&call).unwrap(), JsExpr::Call { .. }));
    }

    #[test]
    fn test_placeholder_get_statement_is_dropped() {
        let stmt = Hir::expr_stmt(Hir::call(
            Hir::identifier("get"),
            vec![Hir::Str("_".to_string()), Hir::Number(0.0)],
        ));
        let out = make().module(&[stmt]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_get_and_call_becomes_typeof_iife() {
        let hir = Hir::GetAndCall {
            object: Box::new(Hir::identifier("user")),
            method: "greet".to_string(),
            args: vec![Hir::Str("hi".to_string())],
        };
        let js = make().expr(&hir).unwrap();
        let JsExpr::Call { callee, args } = js else {
            panic!("Expected IIFE call");
        };
        assert_eq!(args, vec![JsExpr::ident("user")]);
        let JsExpr::Function { params, body, .. } = *callee else {
            panic!("Expected IIFE function");
        };
        assert_eq!(params, vec![JsParam::simple("_obj")]);
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[1], JsStmt::Return(Some(JsExpr::Cond { .. }))));
    }

    #[test]
    fn test_var_decl_kinds() {
        let decl = Hir::VarDecl {
            kind: DeclKind::Const,
            declarators: vec![Declarator {
                name: "x".to_string(),
                init: Some(Hir::Number(1.0)),
            }],
        };
        let out = make().module(&[decl]).unwrap();
        assert_eq!(
            out,
            vec![JsStmt::const_decl("x", JsExpr::Number(1.0))]
        );
    }

    #[test]
    fn test_fx_function_shape() {
        let params = vec![Param {
            name: "n".to_string(),
            ty: Some("Int".to_string()),
            default: None,
            rest: false,
        }];
        let body = vec![Hir::ret(Hir::binary(
            crate::hir::BinaryOp::Mul,
            Hir::identifier("n"),
            Hir::identifier("n"),
        ))];
        let stmt = make().fx_function("square", &params, &body).unwrap();

        let JsStmt::FunctionDecl { params, body, .. } = stmt else {
            panic!("Expected function declaration");
        };
        assert_eq!(params, vec![JsParam::rest("args")]);
        // let n = 0; if (named) {...} else {...}; return n * n;
        assert!(matches!(&body[0], JsStmt::VarDecl { kind: "let", .. }));
        assert!(matches!(&body[1], JsStmt::If { .. }));
        assert!(matches!(body.last(), Some(JsStmt::Return(_))));
        // Int parameters skip the purity clone
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn test_fx_object_param_gets_clone() {
        let params = vec![Param {
            name: "data".to_string(),
            ty: Some("Any".to_string()),
            default: None,
            rest: false,
        }];
        let stmt = make()
            .fx_function("touch", &params, &[Hir::ret(Hir::identifier("data"))])
            .unwrap();
        let JsStmt::FunctionDecl { body, .. } = stmt else {
            panic!("Expected function declaration");
        };
        // let, if, clone-assign, return
        assert_eq!(body.len(), 4);
        assert!(matches!(&body[2], JsStmt::Expr(JsExpr::Assign { .. })));
    }

    #[test]
    fn test_simple_enum_freezes_object() {
        let cases = vec![
            EnumCase {
                id: "ok".to_string(),
                raw_value: Some(Hir::Number(200.0)),
                associated_values: None,
            },
            EnumCase {
                id: "err".to_string(),
                raw_value: Some(Hir::Number(500.0)),
                associated_values: None,
            },
        ];
        let decl = Hir::EnumDecl {
            name: "Status".to_string(),
            raw_type: Some("Int".to_string()),
            cases,
        };
        let out = make().module(&[decl]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], JsStmt::Comment(text) if text.contains("Int")));
        match &out[1] {
            JsStmt::VarDecl { kind, declarators } => {
                assert_eq!(*kind, "const");
                assert_eq!(declarators[0].0, "Status");
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_associated_enum_becomes_class() {
        let cases = vec![
            EnumCase {
                id: "ok".to_string(),
                raw_value: None,
                associated_values: Some(vec![crate::hir::EnumAssociatedValue {
                    name: "value".to_string(),
                    type_name: "Any".to_string(),
                }]),
            },
            EnumCase {
                id: "pending".to_string(),
                raw_value: None,
                associated_values: None,
            },
        ];
        let decl = Hir::EnumDecl {
            name: "Result".to_string(),
            raw_type: None,
            cases,
        };
        let out = make().module(&[decl]).unwrap();
        let JsStmt::ClassDecl(class) = &out[0] else {
            panic!("Expected class declaration");
        };
        assert_eq!(class.name, "Result");
        // constructor, is, getValue, ok factory, pending field
        assert_eq!(class.members.len(), 5);
        assert!(matches!(
            &class.members[3],
            JsClassMember::Method {
                name,
                is_static: true,
                ..
            } if name == "ok"
        ));
        assert!(matches!(
            &class.members[4],
            JsClassMember::Field {
                is_static: true,
                ..
            }
        ));
    }

    #[test]
    fn test_remote_import_binds_namespace() {
        let decl = Hir::ImportDecl {
            specifiers: vec![crate::hir::ImportSpec {
                imported: "map".to_string(),
                local: "map".to_string(),
            }],
            source: "npm:lodash-es".to_string(),
        };
        let out = make().module(&[decl]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(matches!(
            &out[0],
            JsStmt::ImportStar { name, .. } if name == "lodashEsModule"
        ));
        assert!(matches!(&out[1], JsStmt::VarDecl { .. }));
    }

    #[test]
    fn test_local_import_stays_named() {
        let decl = Hir::ImportDecl {
            specifiers: vec![crate::hir::ImportSpec {
                imported: "join".to_string(),
                local: "join".to_string(),
            }],
            source: "./util.hql".to_string(),
        };
        let out = make().module(&[decl]).unwrap();
        assert!(matches!(&out[0], JsStmt::ImportNamed { .. }));
    }

    #[test]
    fn test_comment_and_raw_statements_pass_through() {
        let out = make()
            .module(&[
                Hir::CommentBlock("prelude note".to_string()),
                Hir::Raw("debugger;".to_string()),
            ])
            .unwrap();
        assert_eq!(
            out,
            vec![
                JsStmt::Comment("prelude note".to_string()),
                JsStmt::Raw("debugger;".to_string()),
            ]
        );
    }

    #[test]
    fn test_module_identifier_examples() {
        assert_eq!(module_identifier("npm:lodash-es"), "lodashEsModule");
        assert_eq!(
            module_identifier("./utils/string-helpers.hql"),
            "stringHelpersModule"
        );
        assert_eq!(module_identifier("jsr:@std/path"), "pathModule");
        assert_eq!(module_identifier("https://x.dev/mod.js"), "modModule");
        assert_eq!(module_identifier("123"), "_123Module");
    }
}
