// ABOUTME: High-level IR produced by lowering and consumed by codegen
//
// A closed algebraic model of the JavaScript-shaped program: every node is
// either a statement or an expression, and the split is fixed by
// `is_statement`. Construction helpers enforce the structural invariants
// (function bodies end in a return, statements are never nested in
// expression position) so codegen can stay purely structural.

use serde::Serialize;

// ============================================================================
// Supporting Types
// ============================================================================

/// Variable declaration kinds of the target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

impl DeclKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Const => "const",
            DeclKind::Let => "let",
            DeclKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn js_symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "===",
            BinaryOp::NotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Minus,
    Not,
}

impl UnaryOp {
    pub fn js_symbol(&self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// Object literal property key. Symbol and literal keys become strings;
/// anything else is a computed key expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyKey {
    Str(String),
    Computed(Box<Hir>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectProperty {
    pub key: PropertyKey,
    pub value: Hir,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Hir>,
}

/// A function parameter. `ty` is populated only for `fx` declarations and
/// typed class methods; `rest` marks the trailing `&`-variadic parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<String>,
    pub default: Option<Hir>,
    pub rest: bool,
}

impl Param {
    pub fn simple(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            ty: None,
            default: None,
            rest: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSpec {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSpec {
    pub local: String,
    pub exported: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumAssociatedValue {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumCase {
    pub id: String,
    pub raw_value: Option<Hir>,
    pub associated_values: Option<Vec<EnumAssociatedValue>>,
}

impl EnumCase {
    pub fn has_associated_values(&self) -> bool {
        self.associated_values
            .as_ref()
            .is_some_and(|values| !values.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassField {
    pub name: String,
    pub mutable: bool,
    pub init: Option<Hir>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassConstructor {
    pub params: Vec<Param>,
    pub body: Vec<Hir>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Vec<Hir>,
}

// ============================================================================
// HIR Nodes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Hir {
    // ----- Literals -----
    Null,
    Bool(bool),
    Number(f64),
    Str(String),

    // ----- Identifier -----
    Identifier { name: String, js_namespaced: bool },

    // ----- Collections -----
    Array(Vec<Hir>),
    Object(Vec<ObjectProperty>),
    New { callee: Box<Hir>, args: Vec<Hir> },

    // ----- Access / Call -----
    Member {
        object: Box<Hir>,
        property: Box<Hir>,
        computed: bool,
    },
    Call {
        callee: Box<Hir>,
        args: Vec<Hir>,
    },
    CallMember {
        object: Box<Hir>,
        method: String,
        args: Vec<Hir>,
    },
    GetAndCall {
        object: Box<Hir>,
        method: String,
        args: Vec<Hir>,
    },
    JsMethodAccess {
        object: Box<Hir>,
        method: String,
    },
    InteropIIFE {
        object: Box<Hir>,
        property: Box<Hir>,
    },

    // ----- Operators -----
    Binary {
        op: BinaryOp,
        left: Box<Hir>,
        right: Box<Hir>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Hir>,
    },
    Assign {
        target: Box<Hir>,
        value: Box<Hir>,
    },
    Conditional {
        test: Box<Hir>,
        consequent: Box<Hir>,
        alternate: Box<Hir>,
    },

    // ----- Bindings / Statements -----
    VarDecl {
        kind: DeclKind,
        declarators: Vec<Declarator>,
    },
    ExprStmt(Box<Hir>),
    Block(Vec<Hir>),
    If {
        test: Box<Hir>,
        consequent: Box<Hir>,
        alternate: Option<Box<Hir>>,
    },
    Return(Box<Hir>),
    FunctionExpr {
        params: Vec<Param>,
        body: Vec<Hir>,
    },
    FunctionDecl {
        name: String,
        params: Vec<Param>,
        body: Vec<Hir>,
    },
    /// Untyped `fn` declaration (registered for call-site binding)
    FnDecl {
        name: String,
        params: Vec<Param>,
        body: Vec<Hir>,
    },
    /// Typed pure `fx` declaration; the only variant carrying parameter
    /// types and a return type
    FxDecl {
        name: String,
        params: Vec<Param>,
        return_type: String,
        body: Vec<Hir>,
    },
    ClassDecl {
        name: String,
        fields: Vec<ClassField>,
        constructor: Option<ClassConstructor>,
        methods: Vec<ClassMethod>,
    },
    EnumDecl {
        name: String,
        raw_type: Option<String>,
        cases: Vec<EnumCase>,
    },
    ImportDecl {
        specifiers: Vec<ImportSpec>,
        source: String,
    },
    /// Namespace import: `import name from "path"` / `(js-import name "path")`
    JsImportRef {
        name: String,
        source: String,
    },
    ExportNamed {
        specifiers: Vec<ExportSpec>,
    },
    ExportVarDecl {
        name: String,
        value: Box<Hir>,
    },
    CommentBlock(String),
    Raw(String),
}

// ============================================================================
// Identifier Sanitization
// ============================================================================

/// Rewrite a surface name into a valid JS identifier: every character
/// outside [A-Za-z0-9_$] becomes an underscore, and a leading digit is
/// prefixed with one.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

impl Hir {
    /// An identifier for ordinary surface names (sanitized)
    pub fn identifier(name: &str) -> Hir {
        Hir::Identifier {
            name: sanitize_identifier(name),
            js_namespaced: false,
        }
    }

    /// An identifier for `js/`-namespaced names: emitted verbatim except
    /// that `-` becomes `_`
    pub fn js_identifier(name: &str) -> Hir {
        Hir::Identifier {
            name: name.replace('-', "_"),
            js_namespaced: true,
        }
    }

    pub fn member(object: Hir, property: Hir, computed: bool) -> Hir {
        Hir::Member {
            object: Box::new(object),
            property: Box::new(property),
            computed,
        }
    }

    pub fn call(callee: Hir, args: Vec<Hir>) -> Hir {
        Hir::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn ret(value: Hir) -> Hir {
        Hir::Return(Box::new(value))
    }

    pub fn expr_stmt(expr: Hir) -> Hir {
        Hir::ExprStmt(Box::new(expr))
    }

    pub fn binary(op: BinaryOp, left: Hir, right: Hir) -> Hir {
        Hir::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: Hir, value: Hir) -> Hir {
        Hir::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn conditional(test: Hir, consequent: Hir, alternate: Hir) -> Hir {
        Hir::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    /// Whether this node lowers to a target-language statement.
    /// Everything else is an expression; the split is exhaustive.
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Hir::VarDecl { .. }
                | Hir::ExprStmt(_)
                | Hir::Block(_)
                | Hir::If { .. }
                | Hir::Return(_)
                | Hir::FunctionDecl { .. }
                | Hir::FnDecl { .. }
                | Hir::FxDecl { .. }
                | Hir::ClassDecl { .. }
                | Hir::EnumDecl { .. }
                | Hir::ImportDecl { .. }
                | Hir::JsImportRef { .. }
                | Hir::ExportNamed { .. }
                | Hir::ExportVarDecl { .. }
                | Hir::CommentBlock(_)
                | Hir::Raw(_)
        )
    }

    /// Coerce an expression into statement position. This is the single
    /// place a statement producer may wrap an expression.
    pub fn into_statement(self) -> Hir {
        if self.is_statement() {
            self
        } else {
            Hir::expr_stmt(self)
        }
    }

    /// Shape a function body: all leading nodes become statements, and the
    /// final node is wrapped in a return unless it already is one. An empty
    /// body stays empty.
    pub fn function_body(mut nodes: Vec<Hir>) -> Vec<Hir> {
        let Some(last) = nodes.pop() else {
            return Vec::new();
        };

        let mut body: Vec<Hir> = nodes.into_iter().map(Hir::into_statement).collect();
        match last {
            ret @ Hir::Return(_) => body.push(ret),
            // Statements cannot be returned; keep them and return null so
            // the terminal-return shape still holds.
            stmt if stmt.is_statement() => {
                body.push(stmt);
                body.push(Hir::ret(Hir::Null));
            }
            expr => body.push(Hir::ret(expr)),
        }
        body
    }
}
