// ABOUTME: JavaScript-shaped target AST produced by codegen and consumed by the printer

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsParam {
    pub name: String,
    pub default: Option<JsExpr>,
    pub rest: bool,
}

impl JsParam {
    pub fn simple(name: impl Into<String>) -> Self {
        JsParam {
            name: name.into(),
            default: None,
            rest: false,
        }
    }

    pub fn rest(name: impl Into<String>) -> Self {
        JsParam {
            name: name.into(),
            default: None,
            rest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsPropKey {
    Ident(String),
    Str(String),
    Computed(JsExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsProperty {
    pub key: JsPropKey,
    pub value: JsExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MemberProp {
    Ident(String),
    Computed(Box<JsExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsExpr {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    Array(Vec<JsExpr>),
    Object(Vec<JsProperty>),
    Unary {
        op: &'static str,
        operand: Box<JsExpr>,
    },
    Binary {
        op: &'static str,
        left: Box<JsExpr>,
        right: Box<JsExpr>,
    },
    Assign {
        target: Box<JsExpr>,
        value: Box<JsExpr>,
    },
    Cond {
        test: Box<JsExpr>,
        consequent: Box<JsExpr>,
        alternate: Box<JsExpr>,
    },
    Call {
        callee: Box<JsExpr>,
        args: Vec<JsExpr>,
    },
    New {
        callee: Box<JsExpr>,
        args: Vec<JsExpr>,
    },
    Member {
        object: Box<JsExpr>,
        property: MemberProp,
    },
    Function {
        name: Option<String>,
        params: Vec<JsParam>,
        body: Vec<JsStmt>,
    },
    Raw(String),
}

impl JsExpr {
    pub fn ident(name: impl Into<String>) -> JsExpr {
        JsExpr::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> JsExpr {
        JsExpr::Str(value.into())
    }

    pub fn call(callee: JsExpr, args: Vec<JsExpr>) -> JsExpr {
        JsExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn member(object: JsExpr, property: &str) -> JsExpr {
        JsExpr::Member {
            object: Box::new(object),
            property: MemberProp::Ident(property.to_string()),
        }
    }

    pub fn index(object: JsExpr, key: JsExpr) -> JsExpr {
        JsExpr::Member {
            object: Box::new(object),
            property: MemberProp::Computed(Box::new(key)),
        }
    }

    pub fn binary(op: &'static str, left: JsExpr, right: JsExpr) -> JsExpr {
        JsExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// An immediately-invoked function expression over `body`
    pub fn iife(params: Vec<JsParam>, body: Vec<JsStmt>, args: Vec<JsExpr>) -> JsExpr {
        JsExpr::call(
            JsExpr::Function {
                name: None,
                params,
                body,
            },
            args,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsClassMember {
    Field {
        name: String,
        is_static: bool,
        init: Option<JsExpr>,
    },
    Constructor {
        params: Vec<JsParam>,
        body: Vec<JsStmt>,
    },
    Method {
        name: String,
        is_static: bool,
        params: Vec<JsParam>,
        body: Vec<JsStmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsClass {
    pub name: String,
    pub members: Vec<JsClassMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsStmt {
    Expr(JsExpr),
    VarDecl {
        kind: &'static str,
        declarators: Vec<(String, Option<JsExpr>)>,
    },
    FunctionDecl {
        name: String,
        params: Vec<JsParam>,
        body: Vec<JsStmt>,
    },
    Return(Option<JsExpr>),
    If {
        test: JsExpr,
        consequent: Vec<JsStmt>,
        alternate: Option<Vec<JsStmt>>,
    },
    Block(Vec<JsStmt>),
    ClassDecl(JsClass),
    ImportNamed {
        specifiers: Vec<(String, String)>,
        source: String,
    },
    ImportDefault {
        name: String,
        source: String,
    },
    ImportStar {
        name: String,
        source: String,
    },
    ExportNamed {
        specifiers: Vec<(String, String)>,
    },
    ExportDecl(Box<JsStmt>),
    Comment(String),
    Raw(String),
}

impl JsStmt {
    pub fn const_decl(name: impl Into<String>, init: JsExpr) -> JsStmt {
        JsStmt::VarDecl {
            kind: "const",
            declarators: vec![(name.into(), Some(init))],
        }
    }

    pub fn let_decl(name: impl Into<String>, init: JsExpr) -> JsStmt {
        JsStmt::VarDecl {
            kind: "let",
            declarators: vec![(name.into(), Some(init))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iife_shape() {
        let expr = JsExpr::iife(vec![], vec![JsStmt::Return(Some(JsExpr::Number(1.0)))], vec![]);
        match expr {
            JsExpr::Call { callee, args } => {
                assert!(args.is_empty());
                assert!(matches!(*callee, JsExpr::Function { name: None, .. }));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_member_helpers() {
        let dotted = JsExpr::member(JsExpr::ident("a"), "b");
        assert!(matches!(
            dotted,
            JsExpr::Member {
                property: MemberProp::Ident(_),
                ..
            }
        ));

        let indexed = JsExpr::index(JsExpr::ident("a"), JsExpr::str("k"));
        assert!(matches!(
            indexed,
            JsExpr::Member {
                property: MemberProp::Computed(_),
                ..
            }
        ));
    }
}
