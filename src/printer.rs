// ABOUTME: Deterministic pretty-printer from the JS AST to source text
//
// LF newlines, two-space indentation, every statement terminated, and
// precedence-aware parenthesization so the output needs no re-parsing
// safety margin.

use crate::js_ast::{JsClass, JsClassMember, JsExpr, JsParam, JsPropKey, JsStmt, MemberProp};

// Expression precedence levels (subset of the target language's table)
const PREC_ASSIGN: u8 = 2;
const PREC_COND: u8 = 3;
const PREC_UNARY: u8 = 15;
const PREC_POSTFIX: u8 = 17;
const PREC_PRIMARY: u8 = 20;

fn binary_prec(op: &str) -> u8 {
    match op {
        "||" => 4,
        "&&" => 5,
        "===" | "!==" => 9,
        "<" | ">" | "<=" | ">=" | "in" | "instanceof" => 10,
        "+" | "-" => 12,
        "*" | "/" | "%" => 13,
        _ => 9,
    }
}

/// Print a whole module. Output ends with exactly one newline (or is empty).
pub fn print_module(statements: &[JsStmt]) -> String {
    let mut printer = Printer::new();
    for statement in statements {
        printer.stmt(statement);
    }
    printer.finish()
}

/// Print a single expression (REPL echo and tests)
pub fn print_expr(expr: &JsExpr) -> String {
    let mut printer = Printer::new();
    printer.expr(expr, 0);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Printer {
            out: String::new(),
            indent: 0,
        }
    }

    fn finish(mut self) -> String {
        while self.out.ends_with('\n') {
            self.out.pop();
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn stmt(&mut self, statement: &JsStmt) {
        self.write_indent();
        self.stmt_body(statement);
        self.out.push('\n');
    }

    fn stmt_body(&mut self, statement: &JsStmt) {
        match statement {
            JsStmt::Expr(expr) => {
                // A leading function or object literal would parse as a
                // declaration or block
                let needs_parens = matches!(expr, JsExpr::Function { .. } | JsExpr::Object(_));
                if needs_parens {
                    self.out.push('(');
                }
                self.expr(expr, 0);
                if needs_parens {
                    self.out.push(')');
                }
                self.out.push(';');
            }
            JsStmt::VarDecl { kind, declarators } => {
                self.out.push_str(kind);
                self.out.push(' ');
                for (index, (name, init)) in declarators.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(name);
                    if let Some(init) = init {
                        self.out.push_str(" = ");
                        self.expr(init, PREC_ASSIGN);
                    }
                }
                self.out.push(';');
            }
            JsStmt::FunctionDecl { name, params, body } => {
                self.out.push_str("function ");
                self.out.push_str(name);
                self.params(params);
                self.brace_block(body);
            }
            JsStmt::Return(value) => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(value, PREC_ASSIGN);
                }
                self.out.push(';');
            }
            JsStmt::If {
                test,
                consequent,
                alternate,
            } => self.if_chain(test, consequent, alternate.as_deref()),
            JsStmt::Block(statements) => self.brace_block(statements),
            JsStmt::ClassDecl(class) => self.class(class),
            JsStmt::ImportNamed { specifiers, source } => {
                self.out.push_str("import { ");
                for (index, (imported, local)) in specifiers.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(imported);
                    if imported != local {
                        self.out.push_str(" as ");
                        self.out.push_str(local);
                    }
                }
                self.out.push_str(" } from ");
                self.string_literal(source);
                self.out.push(';');
            }
            JsStmt::ImportDefault { name, source } => {
                self.out.push_str("import ");
                self.out.push_str(name);
                self.out.push_str(" from ");
                self.string_literal(source);
                self.out.push(';');
            }
            JsStmt::ImportStar { name, source } => {
                self.out.push_str("import * as ");
                self.out.push_str(name);
                self.out.push_str(" from ");
                self.string_literal(source);
                self.out.push(';');
            }
            JsStmt::ExportNamed { specifiers } => {
                self.out.push_str("export { ");
                for (index, (local, exported)) in specifiers.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(local);
                    if local != exported {
                        self.out.push_str(" as ");
                        self.out.push_str(exported);
                    }
                }
                self.out.push_str(" };");
            }
            JsStmt::ExportDecl(inner) => {
                self.out.push_str("export ");
                self.stmt_body(inner);
            }
            JsStmt::Comment(text) => {
                for (index, line) in text.lines().enumerate() {
                    if index > 0 {
                        self.out.push('\n');
                        self.write_indent();
                    }
                    self.out.push_str("// ");
                    self.out.push_str(line);
                }
            }
            JsStmt::Raw(text) => {
                self.out.push_str(text.trim_end_matches('\n'));
            }
        }
    }

    fn if_chain(&mut self, test: &JsExpr, consequent: &[JsStmt], alternate: Option<&[JsStmt]>) {
        self.out.push_str("if (");
        self.expr(test, 0);
        self.out.push_str(") ");
        self.brace_block(consequent);

        if let Some(alternate) = alternate {
            self.out.push_str(" else ");
            // Collapse a lone nested if into an else-if chain
            if let [JsStmt::If {
                test,
                consequent,
                alternate,
            }] = alternate
            {
                self.if_chain(test, consequent, alternate.as_deref());
            } else {
                self.brace_block(alternate);
            }
        }
    }

    fn brace_block(&mut self, statements: &[JsStmt]) {
        if statements.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{\n");
        self.indent += 1;
        for statement in statements {
            self.stmt(statement);
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    fn class(&mut self, class: &JsClass) {
        self.out.push_str("class ");
        self.out.push_str(&class.name);
        self.out.push_str(" {\n");
        self.indent += 1;

        for member in &class.members {
            self.write_indent();
            match member {
                JsClassMember::Field {
                    name,
                    is_static,
                    init,
                } => {
                    if *is_static {
                        self.out.push_str("static ");
                    }
                    self.out.push_str(name);
                    if let Some(init) = init {
                        self.out.push_str(" = ");
                        self.expr(init, PREC_ASSIGN);
                    }
                    self.out.push(';');
                }
                JsClassMember::Constructor { params, body } => {
                    self.out.push_str("constructor");
                    self.params(params);
                    self.brace_block(body);
                }
                JsClassMember::Method {
                    name,
                    is_static,
                    params,
                    body,
                } => {
                    if *is_static {
                        self.out.push_str("static ");
                    }
                    self.out.push_str(name);
                    self.params(params);
                    self.brace_block(body);
                }
            }
            self.out.push('\n');
        }

        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    fn params(&mut self, params: &[JsParam]) {
        self.out.push('(');
        for (index, param) in params.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            if param.rest {
                self.out.push_str("...");
            }
            self.out.push_str(&param.name);
            if let Some(default) = &param.default {
                self.out.push_str(" = ");
                self.expr(default, PREC_ASSIGN);
            }
        }
        self.out.push_str(") ");
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, expr: &JsExpr, min_prec: u8) {
        let prec = expr_prec(expr);
        let needs_parens = prec < min_prec;
        if needs_parens {
            self.out.push('(');
        }
        self.expr_body(expr);
        if needs_parens {
            self.out.push(')');
        }
    }

    fn expr_body(&mut self, expr: &JsExpr) {
        match expr {
            JsExpr::Null => self.out.push_str("null"),
            JsExpr::Undefined => self.out.push_str("undefined"),
            JsExpr::Bool(true) => self.out.push_str("true"),
            JsExpr::Bool(false) => self.out.push_str("false"),
            JsExpr::Number(n) => self.number(*n),
            JsExpr::Str(s) => self.string_literal(s),
            JsExpr::Ident(name) => self.out.push_str(name),
            JsExpr::Raw(text) => self.out.push_str(text),
            JsExpr::Array(items) => {
                self.out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(item, PREC_COND);
                }
                self.out.push(']');
            }
            JsExpr::Object(props) => {
                if props.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{ ");
                for (index, prop) in props.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    match &prop.key {
                        JsPropKey::Ident(name) => self.out.push_str(name),
                        JsPropKey::Str(s) => self.string_literal(s),
                        JsPropKey::Computed(key) => {
                            self.out.push('[');
                            self.expr(key, PREC_COND);
                            self.out.push(']');
                        }
                    }
                    self.out.push_str(": ");
                    self.expr(&prop.value, PREC_COND);
                }
                self.out.push_str(" }");
            }
            JsExpr::Unary { op, operand } => {
                self.out.push_str(op);
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.out.push(' ');
                }
                self.expr(operand, PREC_UNARY + 1);
            }
            JsExpr::Binary { op, left, right } => {
                let prec = binary_prec(op);
                self.expr(left, prec);
                self.out.push(' ');
                self.out.push_str(op);
                self.out.push(' ');
                self.expr(right, prec + 1);
            }
            JsExpr::Assign { target, value } => {
                self.expr(target, PREC_POSTFIX);
                self.out.push_str(" = ");
                self.expr(value, PREC_ASSIGN);
            }
            JsExpr::Cond {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, PREC_COND + 1);
                self.out.push_str(" ? ");
                self.expr(consequent, PREC_COND);
                self.out.push_str(" : ");
                self.expr(alternate, PREC_COND);
            }
            JsExpr::Call { callee, args } => {
                self.callee(callee);
                self.out.push('(');
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(arg, PREC_ASSIGN);
                }
                self.out.push(')');
            }
            JsExpr::New { callee, args } => {
                self.out.push_str("new ");
                self.callee(callee);
                self.out.push('(');
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(arg, PREC_ASSIGN);
                }
                self.out.push(')');
            }
            JsExpr::Member { object, property } => {
                self.callee(object);
                match property {
                    MemberProp::Ident(name) => {
                        self.out.push('.');
                        self.out.push_str(name);
                    }
                    MemberProp::Computed(key) => {
                        self.out.push('[');
                        self.expr(key, PREC_ASSIGN);
                        self.out.push(']');
                    }
                }
            }
            JsExpr::Function { name, params, body } => {
                self.out.push_str("function ");
                if let Some(name) = name {
                    self.out.push_str(name);
                }
                self.params(params);
                self.brace_block(body);
            }
        }
    }

    /// Callee / member-object position: function expressions must be
    /// parenthesized, and lower-precedence expressions get parens as usual
    fn callee(&mut self, expr: &JsExpr) {
        if matches!(expr, JsExpr::Function { .. }) {
            self.out.push('(');
            self.expr_body(expr);
            self.out.push(')');
        } else {
            self.expr(expr, PREC_POSTFIX);
        }
    }

    fn number(&mut self, n: f64) {
        if n.fract() == 0.0 && n.is_finite() && n.abs() < 9e15 {
            self.out.push_str(&format!("{}", n as i64));
        } else {
            self.out.push_str(&format!("{}", n));
        }
    }

    fn string_literal(&mut self, s: &str) {
        let escaped = serde_json::to_string(s)
            .unwrap_or_else(|_| format!("\"{}\"", s.escape_default()));
        self.out.push_str(&escaped);
    }
}

fn expr_prec(expr: &JsExpr) -> u8 {
    match expr {
        JsExpr::Assign { .. } => PREC_ASSIGN,
        JsExpr::Cond { .. } => PREC_COND,
        JsExpr::Binary { op, .. } => binary_prec(op),
        JsExpr::Unary { .. } => PREC_UNARY,
        JsExpr::Call { .. } | JsExpr::New { .. } | JsExpr::Member { .. } => PREC_POSTFIX,
        _ => PREC_PRIMARY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js_ast::JsParam;

    #[test]
    fn test_precedence_parens() {
        // (1 + 2) * 3
        let expr = JsExpr::binary(
            "*",
            JsExpr::binary("+", JsExpr::Number(1.0), JsExpr::Number(2.0)),
            JsExpr::Number(3.0),
        );
        assert_eq!(print_expr(&expr), "(1 + 2) * 3");

        // 1 + 2 * 3 needs none
        let expr = JsExpr::binary(
            "+",
            JsExpr::Number(1.0),
            JsExpr::binary("*", JsExpr::Number(2.0), JsExpr::Number(3.0)),
        );
        assert_eq!(print_expr(&expr), "1 + 2 * 3");
    }

    #[test]
    fn test_right_operand_of_same_precedence_gets_parens() {
        // a - (b - c)
        let expr = JsExpr::binary(
            "-",
            JsExpr::ident("a"),
            JsExpr::binary("-", JsExpr::ident("b"), JsExpr::ident("c")),
        );
        assert_eq!(print_expr(&expr), "a - (b - c)");
    }

    #[test]
    fn test_negative_number_round_trip() {
        let expr = JsExpr::Unary {
            op: "-",
            operand: Box::new(JsExpr::Number(42.0)),
        };
        assert_eq!(print_expr(&expr), "-42");
    }

    #[test]
    fn test_nested_unary_gets_parens() {
        let expr = JsExpr::Unary {
            op: "-",
            operand: Box::new(JsExpr::Unary {
                op: "-",
                operand: Box::new(JsExpr::ident("x")),
            }),
        };
        assert_eq!(print_expr(&expr), "-(-x)");
    }

    #[test]
    fn test_typeof_spaces() {
        let expr = JsExpr::binary(
            "===",
            JsExpr::Unary {
                op: "typeof",
                operand: Box::new(JsExpr::ident("x")),
            },
            JsExpr::str("function"),
        );
        assert_eq!(print_expr(&expr), "typeof x === \"function\"");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(print_expr(&JsExpr::str("a\"b\n")), r#""a\"b\n""#);
    }

    #[test]
    fn test_member_call_statement() {
        let stmt = JsStmt::Expr(JsExpr::call(
            JsExpr::member(JsExpr::ident("arr"), "push"),
            vec![JsExpr::Number(1.0), JsExpr::Number(2.0)],
        ));
        assert_eq!(print_module(&[stmt]), "arr.push(1, 2);\n");
    }

    #[test]
    fn test_iife_callee_is_parenthesized() {
        let stmt = JsStmt::Expr(JsExpr::iife(
            vec![],
            vec![JsStmt::Return(Some(JsExpr::Number(1.0)))],
            vec![],
        ));
        assert_eq!(
            print_module(&[stmt]),
            "(function () {\n  return 1;\n})();\n"
        );
    }

    #[test]
    fn test_if_else_blocks() {
        let stmt = JsStmt::If {
            test: JsExpr::binary("<", JsExpr::ident("i"), JsExpr::Number(3.0)),
            consequent: vec![JsStmt::Return(Some(JsExpr::call(
                JsExpr::ident("loop_0"),
                vec![JsExpr::binary("+", JsExpr::ident("i"), JsExpr::Number(1.0))],
            )))],
            alternate: Some(vec![JsStmt::Return(Some(JsExpr::ident("i")))]),
        };
        assert_eq!(
            print_module(&[stmt]),
            "if (i < 3) {\n  return loop_0(i + 1);\n} else {\n  return i;\n}\n"
        );
    }

    #[test]
    fn test_else_if_chain_collapses() {
        let inner = JsStmt::If {
            test: JsExpr::ident("b"),
            consequent: vec![JsStmt::Return(Some(JsExpr::Number(2.0)))],
            alternate: None,
        };
        let stmt = JsStmt::If {
            test: JsExpr::ident("a"),
            consequent: vec![JsStmt::Return(Some(JsExpr::Number(1.0)))],
            alternate: Some(vec![inner]),
        };
        let printed = print_module(&[stmt]);
        assert!(printed.contains("} else if (b) {"));
    }

    #[test]
    fn test_frozen_object_single_line() {
        let stmt = JsStmt::const_decl(
            "Status",
            JsExpr::call(
                JsExpr::member(JsExpr::ident("Object"), "freeze"),
                vec![JsExpr::Object(vec![
                    crate::js_ast::JsProperty {
                        key: JsPropKey::Ident("ok".to_string()),
                        value: JsExpr::Number(200.0),
                    },
                    crate::js_ast::JsProperty {
                        key: JsPropKey::Ident("err".to_string()),
                        value: JsExpr::Number(500.0),
                    },
                ])],
            ),
        );
        assert_eq!(
            print_module(&[stmt]),
            "const Status = Object.freeze({ ok: 200, err: 500 });\n"
        );
    }

    #[test]
    fn test_function_with_defaults_and_rest() {
        let stmt = JsStmt::FunctionDecl {
            name: "add".to_string(),
            params: vec![
                JsParam {
                    name: "x".to_string(),
                    default: Some(JsExpr::Number(1.0)),
                    rest: false,
                },
                JsParam::rest("rest"),
            ],
            body: vec![JsStmt::Return(Some(JsExpr::ident("x")))],
        };
        assert_eq!(
            print_module(&[stmt]),
            "function add(x = 1, ...rest) {\n  return x;\n}\n"
        );
    }

    #[test]
    fn test_output_ends_with_single_newline() {
        let printed = print_module(&[JsStmt::Expr(JsExpr::Number(1.0))]);
        assert!(printed.ends_with('\n'));
        assert!(!printed.ends_with("\n\n"));
    }

    #[test]
    fn test_empty_module_prints_empty() {
        assert_eq!(print_module(&[]), "");
    }

    #[test]
    fn test_class_printing() {
        let class = JsClass {
            name: "Point".to_string(),
            members: vec![
                JsClassMember::Field {
                    name: "x".to_string(),
                    is_static: false,
                    init: Some(JsExpr::Number(0.0)),
                },
                JsClassMember::Constructor {
                    params: vec![JsParam::simple("x")],
                    body: vec![JsStmt::Expr(JsExpr::Assign {
                        target: Box::new(JsExpr::member(JsExpr::ident("this"), "x")),
                        value: Box::new(JsExpr::ident("x")),
                    })],
                },
            ],
        };
        let printed = print_module(&[JsStmt::ClassDecl(class)]);
        assert_eq!(
            printed,
            "class Point {\n  x = 0;\n  constructor(x) {\n    this.x = x;\n  }\n}\n"
        );
    }

    #[test]
    fn test_import_export_forms() {
        let stmts = vec![
            JsStmt::ImportNamed {
                specifiers: vec![
                    ("join".to_string(), "join".to_string()),
                    ("dirname".to_string(), "dir".to_string()),
                ],
                source: "node:path".to_string(),
            },
            JsStmt::ExportNamed {
                specifiers: vec![("compile".to_string(), "translate".to_string())],
            },
        ];
        assert_eq!(
            print_module(&stmts),
            "import { join, dirname as dir } from \"node:path\";\nexport { compile as translate };\n"
        );
    }
}
