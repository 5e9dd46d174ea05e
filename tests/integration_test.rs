// ABOUTME: End-to-end compilation tests over printed JavaScript output

use hql::config::CompilerOptions;
use hql::pipeline::Pipeline;

/// A pipeline without the runtime prelude so assertions see only the
/// compiled program
fn compile(source: &str) -> String {
    let pipeline = Pipeline::new(CompilerOptions {
        emit_runtime: false,
        fold_literal_get: true,
    });
    pipeline
        .compile_source(source, "<test>")
        .expect("compilation failed")
        .code
}

fn compile_with_warnings(source: &str) -> (String, Vec<String>) {
    let pipeline = Pipeline::new(CompilerOptions {
        emit_runtime: false,
        fold_literal_get: true,
    });
    let output = pipeline
        .compile_source(source, "<test>")
        .expect("compilation failed");
    let warnings = output.warnings.iter().map(|w| w.to_string()).collect();
    (output.code, warnings)
}

// ============================================================================
// Named and Defaulted Calls
// ============================================================================

#[test]
fn named_call_reorders_and_fills_defaults() {
    let code = compile("(fn add (x = 1 y = 2) (+ x y))\n(add y: 10)");
    assert!(code.contains("function add(x = 1, y = 2) {"));
    assert!(code.contains("return x + y;"));
    assert!(code.contains("add(1, 10);"));
}

#[test]
fn named_and_positional_calls_agree_after_reordering() {
    let positional = compile("(fn f (a = 1 b = 2) a)\n(f 3 4)");
    let named = compile("(fn f (a = 1 b = 2) a)\n(f b: 4 a: 3)");
    assert_eq!(positional, named);
    assert!(positional.contains("f(3, 4);"));
}

#[test]
fn placeholder_without_default_reports_the_parameter() {
    let (code, warnings) = compile_with_warnings(
        "(fx square (n: Int) (-> Int) (* n n))\n(square _)",
    );
    // The declaration still compiles; the bad call site is collected
    assert!(code.contains("function square(...args) {"));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0]
        .contains("Placeholder used for parameter 'n' but no default value is defined"));
}

// ============================================================================
// Loop / Recur
// ============================================================================

#[test]
fn loop_compiles_to_named_iife_with_return_arms() {
    let code = compile("(loop (i 0) (if (< i 3) (recur (+ i 1)) i))");
    assert!(code.contains("function loop_0(i) {"));
    assert!(code.contains("if (i < 3) {"));
    assert!(code.contains("return loop_0(i + 1);"));
    assert!(code.contains("} else {"));
    assert!(code.contains("return i;"));
    assert!(code.contains("return loop_0(0);"));
}

#[test]
fn recur_outside_loop_fails_compilation() {
    let pipeline = Pipeline::default();
    let err = pipeline
        .compile_source("(recur 1)", "<test>")
        .expect_err("recur at top level must fail");
    assert!(err.to_string().contains("outside any loop"));
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn simple_enum_freezes_raw_values() {
    let code = compile("(enum Status:Int (case ok 200) (case err 500))");
    assert!(code.contains("const Status = Object.freeze({ ok: 200, err: 500 });"));
    assert!(code.contains("// Status raw value type: Int"));
}

#[test]
fn associated_enum_compiles_to_tagged_class() {
    let code = compile("(enum Result (case ok value: Any) (case err message: String))");
    assert!(code.contains("class Result {"));
    assert!(code.contains("constructor(type, values) {"));
    assert!(code.contains("is(t) {"));
    assert!(code.contains("return this.type === t;"));
    assert!(code.contains("getValue(k) {"));
    assert!(code.contains("return this.values[k];"));
    assert!(code.contains("static ok(options = {}) {"));
    assert!(code.contains("static err(options = {}) {"));
    assert!(code.contains("new Result(\"ok\", values)"));
}

// ============================================================================
// Method Calls and Interop
// ============================================================================

#[test]
fn dot_prefix_call_with_arguments() {
    let code = compile("(.push arr 1 2)");
    assert_eq!(code, "arr.push(1, 2);\n");
}

#[test]
fn dot_prefix_access_without_arguments_is_runtime_safe() {
    let code = compile("(.length s)");
    assert!(code.contains("function (_obj) {"));
    assert!(code.contains("const _prop = _obj.length;"));
    assert!(code.contains("typeof _prop === \"function\" ? _prop.call(_obj) : _prop"));
    assert!(code.contains("})(s);"));
}

#[test]
fn method_call_form_passes_arguments_through_the_iife() {
    let code = compile("(method-call user greet \"hi\")");
    assert!(code.contains("_prop.call(_obj, \"hi\")"));
}

#[test]
fn js_interop_forms() {
    let code = compile(concat!(
        "(js-import path \"node:path\")\n",
        "(js-get config \"port\")\n",
        "(js-set config \"port\" 8080)\n",
        "(js-call console \"log\" \"ready\")\n",
        "(js-export \"version\" \"0.1.0\")\n",
    ));
    assert!(code.contains("import path from \"node:path\";"));
    assert!(code.contains("config[\"port\"];"));
    assert!(code.contains("config[\"port\"] = 8080;"));
    assert!(code.contains("console.log(\"ready\");"));
    assert!(code.contains("export const version = \"0.1.0\";"));
}

// ============================================================================
// Bindings, Sequencing, Classes
// ============================================================================

#[test]
fn let_scope_and_lambda_application_emit_equivalent_bodies() {
    let let_code = compile("(let (x 5) (+ x 1))");
    let lambda_code = compile("((lambda (x) (+ x 1)) 5)");

    // Both are immediately-invoked functions returning x + 1 with 5 bound
    assert!(let_code.contains("const x = 5;"));
    assert!(let_code.contains("return x + 1;"));
    assert!(let_code.contains("})();"));
    assert!(lambda_code.contains("return x + 1;"));
    assert!(lambda_code.contains("})(5);"));
}

#[test]
fn do_sequences_into_an_iife() {
    let code = compile("(do (log \"step\") (+ 1 2))");
    assert!(code.contains("(function () {"));
    assert!(code.contains("log(\"step\");"));
    assert!(code.contains("return 1 + 2;"));
}

#[test]
fn class_lowering_produces_fields_constructor_and_methods() {
    let code = compile(
        "(class Point
           (var x 0)
           (constructor (x) (do (set! self.x x)))
           (fn sum () (+ self.x 1)))",
    );
    assert!(code.contains("class Point {"));
    assert!(code.contains("x = 0;"));
    assert!(code.contains("constructor(x) {"));
    assert!(code.contains("this.x = x;"));
    assert!(code.contains("return this;"));
    assert!(code.contains("sum() {"));
    assert!(code.contains("return this.x + 1;"));
}

// ============================================================================
// Data Access
// ============================================================================

#[test]
fn literal_get_folds_to_element_access() {
    let code = compile("(let v (get user \"name\"))");
    assert!(code.contains("const v = user[\"name\"];"));
}

#[test]
fn dynamic_get_keeps_the_runtime_helper() {
    let code = compile("(let v (get user key))");
    assert!(code.contains("const v = get(user, key);"));
}

#[test]
fn single_argument_call_to_unknown_callee_stays_a_call() {
    let code = compile("(arr 0)");
    assert_eq!(code, "arr(0);\n");
}

// ============================================================================
// Boundaries and Invariants
// ============================================================================

#[test]
fn empty_list_compiles_to_empty_array() {
    assert_eq!(compile("()"), "[];\n");
}

#[test]
fn negative_literal_round_trips() {
    assert_eq!(compile("-42"), "-42;\n");
}

#[test]
fn placeholder_never_prints_as_an_identifier() {
    let code = compile("(vector _)");
    assert_eq!(code, "[\"_\"];\n");
}

#[test]
fn quoting_literals_and_symbols() {
    assert_eq!(compile("'42"), "42;\n");
    assert_eq!(compile("'some-name"), "\"some-name\";\n");
    assert_eq!(compile("'(1 x)"), "[1, \"x\"];\n");
}

#[test]
fn imports_and_exports() {
    let code = compile(
        "(import [join dirname as dir] from \"node:path\")\n(export [join])",
    );
    assert!(code.contains("import { join, dirname as dir } from \"node:path\";"));
    assert!(code.contains("export { join };"));
}

#[test]
fn remote_import_uses_deterministic_module_name() {
    let code = compile("(import [map] from \"npm:lodash-es\")");
    assert!(code.contains("import * as lodashEsModule from \"npm:lodash-es\";"));
    assert!(code.contains("const map = lodashEsModule.map;"));
}

#[test]
fn variadic_declaration_accepts_surplus_arguments() {
    let code = compile("(fn tail (first & rest) rest)\n(tail 1 2 3)");
    assert!(code.contains("function tail(first, ...rest) {"));
    assert!(code.contains("tail(1, 2, 3);"));
}

#[test]
fn fx_declaration_emits_rest_args_convention() {
    let code = compile("(fx square (n: Int) (-> Int) (* n n))");
    assert!(code.contains("function square(...args) {"));
    assert!(code.contains("let n = 0;"));
    assert!(code.contains("typeof args[0] === \"object\""));
    assert!(code.contains("!Array.isArray(args[0])"));
    assert!(code.contains("\"n\" in _named"));
    assert!(code.contains("return n * n;"));
}

#[test]
fn fx_object_typed_parameter_is_cloned() {
    let code = compile("(fx touch (data: Any) (-> Any) data)");
    assert!(code.contains("JSON.parse(JSON.stringify(data))"));
}

#[test]
fn output_uses_lf_and_ends_with_single_newline() {
    let code = compile("(+ 1 2)\n(+ 3 4)");
    assert!(!code.contains('\r'));
    assert!(code.ends_with('\n'));
    assert!(!code.ends_with("\n\n"));
}
