// ABOUTME: The compilation pipeline: reader -> lowering -> codegen -> printer

use crate::ast::Sexp;
use crate::codegen::{Codegen, CodegenOptions};
use crate::config::CompilerOptions;
use crate::error::CompileError;
use crate::hir::Hir;
use crate::js_ast::JsStmt;
use crate::lower::{lower_program, LoweringCtx, LoweringWarning};
use crate::printer::print_module;
use crate::reader::parse_program;
use crate::runtime;

/// Result of compiling one module: the printed source plus any per-form
/// failures that were collected rather than aborting the compilation
#[derive(Debug)]
pub struct CompileOutput {
    pub code: String,
    pub warnings: Vec<LoweringWarning>,
}

/// One compilation pipeline. Holds only options; all per-compilation state
/// lives in the LoweringCtx created inside each call, so a pipeline value
/// can be reused across independent compilations.
pub struct Pipeline {
    options: CompilerOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

impl Pipeline {
    pub fn new(options: CompilerOptions) -> Self {
        Pipeline { options }
    }

    fn codegen(&self) -> Codegen {
        Codegen::with_options(CodegenOptions {
            fold_literal_get: self.options.fold_literal_get,
        })
    }

    /// Compile HQL source text to a single JavaScript module
    pub fn compile_source(&self, source: &str, file: &str) -> Result<CompileOutput, CompileError> {
        let forms = parse_program(source, file)?;
        self.compile_forms(&forms)
    }

    /// Compile already-parsed (and macro-expanded) top-level forms
    pub fn compile_forms(&self, forms: &[Sexp]) -> Result<CompileOutput, CompileError> {
        let mut ctx = LoweringCtx::new();
        let (mut hir, warnings) = lower_program(&mut ctx, forms)?;

        if self.options.emit_runtime && !hir.is_empty() {
            hir.insert(0, runtime::prelude_hir());
        }
        let statements = self.codegen().module(&hir)?;

        Ok(CompileOutput {
            code: print_module(&statements),
            warnings,
        })
    }

    /// Lower source to HIR without generating code (--emit-hir)
    pub fn lower_source(
        &self,
        source: &str,
        file: &str,
    ) -> Result<(Vec<Hir>, Vec<LoweringWarning>), CompileError> {
        let forms = parse_program(source, file)?;
        let mut ctx = LoweringCtx::new();
        lower_program(&mut ctx, &forms)
    }

    /// Convert source to the target AST without printing (--emit-js-ast)
    pub fn js_ast_source(
        &self,
        source: &str,
        file: &str,
    ) -> Result<(Vec<JsStmt>, Vec<LoweringWarning>), CompileError> {
        let (hir, warnings) = self.lower_source(source, file)?;
        Ok((self.codegen().module(&hir)?, warnings))
    }

    /// Compile one form against a caller-owned context (REPL turns share a
    /// context so fn/fx registrations persist across lines). No runtime
    /// prelude is attached.
    pub fn compile_snippet(
        &self,
        ctx: &mut LoweringCtx,
        source: &str,
    ) -> Result<String, CompileError> {
        let forms = parse_program(source, "<repl>")?;
        let (hir, _warnings) = lower_program(ctx, &forms)?;
        let statements = self.codegen().module(&hir)?;
        Ok(print_module(&statements))
    }
}
