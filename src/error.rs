// ABOUTME: Error types for the HQL compilation pipeline

use crate::ast::SourceLoc;
use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_AT_LEAST_TWO: &str = "at least 2";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";

#[derive(Error, Debug, Clone)]
pub enum CompileError {
    /// Input shape violates a form's contract
    #[error("{context}: {message} (expected {expected}, got {actual})")]
    Validation {
        message: String,
        context: String,
        expected: String,
        actual: String,
        location: Option<SourceLoc>,
    },

    /// AST-to-HIR lowering failure with preserved cause
    #[error("{context}: {message}")]
    Transform {
        message: String,
        context: String,
        #[source]
        cause: Option<Box<CompileError>>,
    },

    /// HIR-to-JS conversion or printing failure with preserved cause
    #[error("{context}: {message}")]
    CodeGen {
        message: String,
        context: String,
        #[source]
        cause: Option<Box<CompileError>>,
    },

    /// Module resolution or import declaration failure
    #[error("import error: {message}")]
    Import {
        message: String,
        location: Option<SourceLoc>,
    },

    /// Reader failure (malformed surface syntax)
    #[error("parse error: {0}")]
    Read(String),

    /// Loader or cache I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl CompileError {
    /// Create a validation error with full context
    pub fn validation(
        context: &str,
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        CompileError::Validation {
            message: message.into(),
            context: context.to_string(),
            expected: expected.into(),
            actual: actual.into(),
            location: None,
        }
    }

    /// Create an arity validation error
    pub fn arity(context: &str, expected: &str, actual: usize) -> Self {
        CompileError::Validation {
            message: "wrong number of arguments".to_string(),
            context: context.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            location: None,
        }
    }

    /// Create a transform error with no cause
    pub fn transform(context: &str, message: impl Into<String>) -> Self {
        CompileError::Transform {
            message: message.into(),
            context: context.to_string(),
            cause: None,
        }
    }

    /// Create a codegen error with no cause
    pub fn codegen(context: &str, message: impl Into<String>) -> Self {
        CompileError::CodeGen {
            message: message.into(),
            context: context.to_string(),
            cause: None,
        }
    }

    /// Create an import error
    pub fn import(message: impl Into<String>) -> Self {
        CompileError::Import {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source location to a validation or import error.
    /// Other variants pass through unchanged.
    pub fn at(mut self, loc: Option<SourceLoc>) -> Self {
        match &mut self {
            CompileError::Validation { location, .. } | CompileError::Import { location, .. } => {
                if location.is_none() {
                    *location = loc;
                }
            }
            _ => {}
        }
        self
    }

    /// The source location carried by this error, if any
    pub fn location(&self) -> Option<&SourceLoc> {
        match self {
            CompileError::Validation { location, .. } | CompileError::Import { location, .. } => {
                location.as_ref()
            }
            _ => None,
        }
    }

    /// Wrap an error in a Transform envelope with a context string.
    /// An error that is already a Transform (or a Validation, which carries
    /// its own context) is re-thrown unchanged.
    pub fn transform_context(context: &str, err: CompileError) -> CompileError {
        match err {
            CompileError::Transform { .. }
            | CompileError::Validation { .. }
            | CompileError::Import { .. } => err,
            other => CompileError::Transform {
                message: other.to_string(),
                context: context.to_string(),
                cause: Some(Box::new(other)),
            },
        }
    }

    /// Wrap an error in a CodeGen envelope with a context string.
    /// An error that is already a CodeGen is re-thrown unchanged.
    pub fn codegen_context(context: &str, err: CompileError) -> CompileError {
        match err {
            CompileError::CodeGen { .. } => err,
            other => CompileError::CodeGen {
                message: other.to_string(),
                context: context.to_string(),
                cause: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLoc;

    #[test]
    fn test_validation_display() {
        let err = CompileError::validation("if", "malformed condition", "expression", "nothing");
        assert_eq!(
            format!("{}", err),
            "if: malformed condition (expected expression, got nothing)"
        );
    }

    #[test]
    fn test_arity_display() {
        let err = CompileError::arity("set!", ARITY_TWO, 3);
        assert_eq!(
            format!("{}", err),
            "set!: wrong number of arguments (expected 2, got 3)"
        );
    }

    #[test]
    fn test_at_attaches_location_once() {
        let loc = SourceLoc::new("main.hql", 3, 7);
        let err = CompileError::validation("fn", "bad parameter", "symbol", "list")
            .at(Some(loc.clone()))
            .at(Some(SourceLoc::new("other.hql", 1, 1)));

        assert_eq!(err.location(), Some(&loc));
    }

    #[test]
    fn test_transform_context_wraps_foreign_errors() {
        let inner = CompileError::Read("unexpected )".to_string());
        let wrapped = CompileError::transform_context("lowering body", inner);

        match &wrapped {
            CompileError::Transform { context, cause, .. } => {
                assert_eq!(context, "lowering body");
                assert!(cause.is_some());
            }
            other => panic!("Expected Transform, got {:?}", other),
        }
    }

    #[test]
    fn test_transform_context_passes_through_same_kind() {
        let inner = CompileError::transform("loop", "recur outside loop body");
        let rewrapped = CompileError::transform_context("outer", inner);

        match &rewrapped {
            CompileError::Transform { context, cause, .. } => {
                assert_eq!(context, "loop");
                assert!(cause.is_none());
            }
            other => panic!("Expected Transform, got {:?}", other),
        }
    }
}
