// ABOUTME: Embedded JavaScript runtime prelude shipped with compiled output

use crate::hir::Hir;

/// The helpers emitted code relies on: a polymorphic `get` (function-call
/// coercion when the receiver is callable) and `getNumeric` (element access
/// first, call as the fallback).
pub const PRELUDE: &str = include_str!("runtime/prelude.js");

/// The prelude as a verbatim node, prepended to compiled modules
pub fn prelude_hir() -> Hir {
    Hir::Raw(PRELUDE.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_defines_both_helpers() {
        assert!(PRELUDE.contains("function get(obj, key)"));
        assert!(PRELUDE.contains("function getNumeric(obj, index)"));
    }
}
