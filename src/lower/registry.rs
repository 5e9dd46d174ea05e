// ABOUTME: Registries of user-defined fn/fx declarations for call-site binding

use std::collections::HashMap;

use crate::hir::Param;

/// A registered function declaration, kept for call-site binding of named,
/// defaulted, placeholder, and variadic arguments
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Param>,
    pub typed: bool,
}

impl FunctionSignature {
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.rest)
    }

    /// Number of fixed (non-rest) parameters
    pub fn fixed_arity(&self) -> usize {
        self.params.iter().filter(|p| !p.rest).count()
    }
}

/// The two per-compilation function tables: typed pure declarations (`fx`)
/// and untyped declarations (`fn`). Both are append-only within a single
/// compilation; the owning LoweringCtx is discarded between compilations.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    typed: HashMap<String, FunctionSignature>,
    untyped: HashMap<String, FunctionSignature>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            typed: HashMap::new(),
            untyped: HashMap::new(),
        }
    }

    pub fn register_typed(&mut self, signature: FunctionSignature) {
        self.typed.insert(signature.name.clone(), signature);
    }

    pub fn register_untyped(&mut self, signature: FunctionSignature) {
        self.untyped.insert(signature.name.clone(), signature);
    }

    /// Look a callee up in either table (typed first)
    pub fn lookup(&self, name: &str) -> Option<&FunctionSignature> {
        self.typed.get(name).or_else(|| self.untyped.get(name))
    }

    pub fn is_typed(&self, name: &str) -> bool {
        self.typed.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.typed.len() + self.untyped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.untyped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::Param;

    fn signature(name: &str, params: Vec<Param>, typed: bool) -> FunctionSignature {
        FunctionSignature {
            name: name.to_string(),
            params,
            typed,
        }
    }

    #[test]
    fn test_lookup_prefers_typed_table() {
        let mut registry = FunctionRegistry::new();
        registry.register_untyped(signature("f", vec![Param::simple("a")], false));
        registry.register_typed(signature("f", vec![Param::simple("b")], true));

        let found = registry.lookup("f").unwrap();
        assert!(found.typed);
        assert_eq!(found.params[0].name, "b");
    }

    #[test]
    fn test_variadic_detection() {
        let mut rest = Param::simple("items");
        rest.rest = true;
        let sig = signature("f", vec![Param::simple("a"), rest], false);
        assert!(sig.is_variadic());
        assert_eq!(sig.fixed_arity(), 1);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = FunctionRegistry::new();
        assert!(registry.lookup("nope").is_none());
        assert!(registry.is_empty());
    }
}
