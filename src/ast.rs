// ABOUTME: Surface AST types produced by the reader and consumed by lowering

use std::fmt;

/// A position in an HQL source file (1-based line and column)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceLoc {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        SourceLoc {
            file: file.to_string(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A symbol node. Location metadata does not participate in equality.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Symbol {
    pub name: String,
    pub loc: Option<SourceLoc>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            loc: None,
        }
    }

    pub fn at(name: impl Into<String>, loc: SourceLoc) -> Self {
        Symbol {
            name: name.into(),
            loc: Some(loc),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A list node. Location metadata does not participate in equality.
#[derive(Debug, Clone, serde::Serialize)]
pub struct List {
    pub items: Vec<Sexp>,
    pub loc: Option<SourceLoc>,
}

impl List {
    pub fn new(items: Vec<Sexp>) -> Self {
        List { items, loc: None }
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// One node of the macro-expanded surface tree handed to the lowering pass
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Sexp {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Symbol(Symbol),
    List(List),
}

impl Sexp {
    pub fn symbol(name: impl Into<String>) -> Self {
        Sexp::Symbol(Symbol::new(name))
    }

    pub fn list(items: Vec<Sexp>) -> Self {
        Sexp::List(List::new(items))
    }

    /// True when this node is the symbol `name`
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Sexp::Symbol(sym) if sym.name == name)
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Sexp::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn symbol_name(&self) -> Option<&str> {
        self.as_symbol().map(|s| s.name.as_str())
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Sexp::List(list) => Some(list),
            _ => None,
        }
    }

    /// True for the literal node kinds (null, boolean, number, string)
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Sexp::Null | Sexp::Bool(_) | Sexp::Number(_) | Sexp::Str(_)
        )
    }

    /// Source location carried by this node, if any.
    /// Literals carry no location; symbols and lists usually do.
    pub fn loc(&self) -> Option<&SourceLoc> {
        match self {
            Sexp::Symbol(sym) => sym.loc.as_ref(),
            Sexp::List(list) => list.loc.as_ref(),
            _ => None,
        }
    }

    /// Short kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Sexp::Null => "null",
            Sexp::Bool(_) => "boolean",
            Sexp::Number(_) => "number",
            Sexp::Str(_) => "string",
            Sexp::Symbol(_) => "symbol",
            Sexp::List(_) => "list",
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Null => write!(f, "nil"),
            Sexp::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Sexp::Number(n) => {
                // Whole numbers display without a decimal point
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Sexp::Str(s) => write!(f, "\"{}\"", s),
            Sexp::Symbol(sym) => write!(f, "{}", sym.name),
            Sexp::List(list) => {
                write!(f, "(")?;
                for (i, item) in list.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        let whole = Sexp::Number(42.0);
        assert_eq!(format!("{}", whole), "42");

        let decimal = Sexp::Number(-2.5);
        assert_eq!(format!("{}", decimal), "-2.5");

        let zero = Sexp::Number(0.0);
        assert_eq!(format!("{}", zero), "0");
    }

    #[test]
    fn test_list_display_with_nested_lists() {
        let nested = Sexp::list(vec![
            Sexp::Number(1.0),
            Sexp::list(vec![Sexp::Number(2.0), Sexp::Number(3.0)]),
            Sexp::Number(4.0),
        ]);
        assert_eq!(format!("{}", nested), "(1 (2 3) 4)");

        let empty = Sexp::list(vec![]);
        assert_eq!(format!("{}", empty), "()");
    }

    #[test]
    fn test_symbol_equality_ignores_location() {
        let bare = Sexp::symbol("foo");
        let located = Sexp::Symbol(Symbol::at("foo", SourceLoc::new("main.hql", 4, 2)));
        assert_eq!(bare, located);
    }

    #[test]
    fn test_is_symbol() {
        let sym = Sexp::symbol("loop");
        assert!(sym.is_symbol("loop"));
        assert!(!sym.is_symbol("recur"));
        assert!(!Sexp::Number(1.0).is_symbol("loop"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Sexp::Null.kind_name(), "null");
        assert_eq!(Sexp::Bool(true).kind_name(), "boolean");
        assert_eq!(Sexp::Str("x".to_string()).kind_name(), "string");
        assert_eq!(Sexp::list(vec![]).kind_name(), "list");
    }
}
