// ABOUTME: Configuration and constants for the HQL compiler
// This module contains version info, welcome messages, compiler options, and
// module-loader sandbox configuration

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "HQL Compiler v0.1";
pub const WELCOME_SUBTITLE: &str = "A Lisp-dialect to JavaScript compiler in Rust";
pub const WELCOME_FOOTER: &str =
    "Type an HQL form to see its JavaScript. (help) for docs, (quit) to exit.";

/// The project-level options file looked up next to compiled entry files
pub const OPTIONS_FILE: &str = "hql.json";

// ============================================================================
// Compiler Options
// ============================================================================

/// Tunable output behavior, loadable from an `hql.json` project file;
/// CLI flags override the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Prepend the runtime prelude (get/getNumeric) to compiled modules
    pub emit_runtime: bool,
    /// Fold get(obj, "literal") into direct element access
    pub fold_literal_get: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            emit_runtime: true,
            fold_literal_get: true,
        }
    }
}

impl CompilerOptions {
    /// Load options from `hql.json` in the given directory, falling back to
    /// defaults when the file is absent or malformed (malformed files warn).
    pub fn load_from_dir(dir: &Path) -> Self {
        let path = dir.join(OPTIONS_FILE);
        let Ok(text) = std::fs::read_to_string(&path) else {
            return CompilerOptions::default();
        };
        match serde_json::from_str(&text) {
            Ok(options) => options,
            Err(err) => {
                eprintln!("Warning: ignoring malformed {}: {}", path.display(), err);
                CompilerOptions::default()
            }
        }
    }
}

// ============================================================================
// Module Loader Sandboxing Configuration
// ============================================================================

/// Filesystem sandbox configuration for module resolution
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Roots imports may resolve under
    pub allowed_paths: Vec<PathBuf>,
    /// Maximum module source size in bytes
    pub max_module_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: vec![PathBuf::from(".")],
            // Default max module size: 1MB of source text
            max_module_size: 1024 * 1024,
        }
    }
}

/// Network configuration for remote module specifiers
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    /// Whether remote imports (npm:/jsr:/https:) may be fetched
    pub enabled: bool,
    /// Allowed remote hosts; empty = no restriction (if enabled)
    pub allowed_hosts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CompilerOptions::default();
        assert!(options.emit_runtime);
        assert!(options.fold_literal_get);
    }

    #[test]
    fn test_partial_options_file_fills_defaults() {
        let options: CompilerOptions =
            serde_json::from_str(r#"{ "emit_runtime": false }"#).unwrap();
        assert!(!options.emit_runtime);
        assert!(options.fold_literal_get);
    }

    #[test]
    fn test_missing_options_file_uses_defaults() {
        let options = CompilerOptions::load_from_dir(Path::new("/nonexistent-hql-dir"));
        assert!(options.emit_runtime);
    }
}
