// ABOUTME: Command-line entry point: compile HQL files to JavaScript or run the REPL

use std::path::{Path, PathBuf};

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use termimad::MadSkin;

use hql::ast::Sexp;
use hql::cache::ImportCache;
use hql::config::{
    self, CompilerOptions, FsConfig, NetConfig, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE,
};
use hql::help;
use hql::highlighter::HqlHelper;
use hql::loader::ModuleLoader;
use hql::lower::LoweringCtx;
use hql::pipeline::Pipeline;
use hql::reader::parse_program;

/// HQL to JavaScript compiler with a REPL and sandboxed module loading
#[derive(Parser, Debug)]
#[command(name = "hql")]
#[command(version = config::VERSION)]
#[command(about = "An HQL (Lisp-dialect) to JavaScript compiler")]
#[command(long_about = "Compiles HQL source files to JavaScript. Without a file, starts an \
interactive REPL that echoes the compiled JavaScript for each form.")]
struct CliArgs {
    /// Source file to compile (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    source: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,

    /// Print the intermediate tree as JSON instead of JavaScript
    #[arg(long = "emit-hir")]
    emit_hir: bool,

    /// Print the target AST as JSON instead of JavaScript
    #[arg(long = "emit-js-ast")]
    emit_js_ast: bool,

    /// Skip the runtime prelude in the output
    #[arg(long = "no-runtime")]
    no_runtime: bool,

    /// Keep literal get calls instead of folding them to element access
    #[arg(long = "no-fold-get")]
    no_fold_get: bool,

    /// Verify that every static import resolves before emitting output
    #[arg(long = "check-imports")]
    check_imports: bool,

    /// Add an allowed module root (can be repeated)
    #[arg(long = "module-root", value_name = "PATH", action = clap::ArgAction::Append)]
    module_roots: Vec<PathBuf>,

    /// Enable fetching of remote imports (npm:/jsr:/https:)
    #[arg(long = "allow-net")]
    allow_net: bool,

    /// Add an allowed remote host (can be repeated)
    #[arg(long = "net-allow", value_name = "HOST", action = clap::ArgAction::Append)]
    net_hosts: Vec<String>,

    /// Import cache database path (defaults to an in-memory cache)
    #[arg(long = "cache", value_name = "PATH")]
    cache: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(source_path) = args.source.clone() {
        return compile_file(&args, &source_path);
    }

    repl(&args)
}

// ============================================================================
// Compile Mode
// ============================================================================

/// Project options from hql.json next to the source, overridden by flags
fn build_options(args: &CliArgs, source_dir: Option<&Path>) -> CompilerOptions {
    let mut options = match source_dir {
        Some(dir) => CompilerOptions::load_from_dir(dir),
        None => CompilerOptions::default(),
    };
    if args.no_runtime {
        options.emit_runtime = false;
    }
    if args.no_fold_get {
        options.fold_literal_get = false;
    }
    options
}

/// Build filesystem configuration from CLI arguments
fn build_fs_config(args: &CliArgs) -> FsConfig {
    if args.module_roots.is_empty() {
        return FsConfig::default();
    }
    FsConfig {
        allowed_paths: args.module_roots.clone(),
        ..FsConfig::default()
    }
}

/// Build network configuration from CLI arguments
fn build_net_config(args: &CliArgs) -> NetConfig {
    NetConfig {
        enabled: args.allow_net,
        allowed_hosts: args.net_hosts.clone(),
    }
}

fn build_loader(args: &CliArgs) -> Result<ModuleLoader, Box<dyn std::error::Error>> {
    let cache = match &args.cache {
        Some(path) => ImportCache::open(path)?,
        None => ImportCache::in_memory()?,
    };
    Ok(ModuleLoader::new(
        build_fs_config(args),
        build_net_config(args),
        cache,
    )?)
}

fn compile_file(args: &CliArgs, source_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(source_path)
        .map_err(|e| format!("Cannot read source file {}: {}", source_path.display(), e))?;
    let file_name = source_path.display().to_string();

    let options = build_options(args, source_path.parent());
    let pipeline = Pipeline::new(options);

    if args.check_imports {
        let loader = build_loader(args)?;
        let forms = parse_program(&source, &file_name)?;
        check_imports(&loader, &forms);
    }

    if args.emit_hir {
        let (hir, warnings) = pipeline.lower_source(&source, &file_name)?;
        report_warnings(&warnings);
        println!("{}", serde_json::to_string_pretty(&hir)?);
        return Ok(());
    }

    if args.emit_js_ast {
        let (js, warnings) = pipeline.js_ast_source(&source, &file_name)?;
        report_warnings(&warnings);
        println!("{}", serde_json::to_string_pretty(&js)?);
        return Ok(());
    }

    let output = pipeline.compile_source(&source, &file_name)?;
    report_warnings(&output.warnings);

    match &args.out {
        Some(out_path) => {
            std::fs::write(out_path, &output.code)
                .map_err(|e| format!("Cannot write {}: {}", out_path.display(), e))?;
        }
        None => print!("{}", output.code),
    }

    Ok(())
}

fn report_warnings(warnings: &[hql::lower::LoweringWarning]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}

/// Resolve every static import in the program, warning on failures
fn check_imports(loader: &ModuleLoader, forms: &[Sexp]) {
    for form in forms {
        let Some(list) = form.as_list() else { continue };
        let head_is_import = list
            .items
            .first()
            .is_some_and(|h| h.is_symbol("import") || h.is_symbol("js-import"));
        if !head_is_import {
            continue;
        }
        let Some(Sexp::Str(source)) = list
            .items
            .iter()
            .rev()
            .find(|item| matches!(item, Sexp::Str(_)))
        else {
            continue;
        };
        if let Err(err) = loader.load(source) {
            eprintln!("Warning: import '{}' does not resolve: {}", source, err);
        }
    }
}

// ============================================================================
// REPL Mode
// ============================================================================

fn repl(args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(args, None);
    let pipeline = Pipeline::new(CompilerOptions {
        emit_runtime: false,
        ..options
    });

    // One lowering context for the whole session so fn/fx declarations
    // stay visible to later call sites
    let mut ctx = LoweringCtx::new();
    let skin = MadSkin::default();

    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<HqlHelper, DefaultHistory> = Editor::with_config(rl_config)
        .map_err(|e| format!("Failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(HqlHelper::new()));

    let history_file = ".hql_history";
    let _ = rl.load_history(history_file);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);
    println!("{}", WELCOME_FOOTER);

    loop {
        match rl.readline("hql> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match trimmed {
                    "(quit)" | "(exit)" => {
                        println!("Goodbye!");
                        break;
                    }
                    "(clear)" => {
                        print!("\x1B[2J\x1B[H"); // ANSI clear screen
                        continue;
                    }
                    "(help)" => {
                        skin.print_text(&help::format_overview());
                        continue;
                    }
                    _ => {}
                }

                if let Some(topic) = parse_help_command(trimmed) {
                    match help::index().entry(&topic) {
                        Some(form) => skin.print_text(&help::format_form_help(form)),
                        None => eprintln!("No documentation for '{}'", topic),
                    }
                    continue;
                }

                match pipeline.compile_snippet(&mut ctx, &line) {
                    Ok(code) if code.is_empty() => {}
                    Ok(code) => print!("{}", code),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

/// `(help "name")` / `(help name)` meta command
fn parse_help_command(line: &str) -> Option<String> {
    let rest = line.strip_prefix("(help")?;
    if !rest.starts_with([' ', '\t', '"']) {
        return None;
    }
    let inner = rest.strip_suffix(')')?.trim();
    if inner.is_empty() {
        return None;
    }
    Some(inner.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            source: None,
            out: None,
            emit_hir: false,
            emit_js_ast: false,
            no_runtime: false,
            no_fold_get: false,
            check_imports: false,
            module_roots: vec![],
            allow_net: false,
            net_hosts: vec![],
            cache: None,
        }
    }

    #[test]
    fn test_build_fs_config_with_defaults() {
        let config = build_fs_config(&base_args());
        assert_eq!(config.allowed_paths, vec![PathBuf::from(".")]);
        assert_eq!(config.max_module_size, 1024 * 1024);
    }

    #[test]
    fn test_build_fs_config_with_custom_roots() {
        let mut args = base_args();
        args.module_roots = vec![PathBuf::from("./src"), PathBuf::from("./vendor")];

        let config = build_fs_config(&args);
        assert_eq!(config.allowed_paths.len(), 2);
        assert_eq!(config.allowed_paths[0], PathBuf::from("./src"));
        assert_eq!(config.allowed_paths[1], PathBuf::from("./vendor"));
        // Custom roots keep the default size limit
        assert_eq!(config.max_module_size, 1024 * 1024);
    }

    #[test]
    fn test_build_net_config_disabled_by_default() {
        let config = build_net_config(&base_args());
        assert!(!config.enabled);
        assert!(config.allowed_hosts.is_empty());
    }

    #[test]
    fn test_build_net_config_with_allowlist() {
        let mut args = base_args();
        args.allow_net = true;
        args.net_hosts = vec!["esm.sh".to_string(), "registry.local".to_string()];

        let config = build_net_config(&args);
        assert!(config.enabled);
        assert_eq!(config.allowed_hosts.len(), 2);
        assert_eq!(config.allowed_hosts[0], "esm.sh");
        assert_eq!(config.allowed_hosts[1], "registry.local");
    }

    #[test]
    fn test_build_options_defaults_without_project_file() {
        let options = build_options(&base_args(), None);
        assert!(options.emit_runtime);
        assert!(options.fold_literal_get);
    }

    #[test]
    fn test_build_options_flag_overrides() {
        let mut args = base_args();
        args.no_runtime = true;
        args.no_fold_get = true;

        let options = build_options(&args, None);
        assert!(!options.emit_runtime);
        assert!(!options.fold_literal_get);
    }

    #[test]
    fn test_build_options_reads_project_file_and_flags_win() {
        let dir = std::env::temp_dir().join("hql-main-options-test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(config::OPTIONS_FILE),
            r#"{ "fold_literal_get": false }"#,
        )
        .unwrap();

        // The project file turns the fold off, runtime stays on
        let options = build_options(&base_args(), Some(&dir));
        assert!(options.emit_runtime);
        assert!(!options.fold_literal_get);

        // A flag still overrides what the file left alone
        let mut args = base_args();
        args.no_runtime = true;
        let options = build_options(&args, Some(&dir));
        assert!(!options.emit_runtime);
        assert!(!options.fold_literal_get);
    }

    #[test]
    fn test_cli_args_source_argument() {
        let mut args = base_args();
        args.source = Some(PathBuf::from("main.hql"));
        assert_eq!(args.source.as_deref(), Some(Path::new("main.hql")));
    }

    #[test]
    fn test_parse_help_command_shapes() {
        assert_eq!(parse_help_command("(help \"loop\")").as_deref(), Some("loop"));
        assert_eq!(parse_help_command("(help loop)").as_deref(), Some("loop"));
        assert_eq!(parse_help_command("(help)"), None);
        // A call to a function that merely starts with "help" is not a
        // meta command
        assert_eq!(parse_help_command("(helpless 1)"), None);
        assert_eq!(parse_help_command("(+ 1 2)"), None);
    }
}
