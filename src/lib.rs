// ABOUTME: Library module exposing the compiler pipeline and its components

pub mod ast;
pub mod cache;
pub mod codegen;
pub mod config;
pub mod error;
pub mod help;
pub mod highlighter;
pub mod hir;
pub mod js_ast;
pub mod loader;
pub mod lower;
pub mod pipeline;
pub mod printer;
pub mod reader;
pub mod runtime;
