//! Procedural macros for hql special-form transformers
//!
//! Provides the `#[special_form]` attribute macro for defining lowering
//! transformers with rustdoc-style documentation that is automatically
//! converted to help entries and dispatch-table registration code.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// A parsed markdown documentation with structured sections
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct DocMarkdown {
    summary: String,
    examples: Vec<String>,
    see_also: Vec<String>,
    full_markdown: String,
}

/// Extract rustdoc comments from function attributes
fn extract_doc_comments(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit_str),
                        ..
                    }) = &nv.value
                    {
                        return Some(lit_str.value());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse markdown sections from documentation
fn parse_doc_markdown(raw_doc: &str) -> DocMarkdown {
    let mut summary = String::new();
    let mut examples = Vec::new();
    let mut see_also = Vec::new();
    let mut current_section = "summary";
    let mut current_content = String::new();

    fn collect_examples(content: &str, examples: &mut Vec<String>) {
        for code_block in content.split("```") {
            let trimmed_block = code_block.trim();
            if let Some(code_str) = trimmed_block.strip_prefix("hql") {
                let code = code_str.trim().to_string();
                if !code.is_empty() {
                    examples.push(code);
                }
            }
        }
    }

    fn collect_see_also(content: &str) -> Vec<String> {
        content
            .trim()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    for line in raw_doc.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("# ") {
            // Save previous section
            match current_section {
                "summary" => summary = current_content.trim().to_string(),
                "examples" => collect_examples(&current_content, &mut examples),
                "see also" => see_also = collect_see_also(&current_content),
                _ => {}
            }

            // Parse new section header
            let header = rest.trim().to_lowercase();
            current_section = if header.contains("example") {
                "examples"
            } else if header.contains("see") || header.contains("related") {
                "see also"
            } else {
                "other"
            };
            current_content.clear();
        } else {
            current_content.push_str(line);
            current_content.push('\n');
        }
    }

    // Save last section
    match current_section {
        "summary" => summary = current_content.trim().to_string(),
        "examples" => collect_examples(&current_content, &mut examples),
        "see also" => see_also = collect_see_also(&current_content),
        _ => {}
    }

    DocMarkdown {
        summary,
        examples,
        see_also,
        full_markdown: raw_doc.to_string(),
    }
}

/// Parse special_form attribute arguments: name = "...", category = "...",
/// signature = "...", related(...)
fn parse_form_args(attr_stream: TokenStream) -> (String, String, String, Vec<String>) {
    let attr_str = attr_stream.to_string();

    let mut name = String::new();
    let mut category = String::new();
    let mut signature = String::new();
    let mut related = Vec::new();

    fn string_arg(attr_str: &str, key: &str) -> Option<String> {
        let marker = format!("{} = \"", key);
        let start = attr_str.find(&marker)?;
        let rest = &attr_str[start + marker.len()..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    }

    if let Some(v) = string_arg(&attr_str, "name") {
        name = v;
    }
    if let Some(v) = string_arg(&attr_str, "category") {
        category = v;
    }
    if let Some(v) = string_arg(&attr_str, "signature") {
        signature = v;
    }

    // Parse related forms
    if let Some(start) = attr_str.find("related") {
        let rest = &attr_str[start..];
        if let Some(paren_start) = rest.find('(') {
            if let Some(paren_end) = rest.find(')') {
                let related_str = &rest[paren_start + 1..paren_end];
                related = related_str
                    .split(',')
                    .map(|s| s.trim().trim_matches('"').to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
    }

    (name, category, signature, related)
}

/// Attribute macro for defining HQL special-form transformers
///
/// Extracts rustdoc comments and submits an inventory registration entry
/// that binds the head symbol to the transformer in the lowering dispatch
/// table and registers help documentation.
///
/// # Attribute Arguments
///
/// - `name`: The HQL head symbol this transformer handles (e.g., "if")
/// - `category`: Category for help organization (e.g., "Control Flow")
/// - `signature`: Optional signature override (defaults to "(name ...)")
/// - `related`: Related forms to list in help
///
/// # Example
///
/// ```ignore
/// #[special_form(name = "if", category = "Control Flow", related(cond, when))]
/// /// Conditional expression with an optional else branch.
/// ///
/// /// # Examples
/// /// ```hql
/// /// (if (< x 3) "small" "big")
/// /// ```
/// pub fn lower_if(ctx: &mut LoweringCtx, form: &[Sexp]) -> Result<Lowered, CompileError> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn special_form(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    // Extract metadata from attribute
    let (form_name, category, signature, related) = parse_form_args(attr);

    let fn_name = func.sig.ident.clone();
    let fn_ident_str = fn_name.to_string();

    // Use provided name or fall back to function name
    let name_to_use = if !form_name.is_empty() {
        form_name
    } else {
        fn_ident_str.clone()
    };

    // Extract and parse doc comments
    let raw_docs = extract_doc_comments(&func.attrs);
    let parsed_docs = parse_doc_markdown(&raw_docs);

    let description = if !parsed_docs.summary.is_empty() {
        parsed_docs.summary.clone()
    } else {
        parsed_docs.full_markdown.trim().to_string()
    };

    let examples = parsed_docs.examples.clone();
    let related_vec = related;

    let cat_to_use = if !category.is_empty() {
        category
    } else {
        "Other".to_string()
    };

    let sig_to_use = if !signature.is_empty() {
        signature
    } else {
        format!("({} ...)", name_to_use)
    };

    let expanded = quote! {
        #func

        inventory::submit! {
            crate::lower::FormRegistration {
                name: #name_to_use,
                category: #cat_to_use,
                signature: #sig_to_use,
                description: #description,
                examples: &[#(#examples),*],
                related: &[#(#related_vec),*],
                handler: #fn_name,
            }
        }
    };

    TokenStream::from(expanded)
}
