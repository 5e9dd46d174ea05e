// ABOUTME: Reader module parsing HQL source text into the surface AST using nom combinators

use nom::{
    branch::alt,
    bytes::complete::{escaped, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{opt, recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::ast::{List, Sexp, SourceLoc, Symbol};
use crate::error::CompileError;

const SYMBOL_FIRST: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*/%<>=!?._&$";

fn is_symbol_continue(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '-' | '_' | '?' | '!' | '<' | '>' | '=' | '+' | '*' | '/' | '%' | '.' | ':' | '&' | '$'
        )
}

// ============================================================================
// Comment and Whitespace Handling
// ============================================================================

/// Parse a comment (from `;` to end of line). Comments are discarded;
/// preserving them in the output is a non-goal.
fn parse_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

/// Skip whitespace and comments
fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((value((), multispace1), parse_comment)))
        .map(|_| ())
        .parse(input)
}

// ============================================================================
// Literal Parsers
// ============================================================================

/// Parse a number (integer or floating point)
/// Handles: 42, -42, 3.14, -3.14, .5, -.5
fn parse_number(input: &str) -> IResult<&str, Sexp> {
    recognize((
        opt(char('-')),
        alt((
            // Numbers starting with a digit: 123, 123.456
            recognize((digit1, opt((char('.'), opt(digit1))))),
            // Numbers starting with a decimal point: .5, .123
            recognize((char('.'), digit1)),
        )),
    ))
    .map(|num_str: &str| {
        let num: f64 = num_str.parse().expect("Failed to parse number");
        Sexp::Number(num)
    })
    .parse(input)
}

/// Parse a string with escape sequences
/// Handles: "hello world", with escapes: \", \\, \n, \t
fn parse_string(input: &str) -> IResult<&str, Sexp> {
    let (input, _) = char('"')(input)?;

    // Handle empty strings
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, Sexp::Str(String::new())));
    }

    let (input, content) = escaped(none_of("\"\\"), '\\', one_of("\"\\nt"))(input)?;
    let (input, _) = char('"')(input)?;

    // Process escape sequences
    let mut result = String::new();
    let mut chars = content.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                match next {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    _ => {
                        result.push('\\');
                        result.push(next);
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok((input, Sexp::Str(result)))
}

// ============================================================================
// Reader
// ============================================================================

/// Parser over one source buffer. Holds the full text so each node can be
/// stamped with its byte offset converted to a line/column location.
struct Reader<'a> {
    src: &'a str,
    file: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str, file: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in src.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Reader {
            src,
            file,
            line_starts,
        }
    }

    /// Location of the first unconsumed character of `rest`.
    /// `rest` is always a suffix of the source buffer, so the offset is the
    /// difference of the lengths.
    fn loc(&self, rest: &str) -> SourceLoc {
        let offset = self.src.len() - rest.len();
        let line_idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        SourceLoc {
            file: self.file.to_string(),
            line: (line_idx + 1) as u32,
            column: (offset - self.line_starts[line_idx] + 1) as u32,
        }
    }

    /// Parse a symbol, mapping the reserved words true/false/nil/null to
    /// their literal nodes. All other meaning (dot prefixes, js/ namespaces,
    /// trailing colons, the `_` placeholder) belongs to the lowering pass.
    fn parse_symbol(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let loc = self.loc(input);
        let (input, first) = one_of(SYMBOL_FIRST)(input)?;
        let (input, rest) =
            take_while1::<_, _, nom::error::Error<_>>(is_symbol_continue)(input)
                .unwrap_or((input, ""));

        let mut name = String::new();
        name.push(first);
        name.push_str(rest);

        let node = match name.as_str() {
            "true" => Sexp::Bool(true),
            "false" => Sexp::Bool(false),
            "nil" | "null" => Sexp::Null,
            _ => Sexp::Symbol(Symbol {
                name,
                loc: Some(loc),
            }),
        };
        Ok((input, node))
    }

    /// Parse a quoted expression: 'expr -> (quote expr)
    fn parse_quote(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let loc = self.loc(input);
        let (input, _) = char('\'')(input)?;
        let (input, expr) = self.parse_expr(input)?;
        Ok((input, self.sugar_list("quote", expr, loc)))
    }

    /// Parse a quasiquoted expression: `expr -> (quasiquote expr)
    fn parse_quasiquote(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let loc = self.loc(input);
        let (input, _) = char('`')(input)?;
        let (input, expr) = self.parse_expr(input)?;
        Ok((input, self.sugar_list("quasiquote", expr, loc)))
    }

    /// Parse an unquote expression: ,expr -> (unquote expr)
    /// or unquote-splicing: ,@expr -> (unquote-splicing expr)
    fn parse_unquote(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let loc = self.loc(input);
        let (input, _) = char(',')(input)?;

        if let Ok((input, _)) = char::<_, nom::error::Error<_>>('@')(input) {
            let (input, expr) = self.parse_expr(input)?;
            Ok((input, self.sugar_list("unquote-splicing", expr, loc)))
        } else {
            let (input, expr) = self.parse_expr(input)?;
            Ok((input, self.sugar_list("unquote", expr, loc)))
        }
    }

    fn sugar_list(&self, head: &str, expr: Sexp, loc: SourceLoc) -> Sexp {
        Sexp::List(List {
            items: vec![
                Sexp::Symbol(Symbol {
                    name: head.to_string(),
                    loc: Some(loc.clone()),
                }),
                expr,
            ],
            loc: Some(loc),
        })
    }

    /// Parse a list: (expr1 expr2 ...)
    /// The empty list stays a list; lowering gives it meaning.
    fn parse_list(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let loc = self.loc(input);
        let (input, _) = char('(')(input)?;
        self.parse_items_until(input, ')', loc, None)
    }

    /// Parse a vector: [expr1 expr2 ...] desugars to (vector expr1 expr2 ...)
    fn parse_vector(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let loc = self.loc(input);
        let (input, _) = char('[')(input)?;
        self.parse_items_until(input, ']', loc, Some("vector"))
    }

    fn parse_items_until(
        &self,
        input: &'a str,
        close: char,
        loc: SourceLoc,
        head: Option<&str>,
    ) -> IResult<&'a str, Sexp> {
        let (input, _) = ws_and_comments(input)?;

        let mut items = Vec::new();
        if let Some(head) = head {
            items.push(Sexp::Symbol(Symbol {
                name: head.to_string(),
                loc: Some(loc.clone()),
            }));
        }
        let mut remaining = input;

        loop {
            if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(close)(remaining) {
                return Ok((
                    rest,
                    Sexp::List(List {
                        items,
                        loc: Some(loc),
                    }),
                ));
            }

            let (rest, expr) = self.parse_expr(remaining)?;
            items.push(expr);

            let (rest, _) = ws_and_comments(rest)?;
            remaining = rest;
        }
    }

    /// Main expression parser - tries all alternatives
    fn parse_expr(&self, input: &'a str) -> IResult<&'a str, Sexp> {
        let (input, _) = ws_and_comments(input)?;
        alt((
            |i| self.parse_quote(i),
            |i| self.parse_quasiquote(i),
            |i| self.parse_unquote(i),
            |i| self.parse_list(i),
            |i| self.parse_vector(i),
            parse_number,
            parse_string,
            |i| self.parse_symbol(i),
        ))
        .parse(input)
    }
}

// ============================================================================
// Public Entry Points
// ============================================================================

/// Parse a whole program: a sequence of top-level forms
pub fn parse_program(source: &str, file: &str) -> Result<Vec<Sexp>, CompileError> {
    let reader = Reader::new(source, file);
    let mut forms = Vec::new();
    let mut input = source;

    loop {
        let (rest, _) =
            ws_and_comments(input).map_err(|e| CompileError::Read(format!("{:?}", e)))?;
        if rest.is_empty() {
            return Ok(forms);
        }

        match reader.parse_expr(rest) {
            Ok((rest, form)) => {
                forms.push(form);
                input = rest;
            }
            Err(_) => {
                let loc = reader.loc(rest);
                return Err(CompileError::Read(format!(
                    "unexpected input at {}: '{}'",
                    loc,
                    rest.chars().take(20).collect::<String>()
                )));
            }
        }
    }
}

/// Parse exactly one form (REPL input)
pub fn parse_form(source: &str, file: &str) -> Result<Sexp, CompileError> {
    let mut forms = parse_program(source, file)?;
    match forms.len() {
        0 => Err(CompileError::Read("empty input".to_string())),
        1 => Ok(forms.remove(0)),
        n => Err(CompileError::Read(format!(
            "expected a single form, got {}",
            n
        ))),
    }
}
