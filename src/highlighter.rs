// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for HQL syntax elements while preserving display width

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

// ANSI color codes (3-bit/4-bit colors for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_LITERAL: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_QUOTE: &str = "\x1b[1;33m"; // Bold yellow

/// Reserved words that read as literals
const LITERAL_WORDS: [&str; 5] = ["true", "false", "nil", "null", "else"];

/// Every registered special-form head symbol
fn special_forms() -> HashSet<&'static str> {
    crate::lower::registered_forms().map(|r| r.name).collect()
}

/// Main REPL helper providing syntax-aware color highlighting
pub struct HqlHelper;

impl HqlHelper {
    pub fn new() -> Self {
        HqlHelper
    }
}

impl Default for HqlHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for HqlHelper {}

impl Completer for HqlHelper {
    type Candidate = String;
}

impl Hinter for HqlHelper {
    type Hint = String;
}

impl Validator for HqlHelper {}

impl Highlighter for HqlHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let forms = special_forms();
        let highlighted = highlight_line(line, &forms);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        // Always re-highlight on character input or cursor movement
        true
    }
}

fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '"' | ';' | '\'' | '`' | ',')
}

/// Tokenize a line and apply syntax highlighting
fn highlight_line(line: &str, forms: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Comments: everything from ; to end of line
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Strings: preserve exact content but colorize
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }

            '(' | ')' | '[' | ']' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                result.push_str(COLOR_RESET);
                i += 1;
            }

            '\'' | '`' | ',' => {
                result.push_str(COLOR_QUOTE);
                result.push(chars[i]);
                result.push_str(COLOR_RESET);
                i += 1;
            }

            // Numbers (including signed and leading-dot forms)
            c if c.is_ascii_digit()
                || (matches!(c, '-' | '+' | '.') && starts_number(&chars, i)) =>
            {
                let start = i;
                if matches!(chars[i], '-' | '+') {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }

                result.push_str(COLOR_NUMBER);
                result.extend(&chars[start..i]);
                result.push_str(COLOR_RESET);
            }

            c if c.is_whitespace() => {
                result.push(c);
                i += 1;
            }

            // Symbols: special forms and literal words get their colors
            _ => {
                let start = i;
                while i < chars.len() && is_symbol_char(chars[i]) {
                    i += 1;
                }
                let symbol: String = chars[start..i].iter().collect();

                if forms.contains(symbol.as_str()) {
                    result.push_str(COLOR_SPECIAL_FORM);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if LITERAL_WORDS.contains(&symbol.as_str()) {
                    result.push_str(COLOR_LITERAL);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&symbol);
                }
            }
        }
    }

    result
}

/// True when the char at `i` begins a numeric literal (handles -5, +5,
/// .5, -.5 without swallowing bare operators)
fn starts_number(chars: &[char], i: usize) -> bool {
    match chars[i] {
        '.' => chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()),
        '-' | '+' => match chars.get(i + 1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.get(i + 2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        },
        c => c.is_ascii_digit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_highlighting_preserves_text() {
        let forms = special_forms();
        for line in [
            "(fn add (x = 1) (+ x y))",
            "(loop (i 0) (if (< i 3) (recur (+ i 1)) i))",
            "'(1 2 -3.5) ; quoted",
            "\"a \\\"string\\\" here\"",
            "[1 .5 -.5 true nil]",
        ] {
            assert_eq!(strip_ansi(&highlight_line(line, &forms)), line);
        }
    }

    #[test]
    fn test_special_form_is_colored() {
        let forms = special_forms();
        let highlighted = highlight_line("(if x 1 2)", &forms);
        assert!(highlighted.contains(COLOR_SPECIAL_FORM));
    }

    #[test]
    fn test_plain_symbol_is_not_colored() {
        let forms = special_forms();
        let highlighted = highlight_line("someplainname", &forms);
        assert_eq!(highlighted, "someplainname");
    }

    #[test]
    fn test_minus_alone_is_not_a_number() {
        let chars: Vec<char> = "- x".chars().collect();
        assert!(!starts_number(&chars, 0));
        let chars: Vec<char> = "-4".chars().collect();
        assert!(starts_number(&chars, 0));
    }
}
