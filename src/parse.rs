//! Single-line statement parser feeding the colorizer and the value
//! inspector.
//!
//! The grammar is one line of a small dynamic-language statement:
//! identifiers, attribute access, calls, operators, bracket pairs, string /
//! numeric / boolean / `None` literals, and a trailing `#` comment. Parsing
//! either succeeds with a span record of the classified leaf tokens plus
//! the referenceable expressions, or fails as a whole (`None`) — callers
//! then fall back to the plain line. Nothing here ever panics on input.

use crate::theme::Category;

/// A classified, non-overlapping byte range within the parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset, inclusive.
    pub start: usize,
    /// End byte offset, exclusive.
    pub end: usize,
    /// Display category of the token.
    pub category: Category,
}

/// A referenceable expression the value inspector can resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// A bare name.
    Name(String),
    /// A two-part access whose base is a bare name.
    Attribute { base: String, attr: String },
}

/// A reference expression anchored at its display column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefExpr {
    /// Character column the annotation anchors at.
    pub col: usize,
    /// What to resolve.
    pub kind: RefKind,
}

/// The successful result of parsing one line.
#[derive(Debug, Default)]
pub struct ParsedLine {
    /// Classified literal/keyword spans, sorted by start offset.
    pub spans: Vec<Span>,
    /// Referenceable expressions, in source order.
    pub refs: Vec<RefExpr>,
}

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Keyword,
    BoolLit,
    NoneLit,
    Number,
    Str,
    Punct(char),
}

#[derive(Debug)]
struct Token {
    start: usize,
    end: usize,
    col: usize,
    kind: TokenKind,
}

/// Parse one source line. Returns `None` on any lexical or structural
/// error: unterminated string, character outside the grammar, or
/// unbalanced brackets.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let tokens = tokenize(line)?;

    let mut spans = Vec::new();
    for token in &tokens {
        let category = match token.kind {
            TokenKind::Keyword => Some(Category::Keyword),
            TokenKind::BoolLit => Some(Category::LiteralBool),
            TokenKind::NoneLit => Some(Category::LiteralNone),
            TokenKind::Number => Some(Category::LiteralNumber),
            TokenKind::Str => Some(Category::LiteralStr),
            _ => None,
        };
        if let Some(category) = category {
            spans.push(Span {
                start: token.start,
                end: token.end,
                category,
            });
        }
    }

    Some(ParsedLine {
        refs: collect_refs(&tokens),
        spans,
    })
}

/// Collect bare-name and `name.attr` references from the token stream.
///
/// The base identifier of an annotated attribute access is not also
/// reported as a bare name; the attribute annotation supersedes it.
fn collect_refs(tokens: &[Token]) -> Vec<RefExpr> {
    let mut refs = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let TokenKind::Ident(name) = &token.kind else {
            continue;
        };
        // An identifier right after a dot is an attribute name; it is
        // handled together with its base.
        if i > 0 && matches!(tokens[i - 1].kind, TokenKind::Punct('.')) {
            continue;
        }

        let dotted = matches!(tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::Punct('.')));
        if dotted {
            if let Some(attr_token) = tokens.get(i + 2) {
                if let TokenKind::Ident(attr) = &attr_token.kind {
                    refs.push(RefExpr {
                        col: attr_token.col,
                        kind: RefKind::Attribute {
                            base: name.clone(),
                            attr: attr.clone(),
                        },
                    });
                    continue;
                }
            }
        }

        refs.push(RefExpr {
            col: token.col,
            kind: RefKind::Name(name.clone()),
        });
    }

    refs
}

fn tokenize(line: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut brackets: Vec<char> = Vec::new();
    let mut chars = line.char_indices().peekable();
    let mut col = 0usize;

    while let Some(&(start, ch)) = chars.peek() {
        let start_col = col;

        if ch == '#' {
            // Rest of the line is a comment; the colorizer styles it in a
            // separate pass.
            break;
        }

        if ch.is_whitespace() {
            chars.next();
            col += 1;
            continue;
        }

        if ch == '\'' || ch == '"' {
            let end = scan_string(&mut chars, &mut col)?;
            tokens.push(Token {
                start,
                end,
                col: start_col,
                kind: TokenKind::Str,
            });
            continue;
        }

        if ch.is_ascii_digit() {
            let end = scan_number(&mut chars, &mut col);
            tokens.push(Token {
                start,
                end,
                col: start_col,
                kind: TokenKind::Number,
            });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let (end, word) = scan_word(line, &mut chars, &mut col);
            let kind = match word.as_str() {
                "True" | "False" => TokenKind::BoolLit,
                "None" => TokenKind::NoneLit,
                w if is_keyword(w) => TokenKind::Keyword,
                _ => TokenKind::Ident(word),
            };
            tokens.push(Token {
                start,
                end,
                col: start_col,
                kind,
            });
            continue;
        }

        match ch {
            '(' | '[' | '{' => brackets.push(ch),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if brackets.pop() != Some(expected) {
                    return None;
                }
            }
            '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '@'
            | ',' | ':' | ';' | '.' => {}
            _ => return None,
        }
        chars.next();
        col += 1;
        tokens.push(Token {
            start,
            end: start + ch.len_utf8(),
            col: start_col,
            kind: TokenKind::Punct(ch),
        });
    }

    if brackets.is_empty() {
        Some(tokens)
    } else {
        None
    }
}

/// Scan a quoted string. Fails on an unterminated literal.
fn scan_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    col: &mut usize,
) -> Option<usize> {
    let (_, quote) = chars.next()?;
    *col += 1;
    while let Some((i, ch)) = chars.next() {
        *col += 1;
        if ch == '\\' {
            if chars.next().is_some() {
                *col += 1;
            }
            continue;
        }
        if ch == quote {
            return Some(i + ch.len_utf8());
        }
    }
    // Ran off the end of the line inside the literal.
    None
}

/// Scan a numeric literal. Lenient: classification only, not validation.
fn scan_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    col: &mut usize,
) -> usize {
    let mut end = 0;
    let mut prev_exponent = false;
    while let Some(&(i, ch)) = chars.peek() {
        let part_of_number = ch.is_ascii_alphanumeric()
            || ch == '_'
            || ch == '.'
            || (prev_exponent && (ch == '+' || ch == '-'));
        if !part_of_number {
            break;
        }
        prev_exponent = ch == 'e' || ch == 'E';
        end = i + ch.len_utf8();
        chars.next();
        *col += 1;
    }
    end
}

/// Scan an identifier or keyword.
fn scan_word(
    line: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    col: &mut usize,
) -> (usize, String) {
    let mut start = line.len();
    let mut end = line.len();
    while let Some(&(i, ch)) = chars.peek() {
        if !(ch.is_alphanumeric() || ch == '_') {
            break;
        }
        if start == line.len() {
            start = i;
        }
        end = i + ch.len_utf8();
        chars.next();
        *col += 1;
    }
    (end, line[start..end].to_string())
}
