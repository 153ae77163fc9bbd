//! Syntax colorizer: paints the classified tokens of a source line.
//!
//! Colorization is a pure function of the line, the theme, and the styling
//! flag. The parsed span record drives the rebuild; untouched bytes are
//! copied verbatim, so stripping the escape sequences back out always
//! reproduces the input exactly. A line the parser rejects passes through
//! unchanged.

use std::sync::OnceLock;

use regex::Regex;

use crate::parse::parse_line;
use crate::theme::{Category, Theme};
use crate::types::Value;

/// Matches a trailing `#` comment that sits outside any string literal.
/// Group 1 is the code part, group 2 the comment (including the `#`).
fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^((?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[^#"'])*)(#.*)?$"#)
            .expect("comment pattern is valid")
    })
}

/// Colorize one source line. Returns the line unchanged when styling is off
/// or the line does not parse.
pub fn colorize_line(line: &str, theme: &Theme, styling: bool) -> String {
    if !styling {
        return line.to_string();
    }
    let Some(parsed) = parse_line(line) else {
        return line.to_string();
    };

    // Split off a trailing comment first so the span rebuild only covers the
    // code part. The parser stops at `#`, so no span crosses the boundary.
    let (code, comment) = match comment_re().captures(line) {
        Some(caps) => match caps.get(2) {
            Some(m) => (&line[..m.start()], Some(m.as_str())),
            None => (line, None),
        },
        None => (line, None),
    };

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for span in &parsed.spans {
        out.push_str(&code[cursor..span.start]);
        out.push_str(&theme.paint(span.category, &code[span.start..span.end], true));
        cursor = span.end;
    }
    out.push_str(&code[cursor..]);

    if let Some(comment) = comment {
        out.push_str(&theme.paint(Category::Comment, comment, true));
    }
    out
}

/// Render a runtime value with the literal style matching its kind.
pub fn colorize_value(value: &Value, theme: &Theme, styling: bool) -> String {
    theme.paint(Category::for_value(value.kind()), &value.render(), styling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::strip_styles;

    fn colored(line: &str) -> String {
        colorize_line(line, &Theme::pretty(), true)
    }

    #[test]
    fn test_styling_off_is_identity() {
        let line = "return x + 1  # note";
        assert_eq!(colorize_line(line, &Theme::pretty(), false), line);
    }

    #[test]
    fn test_unparsable_line_passes_through() {
        let line = "x = 'unterminated";
        assert_eq!(colored(line), line);
    }

    #[test]
    fn test_strip_reproduces_input() {
        let lines = [
            "def run(count):",
            "    total = total + 3.5  # accumulate",
            "    flag = True if n is None else False",
            "    name = 'ab\\'cd' + \"ef\"",
            "",
        ];
        for line in lines {
            assert_eq!(strip_styles(&colored(line)), line, "line {line:?}");
        }
    }

    #[test]
    fn test_keyword_and_literal_styled() {
        let out = colored("return 42");
        assert!(out.contains("\x1b[38;2;179;179;255mreturn\x1b[39m"));
        assert!(out.contains("\x1b[38;2;179;255;255m42\x1b[39m"));
    }

    #[test]
    fn test_trailing_comment_styled_whole() {
        let out = colored("x = 1  # the answer");
        assert!(out.contains("\x1b[38;2;179;255;179m# the answer\x1b[39m"));
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        let out = colored("x = '#nope'");
        assert!(!out.contains("\x1b[38;2;179;255;179m"));
        assert_eq!(strip_styles(&out), "x = '#nope'");
    }

    #[test]
    fn test_unstyled_theme_is_identity() {
        let line = "return x  # c";
        assert_eq!(colorize_line(line, &Theme::plain(), true), line);
    }

    #[test]
    fn test_value_takes_literal_style() {
        let theme = Theme::pretty();
        let out = colorize_value(&Value::Bool(true), &theme, true);
        assert_eq!(out, "\x1b[38;2;179;179;255mTrue\x1b[39m");
        assert_eq!(colorize_value(&Value::Bool(true), &theme, false), "True");
    }
}
