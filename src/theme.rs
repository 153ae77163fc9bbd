//! Theme tables: semantic categories mapped to SGR style pairs.
//!
//! A theme is constructed once per formatter and read-only afterwards. The
//! default table mirrors a soft pastel palette (HSV 30% saturation colors);
//! user overrides arrive as JSON through the environment (see
//! [`crate::env`]) and are merged over it.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::ValueKind;

/// Semantic categories the colorizer and renderers can style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Language keywords.
    Keyword,
    /// `True` / `False` literals.
    LiteralBool,
    /// The `None` literal.
    LiteralNone,
    /// Numeric literals.
    LiteralNumber,
    /// String literals.
    LiteralStr,
    /// Trailing comments.
    Comment,
    /// Frame location headers.
    Location,
    /// Exception summary lines.
    Exception,
    /// Annotation glyphs and values without a literal style.
    Introspection,
}

impl Category {
    /// The override key for this category in user theme JSON.
    pub fn key(self) -> &'static str {
        match self {
            Category::Keyword => "keyword",
            Category::LiteralBool => "literal_bool",
            Category::LiteralNone => "literal_none",
            Category::LiteralNumber => "literal_number",
            Category::LiteralStr => "literal_str",
            Category::Comment => "comment",
            Category::Location => "location",
            Category::Exception => "exception",
            Category::Introspection => "introspection",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "keyword" => Some(Category::Keyword),
            "literal_bool" => Some(Category::LiteralBool),
            "literal_none" => Some(Category::LiteralNone),
            "literal_number" => Some(Category::LiteralNumber),
            "literal_str" => Some(Category::LiteralStr),
            "comment" => Some(Category::Comment),
            "location" => Some(Category::Location),
            "exception" => Some(Category::Exception),
            "introspection" => Some(Category::Introspection),
            _ => None,
        }
    }

    /// The display category for a runtime value of the given kind.
    pub fn for_value(kind: ValueKind) -> Category {
        match kind {
            ValueKind::None => Category::LiteralNone,
            ValueKind::Bool => Category::LiteralBool,
            ValueKind::Number => Category::LiteralNumber,
            ValueKind::Str => Category::LiteralStr,
            ValueKind::Other => Category::Introspection,
        }
    }
}

/// An SGR start/end parameter pair, e.g. `("1", "22")` for bold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Style {
    /// SGR parameters opening the style.
    pub start: String,
    /// SGR parameters restoring the previous state.
    pub end: String,
}

impl Style {
    /// Create a style from an SGR parameter pair.
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Wrap text in this style's escape sequences.
    pub fn paint(&self, text: &str) -> String {
        format!("\x1b[{}m{}\x1b[{}m", self.start, text, self.end)
    }
}

/// User theme overrides, deserialized from JSON. A key mapped to `null`
/// removes that category's style; a missing key keeps the default.
#[derive(Debug, Default, Deserialize)]
pub struct ThemeOverrides {
    /// Category key → replacement style (or `null` to unstyle).
    #[serde(flatten)]
    pub styles: HashMap<String, Option<Style>>,
}

/// An immutable mapping from semantic category to an optional style, plus
/// the annotation glyphs.
#[derive(Debug, Clone)]
pub struct Theme {
    styles: HashMap<Category, Style>,
    /// Glyph printed before an annotation value (default `└`).
    pub cap_glyph: char,
    /// Placeholder glyph for a value deferred to a later row (default `│`).
    pub pipe_glyph: char,
}

impl Theme {
    /// A theme with no styles at all. Styled output degenerates to plain
    /// text while the glyphs keep working.
    pub fn plain() -> Self {
        Self {
            styles: HashMap::new(),
            cap_glyph: '\u{2514}',
            pipe_glyph: '\u{2502}',
        }
    }

    /// The default pastel theme.
    pub fn pretty() -> Self {
        let mut theme = Theme::plain();
        theme.set(Category::Keyword, Style::new("38;2;179;179;255", "39"));
        theme.set(Category::LiteralBool, Style::new("38;2;179;179;255", "39"));
        theme.set(Category::LiteralNone, Style::new("38;2;179;179;255", "39"));
        theme.set(
            Category::LiteralNumber,
            Style::new("38;2;179;255;255", "39"),
        );
        theme.set(Category::LiteralStr, Style::new("38;2;255;217;179", "39"));
        theme.set(Category::Comment, Style::new("38;2;179;255;179", "39"));
        theme.set(Category::Location, Style::new("1", "22"));
        theme.set(Category::Exception, Style::new("38;2;255;179;179", "39"));
        theme.set(
            Category::Introspection,
            Style::new("38;2;255;179;255", "39"),
        );
        theme
    }

    /// Replace one category's style.
    pub fn set(&mut self, category: Category, style: Style) {
        self.styles.insert(category, style);
    }

    /// Remove one category's style.
    pub fn unset(&mut self, category: Category) {
        self.styles.remove(&category);
    }

    /// The style for a category, if any.
    pub fn style(&self, category: Category) -> Option<&Style> {
        self.styles.get(&category)
    }

    /// Wrap text in a category's style. A no-op when the category is
    /// unstyled or styling is disabled.
    pub fn paint(&self, category: Category, text: &str, styling: bool) -> String {
        if !styling {
            return text.to_string();
        }
        match self.styles.get(&category) {
            Some(style) => style.paint(text),
            None => text.to_string(),
        }
    }

    /// Merge user overrides over this theme. Unknown keys are ignored so a
    /// newer override file keeps working against an older library.
    pub fn merge(&mut self, overrides: &ThemeOverrides) {
        for (key, style) in &overrides.styles {
            let Some(category) = Category::from_key(key) else {
                log::debug!("ignoring unknown theme category {key:?}");
                continue;
            };
            match style {
                Some(style) => self.set(category, style.clone()),
                None => self.unset(category),
            }
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::pretty()
    }
}

/// Strip all SGR escape sequences from a string, recovering the plain text.
pub fn strip_styles(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // SGR parameters end at 'm'.
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(ch);
        }
    }
    out
}
