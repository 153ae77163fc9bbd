//! Value inspector: resolves the referenceable expressions of a parsed line
//! against a frame's bindings and lays the results out as annotation rows.
//!
//! Resolution is silent about absence. A name bound nowhere, or an attribute
//! the base value does not carry, simply produces no annotation; `None` is a
//! present value and annotates as `None`. Layout packs values onto as few
//! rows as possible without ever letting two printed values overlap, using
//! vertical pipe glyphs to carry a colliding column down to a later row.

use unicode_segmentation::UnicodeSegmentation;

use crate::colorize::colorize_value;
use crate::parse::{ParsedLine, RefKind};
use crate::theme::{Category, Theme};
use crate::types::{ExecutionFrame, Value};

/// A resolved expression's value, anchored at its source column.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Character column the expression starts at.
    pub col: usize,
    /// The resolved runtime value.
    pub value: Value,
}

/// One cell of an annotation row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSlot {
    /// A colliding column carried down to a later row.
    Pipe { col: usize },
    /// A value printed on this row, prefixed by the cap glyph.
    Value { col: usize, value: Value },
}

impl RowSlot {
    fn col(&self) -> usize {
        match self {
            RowSlot::Pipe { col } | RowSlot::Value { col, .. } => *col,
        }
    }
}

/// One annotation display row, slots ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub slots: Vec<RowSlot>,
}

/// Display width of a rendering in grapheme clusters.
fn width(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Resolve the line's references against the frame, left to right. Unbound
/// expressions are dropped without comment.
pub fn collect_annotations(parsed: &ParsedLine, frame: &ExecutionFrame) -> Vec<Annotation> {
    let mut annotations: Vec<Annotation> = Vec::new();
    for r in &parsed.refs {
        let value = match &r.kind {
            RefKind::Name(name) => frame.lookup(name),
            RefKind::Attribute { base, attr } => {
                frame.lookup(base).and_then(|value| value.attr(attr))
            }
        };
        if let Some(value) = value {
            annotations.push(Annotation {
                col: r.col,
                value: value.clone(),
            });
        }
    }
    annotations.sort_by_key(|a| a.col);
    annotations
}

/// Pack annotations into rows, rightmost first.
///
/// Each row starts with the rightmost pending annotation. Scanning the rest
/// right to left, an annotation joins the row when its printed span (cap
/// glyph, space, value) ends at least two characters left of the frontier;
/// otherwise the row holds a pipe at its column and the annotation waits for
/// a later row. The frontier moves to the scanned column either way.
pub fn layout_rows(mut pending: Vec<Annotation>) -> Vec<RenderedRow> {
    let mut rows = Vec::new();

    while let Some(anchor) = pending.pop() {
        let mut frontier = anchor.col;
        let mut slots = vec![RowSlot::Value {
            col: anchor.col,
            value: anchor.value,
        }];

        let mut i = pending.len();
        while i > 0 {
            i -= 1;
            let candidate = &pending[i];
            if candidate.col + width(&candidate.value.render()) + 2 < frontier {
                let placed = pending.remove(i);
                frontier = placed.col;
                slots.push(RowSlot::Value {
                    col: placed.col,
                    value: placed.value,
                });
            } else {
                frontier = candidate.col;
                slots.push(RowSlot::Pipe { col: candidate.col });
            }
        }

        slots.reverse();
        rows.push(RenderedRow { slots });
    }

    rows
}

/// Render one row as text, without indentation or trailing newline.
pub fn render_row(row: &RenderedRow, theme: &Theme, styling: bool) -> String {
    let mut out = String::new();
    let mut cursor = 0;
    for slot in &row.slots {
        out.push_str(&" ".repeat(slot.col().saturating_sub(cursor)));
        match slot {
            RowSlot::Pipe { col } => {
                out.push_str(&theme.paint(
                    Category::Introspection,
                    &theme.pipe_glyph.to_string(),
                    styling,
                ));
                cursor = col + 1;
            }
            RowSlot::Value { col, value } => {
                out.push_str(&theme.paint(
                    Category::Introspection,
                    &theme.cap_glyph.to_string(),
                    styling,
                ));
                out.push(' ');
                let rendered = value.render();
                out.push_str(&colorize_value(value, theme, styling));
                cursor = col + 2 + width(&rendered);
            }
        }
    }
    out
}

/// Convenience: annotation rows for one line under one frame, rendered top
/// to bottom.
pub fn annotation_rows(
    parsed: &ParsedLine,
    frame: &ExecutionFrame,
    theme: &Theme,
    styling: bool,
) -> Vec<String> {
    layout_rows(collect_annotations(parsed, frame))
        .iter()
        .map(|row| render_row(row, theme, styling))
        .collect()
}
