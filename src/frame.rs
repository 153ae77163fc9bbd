//! Frame formatter: one frame entry becomes one display block.
//!
//! A block is the location header, the source line (colorized when it
//! parses), the annotation rows, and optionally a sorted dump of the
//! captured locals. Every step is best-effort: no source line means no line
//! and no annotations, a parse failure means the plain line, and value
//! rendering never fails.

use crate::cache::SourceCache;
use crate::colorize::{colorize_line, colorize_value};
use crate::inspect::annotation_rows;
use crate::parse::parse_line;
use crate::theme::{Category, Theme};
use crate::types::FrameEntry;

/// Per-render settings shared by the frame and chain formatters.
pub struct RenderContext<'a> {
    pub theme: &'a Theme,
    /// Emit SGR styling.
    pub styling: bool,
    /// Emit annotation rows under parsed lines.
    pub annotate: bool,
    /// Dump captured locals after each frame.
    pub dump_locals: bool,
    /// Identical-frame run cutoff for the collapser.
    pub cutoff: usize,
    /// Fallback line lookup for frames without captured source.
    pub cache: &'a dyn SourceCache,
}

/// Format one frame entry into its display chunks.
pub fn format_frame(entry: &FrameEntry, ctx: &RenderContext<'_>) -> Vec<String> {
    let frame = &entry.frame;
    let mut chunks = Vec::new();

    let mut header = format!(
        "  File \"{}\", line {}, in {}",
        frame.source_unit, entry.position.line, frame.routine
    );
    if let Some(signature) = &frame.signature {
        if !frame.is_synthetic_routine() {
            header.push_str(signature);
        }
    }
    chunks.push(format!(
        "{}\n",
        ctx.theme.paint(Category::Location, &header, ctx.styling)
    ));

    let line = frame
        .source_line
        .clone()
        .or_else(|| ctx.cache.line(&frame.source_unit, entry.position.line));

    if let Some(line) = line {
        let line = line.trim();
        chunks.push(format!(
            "    {}\n",
            colorize_line(line, ctx.theme, ctx.styling)
        ));

        if ctx.annotate && frame.has_bindings() {
            if let Some(parsed) = parse_line(line) {
                let rows = annotation_rows(&parsed, frame, ctx.theme, ctx.styling);
                let had_rows = !rows.is_empty();
                for row in rows {
                    chunks.push(format!("    {row}\n"));
                }
                if had_rows {
                    chunks.push("\n".to_string());
                }
            }
        }
    }

    if ctx.dump_locals {
        if let Some(locals) = &frame.locals {
            // BTreeMap iteration is already name-sorted.
            for (name, value) in locals {
                chunks.push(format!(
                    "    {name} = {}\n",
                    colorize_value(value, ctx.theme, ctx.styling)
                ));
            }
        }
    }

    chunks
}
