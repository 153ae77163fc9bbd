//! Exception chain resolver: stitches a record's cause/context predecessors
//! and its own trace into one linear report.
//!
//! Cycle protection is unconditional. The resolver tracks record identity
//! (`Arc` pointer) in a seen-set seeded with the record being rendered, so a
//! crafted graph whose links point back into the chain terminates without
//! re-rendering anything.

use std::collections::HashSet;
use std::sync::Arc;

use crate::collapse::Collapser;
use crate::frame::{format_frame, RenderContext};
use crate::theme::Category;
use crate::types::ExceptionRecord;
use crate::walk::{walk, Limit, WalkOrigin};

/// Separator emitted between an explicit cause and its effect.
pub const CAUSE_SEPARATOR: &str =
    "The above exception was the direct cause of the following exception:";

/// Separator emitted between an incidental context and its successor.
pub const CONTEXT_SEPARATOR: &str =
    "During handling of the above exception, another exception occurred:";

/// Header introducing each record's own trace.
pub const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

/// Namespaces that never qualify a type name in summaries.
const DEFAULT_NAMESPACES: &[&str] = &["builtins", "__main__"];

fn identity(record: &Arc<ExceptionRecord>) -> usize {
    Arc::as_ptr(record) as usize
}

/// Render the whole chain ending at `record` into text chunks.
///
/// With `chain` false only the record's own trace and summary render.
/// `limit` applies to each record's trace independently.
pub fn format_chain(
    record: &Arc<ExceptionRecord>,
    chain: bool,
    limit: Option<Limit>,
    ctx: &RenderContext<'_>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    seen.insert(identity(record));
    let mut chunks = Vec::new();
    render_record(record, chain, limit, ctx, &mut seen, &mut chunks);
    chunks
}

fn render_record(
    record: &Arc<ExceptionRecord>,
    chain: bool,
    limit: Option<Limit>,
    ctx: &RenderContext<'_>,
    seen: &mut HashSet<usize>,
    chunks: &mut Vec<String>,
) {
    if chain {
        // Cause wins outright; a present cause hides the context even when
        // the cause itself was already rendered.
        if let Some(cause) = record.cause() {
            if seen.insert(identity(cause)) {
                render_record(cause, chain, limit, ctx, seen, chunks);
                chunks.push(format!("\n{CAUSE_SEPARATOR}\n\n"));
            }
        } else if let Some(context) = record.context() {
            if !record.suppress_context && seen.insert(identity(context)) {
                render_record(context, chain, limit, ctx, seen, chunks);
                chunks.push(format!("\n{CONTEXT_SEPARATOR}\n\n"));
            }
        }
    }

    if record.trace.is_some() {
        chunks.push(format!("{TRACEBACK_HEADER}\n"));
        let mut collapser = Collapser::new(ctx.cutoff);
        for entry in walk(WalkOrigin::Trace(record.trace.clone()), limit) {
            let observation = collapser.observe(&entry);
            if let Some(summary) = observation.summary {
                chunks.push(summary);
            }
            if observation.render {
                chunks.extend(format_frame(&entry, ctx));
            }
        }
        if let Some(summary) = collapser.finish() {
            chunks.push(summary);
        }
    }

    chunks.extend(format_summary(record, ctx));
}

/// The `Type: message` summary line plus any verbatim notes.
pub fn format_summary(record: &ExceptionRecord, ctx: &RenderContext<'_>) -> Vec<String> {
    let qualified = match &record.namespace {
        Some(ns) if !DEFAULT_NAMESPACES.contains(&ns.as_str()) => {
            format!("{ns}.{}", record.type_name)
        }
        _ => record.type_name.clone(),
    };
    let summary = match &record.message {
        Some(message) => format!("{qualified}: {message}"),
        None => qualified,
    };

    let mut chunks = vec![format!(
        "{}\n",
        ctx.theme.paint(Category::Exception, &summary, ctx.styling)
    )];
    for note in &record.notes {
        chunks.push(format!("{note}\n"));
    }
    chunks
}
