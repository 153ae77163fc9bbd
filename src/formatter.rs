//! Formatter surface: the capability interface hosts call, plus the two
//! shipped implementations.
//!
//! [`DefaultFormatter`] is the faithful stand-in for the platform default:
//! plain text, every repeat up to a deep cutoff, sorted local dumps, no
//! styling. [`ThemedFormatter`] is the condensed, colorized report with
//! inline value annotations. Both produce finite chunk sequences; the
//! assembled report is their concatenation, and the `write_*` conveniences
//! do the concatenation straight into a stream.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use crate::cache::{FsSourceCache, SourceCache};
use crate::chain::format_chain;
use crate::collapse::Collapser;
use crate::env;
use crate::frame::{self, RenderContext};
use crate::theme::Theme;
use crate::types::{ExceptionRecord, ExecutionFrame, FrameEntry};
use crate::walk::{walk, Limit, WalkOrigin};

/// Errors surfaced by the write conveniences. Formatting itself is
/// infallible; only the stream can fail.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed writing report: {0}")]
    Io(#[from] io::Error),
}

/// Per-call formatting options.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Follow cause/context links.
    pub chain: bool,
    /// Frame limit applied to each trace.
    pub limit: Option<Limit>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            chain: true,
            limit: None,
        }
    }
}

/// When a themed formatter emits SGR styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StylingMode {
    /// Style when stderr is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl StylingMode {
    fn resolve(self) -> bool {
        match self {
            StylingMode::Auto => io::stderr().is_terminal() && env::color_allowed(),
            StylingMode::Always => true,
            StylingMode::Never => false,
        }
    }
}

/// A diagnostic renderer hosts can install or call directly.
pub trait DiagnosticFormatter: Send + Sync {
    /// The full report for a record, chain links included per the options.
    fn format_traceback(
        &self,
        record: &Arc<ExceptionRecord>,
        options: &FormatOptions,
    ) -> Vec<String>;

    /// Frame blocks for a live frame chain, oldest caller first.
    fn format_stack(
        &self,
        start: Option<Arc<ExecutionFrame>>,
        limit: Option<Limit>,
    ) -> Vec<String>;

    /// One frame's display block.
    fn format_frame(&self, entry: &FrameEntry) -> Vec<String>;

    /// The summary line (and notes) only, no trace.
    fn format_exception(&self, record: &ExceptionRecord) -> Vec<String>;

    /// Format and write a full report in one call.
    fn write_traceback(
        &self,
        out: &mut dyn Write,
        record: &Arc<ExceptionRecord>,
        options: &FormatOptions,
    ) -> Result<(), RenderError> {
        for chunk in self.format_traceback(record, options) {
            out.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }

    /// Format and write a stack dump in one call.
    fn write_stack(
        &self,
        out: &mut dyn Write,
        start: Option<Arc<ExecutionFrame>>,
        limit: Option<Limit>,
    ) -> Result<(), RenderError> {
        for chunk in self.format_stack(start, limit) {
            out.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }
}

fn stack_chunks(
    start: Option<Arc<ExecutionFrame>>,
    limit: Option<Limit>,
    ctx: &RenderContext<'_>,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut collapser = Collapser::new(ctx.cutoff);
    for entry in walk(WalkOrigin::Frames(start), limit) {
        let observation = collapser.observe(&entry);
        if let Some(summary) = observation.summary {
            chunks.push(summary);
        }
        if observation.render {
            chunks.extend(frame::format_frame(&entry, ctx));
        }
    }
    if let Some(summary) = collapser.finish() {
        chunks.push(summary);
    }
    chunks
}

/// Plain, verbose renderer matching the platform default's shape.
pub struct DefaultFormatter {
    theme: Theme,
    cache: Arc<dyn SourceCache>,
    cutoff: usize,
}

impl DefaultFormatter {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(FsSourceCache::new()))
    }

    /// Use a host-supplied line cache instead of the filesystem.
    pub fn with_cache(cache: Arc<dyn SourceCache>) -> Self {
        Self {
            theme: Theme::plain(),
            cache,
            cutoff: 3,
        }
    }

    fn ctx(&self) -> RenderContext<'_> {
        RenderContext {
            theme: &self.theme,
            styling: false,
            annotate: false,
            dump_locals: true,
            cutoff: self.cutoff,
            cache: self.cache.as_ref(),
        }
    }
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticFormatter for DefaultFormatter {
    fn format_traceback(
        &self,
        record: &Arc<ExceptionRecord>,
        options: &FormatOptions,
    ) -> Vec<String> {
        format_chain(record, options.chain, options.limit, &self.ctx())
    }

    fn format_stack(
        &self,
        start: Option<Arc<ExecutionFrame>>,
        limit: Option<Limit>,
    ) -> Vec<String> {
        stack_chunks(start, limit, &self.ctx())
    }

    fn format_frame(&self, entry: &FrameEntry) -> Vec<String> {
        frame::format_frame(entry, &self.ctx())
    }

    fn format_exception(&self, record: &ExceptionRecord) -> Vec<String> {
        crate::chain::format_summary(record, &self.ctx())
    }
}

/// Condensed, colorized renderer with value annotations.
pub struct ThemedFormatter {
    theme: Theme,
    mode: StylingMode,
    cache: Arc<dyn SourceCache>,
    cutoff: usize,
}

impl ThemedFormatter {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            mode: StylingMode::Auto,
            cache: Arc::new(FsSourceCache::new()),
            cutoff: 1,
        }
    }

    /// The default theme merged with any environment overrides.
    pub fn from_env() -> Self {
        Self::new(env::theme_from_env())
    }

    pub fn with_styling(mut self, mode: StylingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn SourceCache>) -> Self {
        self.cache = cache;
        self
    }

    fn ctx(&self, styling: bool) -> RenderContext<'_> {
        RenderContext {
            theme: &self.theme,
            styling,
            annotate: true,
            dump_locals: false,
            cutoff: self.cutoff,
            cache: self.cache.as_ref(),
        }
    }
}

impl DiagnosticFormatter for ThemedFormatter {
    fn format_traceback(
        &self,
        record: &Arc<ExceptionRecord>,
        options: &FormatOptions,
    ) -> Vec<String> {
        format_chain(record, options.chain, options.limit, &self.ctx(self.mode.resolve()))
    }

    fn format_stack(
        &self,
        start: Option<Arc<ExecutionFrame>>,
        limit: Option<Limit>,
    ) -> Vec<String> {
        stack_chunks(start, limit, &self.ctx(self.mode.resolve()))
    }

    fn format_frame(&self, entry: &FrameEntry) -> Vec<String> {
        frame::format_frame(entry, &self.ctx(self.mode.resolve()))
    }

    fn format_exception(&self, record: &ExceptionRecord) -> Vec<String> {
        crate::chain::format_summary(record, &self.ctx(self.mode.resolve()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemorySourceCache;
    use crate::theme::strip_styles;
    use crate::types::{TraceRecord, Value};
    use std::collections::BTreeMap;

    fn sample_record() -> Arc<ExceptionRecord> {
        let locals: BTreeMap<String, Value> =
            [("count".to_string(), Value::Int(3))].into_iter().collect();
        let frame = Arc::new(
            ExecutionFrame::new("app.src", "run", 7)
                .with_source_line("count + missing")
                .with_locals(locals),
        );
        Arc::new(
            ExceptionRecord::new("ValueError", "boom")
                .with_trace(Arc::new(TraceRecord::new(frame))),
        )
    }

    #[test]
    fn test_default_formatter_plain_verbose() {
        let formatter = DefaultFormatter::with_cache(Arc::new(MemorySourceCache::new()));
        let out = formatter
            .format_traceback(&sample_record(), &FormatOptions::default())
            .concat();
        assert!(out.contains("Traceback (most recent call last):\n"));
        assert!(out.contains("  File \"app.src\", line 7, in run\n"));
        assert!(out.contains("    count = 3\n"));
        assert!(out.contains("ValueError: boom\n"));
        // Plain text only.
        assert!(!out.contains('\x1b'));
        // No annotation glyphs in the verbose style.
        assert!(!out.contains('└'));
    }

    #[test]
    fn test_themed_formatter_annotates_and_styles() {
        let formatter = ThemedFormatter::new(Theme::pretty())
            .with_styling(StylingMode::Always)
            .with_cache(Arc::new(MemorySourceCache::new()));
        let out = formatter
            .format_traceback(&sample_record(), &FormatOptions::default())
            .concat();
        assert!(out.contains('\x1b'));
        let plain = strip_styles(&out);
        assert!(plain.contains("    └ 3\n"));
        // `missing` is unbound, so only one annotation.
        assert_eq!(plain.matches('└').count(), 1);
    }

    #[test]
    fn test_themed_formatter_styling_never_is_plain() {
        let formatter = ThemedFormatter::new(Theme::pretty())
            .with_styling(StylingMode::Never)
            .with_cache(Arc::new(MemorySourceCache::new()));
        let out = formatter
            .format_traceback(&sample_record(), &FormatOptions::default())
            .concat();
        assert!(!out.contains('\x1b'));
        assert!(out.contains("└ 3"));
    }

    #[test]
    fn test_write_traceback_concatenates() {
        let formatter = DefaultFormatter::with_cache(Arc::new(MemorySourceCache::new()));
        let record = sample_record();
        let mut buffer = Vec::new();
        formatter
            .write_traceback(&mut buffer, &record, &FormatOptions::default())
            .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            formatter
                .format_traceback(&record, &FormatOptions::default())
                .concat()
        );
    }

    #[test]
    fn test_format_stack_walks_callers() {
        let outer = Arc::new(ExecutionFrame::new("app.src", "main", 1));
        let inner = Arc::new(ExecutionFrame::new("app.src", "run", 9).with_caller(outer));
        let formatter = DefaultFormatter::with_cache(Arc::new(MemorySourceCache::new()));
        let out = formatter.format_stack(Some(inner), None).concat();
        let main_at = out.find("in main").unwrap();
        let run_at = out.find("in run").unwrap();
        assert!(main_at < run_at);
    }

    #[test]
    fn test_format_exception_summary_only() {
        let formatter = DefaultFormatter::with_cache(Arc::new(MemorySourceCache::new()));
        let out = formatter.format_exception(&sample_record()).concat();
        assert_eq!(out, "ValueError: boom\n");
    }
}
