//! Diagnostic traceback renderer.
//!
//! Renders a captured error — an exception record plus its cause/context
//! chain — as a readable, optionally colorized multi-frame report, with the
//! runtime values of the expressions on each source line annotated beneath
//! it. The host supplies the captured data ([`ExceptionRecord`],
//! [`ExecutionFrame`], [`Value`]); this crate never introspects a runtime
//! itself.
//!
//! The pipeline, bottom to top:
//!
//! - [`walk`]: linked frame structures become ordered frame sequences, with
//!   first/last limits.
//! - [`collapse`]: runs of identical frames compress to a summary line.
//! - [`parse`] / [`colorize`] / [`inspect`]: one source line becomes a
//!   classified span record, a colorized line, and value annotation rows.
//! - [`frame`] / [`chain`]: frames become display blocks, chains become
//!   full linear reports with cycle protection.
//! - [`formatter`]: the [`DiagnosticFormatter`] surface with the plain
//!   verbose [`DefaultFormatter`] and the condensed [`ThemedFormatter`].
//! - [`hook`]: install a formatter as the process panic hook, with the
//!   previous hook kept as the fallback for any internal failure.
//!
//! ```no_run
//! use pretty_traceback::hook;
//!
//! // Respects PRETTY_TRACEBACK / PRETTY_TRACEBACK_THEME / NO_COLOR.
//! let handle = hook::install_from_env();
//! ```

pub mod cache;
pub mod chain;
pub mod collapse;
pub mod colorize;
pub mod env;
pub mod formatter;
pub mod frame;
pub mod hook;
pub mod inspect;
pub mod parse;
pub mod theme;
pub mod types;
pub mod walk;

pub use cache::{FsSourceCache, MemorySourceCache, SourceCache};
pub use formatter::{
    DefaultFormatter, DiagnosticFormatter, FormatOptions, RenderError, StylingMode,
    ThemedFormatter,
};
pub use theme::{Category, Style, Theme};
pub use types::{
    ExceptionRecord, ExecutionFrame, FrameEntry, ReportedPosition, TraceRecord, Value,
};
pub use walk::Limit;

/// Crate version, for hosts that report it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
