//! Panic-hook installation: route uncaught panics through a diagnostic
//! formatter.
//!
//! The replacement hook is defensive above all else. A panic raised on the
//! thread that is already running the panic hook is a nested panic and
//! aborts the process before any `catch_unwind` could see it, so capture
//! and render run on a short-lived helper thread instead: if they panic,
//! write to a broken stderr, or decline to capture, the join fails and the
//! previously installed hook reports the original panic. The process never
//! ends up with silent panics. Uninstalling restores the previous hook
//! exactly.

use std::any::Any;
use std::cell::Cell;
use std::io;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, RwLock};

use crate::formatter::{DiagnosticFormatter, FormatOptions, RenderError, ThemedFormatter};
use crate::types::{ExceptionRecord, ExecutionFrame, TraceRecord};
use crate::{env, walk::Limit};

/// A `Send` snapshot of a panic, taken on the panicking thread. Capture
/// runs on a helper thread, so it cannot borrow from the live hook info.
#[derive(Debug, Clone)]
pub struct PanicSnapshot {
    /// The panic payload's text.
    pub message: String,
    /// Source file and line of the panic site, when known.
    pub location: Option<(String, u32)>,
}

impl PanicSnapshot {
    fn of(info: &PanicHookInfo<'_>) -> Self {
        Self {
            message: payload_message(info.payload()),
            location: info
                .location()
                .map(|location| (location.file().to_string(), location.line())),
        }
    }
}

/// Builds an [`ExceptionRecord`] from a panic, or `None` to decline and let
/// the previous hook report it.
pub type CaptureFn = dyn Fn(&PanicSnapshot) -> Option<Arc<ExceptionRecord>> + Send + Sync;

type PrevHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

// Serializes hook swaps; last writer wins.
static INSTALL_LOCK: Mutex<()> = Mutex::new(());

static LAST_RECORD: RwLock<Option<Arc<ExceptionRecord>>> = RwLock::new(None);

thread_local! {
    // Set on the report helper thread so a panic there re-entering the
    // hook stays silent and unwinds back to the join.
    static IN_HELPER: Cell<bool> = const { Cell::new(false) };
}

/// The most recently captured record, if any.
pub fn last_record() -> Option<Arc<ExceptionRecord>> {
    LAST_RECORD.read().clone()
}

/// Remove and return the most recently captured record.
pub fn take_last_record() -> Option<Arc<ExceptionRecord>> {
    LAST_RECORD.write().take()
}

/// Restores the previously installed hook on [`uninstall`](Self::uninstall).
pub struct InstallHandle {
    previous: Arc<PrevHook>,
}

impl InstallHandle {
    /// Put the previous hook back.
    pub fn uninstall(self) {
        let _guard = INSTALL_LOCK.lock();
        let previous = self.previous;
        panic::set_hook(Box::new(move |info| previous(info)));
        log::debug!("diagnostic panic hook uninstalled");
    }
}

/// Replace the process panic hook with one that captures, stores, and
/// renders panics through `formatter`.
pub fn install(formatter: Arc<dyn DiagnosticFormatter>, capture: Arc<CaptureFn>) -> InstallHandle {
    let _guard = INSTALL_LOCK.lock();
    let previous: Arc<PrevHook> = Arc::new(panic::take_hook());
    let fallback = Arc::clone(&previous);

    panic::set_hook(Box::new(move |info| {
        if IN_HELPER.get() {
            return;
        }
        let snapshot = PanicSnapshot::of(info);
        let handled =
            report_on_helper(snapshot, Arc::clone(&capture), Arc::clone(&formatter));
        if !handled {
            fallback(info);
        }
    }));

    log::debug!("diagnostic panic hook installed");
    InstallHandle { previous }
}

/// Build and write the report on a fresh thread, so a panicking capture or
/// formatter unwinds that thread and shows up as a join error instead of
/// a nested panic on the already-panicking thread.
fn report_on_helper(
    snapshot: PanicSnapshot,
    capture: Arc<CaptureFn>,
    formatter: Arc<dyn DiagnosticFormatter>,
) -> bool {
    thread::Builder::new()
        .name("pretty-traceback-report".to_string())
        .spawn(move || {
            IN_HELPER.set(true);
            let Some(record) = capture(&snapshot) else {
                return false;
            };
            *LAST_RECORD.write() = Some(Arc::clone(&record));
            let mut stderr = io::stderr().lock();
            formatter
                .write_traceback(&mut stderr, &record, &FormatOptions::default())
                .is_ok()
        })
        .ok()
        .and_then(|helper| helper.join().ok())
        .unwrap_or(false)
}

/// Install the themed formatter with the default capture when the master
/// toggle is truthy. Returns `None` (and installs nothing) otherwise.
pub fn install_from_env() -> Option<InstallHandle> {
    if !env::env_bool(env::TOGGLE_VAR, false) {
        return None;
    }
    Some(install(
        Arc::new(ThemedFormatter::from_env()),
        Arc::new(default_capture),
    ))
}

/// Default capture: the panic payload as the message, the panic location as
/// a single synthetic frame.
pub fn default_capture(snapshot: &PanicSnapshot) -> Option<Arc<ExceptionRecord>> {
    let mut record = ExceptionRecord::new("panic", &snapshot.message);
    if let Some((file, line)) = &snapshot.location {
        let frame = Arc::new(ExecutionFrame::new(file, "<panic>", *line));
        record = record.with_trace(Arc::new(TraceRecord::new(frame)));
    }
    Some(Arc::new(record))
}

/// The human-readable text of a panic payload.
fn payload_message(payload: &dyn Any) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Render the last captured record to stderr again.
pub fn print_last(
    formatter: &dyn DiagnosticFormatter,
    limit: Option<Limit>,
) -> Result<bool, RenderError> {
    let Some(record) = last_record() else {
        return Ok(false);
    };
    let options = FormatOptions {
        chain: true,
        limit,
    };
    let mut stderr = io::stderr().lock();
    formatter.write_traceback(&mut stderr, &record, &options)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The last-record slot is process-global; tests that touch it hold
    // this lock so they cannot interleave.
    static SLOT_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_payload_message_variants() {
        assert_eq!(payload_message(&"static text"), "static text");
        assert_eq!(payload_message(&"owned".to_string()), "owned");
        assert_eq!(payload_message(&42_u32), "Box<dyn Any>");
    }

    #[test]
    fn test_default_capture_builds_record() {
        let snapshot = PanicSnapshot {
            message: "boom".to_string(),
            location: Some(("app.rs".to_string(), 7)),
        };
        let record = default_capture(&snapshot).unwrap();
        assert_eq!(record.type_name, "panic");
        assert_eq!(record.message.as_deref(), Some("boom"));
        let trace = record.trace.as_ref().unwrap();
        assert_eq!(trace.frame.source_unit, "app.rs");
        assert_eq!(trace.line, 7);
    }

    #[test]
    fn test_default_capture_without_location_has_no_trace() {
        let snapshot = PanicSnapshot {
            message: "boom".to_string(),
            location: None,
        };
        let record = default_capture(&snapshot).unwrap();
        assert!(record.trace.is_none());
    }

    #[test]
    fn test_helper_reports_and_stores_record() {
        let formatter: Arc<dyn DiagnosticFormatter> = Arc::new(
            crate::formatter::DefaultFormatter::with_cache(Arc::new(
                crate::cache::MemorySourceCache::new(),
            )),
        );
        let snapshot = PanicSnapshot {
            message: "helper stored".to_string(),
            location: None,
        };
        let _guard = SLOT_LOCK.lock();
        let _ = take_last_record();
        assert!(report_on_helper(
            snapshot,
            Arc::new(default_capture),
            formatter
        ));
        let record = take_last_record().unwrap();
        assert_eq!(record.message.as_deref(), Some("helper stored"));
    }

    #[test]
    fn test_helper_survives_panicking_capture() {
        let formatter: Arc<dyn DiagnosticFormatter> = Arc::new(
            crate::formatter::DefaultFormatter::with_cache(Arc::new(
                crate::cache::MemorySourceCache::new(),
            )),
        );
        let snapshot = PanicSnapshot {
            message: "doomed".to_string(),
            location: None,
        };
        let capture: Arc<CaptureFn> = Arc::new(|_| panic!("capture exploded"));
        assert!(!report_on_helper(snapshot, capture, formatter));
    }

    #[test]
    fn test_helper_declining_capture_is_unhandled() {
        let formatter: Arc<dyn DiagnosticFormatter> = Arc::new(
            crate::formatter::DefaultFormatter::with_cache(Arc::new(
                crate::cache::MemorySourceCache::new(),
            )),
        );
        let snapshot = PanicSnapshot {
            message: "declined".to_string(),
            location: None,
        };
        let capture: Arc<CaptureFn> = Arc::new(|_| None);
        assert!(!report_on_helper(snapshot, capture, formatter));
    }

    #[test]
    fn test_last_record_store_and_take() {
        let _guard = SLOT_LOCK.lock();
        let record = Arc::new(ExceptionRecord::new("panic", "stored"));
        *LAST_RECORD.write() = Some(Arc::clone(&record));

        let seen = last_record().unwrap();
        assert!(Arc::ptr_eq(&seen, &record));
        // Reading does not consume.
        assert!(last_record().is_some());

        let taken = take_last_record().unwrap();
        assert!(Arc::ptr_eq(&taken, &record));
        assert!(last_record().is_none());
    }
}
