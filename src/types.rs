//! Core data types for the diagnostic rendering engine.
//!
//! Everything here is request-scoped: a host captures an error into these
//! structures, hands them to a formatter, and discards them once the report
//! text comes back. The engine never mutates host-supplied data.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// A runtime value snapshot captured from a frame's bindings.
///
/// Hosts translate their own value model into this enum. `Object` covers
/// everything without a literal form; its `repr` is `None` when the host's
/// own representation of the value failed, which renders as the fixed
/// unprintable placeholder instead of propagating the failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null/absent-result value (`None` in source).
    None,
    /// A boolean (`True` / `False` in source).
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A text string.
    Str(String),
    /// Any other runtime object.
    Object(ObjectValue),
}

/// A non-literal runtime object: a type name, an optional representation,
/// and a snapshot of its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    /// The value's runtime type name.
    pub type_name: String,
    /// The host-rendered representation, or `None` if rendering it failed.
    pub repr: Option<String>,
    /// Attribute snapshot used for `name.attr` annotation lookups.
    pub attrs: BTreeMap<String, Value>,
}

/// Literal classification of a value, used to pick its display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    None,
    Bool,
    Number,
    Str,
    Other,
}

impl Value {
    /// Build an object value with a working representation.
    pub fn object(type_name: &str, repr: &str) -> Self {
        Value::Object(ObjectValue {
            type_name: type_name.to_string(),
            repr: Some(repr.to_string()),
            attrs: BTreeMap::new(),
        })
    }

    /// Build an object value whose representation fails.
    pub fn unprintable(type_name: &str) -> Self {
        Value::Object(ObjectValue {
            type_name: type_name.to_string(),
            repr: None,
            attrs: BTreeMap::new(),
        })
    }

    /// Build an object value with attributes.
    pub fn object_with_attrs(type_name: &str, attrs: BTreeMap<String, Value>) -> Self {
        Value::Object(ObjectValue {
            type_name: type_name.to_string(),
            repr: Some(format!("<{type_name} object>")),
            attrs,
        })
    }

    /// The value's runtime type name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Object(o) => &o.type_name,
        }
    }

    /// Literal classification, for display styling.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::Str(_) => ValueKind::Str,
            Value::Object(_) => ValueKind::Other,
        }
    }

    /// Attribute lookup on this value. Only objects carry attributes.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(o) => o.attrs.get(name),
            _ => None,
        }
    }

    /// Best-effort representation. Never fails: a value without a usable
    /// representation renders as the unprintable placeholder naming its
    /// runtime type.
    pub fn render(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            // {:?} keeps the decimal point on round floats.
            Value::Float(f) => format!("{f:?}"),
            Value::Str(s) => render_str(s),
            Value::Object(o) => match &o.repr {
                Some(r) => r.clone(),
                None => format!("<unprintable {} object>", o.type_name),
            },
        }
    }
}

/// Quote a string value the way source literals are written.
fn render_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// One activation record of an execution history, as captured by the host.
///
/// `caller` links a live frame chain innermost-to-outermost; the walker
/// re-orders it for display. The engine treats frames as read-only.
#[derive(Debug, Default)]
pub struct ExecutionFrame {
    /// Source unit identifier (usually a file path).
    pub source_unit: String,
    /// Routine (function) name. Synthetic names use the `<...>` form.
    pub routine: String,
    /// Current line number, 1-based.
    pub line: u32,
    /// Pre-captured source text for `line`, if the host had it.
    pub source_line: Option<String>,
    /// Host-captured call signature, e.g. `(a, b=1)`.
    pub signature: Option<String>,
    /// Local binding snapshot, if captured.
    pub locals: Option<BTreeMap<String, Value>>,
    /// Global binding snapshot, if captured.
    pub globals: Option<BTreeMap<String, Value>>,
    /// The calling frame, for live frame chains.
    pub caller: Option<Arc<ExecutionFrame>>,
}

impl ExecutionFrame {
    /// Create a frame with the minimum identifying attributes.
    pub fn new(source_unit: &str, routine: &str, line: u32) -> Self {
        Self {
            source_unit: source_unit.to_string(),
            routine: routine.to_string(),
            line,
            ..Default::default()
        }
    }

    /// Attach pre-captured source text.
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    /// Attach a call signature.
    pub fn with_signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    /// Attach a local binding snapshot.
    pub fn with_locals(mut self, locals: BTreeMap<String, Value>) -> Self {
        self.locals = Some(locals);
        self
    }

    /// Attach a global binding snapshot.
    pub fn with_globals(mut self, globals: BTreeMap<String, Value>) -> Self {
        self.globals = Some(globals);
        self
    }

    /// Link the calling frame.
    pub fn with_caller(mut self, caller: Arc<ExecutionFrame>) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Resolve a name against locals first, then globals. `None` means the
    /// name is absent everywhere; a present-but-null binding is
    /// `Some(&Value::None)`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(locals) = &self.locals {
            if let Some(v) = locals.get(name) {
                return Some(v);
            }
        }
        self.globals.as_ref().and_then(|g| g.get(name))
    }

    /// Whether the frame captured any bindings at all.
    pub fn has_bindings(&self) -> bool {
        self.locals.is_some() || self.globals.is_some()
    }

    /// Synthetic routine names (`<module>`, `<lambda>`, ...) never show a
    /// signature.
    pub fn is_synthetic_routine(&self) -> bool {
        self.routine.starts_with('<') && self.routine.ends_with('>')
    }
}

/// One link of a traceback chain: a frame plus the line (and optional
/// column range) that was executing when the error passed through it.
/// `next` points inward, toward the frame that raised.
#[derive(Debug)]
pub struct TraceRecord {
    /// The frame this link refers to.
    pub frame: Arc<ExecutionFrame>,
    /// The reported line number within the frame.
    pub line: u32,
    /// Optional sub-line column range, when the host captured one.
    pub columns: Option<(u32, u32)>,
    /// The next (inner) link.
    pub next: Option<Arc<TraceRecord>>,
}

impl TraceRecord {
    /// Create a trace link reporting the frame's own line.
    pub fn new(frame: Arc<ExecutionFrame>) -> Self {
        let line = frame.line;
        Self {
            frame,
            line,
            columns: None,
            next: None,
        }
    }

    /// Create a trace link reporting a specific line.
    pub fn at_line(frame: Arc<ExecutionFrame>, line: u32) -> Self {
        Self {
            frame,
            line,
            columns: None,
            next: None,
        }
    }

    /// Link the next (inner) record.
    pub fn with_next(mut self, next: Arc<TraceRecord>) -> Self {
        self.next = Some(next);
        self
    }

    /// Build a trace chain from an ordered outer-to-inner frame list.
    pub fn from_frames(frames: Vec<Arc<ExecutionFrame>>) -> Option<Arc<TraceRecord>> {
        let mut head: Option<Arc<TraceRecord>> = None;
        for frame in frames.into_iter().rev() {
            let mut record = TraceRecord::new(frame);
            record.next = head.take();
            head = Some(Arc::new(record));
        }
        head
    }
}

/// Where in a frame the reported position sits: always a line, sometimes a
/// column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedPosition {
    /// Reported line number, 1-based.
    pub line: u32,
    /// Optional sub-line column range.
    pub columns: Option<(u32, u32)>,
}

impl ReportedPosition {
    /// A line-only position.
    pub fn line(line: u32) -> Self {
        Self {
            line,
            columns: None,
        }
    }
}

/// A frame paired with its reported position — the unit the walker emits
/// and the frame formatter consumes.
#[derive(Debug, Clone)]
pub struct FrameEntry {
    /// The frame.
    pub frame: Arc<ExecutionFrame>,
    /// Where in the frame the error was reported.
    pub position: ReportedPosition,
}

/// A captured exception: type, message, trace, chain links, and notes.
///
/// Cause and context links are set-once so a record graph can be built
/// after the records are shared (including, pathologically, a record that
/// points back at itself — the resolver's seen-set handles that).
#[derive(Debug, Default)]
pub struct ExceptionRecord {
    /// The exception's type name.
    pub type_name: String,
    /// The namespace defining the type, when it should qualify the name.
    pub namespace: Option<String>,
    /// The exception message, if any.
    pub message: Option<String>,
    /// The traceback chain, outermost link first.
    pub trace: Option<Arc<TraceRecord>>,
    /// Whether the incidental context link is suppressed in reports.
    pub suppress_context: bool,
    /// Notes attached after the fact, rendered verbatim after the summary.
    pub notes: Vec<String>,
    cause: OnceLock<Arc<ExceptionRecord>>,
    context: OnceLock<Arc<ExceptionRecord>>,
}

impl ExceptionRecord {
    /// Create a record with a type name and message.
    pub fn new(type_name: &str, message: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            message: if message.is_empty() {
                None
            } else {
                Some(message.to_string())
            },
            ..Default::default()
        }
    }

    /// Set the defining namespace.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Attach the traceback chain.
    pub fn with_trace(mut self, trace: Arc<TraceRecord>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Attach a note.
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    /// Suppress the context link in reports.
    pub fn with_suppressed_context(mut self) -> Self {
        self.suppress_context = true;
        self
    }

    /// Attach the explicit cause link.
    pub fn with_cause(self, cause: Arc<ExceptionRecord>) -> Self {
        let _ = self.cause.set(cause);
        self
    }

    /// Attach the incidental context link.
    pub fn with_context(self, context: Arc<ExceptionRecord>) -> Self {
        let _ = self.context.set(context);
        self
    }

    /// Late-bind the cause on an already-shared record. A no-op if a cause
    /// was already set.
    pub fn set_cause(&self, cause: Arc<ExceptionRecord>) {
        let _ = self.cause.set(cause);
    }

    /// Late-bind the context on an already-shared record.
    pub fn set_context(&self, context: Arc<ExceptionRecord>) {
        let _ = self.context.set(context);
    }

    /// The explicit cause, if linked.
    pub fn cause(&self) -> Option<&Arc<ExceptionRecord>> {
        self.cause.get()
    }

    /// The incidental context, if linked.
    pub fn context(&self) -> Option<&Arc<ExceptionRecord>> {
        self.context.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_render_literals() {
        assert_eq!(Value::None.render(), "None");
        assert_eq!(Value::Bool(true).render(), "True");
        assert_eq!(Value::Bool(false).render(), "False");
        assert_eq!(Value::Int(-3).render(), "-3");
        assert_eq!(Value::Float(2.0).render(), "2.0");
        assert_eq!(Value::Str("hi".into()).render(), "'hi'");
    }

    #[test]
    fn test_value_render_escapes_quotes() {
        assert_eq!(Value::Str("a'b".into()).render(), "'a\\'b'");
        assert_eq!(Value::Str("a\nb".into()).render(), "'a\\nb'");
    }

    #[test]
    fn test_unprintable_placeholder_names_type() {
        let v = Value::unprintable("Widget");
        assert_eq!(v.render(), "<unprintable Widget object>");
        assert_eq!(v.type_name(), "Widget");
    }

    #[test]
    fn test_attr_lookup_only_on_objects() {
        let mut attrs = BTreeMap::new();
        attrs.insert("b".to_string(), Value::Int(5));
        let obj = Value::object_with_attrs("Pair", attrs);
        assert_eq!(obj.attr("b"), Some(&Value::Int(5)));
        assert_eq!(obj.attr("missing"), None);
        assert_eq!(Value::Int(1).attr("b"), None);
    }

    #[test]
    fn test_frame_lookup_locals_shadow_globals() {
        let mut locals = BTreeMap::new();
        locals.insert("x".to_string(), Value::Int(1));
        let mut globals = BTreeMap::new();
        globals.insert("x".to_string(), Value::Int(2));
        globals.insert("y".to_string(), Value::Int(3));

        let frame = ExecutionFrame::new("app.src", "main", 1)
            .with_locals(locals)
            .with_globals(globals);

        assert_eq!(frame.lookup("x"), Some(&Value::Int(1)));
        assert_eq!(frame.lookup("y"), Some(&Value::Int(3)));
        assert_eq!(frame.lookup("z"), None);
    }

    #[test]
    fn test_present_null_distinct_from_absent() {
        let mut locals = BTreeMap::new();
        locals.insert("n".to_string(), Value::None);
        let frame = ExecutionFrame::new("app.src", "main", 1).with_locals(locals);

        assert_eq!(frame.lookup("n"), Some(&Value::None));
        assert_eq!(frame.lookup("m"), None);
    }

    #[test]
    fn test_synthetic_routine_detection() {
        assert!(ExecutionFrame::new("u", "<module>", 1).is_synthetic_routine());
        assert!(!ExecutionFrame::new("u", "main", 1).is_synthetic_routine());
    }

    #[test]
    fn test_trace_chain_from_frames_preserves_order() {
        let outer = Arc::new(ExecutionFrame::new("u", "outer", 10));
        let inner = Arc::new(ExecutionFrame::new("u", "inner", 20));
        let head = TraceRecord::from_frames(vec![outer, inner]).unwrap();

        assert_eq!(head.frame.routine, "outer");
        let next = head.next.as_ref().unwrap();
        assert_eq!(next.frame.routine, "inner");
        assert!(next.next.is_none());
    }

    #[test]
    fn test_record_can_point_at_itself() {
        let record = Arc::new(ExceptionRecord::new("ValueError", "boom"));
        record.set_cause(Arc::clone(&record));
        assert!(Arc::ptr_eq(record.cause().unwrap(), &record));
    }

    #[test]
    fn test_cause_set_once() {
        let first = Arc::new(ExceptionRecord::new("A", ""));
        let second = Arc::new(ExceptionRecord::new("B", ""));
        let record = ExceptionRecord::new("C", "");
        record.set_cause(Arc::clone(&first));
        record.set_cause(second);
        assert_eq!(record.cause().unwrap().type_name, "A");
    }

    #[test]
    fn test_empty_message_is_none() {
        assert!(ExceptionRecord::new("StopIteration", "").message.is_none());
    }
}
