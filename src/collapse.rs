//! Recursion collapser: condenses runs of identical frames in a stack.
//!
//! Two entries are the same frame when source unit, reported line, and
//! routine name all match. The first `cutoff` repeats of a run render
//! normally; the rest are suppressed and reported by a single summary line
//! when the run ends — including at end of stream, which callers signal via
//! [`Collapser::finish`].

use crate::types::FrameEntry;

/// Streaming run-length state over a frame entry sequence.
#[derive(Debug)]
pub struct Collapser {
    cutoff: usize,
    key: Option<FrameKey>,
    count: usize,
}

#[derive(Debug, PartialEq, Eq)]
struct FrameKey {
    unit: String,
    line: u32,
    routine: String,
}

impl FrameKey {
    fn of(entry: &FrameEntry) -> Self {
        Self {
            unit: entry.frame.source_unit.clone(),
            line: entry.position.line,
            routine: entry.frame.routine.clone(),
        }
    }
}

/// What to do with one observed entry.
#[derive(Debug, PartialEq, Eq)]
pub struct Observation {
    /// Summary line for the run that just ended, to emit before this entry.
    pub summary: Option<String>,
    /// Whether this entry should be rendered individually.
    pub render: bool,
}

impl Collapser {
    /// Create a collapser suppressing repeats beyond `cutoff`.
    pub fn new(cutoff: usize) -> Self {
        Self {
            cutoff,
            key: None,
            count: 0,
        }
    }

    /// Observe the next entry in the stream.
    pub fn observe(&mut self, entry: &FrameEntry) -> Observation {
        let key = FrameKey::of(entry);
        let mut summary = None;

        if self.key.as_ref() != Some(&key) {
            summary = self.take_summary();
            self.key = Some(key);
            self.count = 0;
        }

        self.count += 1;
        Observation {
            summary,
            render: self.count <= self.cutoff,
        }
    }

    /// Flush the trailing run at end of stream. Must be called exactly once
    /// after the last entry; a missed final flush loses the last summary.
    pub fn finish(&mut self) -> Option<String> {
        let summary = self.take_summary();
        self.key = None;
        self.count = 0;
        summary
    }

    fn take_summary(&self) -> Option<String> {
        if self.count <= self.cutoff {
            return None;
        }
        let suppressed = self.count - self.cutoff;
        let plural = if suppressed == 1 { "" } else { "s" };
        Some(format!(
            "  [Previous line repeated {suppressed} more time{plural}]\n"
        ))
    }
}
