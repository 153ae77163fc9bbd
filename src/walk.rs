//! Chain walker: turns a linked frame structure into an ordered, finite
//! sequence of [`FrameEntry`] values.
//!
//! Two linkages are supported through one interface. A traceback chain
//! ([`TraceRecord`], linked outermost-to-innermost) is walked lazily in
//! link order. A live frame chain ([`ExecutionFrame::caller`], linked
//! innermost-to-outermost) is emitted oldest-caller-first, which requires
//! buffering and reversing the links before emission.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::types::{ExecutionFrame, FrameEntry, ReportedPosition, TraceRecord};

/// How many entries of a walk to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most the first `n` entries in emission order.
    First(usize),
    /// At most the last `n` entries, in original relative order.
    Last(usize),
}

/// The linked structure a walk starts from. An absent starting point walks
/// as empty rather than failing.
#[derive(Debug, Clone)]
pub enum WalkOrigin {
    /// A live frame chain, starting at the innermost frame.
    Frames(Option<Arc<ExecutionFrame>>),
    /// A traceback chain, starting at the outermost record.
    Trace(Option<Arc<TraceRecord>>),
}

/// Walk a frame structure into a [`FrameWalk`] honoring the limit.
pub fn walk(origin: WalkOrigin, limit: Option<Limit>) -> FrameWalk {
    if let Some(Limit::First(0) | Limit::Last(0)) = limit {
        return FrameWalk {
            inner: WalkInner::Buffered(VecDeque::new()),
        };
    }

    match origin {
        WalkOrigin::Trace(start) => match limit {
            // The common case stays lazy: follow links, count down.
            None | Some(Limit::First(_)) => {
                let remaining = match limit {
                    Some(Limit::First(n)) => Some(n),
                    _ => None,
                };
                FrameWalk {
                    inner: WalkInner::Trace {
                        cursor: start,
                        remaining,
                    },
                }
            }
            Some(Limit::Last(n)) => {
                let lazy = FrameWalk {
                    inner: WalkInner::Trace {
                        cursor: start,
                        remaining: None,
                    },
                };
                FrameWalk {
                    inner: WalkInner::Buffered(tail_buffer(lazy, n)),
                }
            }
        },
        WalkOrigin::Frames(start) => {
            // Collect caller links (innermost first), then reverse so the
            // oldest caller leads.
            let mut entries = Vec::new();
            let mut cursor = start;
            while let Some(frame) = cursor {
                entries.push(FrameEntry {
                    position: ReportedPosition::line(frame.line),
                    frame: Arc::clone(&frame),
                });
                cursor = frame.caller.clone();
            }
            entries.reverse();

            let buffered = match limit {
                Some(Limit::First(n)) => {
                    entries.truncate(n);
                    entries.into()
                }
                Some(Limit::Last(n)) => tail_buffer(entries.into_iter(), n),
                None => entries.into(),
            };
            FrameWalk {
                inner: WalkInner::Buffered(buffered),
            }
        }
    }
}

/// Keep only the last `n` entries of an iterator using a bounded sliding
/// buffer, so the chain is never materialized twice.
fn tail_buffer(entries: impl Iterator<Item = FrameEntry>, n: usize) -> VecDeque<FrameEntry> {
    let mut buffer = VecDeque::with_capacity(n);
    for entry in entries {
        if buffer.len() == n {
            buffer.pop_front();
        }
        buffer.push_back(entry);
    }
    buffer
}

/// A finite sequence of frame entries produced by [`walk`].
#[derive(Debug)]
pub struct FrameWalk {
    inner: WalkInner,
}

#[derive(Debug)]
enum WalkInner {
    Trace {
        cursor: Option<Arc<TraceRecord>>,
        remaining: Option<usize>,
    },
    Buffered(VecDeque<FrameEntry>),
}

impl Iterator for FrameWalk {
    type Item = FrameEntry;

    fn next(&mut self) -> Option<FrameEntry> {
        match &mut self.inner {
            WalkInner::Trace { cursor, remaining } => {
                if let Some(n) = remaining {
                    if *n == 0 {
                        return None;
                    }
                    *n -= 1;
                }
                let record = cursor.take()?;
                *cursor = record.next.clone();
                Some(FrameEntry {
                    frame: Arc::clone(&record.frame),
                    position: ReportedPosition {
                        line: record.line,
                        columns: record.columns,
                    },
                })
            }
            WalkInner::Buffered(buffer) => buffer.pop_front(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_chain(lines: &[u32]) -> Option<Arc<TraceRecord>> {
        let mut head: Option<Arc<TraceRecord>> = None;
        for &line in lines.iter().rev() {
            let frame = Arc::new(ExecutionFrame::new("app.src", "routine", line));
            let mut record = TraceRecord::at_line(frame, line);
            record.next = head.take();
            head = Some(Arc::new(record));
        }
        head
    }

    fn frame_chain(lines: &[u32]) -> Option<Arc<ExecutionFrame>> {
        // Innermost frame first, caller links outward.
        let mut head: Option<Arc<ExecutionFrame>> = None;
        for &line in lines.iter().rev() {
            let mut frame = ExecutionFrame::new("app.src", "routine", line);
            frame.caller = head.take();
            head = Some(Arc::new(frame));
        }
        head
    }

    fn lines_of(walked: FrameWalk) -> Vec<u32> {
        walked.map(|e| e.position.line).collect()
    }

    // -- Trace chains --

    #[test]
    fn test_trace_walk_outer_to_inner() {
        let walked = walk(WalkOrigin::Trace(trace_chain(&[1, 2, 3])), None);
        assert_eq!(lines_of(walked), vec![1, 2, 3]);
    }

    #[test]
    fn test_trace_limit_first() {
        let walked = walk(
            WalkOrigin::Trace(trace_chain(&[1, 2, 3, 4])),
            Some(Limit::First(2)),
        );
        assert_eq!(lines_of(walked), vec![1, 2]);
    }

    #[test]
    fn test_trace_limit_last() {
        let walked = walk(
            WalkOrigin::Trace(trace_chain(&[1, 2, 3, 4])),
            Some(Limit::Last(2)),
        );
        assert_eq!(lines_of(walked), vec![3, 4]);
    }

    #[test]
    fn test_trace_limit_exceeds_length() {
        let walked = walk(
            WalkOrigin::Trace(trace_chain(&[1, 2])),
            Some(Limit::First(10)),
        );
        assert_eq!(lines_of(walked), vec![1, 2]);

        let walked = walk(
            WalkOrigin::Trace(trace_chain(&[1, 2])),
            Some(Limit::Last(10)),
        );
        assert_eq!(lines_of(walked), vec![1, 2]);
    }

    #[test]
    fn test_zero_limit_yields_nothing() {
        let walked = walk(
            WalkOrigin::Trace(trace_chain(&[1, 2])),
            Some(Limit::First(0)),
        );
        assert_eq!(lines_of(walked), Vec::<u32>::new());

        let walked = walk(WalkOrigin::Frames(frame_chain(&[1, 2])), Some(Limit::Last(0)));
        assert_eq!(lines_of(walked), Vec::<u32>::new());
    }

    #[test]
    fn test_absent_origin_is_empty_not_error() {
        assert_eq!(lines_of(walk(WalkOrigin::Trace(None), None)), Vec::<u32>::new());
        assert_eq!(lines_of(walk(WalkOrigin::Frames(None), None)), Vec::<u32>::new());
    }

    // -- Live frame chains --

    #[test]
    fn test_frame_walk_oldest_caller_first() {
        // Chain built innermost-first: line 3 called from 2 called from 1.
        let walked = walk(WalkOrigin::Frames(frame_chain(&[3, 2, 1])), None);
        assert_eq!(lines_of(walked), vec![1, 2, 3]);
    }

    #[test]
    fn test_frame_limit_first_applies_to_emission_order() {
        let walked = walk(
            WalkOrigin::Frames(frame_chain(&[4, 3, 2, 1])),
            Some(Limit::First(2)),
        );
        assert_eq!(lines_of(walked), vec![1, 2]);
    }

    #[test]
    fn test_frame_limit_last_keeps_relative_order() {
        let walked = walk(
            WalkOrigin::Frames(frame_chain(&[4, 3, 2, 1])),
            Some(Limit::Last(2)),
        );
        assert_eq!(lines_of(walked), vec![3, 4]);
    }
}
