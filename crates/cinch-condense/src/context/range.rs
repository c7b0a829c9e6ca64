//! Condensation trigger: decides *when* to condense and *which* events.
//!
//! The history is split into two zones:
//! 1. **Eligible prefix**: everything except the most recent `keep_recent`
//!    events. Candidates for condensation.
//! 2. **Retained tail**: the last `keep_recent` events, always kept verbatim.
//!
//! Within the eligible prefix the oldest contiguous run of condensable,
//! id-carrying events is chosen. Non-condensable events (pinned task, system
//! notes) break a run and are never folded into a summary.

use crate::context::budget::{ContextBudget, ContextUsage};
use crate::message::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default number of recent events kept verbatim.
pub const DEFAULT_KEEP_RECENT: usize = 10;

/// Minimum number of events worth replacing with a summary.
const MIN_RANGE_LEN: usize = 2;

/// Inclusive span of event ids folded into one summary.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRange {
    pub start: u64,
    pub end: u64,
}

impl EventRange {
    pub fn contains(&self, event_id: u64) -> bool {
        self.start <= event_id && event_id <= self.end
    }

    /// Index bounds (inclusive) of this range within `events`, if both ends
    /// are present.
    pub fn locate(&self, events: &[Message]) -> Option<(usize, usize)> {
        let first = events.iter().position(|m| m.event_id() == Some(self.start))?;
        let last = events.iter().rposition(|m| m.event_id() == Some(self.end))?;
        (first <= last).then_some((first, last))
    }

    /// The messages covered by this range.
    pub fn slice<'a>(&self, events: &'a [Message]) -> Option<&'a [Message]> {
        let (first, last) = self.locate(events)?;
        events.get(first..=last)
    }
}

impl std::fmt::Display for EventRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "events {}..={}", self.start, self.end)
    }
}

fn is_foldable(msg: &Message) -> bool {
    msg.condensable() && msg.event_id().is_some()
}

/// Whether every event in `span` may be folded into a summary.
pub fn is_condensable_span(span: &[Message]) -> bool {
    !span.is_empty() && span.iter().all(is_foldable)
}

/// Pick the oldest contiguous run of condensable events, leaving the last
/// `keep_recent` events untouched.
///
/// Returns `None` when no run of at least two condensable events exists.
pub fn select_range(events: &[Message], keep_recent: usize) -> Option<EventRange> {
    let eligible = events.len().saturating_sub(keep_recent);
    let window = events.get(..eligible)?;

    let mut run_start: Option<usize> = None;
    for (idx, msg) in window.iter().enumerate() {
        match (is_foldable(msg), run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start >= MIN_RANGE_LEN {
                    return range_for(&window[start..idx]);
                }
                run_start = None;
            }
            _ => {}
        }
    }

    match run_start {
        Some(start) if eligible - start >= MIN_RANGE_LEN => range_for(&window[start..]),
        _ => None,
    }
}

fn range_for(run: &[Message]) -> Option<EventRange> {
    let start = run.first()?.event_id()?;
    let end = run.last()?.event_id()?;
    Some(EventRange { start, end })
}

/// Threshold check plus range selection for one session.
#[derive(Debug, Clone)]
pub struct CondensationTrigger {
    budget: ContextBudget,
    keep_recent: usize,
}

impl CondensationTrigger {
    pub fn new(budget: ContextBudget) -> Self {
        Self {
            budget,
            keep_recent: DEFAULT_KEEP_RECENT,
        }
    }

    /// Set the number of most recent events kept verbatim.
    pub fn with_keep_recent(mut self, n: usize) -> Self {
        self.keep_recent = n;
        self
    }

    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    pub fn keep_recent(&self) -> usize {
        self.keep_recent
    }

    pub fn usage(&self, events: &[Message]) -> ContextUsage {
        self.budget.estimate_usage(events)
    }

    /// Decide whether to condense now, and over which range.
    pub fn evaluate(&self, events: &[Message]) -> Option<EventRange> {
        if events.is_empty() {
            return None;
        }
        if !self.budget.should_condense(events) {
            trace!("{}: below threshold", self.usage(events).to_log_string());
            return None;
        }
        let range = select_range(events, self.keep_recent);
        match range {
            Some(r) => debug!("Condensation due: selected {r}"),
            None => debug!("Condensation due, but no run of condensable events is eligible"),
        }
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: u64) -> Vec<Message> {
        let mut events = vec![Message::system("Fix the failing test in parser.rs")];
        for id in 1..=n {
            if id % 2 == 1 {
                events.push(Message::assistant(format!("action {id}"), id));
            } else {
                events.push(Message::user(format!("observation {id}"), id));
            }
        }
        events
    }

    #[test]
    fn empty_stream_selects_nothing() {
        assert_eq!(select_range(&[], 0), None);
    }

    #[test]
    fn skips_pinned_prefix_and_keeps_tail() {
        let events = history(8);
        let range = select_range(&events, 3).unwrap();
        assert_eq!(range, EventRange { start: 1, end: 5 });
    }

    #[test]
    fn single_condensable_event_is_not_enough() {
        let events = vec![Message::system("task"), Message::user("only one", 1)];
        assert_eq!(select_range(&events, 0), None);
    }

    #[test]
    fn tail_covering_everything_selects_nothing() {
        let events = history(4);
        assert_eq!(select_range(&events, 10), None);
    }

    #[test]
    fn non_condensable_event_breaks_run() {
        let events = vec![
            Message::user("a", 1),
            Message::user("b", 2),
            Message::new(crate::message::Role::User, "pinned", false, Some(3)),
            Message::user("c", 4),
            Message::user("d", 5),
        ];
        let range = select_range(&events, 0).unwrap();
        assert_eq!(range, EventRange { start: 1, end: 2 });
        assert!(!range.contains(3));
    }

    #[test]
    fn span_with_pinned_or_unnumbered_event_is_not_condensable() {
        let pinned = vec![
            Message::user("a", 1),
            Message::new(crate::message::Role::User, "pinned", false, Some(2)),
            Message::user("c", 3),
        ];
        assert!(!is_condensable_span(&pinned));

        let unnumbered = vec![Message::user("a", 1), Message::system("task")];
        assert!(!is_condensable_span(&unnumbered));

        assert!(is_condensable_span(&history(3)[1..]));
        assert!(!is_condensable_span(&[]));
    }

    #[test]
    fn short_leading_run_is_skipped() {
        let events = vec![
            Message::user("a", 1),
            Message::system("pinned"),
            Message::user("b", 2),
            Message::assistant("c", 3),
            Message::user("d", 4),
        ];
        let range = select_range(&events, 0).unwrap();
        assert_eq!(range, EventRange { start: 2, end: 4 });
    }

    #[test]
    fn events_without_ids_are_not_foldable() {
        let events = vec![
            Message::new(crate::message::Role::User, "a", true, None),
            Message::new(crate::message::Role::User, "b", true, None),
        ];
        assert_eq!(select_range(&events, 0), None);
    }

    #[test]
    fn slice_returns_covered_messages() {
        let events = history(6);
        let range = EventRange { start: 2, end: 4 };
        let slice = range.slice(&events).unwrap();
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].content(), "observation 2");
        assert_eq!(range.locate(&events), Some((2, 4)));
        assert_eq!(EventRange { start: 7, end: 9 }.slice(&events), None);
    }

    #[test]
    fn trigger_waits_for_threshold() {
        let events = history(20);
        let roomy = CondensationTrigger::new(ContextBudget::new()).with_keep_recent(2);
        assert_eq!(roomy.evaluate(&events), None);

        let tight =
            CondensationTrigger::new(ContextBudget::new().with_max_tokens(10)).with_keep_recent(2);
        assert_eq!(tight.evaluate(&events), Some(EventRange { start: 1, end: 18 }));
    }

    #[test]
    fn trigger_ignores_empty_stream() {
        let trigger = CondensationTrigger::new(ContextBudget::new().with_max_tokens(0));
        assert_eq!(trigger.evaluate(&[]), None);
    }
}
