//! Events and handlers for observing condensation cycles.
//!
//! The [`Condenser`](crate::context::Condenser) reports every decision it
//! makes through [`CondenseEvent`] variants. Callers implement
//! [`EventHandler`] for UI updates, metrics, or tests.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`EventObserver`] | Quick closures |

use crate::action::AgentSummarizeAction;
use crate::context::budget::ContextUsage;
use crate::context::range::EventRange;
use crate::error::CondenseError;
use tracing::{debug, error, info};

/// Events emitted by the condenser during a cycle.
#[derive(Debug)]
pub enum CondenseEvent<'a> {
    /// Usage crossed the threshold; a cycle is starting.
    ThresholdCrossed { usage: &'a ContextUsage },
    /// A range was chosen for condensation.
    RangeSelected {
        range: EventRange,
        event_count: usize,
    },
    /// Usage crossed the threshold but no range qualified.
    NothingToCondense,
    /// The summarization request is about to be sent.
    SummaryRequested { model: &'a str, range: EventRange },
    /// The range was condensed into a summary.
    Condensed {
        range: EventRange,
        action: &'a AgentSummarizeAction,
        condensation_number: usize,
    },
    /// The cycle aborted. History is untouched.
    Failed {
        range: EventRange,
        error: &'a CondenseError,
    },
}

/// Handler for condenser events.
///
/// # Example
///
/// ```ignore
/// struct Counter(std::sync::atomic::AtomicUsize);
///
/// impl EventHandler for Counter {
///     fn on_event(&self, event: &CondenseEvent<'_>) {
///         if let CondenseEvent::Condensed { .. } = event {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &CondenseEvent<'_>) {
        let _ = event;
    }
}

/// A handler that ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// Adapts a closure into an [`EventHandler`].
pub struct EventObserver<F>(F)
where
    F: Fn(&CondenseEvent<'_>) + Send + Sync;

impl<F> EventObserver<F>
where
    F: Fn(&CondenseEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for EventObserver<F>
where
    F: Fn(&CondenseEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &CondenseEvent<'_>) {
        (self.0)(event);
    }
}

/// An event handler that logs events via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &CondenseEvent<'_>) {
        match event {
            CondenseEvent::ThresholdCrossed { usage } => {
                info!("Condensation threshold crossed: {}", usage.to_log_string());
            }
            CondenseEvent::RangeSelected { range, event_count } => {
                debug!("Condensing {range} ({event_count} events)");
            }
            CondenseEvent::NothingToCondense => {
                debug!("Nothing eligible to condense");
            }
            CondenseEvent::SummaryRequested { model, range } => {
                debug!("Requesting summary of {range} from {model}");
            }
            CondenseEvent::Condensed {
                range,
                action,
                condensation_number,
            } => {
                let preview: String = action.summarized_observations.chars().take(200).collect();
                info!("Condensation #{condensation_number}: {range} folded into summary");
                debug!(
                    "Summary: {preview}{}",
                    if action.summarized_observations.chars().count() > 200 {
                        "..."
                    } else {
                        ""
                    }
                );
            }
            CondenseEvent::Failed { range, error } => {
                error!("Condensation of {range} failed: {error}. History left unchanged.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn observer_sees_events() {
        let seen = Mutex::new(Vec::new());
        let observer = EventObserver::new(|event| {
            if let CondenseEvent::RangeSelected { event_count, .. } = event {
                seen.lock().unwrap().push(*event_count);
            }
        });
        observer.on_event(&CondenseEvent::RangeSelected {
            range: EventRange { start: 1, end: 4 },
            event_count: 4,
        });
        observer.on_event(&CondenseEvent::NothingToCondense);
        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }

    #[test]
    fn logging_handler_accepts_every_variant() {
        let usage = ContextUsage {
            estimated_tokens: 900,
            max_tokens: 1000,
            usage_pct: 0.9,
        };
        let action = AgentSummarizeAction {
            summarized_observations: "s".repeat(300),
            ..Default::default()
        };
        let range = EventRange { start: 1, end: 2 };
        let error = CondenseError::Transport("timed out".into());

        LoggingHandler.on_event(&CondenseEvent::ThresholdCrossed { usage: &usage });
        LoggingHandler.on_event(&CondenseEvent::SummaryRequested { model: "m", range });
        LoggingHandler.on_event(&CondenseEvent::Condensed {
            range,
            action: &action,
            condensation_number: 1,
        });
        LoggingHandler.on_event(&CondenseEvent::Failed {
            range,
            error: &error,
        });
    }
}
