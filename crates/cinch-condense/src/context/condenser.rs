//! One session's condensation cycle.
//!
//! A [`Condenser`] owns the session's watermark (the id of the newest event
//! already folded into a summary) and runs the cycle:
//!
//! 1. check the budget threshold,
//! 2. pick the oldest eligible range,
//! 3. ask the LLM for a summary of that range,
//! 4. parse and validate the reply,
//! 5. hand back a [`Condensation`] for the runtime to [`splice`].
//!
//! The condenser never mutates the caller's history. A failed cycle leaves
//! the watermark and counters as they were and returns the error; the next
//! cycle simply tries again.
//!
//! Delegated sub-sessions get their own `Condenser` (configured with
//! [`CondenserConfig::delegate`]), so no state is shared between sessions.

use crate::action::AgentSummarizeAction;
use crate::api::{SummaryTransport, complete_with_retry};
use crate::config::CondenserConfig;
use crate::context::parser::parse_summary_response;
use crate::context::range::{CondensationTrigger, EventRange, is_condensable_span, select_range};
use crate::context::summarizer::{Summarizer, check_word_limit};
use crate::error::CondenseError;
use crate::events::{CondenseEvent, EventHandler, NoopHandler};
use crate::message::{Message, Role};
use tracing::{error, warn};

/// A successful condensation: the range to replace and its replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Condensation {
    pub range: EventRange,
    pub action: AgentSummarizeAction,
}

/// The summary re-enters history as a condensable assistant message keyed by
/// the last event id of its range, so it keeps its place in id order and a
/// later cycle can fold it again.
impl From<&Condensation> for Message {
    fn from(condensation: &Condensation) -> Self {
        Message::new(
            Role::Assistant,
            condensation.action.message(),
            true,
            Some(condensation.range.end),
        )
    }
}

/// Per-session condensation driver.
pub struct Condenser<'a, T: SummaryTransport> {
    transport: T,
    config: CondenserConfig,
    trigger: CondensationTrigger,
    summarizer: Summarizer,
    event_handler: &'a dyn EventHandler,
    watermark: Option<u64>,
    condensation_count: usize,
}

impl<'a, T: SummaryTransport> Condenser<'a, T> {
    pub fn new(transport: T, config: CondenserConfig) -> Self {
        let trigger = config.build_trigger();
        let summarizer = Summarizer::new(config.summarizer.clone());
        Self {
            transport,
            config,
            trigger,
            summarizer,
            event_handler: &NoopHandler,
            watermark: None,
            condensation_count: 0,
        }
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Resume from a previously persisted watermark.
    pub fn with_watermark(mut self, watermark: Option<u64>) -> Self {
        self.watermark = watermark;
        self
    }

    /// Id of the newest event already folded into a summary.
    pub fn watermark(&self) -> Option<u64> {
        self.watermark
    }

    pub fn condensation_count(&self) -> usize {
        self.condensation_count
    }

    pub fn config(&self) -> &CondenserConfig {
        &self.config
    }

    pub fn trigger(&self) -> &CondensationTrigger {
        &self.trigger
    }

    /// Run one cycle if the history is over budget.
    ///
    /// Returns `Ok(None)` when nothing needs (or can) be condensed.
    pub async fn condense(
        &mut self,
        events: &[Message],
    ) -> Result<Option<Condensation>, CondenseError> {
        if events.is_empty() {
            return Ok(None);
        }
        let range = self.trigger.evaluate(events);
        if range.is_none() && !self.trigger.budget().should_condense(events) {
            return Ok(None);
        }
        let usage = self.trigger.usage(events);
        self.event_handler
            .on_event(&CondenseEvent::ThresholdCrossed { usage: &usage });

        match range {
            Some(range) => self.condense_range(events, range).await.map(Some),
            None => {
                self.event_handler.on_event(&CondenseEvent::NothingToCondense);
                Ok(None)
            }
        }
    }

    /// Run one cycle regardless of the budget, if any range is eligible.
    pub async fn force_condense(
        &mut self,
        events: &[Message],
    ) -> Result<Option<Condensation>, CondenseError> {
        match select_range(events, self.trigger.keep_recent()) {
            Some(range) => self.condense_range(events, range).await.map(Some),
            None => {
                self.event_handler.on_event(&CondenseEvent::NothingToCondense);
                Ok(None)
            }
        }
    }

    /// Summarize an explicit range of `events`.
    pub async fn condense_range(
        &mut self,
        events: &[Message],
        range: EventRange,
    ) -> Result<Condensation, CondenseError> {
        let result = self.summarize_range(events, range).await;
        match result {
            Ok(mut action) => {
                let watermark = self.watermark.map_or(range.end, |w| w.max(range.end));
                action.last_summarized_event_id = Some(watermark);
                action.is_delegate_summary = self.config.is_delegate;
                self.watermark = Some(watermark);
                self.condensation_count += 1;

                self.event_handler.on_event(&CondenseEvent::Condensed {
                    range,
                    action: &action,
                    condensation_number: self.condensation_count,
                });
                Ok(Condensation { range, action })
            }
            Err(error) => {
                error!("Condensation of {range} failed: {error}");
                self.event_handler.on_event(&CondenseEvent::Failed {
                    range,
                    error: &error,
                });
                Err(error)
            }
        }
    }

    async fn summarize_range(
        &self,
        events: &[Message],
        range: EventRange,
    ) -> Result<AgentSummarizeAction, CondenseError> {
        let span = range
            .slice(events)
            .ok_or(CondenseError::RangeNotFound(range))?;
        if !is_condensable_span(span) {
            return Err(CondenseError::RangeNotCondensable(range));
        }
        self.event_handler.on_event(&CondenseEvent::RangeSelected {
            range,
            event_count: span.len(),
        });

        let request = self.summarizer.build_request(span, &self.config.model);
        let model = request.model.clone().unwrap_or_default();
        self.event_handler
            .on_event(&CondenseEvent::SummaryRequested {
                model: &model,
                range,
            });

        let raw = complete_with_retry(&self.transport, &request, &self.config.retry)
            .await
            .map_err(CondenseError::Transport)?;
        let action = parse_summary_response(&raw)?;
        check_word_limit(
            &action.summarized_observations,
            self.summarizer.config.word_limit,
        );
        Ok(action)
    }
}

/// Build the new history: `events` with the condensed range replaced by one
/// condensable assistant message carrying the summary.
///
/// If the range is no longer present, or covers an event that must stay
/// verbatim, the history is returned unchanged.
pub fn splice(events: &[Message], condensation: &Condensation) -> Vec<Message> {
    let Some((first, last)) = condensation.range.locate(events) else {
        warn!(
            "Cannot splice summary: {} not found in history",
            condensation.range
        );
        return events.to_vec();
    };
    if !is_condensable_span(&events[first..=last]) {
        warn!(
            "Cannot splice summary: {} contains events that cannot be condensed",
            condensation.range
        );
        return events.to_vec();
    }

    let summary = Message::from(condensation);

    let mut spliced = Vec::with_capacity(events.len() - (last - first));
    spliced.extend_from_slice(&events[..first]);
    spliced.push(summary);
    spliced.extend_from_slice(&events[last + 1..]);
    spliced
}
