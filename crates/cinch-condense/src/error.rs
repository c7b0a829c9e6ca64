//! Error types for summary parsing and condensation cycles.
//!
//! The parser distinguishes three internal failure kinds ([`ParseFailure`])
//! but only ever returns [`InvalidSummaryResponse`], so callers match on a
//! single type. The original failure stays reachable through
//! [`InvalidSummaryResponse::failure`] and `Error::source`.

use crate::action::ActionKind;
use crate::context::range::EventRange;
use thiserror::Error;

/// Why a summarization reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The text did not decode as a JSON value, or its arguments did not fit
    /// the action's shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The `"action"` discriminator was missing or names no known action.
    #[error("unrecognized action: {0}")]
    UnrecognizedAction(String),

    /// The reply decoded to a known action that is not a summary.
    #[error("expected a summarize action, but the response got {0}")]
    UnexpectedActionKind(ActionKind),
}

/// The single error surfaced by
/// [`parse_summary_response`](crate::context::parser::parse_summary_response).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse the response: {failure}")]
pub struct InvalidSummaryResponse {
    #[source]
    failure: ParseFailure,
}

impl InvalidSummaryResponse {
    pub fn failure(&self) -> &ParseFailure {
        &self.failure
    }
}

impl From<ParseFailure> for InvalidSummaryResponse {
    fn from(failure: ParseFailure) -> Self {
        Self { failure }
    }
}

/// Failure of one condensation cycle. The event stream is untouched in
/// every case.
#[derive(Debug, Error)]
pub enum CondenseError {
    /// The LLM transport failed (after any configured retries).
    #[error("summarization request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    InvalidSummary(#[from] InvalidSummaryResponse),

    /// The requested range does not appear in the history passed in.
    #[error("{0} not found in history")]
    RangeNotFound(EventRange),

    /// The requested range covers an event that must stay verbatim.
    #[error("{0} contains events that cannot be condensed")]
    RangeNotCondensable(EventRange),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wrapper_keeps_original_message() {
        let err = InvalidSummaryResponse::from(ParseFailure::UnexpectedActionKind(
            ActionKind::Finish,
        ));
        let text = err.to_string();
        assert!(text.contains("expected a summarize action, but the response got finish"));
        assert!(err.source().is_some());
    }

    #[test]
    fn condense_error_is_transparent_over_parse_errors() {
        let inner = InvalidSummaryResponse::from(ParseFailure::UnrecognizedAction(
            "missing \"action\" field".into(),
        ));
        let err = CondenseError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}
