//! Strict parser for summarization replies.
//!
//! Raw model text goes through three checks, in order:
//!
//! 1. **Decode**: the whole text must be one JSON value. Anything before or
//!    after it is a [`MalformedResponse`](ParseFailure::MalformedResponse).
//! 2. **Discriminate**: the `"action"` field must name a known
//!    [`ActionKind`], otherwise [`UnrecognizedAction`](ParseFailure::UnrecognizedAction).
//! 3. **Validate**: the decoded action must be a summary, otherwise
//!    [`UnexpectedActionKind`](ParseFailure::UnexpectedActionKind).
//!
//! A successful summary is stamped with agent provenance, whatever the text
//! claimed. Every failure is logged and returned as one
//! [`InvalidSummaryResponse`]. There is no partial result.

use crate::action::{Action, ActionKind, AgentSummarizeAction, EventSource};
use crate::error::{InvalidSummaryResponse, ParseFailure};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Maximum characters of raw text echoed into logs.
const LOG_PREVIEW_CHARS: usize = 500;

/// Parse a raw summarization reply into a provenance-stamped summary action.
pub fn parse_summary_response(raw: &str) -> Result<AgentSummarizeAction, InvalidSummaryResponse> {
    match decode_summary(raw) {
        Ok(mut action) => {
            action.source = Some(EventSource::Agent);
            debug!(
                "Parsed summary response ({} chars of observations)",
                action.summarized_observations.len()
            );
            Ok(action)
        }
        Err(failure) => {
            let preview: String = raw.chars().take(LOG_PREVIEW_CHARS).collect();
            error!(
                "Failed to parse summary response: {failure}; raw response: {preview}{}",
                if raw.chars().count() > LOG_PREVIEW_CHARS { "..." } else { "" }
            );
            Err(InvalidSummaryResponse::from(failure))
        }
    }
}

/// Decode any action from raw reply text.
///
/// Exposed separately so callers that accept more than summaries can reuse
/// the same decoding rules.
pub fn parse_action(raw: &str) -> Result<Action, ParseFailure> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ParseFailure::MalformedResponse(e.to_string()))?;

    let Value::Object(mut envelope) = value else {
        return Err(ParseFailure::UnrecognizedAction(
            "response is not a JSON object".into(),
        ));
    };

    let kind = match envelope.get("action") {
        None => {
            return Err(ParseFailure::UnrecognizedAction(
                "missing \"action\" field".into(),
            ));
        }
        Some(Value::String(tag)) => ActionKind::from_tag(tag)
            .ok_or_else(|| ParseFailure::UnrecognizedAction(format!("unknown action {tag:?}")))?,
        Some(other) => {
            return Err(ParseFailure::UnrecognizedAction(format!(
                "\"action\" must be a string, got {other}"
            )));
        }
    };

    let args = match envelope.remove("args") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args,
        Some(other) => {
            return Err(ParseFailure::MalformedResponse(format!(
                "\"args\" of {kind} must be an object, got {other}"
            )));
        }
    };

    Action::from_args(kind, args)
        .map_err(|e| ParseFailure::MalformedResponse(format!("invalid arguments for {kind}: {e}")))
}

fn decode_summary(raw: &str) -> Result<AgentSummarizeAction, ParseFailure> {
    match parse_action(raw)? {
        Action::Summarize(action) => Ok(action),
        other => Err(ParseFailure::UnexpectedActionKind(other.kind())),
    }
}
