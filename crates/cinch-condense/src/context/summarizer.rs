//! Summarization protocol: the prompt sent over a condensed range and the
//! reply contract the model must follow.
//!
//! The model is asked for exactly one JSON object,
//! `{"action": "summarize", "args": {"summary": "..."}}`, with nothing before
//! or after it. The contract is validated by the
//! [`parser`](crate::context::parser), never repaired. The word limit is an
//! instruction only: an overlong summary is logged and accepted.

use crate::message::{Message, Role};
use crate::{ChatMessage, ChatRequest, JsonSchemaFormat, ResponseFormat, json_schema_for};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

/// Default upper bound on summary length, in words.
pub const WORD_LIMIT: usize = 200;

const WORD_LIMIT_PLACEHOLDER: &str = "{WORD_LIMIT}";

/// System instruction for the summarization call. `{WORD_LIMIT}` is filled in
/// by [`summary_instruction`].
const SUMMARY_PROMPT_SYSTEM: &str = "\
Your job is to summarize a history of previous messages in a conversation between an AI persona and a human.
The conversation you are given is from a fixed context window and may not be complete.
Messages sent by the AI are marked with the 'assistant' role.
Messages the user sends are in the 'user' role.
The 'user' role is also used for important system events, such as login events and heartbeat events \
(heartbeats run the AI's program without user action, allowing the AI to act without prompting from the user sending them a message).
Summarize what happened in the conversation from the perspective of the AI (use the first person).
Include all the critical information in the conversation so far in the summary.
Respond with a JSON object containing:
    - \"action\": \"summarize\"
    - \"args\":
      - \"summary\": precise sentences summarizing all the provided actions and all the provided observations, written in the third person.

Example response:
{
    \"action\": \"summarize\",
    \"args\": {
        \"summary\": \"The agent located the UML specification PDF, parsed its content, and searched for information about sequence diagrams. \
The agent hit a UnicodeDecodeError when first searching the PDF text, resolved it by installing the PyPDF2 library, and extracted the relevant information about sequence diagrams.\"
    }
}
Keep your summary under {WORD_LIMIT} words, do NOT exceed this word limit.
Output only the JSON object, do NOT include anything else before or after it.";

// ── Reply contract ─────────────────────────────────────────────────

/// Discriminator of the only reply the summarization call accepts.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryReplyAction {
    #[serde(rename = "summarize")]
    Summarize,
}

/// Arguments of the summarization reply.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SummaryReplyArgs {
    /// Third-person summary of every action and observation in the range.
    pub summary: String,
}

/// The exact reply shape expected from the summarization model.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SummaryReply {
    pub action: SummaryReplyAction,
    pub args: SummaryReplyArgs,
}

/// JSON Schema of [`SummaryReply`], for providers that enforce structured output.
pub fn reply_schema() -> Value {
    json_schema_for::<SummaryReply>()
}

// ── Prompt assembly ────────────────────────────────────────────────

/// The system instruction with the word limit filled in.
pub fn summary_instruction(word_limit: usize) -> String {
    SUMMARY_PROMPT_SYSTEM.replace(WORD_LIMIT_PLACEHOLDER, &word_limit.to_string())
}

/// Serialize events as a JSON array of `{"role", "content"}` objects.
pub fn serialize_events(events: &[Message]) -> String {
    let list: Vec<Value> = events
        .iter()
        .map(|m| json!({"role": m.role(), "content": m.content()}))
        .collect();
    format!("{:#}", Value::Array(list))
}

/// Full single-text prompt: instruction followed by the serialized events.
pub fn build_prompt(events: &[Message], word_limit: usize) -> String {
    format!(
        "{}\n{}",
        summary_instruction(word_limit),
        serialize_events(events)
    )
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Log (but accept) a summary that overruns the requested word limit.
///
/// Returns `true` when the summary is within the limit.
pub fn check_word_limit(summary: &str, word_limit: usize) -> bool {
    let words = word_count(summary);
    if words > word_limit {
        warn!("Summary has {words} words, over the requested limit of {word_limit}");
        return false;
    }
    true
}

// ── Summarizer ─────────────────────────────────────────────────────

/// How strongly the request asks the provider for JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonMode {
    /// Rely on the prompt alone.
    #[default]
    Off,
    /// Ask for any JSON object.
    Object,
    /// Ask for output matching [`reply_schema`].
    Schema,
}

/// Configuration for the summarization call.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Model to use for summarization (cheaper than the main model).
    pub model: Option<String>,
    /// Maximum tokens for the summarization response.
    pub max_summary_tokens: u32,
    /// Word limit stated in the prompt.
    pub word_limit: usize,
    /// Sampling temperature for the summarization call.
    pub temperature: f32,
    pub json_mode: JsonMode,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: None, // Use main model if not specified.
            max_summary_tokens: 1024,
            word_limit: WORD_LIMIT,
            temperature: 0.3,
            json_mode: JsonMode::Off,
        }
    }
}

/// Builds summarization requests for event ranges.
#[derive(Debug, Clone)]
pub struct Summarizer {
    pub config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config }
    }

    /// Get the model to use for summarization.
    pub fn summary_model<'a>(&'a self, main_model: &'a str) -> &'a str {
        self.config.model.as_deref().unwrap_or(main_model)
    }

    /// Build a one-shot (system, user) request over a span of events.
    pub fn build_request(&self, span: &[Message], main_model: &str) -> ChatRequest {
        let response_format = match self.config.json_mode {
            JsonMode::Off => None,
            JsonMode::Object => Some(ResponseFormat::json_object()),
            JsonMode::Schema => Some(ResponseFormat::json_schema(JsonSchemaFormat {
                name: "summary_reply".into(),
                strict: true,
                schema: reply_schema(),
            })),
        };

        ChatRequest {
            model: Some(self.summary_model(main_model).to_string()),
            messages: vec![
                ChatMessage::new(Role::System, summary_instruction(self.config.word_limit)),
                ChatMessage::new(Role::User, serialize_events(span)),
            ],
            max_tokens: self.config.max_summary_tokens,
            temperature: self.config.temperature,
            response_format,
        }
    }
}
