//! Configuration for a [`Condenser`](crate::context::Condenser).
//!
//! Every field has a default; callers usually set the model and the context
//! window and leave the rest alone.
//!
//! ```ignore
//! let config = CondenserConfig::new("anthropic/claude-sonnet-4")
//!     .with_max_tokens(128_000)
//!     .with_keep_recent(6)
//!     .with_word_limit(150);
//! ```
//!
//! Advanced fields can be set with struct update syntax:
//!
//! ```ignore
//! let config = CondenserConfig {
//!     retry: RetryConfig::disabled(),
//!     ..CondenserConfig::new("anthropic/claude-sonnet-4")
//! };
//! ```

use crate::DEFAULT_MODEL;
use crate::api::retry::RetryConfig;
use crate::context::budget::{
    ContextBudget, DEFAULT_CHARS_PER_TOKEN, DEFAULT_CONTEXT_WINDOW, MESSAGE_SUMMARY_WARNING_FRAC,
};
use crate::context::range::{CondensationTrigger, DEFAULT_KEEP_RECENT};
use crate::context::summarizer::SummarizerConfig;

/// Configuration for one session's condenser.
#[derive(Debug, Clone)]
pub struct CondenserConfig {
    /// Main model of the session. Used for summaries unless
    /// `summarizer.model` overrides it.
    pub model: String,
    /// Context window of the main model, in tokens.
    pub max_tokens: usize,
    /// Tokens reserved for the main model's output.
    pub output_reserve: usize,
    /// Fraction of the effective window that triggers condensation.
    pub warning_fraction: f64,
    /// Characters per token used for size estimation.
    pub chars_per_token: f64,
    /// Most recent events always kept verbatim.
    pub keep_recent: usize,
    /// Whether this condenser serves a delegated sub-session. Stamped onto
    /// every summary it produces.
    pub is_delegate: bool,
    /// Summarization call settings.
    pub summarizer: SummarizerConfig,
    /// Retry policy for transport failures.
    pub retry: RetryConfig,
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_CONTEXT_WINDOW,
            output_reserve: 0,
            warning_fraction: MESSAGE_SUMMARY_WARNING_FRAC,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            keep_recent: DEFAULT_KEEP_RECENT,
            is_delegate: false,
            summarizer: SummarizerConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl CondenserConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_output_reserve(mut self, tokens: usize) -> Self {
        self.output_reserve = tokens;
        self
    }

    pub fn with_warning_fraction(mut self, fraction: f64) -> Self {
        self.warning_fraction = fraction;
        self
    }

    pub fn with_keep_recent(mut self, n: usize) -> Self {
        self.keep_recent = n;
        self
    }

    /// Summaries will be marked as belonging to a delegated sub-session.
    pub fn delegate(mut self) -> Self {
        self.is_delegate = true;
        self
    }

    /// Use a different (usually cheaper) model for summaries.
    pub fn with_summary_model(mut self, model: impl Into<String>) -> Self {
        self.summarizer.model = Some(model.into());
        self
    }

    pub fn with_word_limit(mut self, words: usize) -> Self {
        self.summarizer.word_limit = words;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(retries);
        self
    }

    /// Build the trigger described by this config.
    pub fn build_trigger(&self) -> CondensationTrigger {
        let budget = ContextBudget::new()
            .with_max_tokens(self.max_tokens)
            .with_output_reserve(self.output_reserve)
            .with_chars_per_token(self.chars_per_token)
            .with_warning_fraction(self.warning_fraction);
        CondensationTrigger::new(budget).with_keep_recent(self.keep_recent)
    }
}
