//! Context budget tracking: estimates how much of the model's window the
//! event history occupies and decides when condensation is due.
//!
//! Usage is estimated from character counts. Condensation is triggered once
//! the estimate reaches a fraction of the effective window (75% by default),
//! leaving enough headroom for the summarization call itself.

use crate::message::Message;

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Default context window size in tokens.
pub const DEFAULT_CONTEXT_WINDOW: usize = 200_000;

/// Fraction of the window at which condensation kicks in.
pub const MESSAGE_SUMMARY_WARNING_FRAC: f64 = 0.75;

/// Whether accumulated usage has crossed the condensation threshold.
///
/// True when `current_usage >= limit * warning_fraction`.
pub fn should_condense(current_usage: usize, limit: usize, warning_fraction: f64) -> bool {
    current_usage as f64 >= limit as f64 * warning_fraction
}

/// Tracks context budget consumption for one session's history.
///
/// # Example
///
/// ```ignore
/// let budget = ContextBudget::new()
///     .with_max_tokens(128_000)
///     .with_output_reserve(4096);
///
/// let usage = budget.estimate_usage(&history);
/// tracing::debug!("{}", usage.to_log_string());
///
/// if budget.should_condense(&history) {
///     // pick a range and summarize it
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ContextBudget {
    /// Maximum context window in tokens.
    max_tokens: usize,
    /// Tokens reserved for model output (per-response token limit).
    output_reserve: usize,
    /// Characters per token ratio (calibrated or default).
    chars_per_token: f64,
    /// Fraction of the effective window that triggers condensation.
    warning_fraction: f64,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBudget {
    pub fn new() -> Self {
        Self {
            max_tokens: DEFAULT_CONTEXT_WINDOW,
            output_reserve: 0,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            warning_fraction: MESSAGE_SUMMARY_WARNING_FRAC,
        }
    }

    /// Override the context window size (in tokens).
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set tokens reserved for model output.
    pub fn with_output_reserve(mut self, tokens: usize) -> Self {
        self.output_reserve = tokens;
        self
    }

    /// Use a calibrated chars-per-token ratio. Non-positive values are ignored.
    pub fn with_chars_per_token(mut self, cpt: f64) -> Self {
        if cpt > 0.0 {
            self.chars_per_token = cpt;
        }
        self
    }

    pub fn with_warning_fraction(mut self, fraction: f64) -> Self {
        self.warning_fraction = fraction;
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }

    pub fn warning_fraction(&self) -> f64 {
        self.warning_fraction
    }

    /// Effective context window: max_tokens minus the output reserve.
    pub fn effective_max_tokens(&self) -> usize {
        self.max_tokens.saturating_sub(self.output_reserve)
    }

    /// Estimate the total tokens consumed by all messages.
    pub fn estimate_usage(&self, messages: &[Message]) -> ContextUsage {
        let total_chars: usize = messages.iter().map(|m| m.content().len()).sum();
        let estimated_tokens = (total_chars as f64 / self.chars_per_token) as usize;
        let effective = self.effective_max_tokens();
        let usage_pct = if effective > 0 {
            estimated_tokens as f64 / effective as f64
        } else {
            1.0
        };

        ContextUsage {
            estimated_tokens,
            max_tokens: effective,
            usage_pct,
        }
    }

    /// Whether the history has grown past the condensation threshold.
    pub fn should_condense(&self, messages: &[Message]) -> bool {
        let usage = self.estimate_usage(messages);
        should_condense(
            usage.estimated_tokens,
            self.effective_max_tokens(),
            self.warning_fraction,
        )
    }
}

/// Snapshot of context usage at a point in time.
#[derive(Debug, Clone)]
pub struct ContextUsage {
    /// Estimated tokens consumed.
    pub estimated_tokens: usize,
    /// Effective context window.
    pub max_tokens: usize,
    /// Usage as a fraction (0.0 to 1.0+).
    pub usage_pct: f64,
}

impl ContextUsage {
    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "context: ~{} tokens ({:.0}% of {})",
            self.estimated_tokens,
            self.usage_pct * 100.0,
            self.max_tokens,
        )
    }
}
