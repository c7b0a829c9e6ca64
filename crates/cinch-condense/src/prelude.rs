//! Convenience re-exports for common `cinch-condense` types.
//!
//! ```ignore
//! use cinch_condense::prelude::*;
//! ```

// ── Core types ──────────────────────────────────────────────────────
pub use crate::message::{Message, Role};
pub use crate::{ChatRequest, OpenRouterClient};

// ── Actions and errors ──────────────────────────────────────────────
pub use crate::action::{Action, ActionKind, AgentSummarizeAction, EventSource};
pub use crate::error::{CondenseError, InvalidSummaryResponse, ParseFailure};

// ── Condensation ────────────────────────────────────────────────────
pub use crate::api::{RetryConfig, SummaryTransport, TransportFuture};
pub use crate::config::CondenserConfig;
pub use crate::context::{
    Condensation, CondensationTrigger, Condenser, ContextBudget, EventRange, build_prompt,
    parse_summary_response, splice,
};
pub use crate::events::{CondenseEvent, EventHandler, EventObserver, LoggingHandler, NoopHandler};
