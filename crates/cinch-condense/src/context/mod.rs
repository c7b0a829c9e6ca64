//! Context window management: deciding when to condense, what to send, and
//! how to read the reply.
//!
//! 1. **[`budget`]**: [`ContextBudget`] estimates token usage and applies the
//!    75% warning threshold.
//! 2. **[`range`]**: [`CondensationTrigger`] picks the oldest contiguous run
//!    of condensable events, keeping a recent tail verbatim.
//! 3. **[`summarizer`]**: the summarization prompt and the reply contract.
//! 4. **[`parser`]**: strict reply validation into an
//!    [`AgentSummarizeAction`](crate::action::AgentSummarizeAction).
//! 5. **[`condenser`]**: [`Condenser`] ties the above into one cycle per call
//!    and owns the session watermark.

pub mod budget;
pub mod condenser;
pub mod parser;
pub mod range;
pub mod summarizer;

// Re-export commonly used items at the module level.
pub use budget::{ContextBudget, ContextUsage, MESSAGE_SUMMARY_WARNING_FRAC, should_condense};
pub use condenser::{Condensation, Condenser, splice};
pub use parser::parse_summary_response;
pub use range::{CondensationTrigger, EventRange, is_condensable_span, select_range};
pub use summarizer::{WORD_LIMIT, build_prompt};
