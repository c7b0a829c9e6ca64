//! Agent-control actions: the closed set of actions the condenser can decode.
//!
//! Every variant exposes the same three things to downstream rendering and
//! logging: a [`kind`](Action::kind), a [`thought`](Action::thought), and a
//! human-readable [`message`](Action::message). The message is always
//! computed from the current field values; nothing caches it.
//!
//! On the wire an action is `{"action": "<kind>", "args": {...}}`. Decoding
//! goes through [`Action::from_args`], a single exhaustive match over
//! [`ActionKind`]. Adding a variant means adding a kind and a match arm.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Free-form key/value payload carried by finish, reject, and delegate actions.
pub type Outputs = Map<String, Value>;

/// Fallback message of a finish action with no thought.
pub const FINISH_DEFAULT_MESSAGE: &str = "All done! What's next on the agenda?";

/// Fixed prefix of every reject message.
pub const REJECT_MESSAGE_PREFIX: &str = "Task is rejected by the agent.";

// ── Provenance ─────────────────────────────────────────────────────

/// Who originated an event.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Agent,
    User,
    Environment,
}

// ── Kinds ──────────────────────────────────────────────────────────

/// Discriminator of an [`Action`], as it appears in the `"action"` field.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ChangeAgentState,
    Summarize,
    Finish,
    Reject,
    Delegate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::ChangeAgentState,
        ActionKind::Summarize,
        ActionKind::Finish,
        ActionKind::Reject,
        ActionKind::Delegate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::ChangeAgentState => "change_agent_state",
            ActionKind::Summarize => "summarize",
            ActionKind::Finish => "finish",
            ActionKind::Reject => "reject",
            ActionKind::Delegate => "delegate",
        }
    }

    /// Look up a kind by its wire tag. Returns `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Variants ───────────────────────────────────────────────────────

/// Notifies the client that the agent's task state changed.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ChangeAgentStateAction {
    pub agent_state: String,
    #[serde(default)]
    pub thought: String,
}

impl ChangeAgentStateAction {
    pub fn message(&self) -> String {
        format!("Agent state changed to {}", self.agent_state)
    }
}

/// Replacement for a condensed range of events.
///
/// `summarized_actions` is a first-person account of what the agent did;
/// `summarized_observations` is the third-person account of what it saw and
/// doubles as the action's message. `last_summarized_event_id` is the session
/// watermark at the time this summary was produced.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "SummarizeArgs")]
pub struct AgentSummarizeAction {
    pub summarized_actions: String,
    pub summarized_observations: String,
    pub last_summarized_event_id: Option<u64>,
    pub is_delegate_summary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
}

impl AgentSummarizeAction {
    pub fn message(&self) -> String {
        self.summarized_observations.clone()
    }
}

impl fmt::Display for AgentSummarizeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**AgentSummarizeAction**")?;
        writeln!(f, "SUMMARIZED ACTIONS: {}", self.summarized_actions)?;
        writeln!(f, "SUMMARIZED OBSERVATIONS: {}", self.summarized_observations)
    }
}

/// Accepted argument shapes for a summarize action.
///
/// The reply contract sends a single `summary`; serialized actions (and older
/// prompts) carry the two-field form. Either one must supply summary text.
///
/// Only summary text is read. Provenance, the watermark and the delegate flag
/// belong to the condenser and are never taken from decoded text, so any such
/// keys (like any other unknown key) are ignored.
#[derive(Deserialize)]
struct SummarizeArgs {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    summarized_actions: Option<String>,
    #[serde(default)]
    summarized_observations: Option<String>,
}

impl TryFrom<SummarizeArgs> for AgentSummarizeAction {
    type Error = String;

    fn try_from(args: SummarizeArgs) -> Result<Self, Self::Error> {
        let Some(observations) = args.summary.or(args.summarized_observations) else {
            return Err("summarize action has no summary text".to_string());
        };
        Ok(Self {
            summarized_actions: args.summarized_actions.unwrap_or_default(),
            summarized_observations: observations,
            ..Default::default()
        })
    }
}

/// The agent considers its task complete.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AgentFinishAction {
    #[serde(default)]
    pub outputs: Outputs,
    #[serde(default)]
    pub thought: String,
}

impl AgentFinishAction {
    pub fn message(&self) -> String {
        if self.thought.is_empty() {
            FINISH_DEFAULT_MESSAGE.to_string()
        } else {
            self.thought.clone()
        }
    }
}

/// The agent refuses the task.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AgentRejectAction {
    #[serde(default)]
    pub outputs: Outputs,
    #[serde(default)]
    pub thought: String,
}

impl AgentRejectAction {
    pub fn message(&self) -> String {
        match self.outputs.get("reason") {
            Some(Value::String(reason)) => format!("{REJECT_MESSAGE_PREFIX} Reason: {reason}"),
            Some(other) => format!("{REJECT_MESSAGE_PREFIX} Reason: {other}"),
            None => REJECT_MESSAGE_PREFIX.to_string(),
        }
    }
}

/// The agent hands the task (or part of it) to another agent.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AgentDelegateAction {
    pub agent: String,
    #[serde(default)]
    pub inputs: Outputs,
    #[serde(default)]
    pub thought: String,
}

impl AgentDelegateAction {
    pub fn message(&self) -> String {
        format!("I'm asking {} for help with this task.", self.agent)
    }
}

// ── Action ─────────────────────────────────────────────────────────

/// A decoded agent-control action.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", content = "args", rename_all = "snake_case")]
pub enum Action {
    ChangeAgentState(ChangeAgentStateAction),
    Summarize(AgentSummarizeAction),
    Finish(AgentFinishAction),
    Reject(AgentRejectAction),
    Delegate(AgentDelegateAction),
}

impl Action {
    /// Decode the `args` object of an action whose kind is already known.
    ///
    /// This is the only place a wire payload is mapped onto a variant.
    pub fn from_args(kind: ActionKind, args: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ActionKind::ChangeAgentState => Action::ChangeAgentState(serde_json::from_value(args)?),
            ActionKind::Summarize => Action::Summarize(serde_json::from_value(args)?),
            ActionKind::Finish => Action::Finish(serde_json::from_value(args)?),
            ActionKind::Reject => Action::Reject(serde_json::from_value(args)?),
            ActionKind::Delegate => Action::Delegate(serde_json::from_value(args)?),
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ChangeAgentState(_) => ActionKind::ChangeAgentState,
            Action::Summarize(_) => ActionKind::Summarize,
            Action::Finish(_) => ActionKind::Finish,
            Action::Reject(_) => ActionKind::Reject,
            Action::Delegate(_) => ActionKind::Delegate,
        }
    }

    /// The agent's reasoning behind the action. Summaries carry none.
    pub fn thought(&self) -> &str {
        match self {
            Action::ChangeAgentState(a) => &a.thought,
            Action::Summarize(_) => "",
            Action::Finish(a) => &a.thought,
            Action::Reject(a) => &a.thought,
            Action::Delegate(a) => &a.thought,
        }
    }

    /// Human-readable message, recomputed from the current fields.
    pub fn message(&self) -> String {
        match self {
            Action::ChangeAgentState(a) => a.message(),
            Action::Summarize(a) => a.message(),
            Action::Finish(a) => a.message(),
            Action::Reject(a) => a.message(),
            Action::Delegate(a) => a.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs(value: Value) -> Outputs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn kind_tags_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::from_tag("run"), None);
        assert_eq!(ActionKind::from_tag("Summarize"), None);
    }

    #[test]
    fn change_state_message() {
        let action = ChangeAgentStateAction {
            agent_state: "paused".into(),
            thought: String::new(),
        };
        assert_eq!(action.message(), "Agent state changed to paused");
    }

    #[test]
    fn finish_message_prefers_thought() {
        let mut action = AgentFinishAction::default();
        assert_eq!(action.message(), FINISH_DEFAULT_MESSAGE);

        action.thought = "Tests pass, shipping it.".into();
        assert_eq!(action.message(), "Tests pass, shipping it.");
    }

    #[test]
    fn finish_message_is_pure() {
        let a = AgentFinishAction {
            outputs: outputs(json!({"result": 1})),
            thought: "done".into(),
        };
        let b = a.clone();
        assert_eq!(a.message(), b.message());

        let c = AgentFinishAction {
            thought: "really done".into(),
            ..a.clone()
        };
        assert_ne!(a.message(), c.message());
    }

    #[test]
    fn reject_message_with_and_without_reason() {
        let with_reason = AgentRejectAction {
            outputs: outputs(json!({"reason": "unsafe"})),
            thought: String::new(),
        };
        assert_eq!(
            with_reason.message(),
            "Task is rejected by the agent. Reason: unsafe"
        );

        let without = AgentRejectAction::default();
        assert_eq!(without.message(), "Task is rejected by the agent.");

        let other_keys = AgentRejectAction {
            outputs: outputs(json!({"why": "unsafe"})),
            thought: String::new(),
        };
        assert_eq!(other_keys.message(), REJECT_MESSAGE_PREFIX);
    }

    #[test]
    fn delegate_message_names_agent() {
        let action = AgentDelegateAction {
            agent: "browser".into(),
            inputs: outputs(json!({"task": "open the docs"})),
            thought: String::new(),
        };
        assert_eq!(
            action.message(),
            "I'm asking browser for help with this task."
        );
    }

    #[test]
    fn summarize_message_tracks_observations() {
        let mut action = AgentSummarizeAction {
            summarized_actions: "I ran the tests.".into(),
            summarized_observations: "Two tests failed.".into(),
            ..Default::default()
        };
        assert_eq!(action.message(), "Two tests failed.");

        action.summarized_observations = "All tests pass.".into();
        assert_eq!(Action::Summarize(action).message(), "All tests pass.");
    }

    #[test]
    fn summarize_display_lists_both_fields() {
        let action = AgentSummarizeAction {
            summarized_actions: "I opened main.rs.".into(),
            summarized_observations: "It defines the CLI.".into(),
            ..Default::default()
        };
        let text = action.to_string();
        assert!(text.starts_with("**AgentSummarizeAction**"));
        assert!(text.contains("SUMMARIZED ACTIONS: I opened main.rs."));
        assert!(text.contains("SUMMARIZED OBSERVATIONS: It defines the CLI."));
    }

    #[test]
    fn from_args_maps_summary_key() {
        let action = Action::from_args(
            ActionKind::Summarize,
            json!({"summary": "The agent fixed the build."}),
        )
        .unwrap();
        let Action::Summarize(summary) = action else {
            panic!("expected summarize");
        };
        assert_eq!(summary.summarized_observations, "The agent fixed the build.");
        assert!(summary.summarized_actions.is_empty());
    }

    #[test]
    fn from_args_accepts_two_field_form() {
        let action = Action::from_args(
            ActionKind::Summarize,
            json!({
                "summarized_actions": "I searched the PDF.",
                "summarized_observations": "It describes sequence diagrams."
            }),
        )
        .unwrap();
        assert_eq!(action.message(), "It describes sequence diagrams.");
    }

    #[test]
    fn from_args_rejects_summary_without_text() {
        assert!(Action::from_args(ActionKind::Summarize, json!({})).is_err());
        assert!(Action::from_args(ActionKind::Summarize, json!({"summary": 42})).is_err());
    }

    #[test]
    fn from_args_requires_delegate_agent() {
        assert!(Action::from_args(ActionKind::Delegate, json!({"inputs": {}})).is_err());
        let ok = Action::from_args(ActionKind::Delegate, json!({"agent": "browser"})).unwrap();
        assert_eq!(ok.kind(), ActionKind::Delegate);
    }

    #[test]
    fn uniform_view_across_variants() {
        let actions = vec![
            Action::ChangeAgentState(ChangeAgentStateAction {
                agent_state: "running".into(),
                thought: "resuming".into(),
            }),
            Action::Finish(AgentFinishAction::default()),
            Action::Reject(AgentRejectAction::default()),
        ];
        let thoughts: Vec<&str> = actions.iter().map(|a| a.thought()).collect();
        assert_eq!(thoughts, vec!["resuming", "", ""]);
        assert!(actions.iter().all(|a| !a.message().is_empty()));
    }

    #[test]
    fn wire_form_is_adjacently_tagged() {
        let action = Action::Finish(AgentFinishAction {
            outputs: Outputs::new(),
            thought: "done".into(),
        });
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "finish");
        assert_eq!(json["args"]["thought"], "done");
    }
}
