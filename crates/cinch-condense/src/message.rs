//! History messages: the immutable carrier for one event in the agent's stream.
//!
//! Every action the agent took and every observation it received enters the
//! condenser as a [`Message`]. The `condensable` flag decides whether the
//! event may be folded into a summary or must stay verbatim (the original
//! task, pinned instructions). Messages are never edited in place; a changed
//! event is a new value.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Role of a history message as presented to the summarization model.
///
/// `Assistant` is the agent's own prior actions. `User` covers both human
/// messages and system-originated notifications (login, heartbeat).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One historical event in the agent's stream.
///
/// Fields are private: once built, a message cannot change. In particular
/// the `condensable` flag is fixed for the message's lifetime.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
    condensable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<u64>,
}

impl Message {
    pub fn new(
        role: Role,
        content: impl Into<String>,
        condensable: bool,
        event_id: Option<u64>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            condensable,
            event_id,
        }
    }

    /// A condensable user-role event.
    pub fn user(content: impl Into<String>, event_id: u64) -> Self {
        Self::new(Role::User, content, true, Some(event_id))
    }

    /// A condensable assistant-role event (an action the agent took).
    pub fn assistant(content: impl Into<String>, event_id: u64) -> Self {
        Self::new(Role::Assistant, content, true, Some(event_id))
    }

    /// A pinned system message. Never condensed, carries no event id.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, false, None)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn condensable(&self) -> bool {
        self.condensable
    }

    pub fn event_id(&self) -> Option<u64> {
        self.event_id
    }

    /// Approximate token count of the content.
    pub fn estimated_tokens(&self, chars_per_token: f64) -> usize {
        if chars_per_token <= 0.0 {
            return self.content.len();
        }
        (self.content.len() as f64 / chars_per_token) as usize
    }
}

/// Read a JSON-lines history file, one [`Message`] per non-empty line.
pub fn load_history(path: &Path) -> Result<Vec<Message>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read history '{}': {e}", path.display()))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Message>(line)
                .map_err(|e| format!("history line {}: {e}", idx + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn constructors_set_flags() {
        let user = Message::user("ls -la", 3);
        assert_eq!(user.role(), Role::User);
        assert!(user.condensable());
        assert_eq!(user.event_id(), Some(3));

        let sys = Message::system("You are a coding agent.");
        assert_eq!(sys.role(), Role::System);
        assert!(!sys.condensable());
        assert_eq!(sys.event_id(), None);
    }

    #[test]
    fn estimated_tokens_uses_ratio() {
        let msg = Message::assistant("a".repeat(350), 1);
        assert_eq!(msg.estimated_tokens(3.5), 100);
        assert_eq!(msg.estimated_tokens(0.0), 350);
    }

    #[test]
    fn serde_uses_lowercase_roles() {
        let msg = Message::user("hello", 1);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["condensable"], true);

        let sys = serde_json::to_value(Message::system("pinned")).unwrap();
        assert!(sys.get("event_id").is_none());
    }

    #[test]
    fn load_history_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"role":"system","content":"task","condensable":false}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"role":"assistant","content":"ran tests","condensable":true,"event_id":1}}"#
        )
        .unwrap();

        let history = load_history(file.path()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].event_id(), Some(1));
    }

    #[test]
    fn load_history_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"role":"user","content":"ok","condensable":true,"event_id":1}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();

        let err = load_history(file.path()).unwrap_err();
        assert!(err.contains("history line 2"), "got: {err}");
    }
}
