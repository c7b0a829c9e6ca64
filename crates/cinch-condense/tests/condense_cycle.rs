//! End-to-end condensation cycles against a scripted transport.

use cinch_condense::ChatRequest;
use cinch_condense::action::{Action, ActionKind, EventSource};
use cinch_condense::api::{SummaryTransport, TransportFuture};
use cinch_condense::config::CondenserConfig;
use cinch_condense::context::{Condenser, splice};
use cinch_condense::error::{CondenseError, ParseFailure};
use cinch_condense::events::{CondenseEvent, EventObserver};
use cinch_condense::message::{Message, Role};
use std::sync::Mutex;

struct ScriptedTransport {
    replies: Mutex<Vec<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(mut replies: Vec<Result<String, String>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl SummaryTransport for ScriptedTransport {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> TransportFuture<'a> {
        let user_turn = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(user_turn);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err("script exhausted".into()));
        Box::pin(async move { next })
    }
}

fn reply(summary: &str) -> Result<String, String> {
    Ok(serde_json::json!({"action": "summarize", "args": {"summary": summary}}).to_string())
}

fn session(n: u64) -> Vec<Message> {
    let mut events = vec![Message::system("Make the parser tests pass")];
    for id in 1..=n {
        let body = format!("step {id}: {}", "output ".repeat(10));
        if id % 2 == 1 {
            events.push(Message::assistant(body, id));
        } else {
            events.push(Message::user(body, id));
        }
    }
    events
}

fn config() -> CondenserConfig {
    CondenserConfig::new("main/model")
        .with_max_tokens(100)
        .with_keep_recent(2)
        .with_retries(0)
}

#[tokio::test]
async fn two_cycles_fold_the_previous_summary() {
    let transport = ScriptedTransport::new(vec![
        reply("Ran the tests; two failed in the lexer."),
        reply("Fixed the lexer; all tests pass."),
    ]);
    let mut condenser = Condenser::new(&transport, config());

    let history = session(8);
    let first = condenser
        .condense(&history)
        .await
        .unwrap()
        .expect("history is over budget");
    assert_eq!(first.range.start, 1);
    assert_eq!(first.range.end, 6);
    assert_eq!(first.action.last_summarized_event_id, Some(6));
    assert_eq!(first.action.source, Some(EventSource::Agent));

    let history = splice(&history, &first);
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role(), Role::System);
    assert_eq!(history[1].role(), Role::Assistant);
    assert!(history[1].condensable());
    assert!(history[1].content().contains("two failed in the lexer"));

    // New work arrives, and the summary itself is folded into the next one.
    let mut history = history;
    for id in 9..=14 {
        history.push(Message::user(format!("step {id}: {}", "output ".repeat(10)), id));
    }
    let second = condenser.condense(&history).await.unwrap().unwrap();
    assert_eq!(second.range.start, 6);
    assert_eq!(second.range.end, 12);
    assert_eq!(condenser.watermark(), Some(12));
    assert_eq!(condenser.condensation_count(), 2);

    let prompts = transport.prompts.lock().unwrap();
    assert!(prompts[1].contains("two failed in the lexer"));

    let history = splice(&history, &second);
    assert_eq!(history.len(), 4);
    assert!(history[1].content().contains("all tests pass"));
}

#[tokio::test]
async fn bad_reply_leaves_history_and_watermark_untouched() {
    let transport = ScriptedTransport::new(vec![Ok(
        r#"{"action": "finish", "args": {"outputs": {}}}"#.into(),
    )]);
    let failures = Mutex::new(0usize);
    let observer = EventObserver::new(|event| {
        if let CondenseEvent::Failed { .. } = event {
            *failures.lock().unwrap() += 1;
        }
    });
    let mut condenser = Condenser::new(&transport, config()).with_event_handler(&observer);

    let history = session(8);
    let err = condenser.condense(&history).await.unwrap_err();
    match err {
        CondenseError::InvalidSummary(e) => {
            assert_eq!(
                *e.failure(),
                ParseFailure::UnexpectedActionKind(ActionKind::Finish)
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(condenser.watermark(), None);
    assert_eq!(condenser.condensation_count(), 0);
    assert_eq!(*failures.lock().unwrap(), 1);
    assert_eq!(history.len(), 9);
}

#[tokio::test]
async fn delegate_condenser_marks_its_summaries() {
    let transport = ScriptedTransport::new(vec![reply("Delegate explored the repo layout.")]);
    let mut condenser = Condenser::new(&transport, config().delegate());

    let condensation = condenser.force_condense(&session(6)).await.unwrap().unwrap();
    assert!(condensation.action.is_delegate_summary);

    let action = Action::Summarize(condensation.action);
    assert_eq!(action.kind(), ActionKind::Summarize);
    assert!(action.message().contains("Delegate explored the repo layout."));
}
