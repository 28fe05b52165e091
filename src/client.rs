//! The send → render cycle
//!
//! [`ChatClient::submit`] runs one full cycle. Event-driven front ends use the
//! two halves instead: [`ChatClient::begin`] renders the human side and returns
//! a [`PendingReply`], the caller performs the request wherever it likes, and
//! [`ChatClient::complete`] renders the outcome.

use serde_json::Value;

use crate::reply::ReplyPayload;
use crate::service::{ReplyService, ServiceError};
use crate::state::Message;
use crate::variant::Variant;
use crate::view::{BubbleId, ConversationView, InputField};

pub const DEFAULT_PLACEHOLDER: &str = "Luma is thinking...";
pub const FAILURE_TEXT: &str = "Something went wrong. Please try again.";

/// A request that has been rendered but not answered yet
#[derive(Debug)]
pub struct PendingReply {
    query: String,
    placeholder: Option<BubbleId>,
}

impl PendingReply {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// What a submit did to the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, nothing rendered or sent
    Ignored,
    /// Reply dispatched; counts reply bubbles, not the empty container
    Rendered { ai_bubbles: usize },
    /// Request or decode failed; `reported` when a failure bubble was shown
    Failed { reported: bool },
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    variant: Variant,
    placeholder_text: String,
}

impl ChatClient {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            placeholder_text: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn with_placeholder_text(mut self, text: impl Into<String>) -> Self {
        self.placeholder_text = text.into();
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub async fn submit<V, I, S>(&self, view: &mut V, input: &mut I, service: &S) -> SubmitOutcome
    where
        V: ConversationView + ?Sized,
        I: InputField + ?Sized,
        S: ReplyService + ?Sized,
    {
        let Some(pending) = self.begin(view, input) else {
            return SubmitOutcome::Ignored;
        };
        let outcome = service.send(pending.query()).await;
        self.complete(view, pending, outcome)
    }

    /// Render the human side of a submit.
    ///
    /// Returns `None` and leaves everything untouched when the input is blank.
    pub fn begin<V, I>(&self, view: &mut V, input: &mut I) -> Option<PendingReply>
    where
        V: ConversationView + ?Sized,
        I: InputField + ?Sized,
    {
        let raw = input.value().to_string();
        let query = raw.trim();
        if query.is_empty() {
            return None;
        }
        let query = query.to_string();

        view.append(Message::human(raw));
        input.clear();

        let placeholder = self
            .variant
            .shows_placeholder()
            .then(|| view.append(Message::ai(self.placeholder_text.clone())));

        view.scroll_to_bottom();
        tracing::info!(variant = self.variant.as_str(), chars = query.chars().count(), "sending query");

        Some(PendingReply { query, placeholder })
    }

    /// Render the reply (or failure) for a request started with [`ChatClient::begin`].
    pub fn complete<V>(
        &self,
        view: &mut V,
        pending: PendingReply,
        outcome: Result<Value, ServiceError>,
    ) -> SubmitOutcome
    where
        V: ConversationView + ?Sized,
    {
        if let Some(id) = pending.placeholder {
            if !view.remove(id) {
                tracing::debug!(?id, "placeholder already gone");
            }
        }

        let result = outcome.and_then(|value| self.render_reply(view, &value));
        let outcome = match result {
            Ok(ai_bubbles) => {
                tracing::info!(ai_bubbles, "reply rendered");
                SubmitOutcome::Rendered { ai_bubbles }
            }
            Err(err) if self.variant.reports_failures() => {
                tracing::error!(error = %err, "reply failed");
                view.append(Message::ai(FAILURE_TEXT));
                SubmitOutcome::Failed { reported: true }
            }
            Err(err) => {
                tracing::debug!(error = %err, variant = self.variant.as_str(), "reply failed, not shown");
                SubmitOutcome::Failed { reported: false }
            }
        };

        view.scroll_to_bottom();
        outcome
    }

    fn render_reply<V>(&self, view: &mut V, value: &Value) -> Result<usize, ServiceError>
    where
        V: ConversationView + ?Sized,
    {
        if self.variant.prepends_container() {
            view.append(Message::ai(""));
        }

        let payload = ReplyPayload::detect(value, self.variant.reply_shape())?;
        if payload == ReplyPayload::Unrecognized {
            tracing::debug!(variant = self.variant.as_str(), "reply has no recognized fields");
        }

        match payload.bubble_text() {
            Some(text) => {
                view.append(Message::ai(text));
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Role;
    use crate::view::TranscriptView;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replies with a fixed JSON value, or a decode error when `reply` is None
    struct FakeService {
        reply: Option<Value>,
        calls: AtomicUsize,
        last_query: Mutex<Option<String>>,
    }

    impl FakeService {
        fn replying(reply: Value) -> Self {
            Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }
        }
    }

    impl ReplyService for FakeService {
        async fn send(&self, query: &str) -> Result<Value, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.to_string());
            match &self.reply {
                Some(value) => Ok(value.clone()),
                None => Err(serde_json::from_str::<Value>("<html>").unwrap_err().into()),
            }
        }
    }

    fn texts(view: &TranscriptView) -> Vec<(Role, String)> {
        view.messages().map(|m| (m.role, m.text.clone())).collect()
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        for variant in Variant::all() {
            let client = ChatClient::new(variant);
            let service = FakeService::replying(json!({}));
            let mut view = TranscriptView::new();

            for blank in ["", "   ", "\t\n "] {
                let mut input = blank.to_string();
                let outcome = client.submit(&mut view, &mut input, &service).await;
                assert_eq!(outcome, SubmitOutcome::Ignored);
                assert_eq!(input, blank);
            }

            assert!(view.is_empty());
            assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_human_bubble_is_verbatim_and_input_cleared() {
        let client = ChatClient::new(Variant::Tapas);
        let service = FakeService::replying(json!({"tapas_answer": "X"}));
        let mut view = TranscriptView::new();
        let mut input = "  <i>how much?</i> ".to_string();

        client.submit(&mut view, &mut input, &service).await;

        assert!(input.is_empty());
        assert_eq!(view.count(Role::Human), 1);
        assert_eq!(view.messages().next().unwrap().text, "  <i>how much?</i> ");
        assert_eq!(service.last_query.lock().unwrap().as_deref(), Some("<i>how much?</i>"));
    }

    #[tokio::test]
    async fn test_tapas_reply() {
        let client = ChatClient::new(Variant::Tapas);
        let service = FakeService::replying(json!({"tapas_answer": "X"}));
        let mut view = TranscriptView::new();

        let outcome = client.submit(&mut view, &mut "q".to_string(), &service).await;

        assert_eq!(outcome, SubmitOutcome::Rendered { ai_bubbles: 1 });
        assert_eq!(
            texts(&view),
            vec![
                (Role::Human, "q".to_string()),
                (Role::Ai, "TAPAS: X<br>GPT-2: No answer".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_gemini_reply_replaces_placeholder() {
        let client = ChatClient::new(Variant::Gemini);
        let service = FakeService::replying(
            json!({"gemini_recommendations": [{"content": {"parts": [{"text": "**Hi**"}]}}]}),
        );
        let mut view = TranscriptView::new();

        let outcome = client.submit(&mut view, &mut "hello".to_string(), &service).await;

        assert_eq!(outcome, SubmitOutcome::Rendered { ai_bubbles: 1 });
        assert_eq!(
            texts(&view),
            vec![
                (Role::Human, "hello".to_string()),
                (Role::Ai, "<b>Hi</b>".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_luma_unrecognized_leaves_only_container() {
        let client = ChatClient::new(Variant::Luma);
        let service = FakeService::replying(json!({}));
        let mut view = TranscriptView::new();

        let outcome = client.submit(&mut view, &mut "hello".to_string(), &service).await;

        assert_eq!(outcome, SubmitOutcome::Rendered { ai_bubbles: 0 });
        assert_eq!(
            texts(&view),
            vec![(Role::Human, "hello".to_string()), (Role::Ai, String::new())]
        );
    }

    #[tokio::test]
    async fn test_luma_falsy_recommendations_show_no_failure() {
        let client = ChatClient::new(Variant::Luma);
        for raw in [json!(false), json!(""), json!(0)] {
            let service = FakeService::replying(json!({"gemini_recommendations": raw}));
            let mut view = TranscriptView::new();

            let outcome = client.submit(&mut view, &mut "q".to_string(), &service).await;

            assert_eq!(outcome, SubmitOutcome::Rendered { ai_bubbles: 0 });
            assert_eq!(
                texts(&view),
                vec![(Role::Human, "q".to_string()), (Role::Ai, String::new())]
            );
        }
    }

    #[tokio::test]
    async fn test_luma_numeric_part_text_renders() {
        let client = ChatClient::new(Variant::Luma);
        let service = FakeService::replying(
            json!({"gemini_recommendations": [{"content": {"parts": [{"text": 5}]}}]}),
        );
        let mut view = TranscriptView::new();

        let outcome = client.submit(&mut view, &mut "q".to_string(), &service).await;

        assert_eq!(outcome, SubmitOutcome::Rendered { ai_bubbles: 1 });
        assert_eq!(view.last().unwrap().text, "5");
    }

    #[tokio::test]
    async fn test_luma_failure_is_reported_once() {
        let client = ChatClient::new(Variant::Luma);
        let service = FakeService::failing();
        let mut view = TranscriptView::new();

        let outcome = client.submit(&mut view, &mut "hello".to_string(), &service).await;

        assert_eq!(outcome, SubmitOutcome::Failed { reported: true });
        assert_eq!(
            texts(&view),
            vec![
                (Role::Human, "hello".to_string()),
                (Role::Ai, FAILURE_TEXT.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_silent_failure_removes_placeholder() {
        let client = ChatClient::new(Variant::Gemini);
        let service = FakeService::failing();
        let mut view = TranscriptView::new();

        let outcome = client.submit(&mut view, &mut "hello".to_string(), &service).await;

        assert_eq!(outcome, SubmitOutcome::Failed { reported: false });
        assert_eq!(texts(&view), vec![(Role::Human, "hello".to_string())]);
    }

    #[test]
    fn test_interleaved_replies_remove_their_own_placeholder() {
        let client = ChatClient::new(Variant::Gemini).with_placeholder_text("...");
        let mut view = TranscriptView::new();

        let first = client.begin(&mut view, &mut "one".to_string()).unwrap();
        let second = client.begin(&mut view, &mut "two".to_string()).unwrap();
        assert_eq!(view.len(), 4);

        let reply = json!({"gemini_recommendations": [{"content": {"parts": [{"text": "for two"}]}}]});
        client.complete(&mut view, second, Ok(reply));

        assert_eq!(
            texts(&view),
            vec![
                (Role::Human, "one".to_string()),
                (Role::Ai, "...".to_string()),
                (Role::Human, "two".to_string()),
                (Role::Ai, "for two".to_string()),
            ]
        );

        client.complete(&mut view, first, Ok(json!({})));
        assert_eq!(view.count(Role::Ai), 1);
        assert_eq!(view.scroll_offset(), view.max_scroll_offset());
    }
}
