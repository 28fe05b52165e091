use ratatui::layout::Rect;
use tokio::sync::mpsc;
use luma_chat::markup;
use luma_chat::{
    BubbleId, ChatClient, ConversationView, HttpReplyService, InputField, Message,
    PendingReply, ReplyService, ServiceError, SubmitOutcome, TranscriptView,
};
use serde_json::Value;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line prompt with a character cursor
#[derive(Debug, Default)]
pub struct PromptInput {
    pub text: String,
    pub cursor: usize,
}

impl PromptInput {
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

impl InputField for PromptInput {
    fn value(&self) -> &str {
        &self.text
    }

    fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Conversation pane; scroll offsets are in wrapped terminal lines
#[derive(Debug, Default)]
pub struct ChatPane {
    transcript: TranscriptView,
    scroll: usize,
    // Inner size of the chat area, updated on every render
    pub width: u16,
    pub height: u16,
}

impl ChatPane {
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.transcript.messages()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn reset(&mut self) {
        self.transcript.reset();
        self.scroll = 0;
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = self.scroll.saturating_add_signed(delta);
        self.set_scroll_offset(target);
    }

    pub fn page(&self) -> usize {
        (self.visible_height() / 2).max(1)
    }

    fn wrap_width(&self) -> usize {
        // Default to 50 before the first render
        if self.width > 0 { self.width as usize } else { 50 }
    }

    fn visible_height(&self) -> usize {
        if self.height > 0 { self.height as usize } else { 20 }
    }

    /// Rendered height of the whole conversation
    fn total_lines(&self) -> usize {
        let wrap_width = self.wrap_width();
        let mut total_lines = 0;

        for msg in self.transcript.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in markup::parse(&msg.text) {
                let char_count: usize = line.iter().map(|s| s.text.chars().count()).sum();
                total_lines += char_count.div_ceil(wrap_width).max(1);
            }
            total_lines += 1; // Blank line after message
        }

        total_lines
    }
}

impl ConversationView for ChatPane {
    fn append(&mut self, message: Message) -> BubbleId {
        self.transcript.append(message)
    }

    fn remove(&mut self, id: BubbleId) -> bool {
        let removed = self.transcript.remove(id);
        self.scroll = self.scroll.min(self.max_scroll_offset());
        removed
    }

    fn scroll_offset(&self) -> usize {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll = offset.min(self.max_scroll_offset());
    }

    fn max_scroll_offset(&self) -> usize {
        self.total_lines().saturating_sub(self.visible_height())
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub pane: ChatPane,
    pub input: PromptInput,
    pub chat_area: Option<Rect>,

    // Requests in flight; overlapping sends are allowed
    pub pending: usize,
    pub animation_frame: u8,

    pub client: ChatClient,
    pub service: HttpReplyService,
    replies: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        client: ChatClient,
        service: HttpReplyService,
        replies: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            pane: ChatPane::default(),
            input: PromptInput::default(),
            chat_area: None,
            pending: 0,
            animation_frame: 0,
            client,
            service,
            replies,
        }
    }

    /// Render the typed message and send it in the background
    pub fn submit(&mut self) {
        let Some(pending) = self.client.begin(&mut self.pane, &mut self.input) else {
            return;
        };

        self.pending += 1;
        let service = self.service.clone();
        let replies = self.replies.clone();
        tokio::spawn(async move {
            let outcome = service.send(pending.query()).await;
            if replies.send(AppEvent::Reply(pending, outcome)).is_err() {
                tracing::debug!("reply arrived after shutdown");
            }
        });
    }

    pub fn on_reply(&mut self, pending: PendingReply, outcome: Result<Value, ServiceError>) {
        self.pending = self.pending.saturating_sub(1);
        match self.client.complete(&mut self.pane, pending, outcome) {
            SubmitOutcome::Failed { reported: false } => {
                tracing::warn!("reply failed and this variant shows nothing");
            }
            outcome => tracing::debug!(?outcome, "reply handled"),
        }
    }

    /// Clear the conversation; replies still in flight render into the fresh pane
    pub fn reset(&mut self) {
        self.pane.reset();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.pending > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_editing_is_utf8_safe() {
        let mut input = PromptInput::default();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.text, "hélo");
        input.home();
        input.delete();
        assert_eq!(input.text, "élo");
        input.end();
        input.insert('!');
        assert_eq!(input.text, "élo!");

        InputField::clear(&mut input);
        assert_eq!(input.cursor, 0);
        assert!(input.value().is_empty());
    }

    #[test]
    fn test_pane_scrolls_in_wrapped_lines() {
        let mut pane = ChatPane {
            width: 10,
            height: 4,
            ..ChatPane::default()
        };
        // 1 role line + 3 wrapped lines + 1 blank
        pane.append(Message::ai("x".repeat(25)));
        assert_eq!(pane.max_scroll_offset(), 1);

        // 1 role line + 2 lines + 1 blank
        pane.append(Message::human("a<br>b"));
        assert_eq!(pane.max_scroll_offset(), 5);

        pane.scroll_to_bottom();
        assert_eq!(pane.scroll_offset(), 5);
        pane.scroll_by(-10);
        assert_eq!(pane.scroll_offset(), 0);
    }

    #[test]
    fn test_exact_width_line_does_not_wrap_extra() {
        let mut pane = ChatPane {
            width: 10,
            height: 4,
            ..ChatPane::default()
        };
        // 1 role line + 2 wrapped lines + 1 blank
        pane.append(Message::ai("x".repeat(20)));
        assert_eq!(pane.max_scroll_offset(), 0);

        // empty bubble still takes one line
        pane.append(Message::ai(""));
        assert_eq!(pane.max_scroll_offset(), 3);
    }

    #[test]
    fn test_remove_clamps_scroll() {
        let mut pane = ChatPane {
            width: 10,
            height: 2,
            ..ChatPane::default()
        };
        pane.append(Message::human("q"));
        let placeholder = pane.append(Message::ai("thinking"));
        pane.scroll_to_bottom();
        assert_eq!(pane.scroll_offset(), 4);

        assert!(pane.remove(placeholder));
        assert_eq!(pane.scroll_offset(), 1);
    }
}
