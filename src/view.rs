//! Conversation view and input contracts
//!
//! The client never touches a concrete widget. It appends and removes bubbles
//! through [`ConversationView`] and reads the typed message through
//! [`InputField`], so the terminal pane, the `ask` transcript and test doubles
//! are interchangeable.

use crate::state::{Message, Role};

/// Handle to a bubble previously appended to a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BubbleId(pub u64);

pub trait ConversationView {
    /// Append a bubble at the end of the conversation.
    fn append(&mut self, message: Message) -> BubbleId;

    /// Remove a previously appended bubble. Returns false if it was already gone.
    fn remove(&mut self, id: BubbleId) -> bool;

    fn scroll_offset(&self) -> usize;

    fn set_scroll_offset(&mut self, offset: usize);

    /// Largest offset that still shows content, i.e. the bottom of the view.
    fn max_scroll_offset(&self) -> usize;

    fn scroll_to_bottom(&mut self) {
        let bottom = self.max_scroll_offset();
        self.set_scroll_offset(bottom);
    }
}

/// A single text field that is read and then cleared on submit
pub trait InputField {
    fn value(&self) -> &str;
    fn clear(&mut self);
}

impl InputField for String {
    fn value(&self) -> &str {
        self.as_str()
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

/// In-memory conversation, one scroll unit per bubble
#[derive(Debug, Default)]
pub struct TranscriptView {
    bubbles: Vec<(BubbleId, Message)>,
    next_id: u64,
    scroll: usize,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.bubbles.iter().map(|(_, message)| message)
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn count(&self, role: Role) -> usize {
        self.messages().filter(|m| m.role == role).count()
    }

    pub fn last(&self) -> Option<&Message> {
        self.bubbles.last().map(|(_, message)| message)
    }

    /// Drop every bubble. Ids keep increasing so stale handles stay invalid.
    pub fn reset(&mut self) {
        self.bubbles.clear();
        self.scroll = 0;
    }
}

impl ConversationView for TranscriptView {
    fn append(&mut self, message: Message) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        self.bubbles.push((id, message));
        id
    }

    fn remove(&mut self, id: BubbleId) -> bool {
        match self.bubbles.iter().position(|(bubble, _)| *bubble == id) {
            Some(idx) => {
                self.bubbles.remove(idx);
                self.scroll = self.scroll.min(self.max_scroll_offset());
                true
            }
            None => false,
        }
    }

    fn scroll_offset(&self) -> usize {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll = offset.min(self.max_scroll_offset());
    }

    fn max_scroll_offset(&self) -> usize {
        self.bubbles.len().saturating_sub(1)
    }
}
