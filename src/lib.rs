pub mod client;
pub mod config;
pub mod format;
pub mod markup;
pub mod reply;
pub mod service;
pub mod state;
pub mod variant;
pub mod view;

// Re-export main types for convenience
pub use client::{ChatClient, PendingReply, SubmitOutcome, DEFAULT_PLACEHOLDER, FAILURE_TEXT};
pub use config::Config;
pub use format::format_response;
pub use reply::{Candidate, ReplyPayload};
pub use service::{HttpReplyService, ReplyService, ServiceError};
pub use state::{Message, Role};
pub use variant::Variant;
pub use view::{BubbleId, ConversationView, InputField, TranscriptView};
