use serde::{Deserialize, Serialize};

/// Deployment profile of the chat client.
///
/// All three talk to the same endpoint and differ only in which reply shape
/// they understand and how they dress up the wait and the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// `tapas_answer` / `gpt2_answer` replies, no placeholder, silent failures
    Tapas,
    /// `gemini_recommendations` replies with a placeholder, silent failures
    Gemini,
    /// Gemini replies with placeholder, empty container and a failure bubble
    #[default]
    Luma,
}

/// Which reply fields a variant looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    Answers,
    Recommendations,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Tapas => "tapas",
            Variant::Gemini => "gemini",
            Variant::Luma => "luma",
        }
    }

    pub fn all() -> Vec<Variant> {
        vec![Variant::Tapas, Variant::Gemini, Variant::Luma]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Variant::Tapas => "TAPAS + GPT-2",
            Variant::Gemini => "Gemini",
            Variant::Luma => "Luma (Gemini)",
        }
    }

    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Variant::Tapas => ReplyShape::Answers,
            Variant::Gemini | Variant::Luma => ReplyShape::Recommendations,
        }
    }

    pub fn shows_placeholder(&self) -> bool {
        matches!(self, Variant::Gemini | Variant::Luma)
    }

    /// Append an empty ai bubble before dispatching the reply
    pub fn prepends_container(&self) -> bool {
        matches!(self, Variant::Luma)
    }

    pub fn reports_failures(&self) -> bool {
        matches!(self, Variant::Luma)
    }
}
