//! Reply payloads returned by the endpoint
//!
//! The endpoint is not versioned; each deployment returns its own shape. The
//! payload is read as a [`serde_json::Value`] first and then narrowed to the
//! shape the active variant understands.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::format::{format_response, LINE_BREAK};
use crate::variant::ReplyShape;

pub const NO_ANSWER: &str = "No answer";

const RECOMMENDATIONS_KEY: &str = "gemini_recommendations";
const TAPAS_KEY: &str = "tapas_answer";
const GPT2_KEY: &str = "gpt2_answer";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateContent {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Part {
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: String,
}

// Missing or null text is "", other scalars are shown as JSON.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl Candidate {
    /// Part texts joined by line breaks
    pub fn joined_text(&self) -> String {
        self.content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join(LINE_BREAK)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    Recommendations(Vec<Candidate>),
    Answers {
        tapas: Option<String>,
        gpt2: Option<String>,
    },
    Unrecognized,
}

impl ReplyPayload {
    /// Narrow a decoded reply to the shape a variant understands.
    ///
    /// Fails only when a recognized field is present but malformed.
    pub fn detect(value: &Value, shape: ReplyShape) -> serde_json::Result<Self> {
        match shape {
            ReplyShape::Recommendations => match value.get(RECOMMENDATIONS_KEY) {
                None => Ok(ReplyPayload::Unrecognized),
                Some(raw) if is_falsy(raw) => Ok(ReplyPayload::Unrecognized),
                Some(raw) => {
                    let candidates = Vec::<Candidate>::deserialize(raw)?;
                    Ok(ReplyPayload::Recommendations(candidates))
                }
            },
            ReplyShape::Answers => {
                let tapas = value.get(TAPAS_KEY);
                let gpt2 = value.get(GPT2_KEY);
                if tapas.is_none() && gpt2.is_none() {
                    return Ok(ReplyPayload::Unrecognized);
                }
                Ok(ReplyPayload::Answers {
                    tapas: tapas.and_then(answer_text),
                    gpt2: gpt2.and_then(answer_text),
                })
            }
        }
    }

    /// Markup for the ai bubble this payload renders, if any
    pub fn bubble_text(&self) -> Option<String> {
        match self {
            ReplyPayload::Recommendations(candidates) if candidates.is_empty() => None,
            ReplyPayload::Recommendations(candidates) => {
                let combined = candidates
                    .iter()
                    .map(Candidate::joined_text)
                    .collect::<Vec<_>>()
                    .join(LINE_BREAK);
                Some(format_response(&combined))
            }
            ReplyPayload::Answers { tapas, gpt2 } => Some(format!(
                "TAPAS: {}{}GPT-2: {}",
                tapas.as_deref().unwrap_or(NO_ANSWER),
                LINE_BREAK,
                gpt2.as_deref().unwrap_or(NO_ANSWER),
            )),
            ReplyPayload::Unrecognized => None,
        }
    }
}

// null, false, "" and 0 mean "no recommendations", not a malformed reply.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// null and "" count as missing; other scalars are shown as JSON.
fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tapas_only() {
        let payload = ReplyPayload::detect(&json!({"tapas_answer": "X"}), ReplyShape::Answers).unwrap();
        let text = payload.bubble_text().unwrap();
        assert!(text.contains("TAPAS: X"));
        assert!(text.contains("GPT-2: No answer"));
    }

    #[test]
    fn test_null_answers_still_render() {
        let payload = ReplyPayload::detect(
            &json!({"tapas_answer": null, "gpt2_answer": ""}),
            ReplyShape::Answers,
        )
        .unwrap();
        assert_eq!(
            payload.bubble_text().unwrap(),
            "TAPAS: No answer<br>GPT-2: No answer"
        );
    }

    #[test]
    fn test_numeric_answer_is_stringified() {
        let payload = ReplyPayload::detect(
            &json!({"tapas_answer": 42.5, "gpt2_answer": "Use less"}),
            ReplyShape::Answers,
        )
        .unwrap();
        assert_eq!(payload.bubble_text().unwrap(), "TAPAS: 42.5<br>GPT-2: Use less");
    }

    #[test]
    fn test_single_candidate_is_formatted() {
        let value = json!({"gemini_recommendations": [{"content": {"parts": [{"text": "**Hi**"}]}}]});
        let payload = ReplyPayload::detect(&value, ReplyShape::Recommendations).unwrap();
        assert_eq!(payload.bubble_text().as_deref(), Some("<b>Hi</b>"));
    }

    #[test]
    fn test_candidates_and_parts_join_with_breaks() {
        let value = json!({"gemini_recommendations": [
            {"content": {"parts": [{"text": "a"}, {"text": "b\n* c"}]}},
            {"content": {"parts": [{}, {"text": "d"}]}}
        ]});
        let payload = ReplyPayload::detect(&value, ReplyShape::Recommendations).unwrap();
        assert_eq!(payload.bubble_text().unwrap(), "a<br>b<br>* c<br><br>d");
    }

    #[test]
    fn test_empty_recommendations_render_nothing() {
        let value = json!({"gemini_recommendations": []});
        let payload = ReplyPayload::detect(&value, ReplyShape::Recommendations).unwrap();
        assert_eq!(payload, ReplyPayload::Recommendations(vec![]));
        assert_eq!(payload.bubble_text(), None);
    }

    #[test]
    fn test_falsy_recommendations_are_unrecognized() {
        for raw in [json!(null), json!(false), json!(""), json!(0), json!(0.0)] {
            let value = json!({"gemini_recommendations": raw});
            let payload = ReplyPayload::detect(&value, ReplyShape::Recommendations).unwrap();
            assert_eq!(payload, ReplyPayload::Unrecognized);
            assert_eq!(payload.bubble_text(), None);
        }
    }

    #[test]
    fn test_non_string_part_text_is_stringified() {
        let value = json!({"gemini_recommendations": [
            {"content": {"parts": [{"text": 5}, {"text": null}, {"text": true}]}}
        ]});
        let payload = ReplyPayload::detect(&value, ReplyShape::Recommendations).unwrap();
        assert_eq!(payload.bubble_text().unwrap(), "5<br><br>true");
    }

    #[test]
    fn test_truthy_non_array_is_an_error() {
        let value = json!({"gemini_recommendations": "some text"});
        assert!(ReplyPayload::detect(&value, ReplyShape::Recommendations).is_err());
    }

    #[test]
    fn test_malformed_candidate_is_an_error() {
        let value = json!({"gemini_recommendations": [{"parts": []}]});
        assert!(ReplyPayload::detect(&value, ReplyShape::Recommendations).is_err());
    }

    #[test]
    fn test_unrecognized_shapes() {
        for value in [json!({}), json!([1, 2]), json!("text"), json!({"answer": "x"})] {
            for shape in [ReplyShape::Answers, ReplyShape::Recommendations] {
                let payload = ReplyPayload::detect(&value, shape).unwrap();
                assert_eq!(payload, ReplyPayload::Unrecognized);
                assert_eq!(payload.bubble_text(), None);
            }
        }
    }

    #[test]
    fn test_shape_selects_fields() {
        let value = json!({"tapas_answer": "X", "gemini_recommendations": null});
        assert_eq!(
            ReplyPayload::detect(&value, ReplyShape::Recommendations).unwrap(),
            ReplyPayload::Unrecognized
        );
        assert!(matches!(
            ReplyPayload::detect(&value, ReplyShape::Answers).unwrap(),
            ReplyPayload::Answers { .. }
        ));
    }
}
