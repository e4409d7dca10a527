//! LLM API types
//!
//! The canonical request/response shape follows the Anthropic Messages API;
//! OpenAI-compatible chat completions are converted to and from it.

use serde::{Deserialize, Serialize};

/// Message in conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: Vec<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![MessageContent::Text { text: text.into() }],
        }
    }

    /// Get text content from message
    pub fn text_content(&self) -> String {
        join_text(&self.content)
    }
}

/// Content block in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
}

fn join_text(content: &[MessageContent]) -> String {
    content
        .iter()
        .map(|c| match c {
            MessageContent::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Messages API request
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

/// Messages API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub response_type: String,
    #[serde(default)]
    pub role: String,
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// All text blocks joined with newlines
    pub fn text(&self) -> String {
        join_text(&self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// ============================================================================
// OpenAI-compatible format
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: String,
}

impl OpenAiMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: text.into(),
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.text_content(),
        }
    }
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
}

impl ChatCompletionRequest {
    /// Convert from a Messages API request
    pub fn from_messages_request(req: &MessagesRequest) -> Self {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);

        if let Some(system) = &req.system {
            messages.push(OpenAiMessage::system(system));
        }
        messages.extend(req.messages.iter().map(OpenAiMessage::from));

        Self {
            model: req.model.clone(),
            messages,
            max_tokens: Some(req.max_tokens),
        }
    }
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessageResponse,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ChatCompletionResponse {
    /// Convert to a Messages API response
    pub fn into_messages_response(self) -> MessagesResponse {
        let choice = self.choices.into_iter().next();

        let (content, stop_reason) = match choice {
            Some(c) => {
                let content = c
                    .message
                    .content
                    .filter(|text| !text.is_empty())
                    .map(|text| vec![MessageContent::Text { text }])
                    .unwrap_or_default();
                let stop_reason = c.finish_reason.map(|reason| match reason.as_str() {
                    "stop" => "end_turn".to_string(),
                    _ => reason,
                });
                (content, stop_reason)
            }
            None => (Vec::new(), None),
        };

        MessagesResponse {
            id: self.id,
            response_type: "message".to_string(),
            role: "assistant".to_string(),
            content,
            model: self.model,
            stop_reason,
            stop_sequence: None,
            usage: self.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        }
    }
}

/// Builder for creating messages requests
pub struct MessagesRequestBuilder {
    model: String,
    max_tokens: u64,
    system: Option<String>,
    messages: Vec<Message>,
}

impl MessagesRequestBuilder {
    pub fn new(model: String) -> Self {
        Self {
            model,
            max_tokens: 1024,
            system: None,
            messages: vec![],
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn user(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::user(text));
        self
    }

    pub fn build(self) -> MessagesRequest {
        MessagesRequest {
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
            messages: self.messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_single_turn() {
        let request = MessagesRequestBuilder::new("gpt-4".to_string())
            .max_tokens(256)
            .user("Hello")
            .build();

        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.max_tokens, 256);
        assert!(request.system.is_none());
        assert_eq!(request.messages, vec![Message::user("Hello")]);
    }

    #[test]
    fn test_chat_completion_request_places_system_first() {
        let request = MessagesRequestBuilder::new("gpt-4".to_string())
            .system("Be brief.")
            .user("Hi")
            .build();

        let openai = ChatCompletionRequest::from_messages_request(&request);
        assert_eq!(openai.messages.len(), 2);
        assert_eq!(openai.messages[0].role, "system");
        assert_eq!(openai.messages[1].role, "user");
        assert_eq!(openai.messages[1].content, "Hi");

        let json = serde_json::to_value(&openai).unwrap();
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn test_chat_completion_response_conversion() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Fine, thanks."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let converted = response.into_messages_response();
        assert_eq!(converted.text(), "Fine, thanks.");
        assert_eq!(converted.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(converted.usage.unwrap().output_tokens, 3);
    }

    #[test]
    fn test_chat_completion_null_content_has_no_text() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null},
                       "finish_reason": "content_filter"}]}"#;

        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let converted = response.into_messages_response();
        assert!(converted.content.is_empty());
        assert_eq!(converted.text(), "");
        assert_eq!(converted.stop_reason.as_deref(), Some("content_filter"));
    }

    #[test]
    fn test_messages_response_parsing() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hello!"}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 4, "output_tokens": 2}
        }"#;

        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), "Hello!");
    }
}
