//! The completion client boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use buddy_core::{Role, Turn};

use crate::error::LlmError;

/// Anything that can turn a prompt plus conversation history into text.
///
/// Implementations own transport, credentials, timeouts and retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

/// Role of a message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        }
    }
}

/// One completion call: optional system prompt, ordered history, new message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    /// Prior conversation, oldest first.
    pub history: Vec<ChatMessage>,
    pub message: String,
    /// When set, the model is asked for JSON matching this schema.
    pub output_schema: Option<JsonValue>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Use the given turns, in order, as conversation context.
    #[must_use]
    pub fn with_history(mut self, turns: &[Turn]) -> Self {
        self.history = turns.iter().map(ChatMessage::from).collect();
        self
    }

    #[must_use]
    pub fn with_output_schema(mut self, schema: JsonValue) -> Self {
        self.output_schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Flatten into the message list sent on the wire.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(self.message.clone()));
        messages
    }
}

/// Model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Parsed JSON, present when the request carried an output schema.
    pub structured: Option<JsonValue>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    pub fn structured(value: JsonValue) -> Self {
        Self {
            text: value.to_string(),
            structured: Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_conversion() {
        let user = ChatMessage::from(&Turn::user("hi"));
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.content, "hi");

        let assistant = ChatMessage::from(&Turn::assistant("hello"));
        assert_eq!(assistant.role, MessageRole::Assistant);
    }

    #[test]
    fn test_to_messages_order() {
        let turns = vec![Turn::user("first"), Turn::assistant("second")];
        let request = CompletionRequest::new("third")
            .with_system("be helpful")
            .with_history(&turns);

        let messages = request.to_messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("be helpful"));
        assert_eq!(messages[1].content, "first");
        assert_eq!(messages[2].content, "second");
        assert_eq!(messages[3], ChatMessage::user("third"));
    }

    #[test]
    fn test_to_messages_without_system() {
        let messages = CompletionRequest::new("only").to_messages();
        assert_eq!(messages, vec![ChatMessage::user("only")]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("x")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_structured_completion_keeps_text() {
        let completion = Completion::structured(serde_json::json!({"intent": "general_chat"}));
        assert!(completion.text.contains("general_chat"));
        assert!(completion.structured.is_some());
    }
}
