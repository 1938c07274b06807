use crate::types::ApiMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub streaming: bool,
}

/// Ordered message log. Insertion order is display order and at most one
/// message is streaming at a time.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: String) {
        self.messages.push(Message {
            role: Role::User,
            content,
            streaming: false,
        });
    }

    /// Opens an empty assistant message that receives deltas. Returns `false`
    /// without touching the log if another message is still streaming.
    pub fn open_assistant(&mut self) -> bool {
        if self.streaming_index().is_some() {
            return false;
        }
        self.messages.push(Message {
            role: Role::Assistant,
            content: String::new(),
            streaming: true,
        });
        true
    }

    pub fn append_to_streaming(&mut self, text: &str) -> bool {
        match self.streaming_message_mut() {
            Some(message) => {
                message.content.push_str(text);
                true
            }
            None => false,
        }
    }

    pub fn finish_streaming(&mut self) -> bool {
        match self.streaming_message_mut() {
            Some(message) => {
                message.streaming = false;
                true
            }
            None => false,
        }
    }

    pub fn streaming_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|message| message.streaming)
    }

    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|message| message.streaming).count()
    }

    /// Conversation history for the next request.
    ///
    /// Streaming and empty messages are skipped, and adjacent messages with the
    /// same role are merged so the roles keep alternating after a failed turn.
    pub fn to_api_messages(&self) -> Vec<ApiMessage> {
        let mut out: Vec<ApiMessage> = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            if message.streaming || message.content.trim().is_empty() {
                continue;
            }
            let role = message.role.as_str();
            match out.last_mut() {
                Some(previous) if previous.role == role => {
                    previous.content.push_str("\n\n");
                    previous.content.push_str(&message.content);
                }
                _ => out.push(ApiMessage::new(role, message.content.clone())),
            }
        }
        out
    }

    fn streaming_message_mut(&mut self) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|message| message.streaming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_assistant_refuses_second_streaming_message() {
        let mut transcript = Transcript::new();
        transcript.push_user("a".to_string());
        assert!(transcript.open_assistant());
        assert!(!transcript.open_assistant());
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.streaming_count(), 1);
    }

    #[test]
    fn test_append_requires_streaming_message() {
        let mut transcript = Transcript::new();
        transcript.push_user("a".to_string());
        assert!(!transcript.append_to_streaming("x"));
        assert_eq!(transcript.messages()[0].content, "a");
    }

    #[test]
    fn test_finish_freezes_content() {
        let mut transcript = Transcript::new();
        transcript.open_assistant();
        transcript.append_to_streaming("Hi");
        assert!(transcript.finish_streaming());
        assert!(!transcript.append_to_streaming(" more"));
        assert_eq!(transcript.messages()[0].content, "Hi");
        assert_eq!(transcript.streaming_index(), None);
    }

    #[test]
    fn test_api_history_skips_placeholder_and_merges_roles() {
        let mut transcript = Transcript::new();
        transcript.push_user("ping".to_string());
        transcript.open_assistant();
        transcript.finish_streaming();
        transcript.push_user("retry".to_string());
        transcript.open_assistant();

        let history = transcript.to_api_messages();
        assert_eq!(history, vec![ApiMessage::new("user", "ping\n\nretry")]);
    }

    #[test]
    fn test_api_history_keeps_order() {
        let mut transcript = Transcript::new();
        transcript.push_user("hello".to_string());
        transcript.open_assistant();
        transcript.append_to_streaming("Hi there");
        transcript.finish_streaming();
        transcript.push_user("how are you".to_string());

        let roles: Vec<_> = transcript
            .to_api_messages()
            .into_iter()
            .map(|message| message.role)
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }
}
