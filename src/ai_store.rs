//! Client-side bookkeeping for AI-generated quizzes and the prompts that
//! produced them. Both stores are plain owned values; whoever needs one gets
//! it passed in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::quiz::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiQuizData {
    pub conversation_id: Uuid,
    pub status: GenerationStatus,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub quizzes: Vec<Question>,
}

impl AiQuizData {
    pub fn pending(conversation_id: Uuid) -> Self {
        Self {
            conversation_id,
            status: GenerationStatus::Pending,
            topic: None,
            description: None,
            quizzes: vec![],
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AiQuizStore {
    entries: Vec<AiQuizData>,
}

impl AiQuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conversation_id: &Uuid) -> Option<&AiQuizData> {
        self.entries
            .iter()
            .find(|entry| entry.conversation_id == *conversation_id)
    }

    /// Replaces the entry for the same conversation, or appends a new one.
    pub fn upsert(&mut self, data: AiQuizData) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.conversation_id == data.conversation_id)
        {
            Some(existing) => *existing = data,
            None => self.entries.push(data),
        }
    }

    pub fn begin(&mut self, conversation_id: Uuid) {
        tracing::debug!(%conversation_id, "ai quiz generation pending");
        self.upsert(AiQuizData::pending(conversation_id));
    }

    pub fn complete(
        &mut self,
        conversation_id: Uuid,
        topic: impl Into<String>,
        description: impl Into<String>,
        quizzes: Vec<Question>,
    ) {
        tracing::debug!(%conversation_id, quizzes = quizzes.len(), "ai quiz generation finished");
        self.upsert(AiQuizData {
            conversation_id,
            status: GenerationStatus::Success,
            topic: Some(topic.into()),
            description: Some(description.into()),
            quizzes,
        });
    }

    /// Marks a generation as failed. Quizzes from an earlier success are kept.
    pub fn fail(&mut self, conversation_id: Uuid) {
        tracing::warn!(%conversation_id, "ai quiz generation failed");
        let mut data = self
            .get(&conversation_id)
            .cloned()
            .unwrap_or_else(|| AiQuizData::pending(conversation_id));
        data.status = GenerationStatus::Error;
        self.upsert(data);
    }

    pub fn remove(&mut self, conversation_id: &Uuid) {
        self.entries
            .retain(|entry| entry.conversation_id != *conversation_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &AiQuizData> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ai,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, attachments: Vec<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            attachments,
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            text: text.into(),
            attachments: vec![],
        }
    }
}

/// Prompt/response history per generation conversation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    conversations: HashMap<Uuid, Vec<ChatMessage>>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self, conversation_id: &Uuid) -> &[ChatMessage] {
        self.conversations
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push(&mut self, conversation_id: Uuid, message: ChatMessage) {
        self.conversations
            .entry(conversation_id)
            .or_default()
            .push(message);
    }

    pub fn remove(&mut self, conversation_id: &Uuid) {
        self.conversations.remove(conversation_id);
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
    }
}

/// Generated quizzes and the conversations behind them, shared by the bot's
/// handlers. Lock one store at a time.
#[derive(Debug, Default)]
pub struct AiWorkspace {
    pub quizzes: Mutex<AiQuizStore>,
    pub history: Mutex<ChatHistory>,
}

impl AiWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topic of a successful generation, for listing its results.
    pub async fn topic(&self, conversation_id: &Uuid) -> Option<String> {
        self.quizzes
            .lock()
            .await
            .get(conversation_id)
            .and_then(|data| data.topic.clone())
    }
}
