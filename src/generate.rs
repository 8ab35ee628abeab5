//! Quiz generation from a free-text prompt. The bot has no model backend, so
//! the generator answers a prompt with catalog questions matching its words.

use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    ai_store::{AiWorkspace, ChatMessage},
    catalog::{quiz::Question, store::Catalog},
};

/// Upper bound on the questions in one generated quiz.
pub const GENERATED_QUIZ_LEN: usize = 5;

/// Shortest prompt word that takes part in matching.
const MIN_KEYWORD_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuiz {
    pub conversation_id: Uuid,
    pub message: String,
    pub topic: String,
    pub description: String,
    pub quizzes: Vec<Question>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Tell me what the quiz should be about, e.g. /generate rust ownership")]
    EmptyPrompt,
    #[error("I couldn't find any questions about '{0}'")]
    NothingFound(String),
}

pub(crate) trait GenerateQuiz {
    async fn generate_quiz(
        &self,
        conversation_id: Uuid,
        prompt: &str,
    ) -> Result<GeneratedQuiz, GenerationError>;
}

impl GenerateQuiz for Catalog {
    async fn generate_quiz(
        &self,
        conversation_id: Uuid,
        prompt: &str,
    ) -> Result<GeneratedQuiz, GenerationError> {
        let topic = prompt.trim();
        if topic.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let keywords = keywords(topic);
        let mut sources = BTreeSet::new();
        let quizzes: Vec<Question> = self
            .topics()
            .iter()
            .flat_map(|t| t.quizzes().iter().map(move |question| (t, question)))
            .filter(|(t, question)| {
                let haystack = format!("{} {} {}", t.title(), t.description(), question.text())
                    .to_lowercase();
                keywords.iter().any(|word| haystack.contains(word.as_str()))
            })
            .take(GENERATED_QUIZ_LEN)
            .map(|(t, question)| {
                sources.insert(t.title().to_owned());
                question.clone()
            })
            .collect();

        if quizzes.is_empty() {
            return Err(GenerationError::NothingFound(topic.to_owned()));
        }

        let count = quizzes.len();
        Ok(GeneratedQuiz {
            conversation_id,
            message: format!("Here is a quiz about {} with {} questions.", topic, count),
            topic: topic.to_owned(),
            description: format!(
                "{} questions from {}",
                count,
                sources.into_iter().collect::<Vec<_>>().join(", ")
            ),
            quizzes,
        })
    }
}

fn keywords(prompt: &str) -> Vec<String> {
    prompt
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Runs one generation for `prompt` under a fresh conversation id. The prompt
/// and the reply land in the chat history, and the result (or the failure)
/// in the quiz store.
pub(crate) async fn generate<G: GenerateQuiz>(
    generator: &G,
    workspace: &AiWorkspace,
    prompt: &str,
) -> Result<GeneratedQuiz, GenerationError> {
    let conversation_id = Uuid::new_v4();
    workspace
        .history
        .lock()
        .await
        .push(conversation_id, ChatMessage::user(prompt.trim(), vec![]));
    workspace.quizzes.lock().await.begin(conversation_id);

    let outcome = generator.generate_quiz(conversation_id, prompt).await;

    let reply = match &outcome {
        Ok(generated) => {
            workspace.quizzes.lock().await.complete(
                conversation_id,
                generated.topic.clone(),
                generated.description.clone(),
                generated.quizzes.clone(),
            );
            generated.message.clone()
        }
        Err(err) => {
            workspace.quizzes.lock().await.fail(conversation_id);
            err.to_string()
        }
    };
    workspace
        .history
        .lock()
        .await
        .push(conversation_id, ChatMessage::ai(reply));

    outcome
}
