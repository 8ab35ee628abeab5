use thiserror::Error;
use uuid::Uuid;

use crate::{
    ai_store::{AiQuizStore, GenerationStatus},
    catalog::{
        quiz::Question,
        store::{CatalogError, RetrieveQuestions},
    },
};

/// Where a quiz's questions come from. Resolved once, before a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSource {
    Database { topic_id: Uuid },
    AiGenerated { conversation_id: Uuid },
}

#[derive(Debug, Error, PartialEq)]
pub enum SourceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("no generated quiz for conversation {0}")]
    UnknownConversation(Uuid),
    #[error("quiz generation for conversation {0} has not succeeded")]
    NotReady(Uuid),
    #[error("the quiz has no questions")]
    NoQuestions,
}

impl QuizSource {
    /// Key the finished session's analysis is stored under.
    pub fn key(&self) -> Uuid {
        match self {
            QuizSource::Database { topic_id } => *topic_id,
            QuizSource::AiGenerated { conversation_id } => *conversation_id,
        }
    }

    pub(crate) async fn resolve<R: RetrieveQuestions>(
        &self,
        catalog: &R,
        ai_quizzes: &AiQuizStore,
    ) -> Result<Vec<Question>, SourceError> {
        let questions = match self {
            QuizSource::Database { topic_id } => catalog.retrieve_questions(topic_id).await?,
            QuizSource::AiGenerated { conversation_id } => {
                let data = ai_quizzes
                    .get(conversation_id)
                    .ok_or(SourceError::UnknownConversation(*conversation_id))?;
                if data.status != GenerationStatus::Success {
                    return Err(SourceError::NotReady(*conversation_id));
                }
                data.quizzes.clone()
            }
        };

        if questions.is_empty() {
            return Err(SourceError::NoQuestions);
        }
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        quiz::{Answer, QuestionKind},
        store::Catalog,
    };

    fn quiz() -> Question {
        Question::new(
            "q",
            QuestionKind::Single,
            vec![
                Answer::new("a", true),
                Answer::new("b", false),
                Answer::new("c", false),
                Answer::new("d", false),
            ],
        )
    }

    #[tokio::test]
    async fn resolves_database_topic() {
        let mut catalog = Catalog::new();
        let topic = catalog.create_topic("Rust", "Ownership").unwrap();
        let source = QuizSource::Database { topic_id: topic };

        assert_eq!(
            source.resolve(&catalog, &AiQuizStore::new()).await,
            Err(SourceError::NoQuestions)
        );

        catalog.create_quizzes(&topic, vec![quiz()]).unwrap();
        let questions = source.resolve(&catalog, &AiQuizStore::new()).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(source.key(), topic);
    }

    #[tokio::test]
    async fn resolves_ai_generated_quiz() {
        let catalog = Catalog::new();
        let mut store = AiQuizStore::new();
        let conversation_id = Uuid::new_v4();
        let source = QuizSource::AiGenerated { conversation_id };

        assert_eq!(
            source.resolve(&catalog, &store).await,
            Err(SourceError::UnknownConversation(conversation_id))
        );

        store.begin(conversation_id);
        assert_eq!(
            source.resolve(&catalog, &store).await,
            Err(SourceError::NotReady(conversation_id))
        );

        store.complete(conversation_id, "Rust", "Lifetimes", vec![quiz(), quiz()]);
        assert_eq!(source.resolve(&catalog, &store).await.unwrap().len(), 2);
    }
}
