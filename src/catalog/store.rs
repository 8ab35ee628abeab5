use thiserror::Error;
use uuid::Uuid;

use super::quiz::{Question, Topic};

/// Options every authored question carries.
pub const AUTHORED_ANSWER_COUNT: usize = 4;

const TITLE_LEN: std::ops::RangeInclusive<usize> = 2..=40;
const DESCRIPTION_LEN: std::ops::RangeInclusive<usize> = 2..=200;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Title must be between 2 and 40 characters")]
    InvalidTitle,
    #[error("Description must be between 2 and 200 characters")]
    InvalidDescription,
    #[error("A topic titled '{0}' already exists")]
    DuplicateTitle(String),
    #[error("Topic {0} not found")]
    TopicNotFound(Uuid),
    #[error("Question {0} not found")]
    QuestionNotFound(Uuid),
    #[error("At least one question is required")]
    NoQuestions,
    #[error("{}", blank_fields_message(.0))]
    BlankFields(Vec<usize>),
    #[error("Failed to parse question bank: {0}")]
    Parse(String),
}

fn blank_fields_message(indices: &[usize]) -> String {
    match indices {
        [single] => format!("Question {} has blank fields.", single),
        many => {
            let joined = many
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("Questions {} have blank fields.", joined)
        }
    }
}

type CatalogResult<T> = Result<T, CatalogError>;

pub(crate) trait RetrieveTopic {
    async fn retrieve_topic(&self, title: &str) -> CatalogResult<Option<Topic>>;

    async fn retrieve_all_topic_titles(&self) -> CatalogResult<Vec<String>>;
}

pub(crate) trait RetrieveQuestions {
    async fn retrieve_questions(&self, topic_id: &Uuid) -> CatalogResult<Vec<Question>>;
}

/// In-process topic and quiz catalog.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    topics: Vec<Topic>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a question bank: a JSON array of topics with their quizzes.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let topics: Vec<Topic> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        tracing::debug!(topics = topics.len(), "question bank parsed");
        Ok(Self { topics })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, id: &Uuid) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.id() == id)
    }

    pub fn quizzes_count(&self) -> usize {
        self.topics.iter().map(|topic| topic.quizzes().len()).sum()
    }

    pub fn create_topic(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> CatalogResult<Uuid> {
        let (title, description) = validate_topic_fields(title.into(), description.into())?;
        if self.topics.iter().any(|topic| topic.title() == title) {
            return Err(CatalogError::DuplicateTitle(title));
        }

        let topic = Topic::new(title, description);
        let id = *topic.id();
        tracing::info!(%id, title = topic.title(), "topic created");
        self.topics.push(topic);
        Ok(id)
    }

    pub fn update_topic(
        &mut self,
        id: &Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> CatalogResult<()> {
        let (title, description) = validate_topic_fields(title.into(), description.into())?;
        if self
            .topics
            .iter()
            .any(|topic| topic.title() == title && topic.id() != id)
        {
            return Err(CatalogError::DuplicateTitle(title));
        }

        let topic = self.topic_mut(id)?;
        topic.set_title(title);
        topic.set_description(description);
        tracing::info!(%id, "topic updated");
        Ok(())
    }

    pub fn delete_topic(&mut self, id: &Uuid) -> CatalogResult<Topic> {
        let idx = self
            .topics
            .iter()
            .position(|topic| topic.id() == id)
            .ok_or(CatalogError::TopicNotFound(*id))?;
        tracing::info!(%id, "topic deleted");
        Ok(self.topics.remove(idx))
    }

    /// Appends authored questions to a topic. Either all are accepted or none.
    pub fn create_quizzes(&mut self, topic_id: &Uuid, questions: Vec<Question>) -> CatalogResult<usize> {
        validate_authored(&questions)?;
        let topic = self.topic_mut(topic_id)?;
        let added = questions.len();
        topic.quizzes_mut().extend(questions);
        tracing::info!(%topic_id, added, "quizzes created");
        Ok(added)
    }

    pub fn update_quiz(&mut self, topic_id: &Uuid, question: Question) -> CatalogResult<()> {
        validate_authored(std::slice::from_ref(&question))?;
        let topic = self.topic_mut(topic_id)?;
        let slot = topic
            .quizzes_mut()
            .iter_mut()
            .find(|existing| existing.id() == question.id())
            .ok_or(CatalogError::QuestionNotFound(*question.id()))?;
        *slot = question;
        Ok(())
    }

    pub fn delete_quiz(&mut self, topic_id: &Uuid, question_id: &Uuid) -> CatalogResult<Question> {
        let quizzes = self.topic_mut(topic_id)?.quizzes_mut();
        let idx = quizzes
            .iter()
            .position(|question| question.id() == question_id)
            .ok_or(CatalogError::QuestionNotFound(*question_id))?;
        Ok(quizzes.remove(idx))
    }

    fn topic_mut(&mut self, id: &Uuid) -> CatalogResult<&mut Topic> {
        self.topics
            .iter_mut()
            .find(|topic| topic.id() == id)
            .ok_or(CatalogError::TopicNotFound(*id))
    }
}

impl RetrieveTopic for Catalog {
    async fn retrieve_topic(&self, title: &str) -> CatalogResult<Option<Topic>> {
        Ok(self.topics.iter().find(|topic| topic.title() == title).cloned())
    }

    async fn retrieve_all_topic_titles(&self) -> CatalogResult<Vec<String>> {
        Ok(self.topics.iter().map(|topic| topic.title().to_owned()).collect())
    }
}

impl RetrieveQuestions for Catalog {
    async fn retrieve_questions(&self, topic_id: &Uuid) -> CatalogResult<Vec<Question>> {
        self.topic(topic_id)
            .map(|topic| topic.quizzes().to_vec())
            .ok_or(CatalogError::TopicNotFound(*topic_id))
    }
}

fn validate_topic_fields(title: String, description: String) -> CatalogResult<(String, String)> {
    let title = title.trim().to_owned();
    let description = description.trim().to_owned();

    if !TITLE_LEN.contains(&title.chars().count()) {
        return Err(CatalogError::InvalidTitle);
    }
    if !DESCRIPTION_LEN.contains(&description.chars().count()) {
        return Err(CatalogError::InvalidDescription);
    }
    Ok((title, description))
}

fn validate_authored(questions: &[Question]) -> CatalogResult<()> {
    if questions.is_empty() {
        return Err(CatalogError::NoQuestions);
    }

    let blank: Vec<usize> = questions
        .iter()
        .enumerate()
        .filter(|(_, question)| !is_authored_complete(question))
        .map(|(i, _)| i + 1)
        .collect();

    if blank.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::BlankFields(blank))
    }
}

fn is_authored_complete(question: &Question) -> bool {
    let answers_filled = question.answers().len() == AUTHORED_ANSWER_COUNT
        && question.answers().iter().all(|a| !a.text().trim().is_empty());

    !question.text().trim().is_empty() && answers_filled && question.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::quiz::{Answer, QuestionKind};

    fn authored(text: &str) -> Question {
        Question::new(
            text,
            QuestionKind::Single,
            vec![
                Answer::new("a", true),
                Answer::new("b", false),
                Answer::new("c", false),
                Answer::new("d", false),
            ],
        )
    }

    #[test]
    fn topic_title_length_is_checked() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.create_topic(" x ", "A valid description"),
            Err(CatalogError::InvalidTitle)
        );
        assert_eq!(
            catalog.create_topic("Rust", "x"),
            Err(CatalogError::InvalidDescription)
        );
        assert!(catalog.create_topic("Rust", "Ownership and borrowing").is_ok());
        assert_eq!(
            catalog.create_topic("Rust", "Again"),
            Err(CatalogError::DuplicateTitle("Rust".into()))
        );
    }

    #[test]
    fn blank_questions_are_reported_by_index() {
        let mut catalog = Catalog::new();
        let topic = catalog.create_topic("Rust", "Ownership and borrowing").unwrap();

        let three_answers = Question::new(
            "Too few",
            QuestionKind::Single,
            vec![Answer::new("a", true), Answer::new("b", false), Answer::new("c", false)],
        );
        let err = catalog
            .create_quizzes(&topic, vec![authored("ok"), three_answers, authored(" ")])
            .unwrap_err();

        assert_eq!(err, CatalogError::BlankFields(vec![2, 3]));
        assert_eq!(err.to_string(), "Questions 2, 3 have blank fields.");
        assert_eq!(catalog.quizzes_count(), 0);
    }

    #[test]
    fn quiz_crud_round() {
        let mut catalog = Catalog::new();
        let topic = catalog.create_topic("Rust", "Ownership and borrowing").unwrap();
        catalog.create_quizzes(&topic, vec![authored("first"), authored("second")]).unwrap();
        assert_eq!(catalog.quizzes_count(), 2);

        let first = catalog.topic(&topic).unwrap().quizzes()[0].clone();
        let removed = catalog.delete_quiz(&topic, first.id()).unwrap();
        assert_eq!(removed.text(), "first");
        assert_eq!(
            catalog.delete_quiz(&topic, first.id()),
            Err(CatalogError::QuestionNotFound(*first.id()))
        );

        catalog.update_topic(&topic, "Rust 2024", "Editions").unwrap();
        assert_eq!(catalog.topic(&topic).unwrap().title(), "Rust 2024");

        catalog.delete_topic(&topic).unwrap();
        assert!(catalog.topics().is_empty());
    }

    #[tokio::test]
    async fn retrieves_questions_by_topic() {
        let json = r#"[{
            "title": "Geography",
            "description": "Capitals",
            "quizzes": [{
                "question": "Capital of Italy?",
                "options": [
                    { "value": "Rome", "isCorrect": true },
                    { "value": "Milan", "isCorrect": false }
                ]
            }]
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();

        let topic = catalog.retrieve_topic("Geography").await.unwrap().unwrap();
        let questions = catalog.retrieve_questions(topic.id()).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(
            catalog.retrieve_all_topic_titles().await.unwrap(),
            vec!["Geography".to_string()]
        );

        let missing = Uuid::new_v4();
        assert_eq!(
            catalog.retrieve_questions(&missing).await,
            Err(CatalogError::TopicNotFound(missing))
        );
    }

    #[test]
    fn bundled_bank_is_valid() {
        let catalog = Catalog::from_json(include_str!("../../data/questions.json")).unwrap();
        assert_eq!(catalog.topics().len(), 2);
        assert_eq!(catalog.quizzes_count(), 4);
        assert!(catalog
            .topics()
            .iter()
            .flat_map(|topic| topic.quizzes())
            .all(|question| question.validate()));
    }
}
