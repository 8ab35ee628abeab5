use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a question is answered and judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    Single,
    Multiple,
    Ordering,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    id: Uuid,
    text: String,
    kind: QuestionKind,
    answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    id: Uuid,
    #[serde(rename = "value")]
    text: String,
    #[serde(rename = "isCorrect", default)]
    is_correct: bool,
    #[serde(default)]
    position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    id: Uuid,
    title: String,
    description: String,
    #[serde(default)]
    quizzes: Vec<Question>,
}

/// Wire shape of a question: two flags instead of a kind.
#[derive(Serialize, Deserialize)]
struct RawQuestion {
    #[serde(rename = "_id", default = "Uuid::new_v4")]
    id: Uuid,
    question: String,
    #[serde(rename = "isMultiple", default)]
    is_multiple: bool,
    #[serde(rename = "isSortQuiz", default)]
    is_sort_quiz: bool,
    options: Vec<Answer>,
}

impl From<RawQuestion> for Question {
    fn from(raw: RawQuestion) -> Self {
        let kind = if raw.is_sort_quiz {
            QuestionKind::Ordering
        } else if raw.is_multiple {
            QuestionKind::Multiple
        } else {
            QuestionKind::Single
        };

        Self {
            id: raw.id,
            text: raw.question,
            kind,
            answers: raw.options,
        }
    }
}

impl From<Question> for RawQuestion {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question: question.text,
            is_multiple: question.kind == QuestionKind::Multiple,
            is_sort_quiz: question.kind == QuestionKind::Ordering,
            options: question.answers,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} questions)",
            self.title,
            self.description,
            self.quizzes.len()
        )
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut answers = String::new();
        for (i, answer) in self.answers.iter().enumerate() {
            answers.push_str(&format!("{}) {}\n", i + 1, answer));
        }

        write!(f, "{}\n{}", self.text, answers)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} (#{})", self.text, position),
            None => write!(f, "{} ({})", self.text, if self.is_correct { 'V' } else { 'X' }),
        }
    }
}

impl Topic {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            quizzes: vec![],
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quizzes(&self) -> &[Question] {
        &self.quizzes
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn quizzes_mut(&mut self) -> &mut Vec<Question> {
        &mut self.quizzes
    }
}

impl Question {
    pub fn new(text: impl Into<String>, kind: QuestionKind, answers: Vec<Answer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            kind,
            answers,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn is_ordering(&self) -> bool {
        self.kind == QuestionKind::Ordering
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn answer(&self, id: &Uuid) -> Option<&Answer> {
        self.answers.iter().find(|answer| answer.id == *id)
    }

    /// Checks the data invariants a question must hold before it can be played:
    /// ordering questions carry the positions `1..=N` exactly once, every other
    /// question has at least one correct answer.
    pub fn validate(&self) -> bool {
        if self.answers.is_empty() {
            return false;
        }

        match self.kind {
            QuestionKind::Ordering => {
                let positions: BTreeSet<u32> =
                    self.answers.iter().filter_map(|answer| answer.position).collect();
                let expected: BTreeSet<u32> = (1..=self.answers.len() as u32).collect();
                positions == expected && self.answers.iter().all(|a| a.position.is_some())
            }
            QuestionKind::Single | QuestionKind::Multiple => {
                self.answers.iter().any(|answer| answer.is_correct)
            }
        }
    }
}

impl Answer {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Answer {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_correct,
            position: None,
        }
    }

    pub fn ranked(text: impl Into<String>, position: u32) -> Answer {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_correct: false,
            position: Some(position),
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn position(&self) -> Option<u32> {
        self.position
    }
}
