use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup},
    utils::html,
};
use uuid::Uuid;

use crate::{catalog::quiz::QuestionKind, session::QuizSession};

pub const TAKE_QUIZ: &str = "Take a quiz📝";
pub const SHOW_RESULTS: &str = "My results📊";

/// Callback data for buttons that only carry a label.
const NOOP: &str = "noop";

/// What an inline button press asks the running session to do. Every action
/// names the question index it was rendered for, so taps on an old message
/// can be told apart from taps on the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle { question: usize, answer: Uuid },
    Move { question: usize, from: usize, to: usize },
    Next { question: usize },
}

impl Action {
    pub fn parse(data: &str) -> Option<Action> {
        let (tag, rest) = data.split_once(':')?;
        match tag {
            "next" => Some(Action::Next {
                question: rest.parse().ok()?,
            }),
            "t" => {
                let (question, answer) = rest.split_once(':')?;
                Some(Action::Toggle {
                    question: question.parse().ok()?,
                    answer: Uuid::parse_str(answer).ok()?,
                })
            }
            "m" => {
                let mut parts = rest.split(':');
                let action = Action::Move {
                    question: parts.next()?.parse().ok()?,
                    from: parts.next()?.parse().ok()?,
                    to: parts.next()?.parse().ok()?,
                };
                parts.next().is_none().then_some(action)
            }
            _ => None,
        }
    }

    pub fn data(&self) -> String {
        match self {
            Action::Toggle { question, answer } => format!("t:{}:{}", question, answer),
            Action::Move { question, from, to } => format!("m:{}:{}:{}", question, from, to),
            Action::Next { question } => format!("next:{}", question),
        }
    }

    pub fn question(&self) -> usize {
        match self {
            Action::Toggle { question, .. }
            | Action::Move { question, .. }
            | Action::Next { question } => *question,
        }
    }
}

/// Snapshot of the active question, taken under the session lock so rendering
/// never holds it across a request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub kind: QuestionKind,
    pub answers: Vec<(Uuid, String, bool)>,
    pub remaining_secs: u32,
    pub locked: bool,
    pub is_last: bool,
}

impl QuestionView {
    pub fn capture(session: &QuizSession) -> Option<QuestionView> {
        let question = session.current_question()?;
        let selection = session.selection();
        let answers = session
            .displayed_answers()
            .into_iter()
            .map(|answer| {
                (
                    *answer.id(),
                    answer.text().to_owned(),
                    selection.contains(answer.id()),
                )
            })
            .collect();

        Some(QuestionView {
            index: session.current_index(),
            total: session.len(),
            text: question.text().to_owned(),
            kind: question.kind(),
            answers,
            remaining_secs: session.remaining_secs(),
            locked: session.is_locked(),
            is_last: session.is_last(),
        })
    }

    pub fn message(&self) -> String {
        let hint = match self.kind {
            QuestionKind::Single => "Choose one answer.",
            QuestionKind::Multiple => "Choose every correct answer.",
            QuestionKind::Ordering => "Put the answers in the right order.",
        };
        let clock = if self.locked {
            "⏰ Time is up".to_string()
        } else {
            format!("⏱ {}s left", self.remaining_secs)
        };

        format!(
            "Question #{} of {}\n<b>{}</b>\n<i>{}</i>\n{}",
            self.index + 1,
            self.total,
            html::escape(&self.text),
            hint,
            clock
        )
    }
}

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new("Yes✔️"),
        KeyboardButton::new("No❌"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn topics_keyboard(topics: &[String]) -> KeyboardMarkup {
    let keyboard = topics.iter().map(|topic| vec![KeyboardButton::new(topic)]);

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn action_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(TAKE_QUIZ)],
        vec![KeyboardButton::new(SHOW_RESULTS)],
    ];

    KeyboardMarkup::new(keyboard)
}

pub fn question_keyboard(view: &QuestionView) -> InlineKeyboardMarkup {
    let last = view.answers.len().saturating_sub(1);
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = match view.kind {
        QuestionKind::Ordering => view
            .answers
            .iter()
            .enumerate()
            .map(|(i, (_, text, _))| {
                let mut row = vec![InlineKeyboardButton::callback(
                    format!("{}. {}", i + 1, text),
                    NOOP,
                )];
                if i > 0 {
                    row.push(InlineKeyboardButton::callback(
                        "⬆️",
                        Action::Move {
                            question: view.index,
                            from: i,
                            to: i - 1,
                        }
                        .data(),
                    ));
                }
                if i < last {
                    row.push(InlineKeyboardButton::callback(
                        "⬇️",
                        Action::Move {
                            question: view.index,
                            from: i,
                            to: i + 1,
                        }
                        .data(),
                    ));
                }
                row
            })
            .collect(),
        QuestionKind::Single | QuestionKind::Multiple => view
            .answers
            .iter()
            .map(|(id, text, selected)| {
                let label = if *selected {
                    format!("✅ {}", text)
                } else {
                    text.clone()
                };
                let action = Action::Toggle {
                    question: view.index,
                    answer: *id,
                };
                vec![InlineKeyboardButton::callback(label, action.data())]
            })
            .collect(),
    };

    let next = if view.is_last { "Finish 🏁" } else { "Next ➡️" };
    let action = Action::Next {
        question: view.index,
    };
    keyboard.push(vec![InlineKeyboardButton::callback(next, action.data())]);

    InlineKeyboardMarkup::new(keyboard)
}
