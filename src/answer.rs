use uuid::Uuid;

use crate::{
    catalog::quiz::{Answer, QuestionKind},
    error::SessionError,
};

/// The in-progress answer to the active question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Chosen answer ids, in the order they were picked, without duplicates.
    Toggle(Vec<Uuid>),
    /// The full answer list in the order the player arranged it.
    Ordering(Vec<Uuid>),
}

impl Selection {
    /// Initial selection for a question whose answers are shown in `displayed` order.
    /// An ordering question starts out answered with the displayed arrangement.
    pub fn for_question(kind: QuestionKind, displayed: &[Answer]) -> Self {
        match kind {
            QuestionKind::Ordering => {
                Selection::Ordering(displayed.iter().map(|answer| *answer.id()).collect())
            }
            QuestionKind::Single | QuestionKind::Multiple => Selection::Toggle(vec![]),
        }
    }

    /// Flips `id` in a toggle selection. Returns whether it is now selected.
    pub fn toggle(&mut self, id: Uuid) -> Result<bool, SessionError> {
        let Selection::Toggle(ids) = self else {
            return Err(SessionError::ModeMismatch);
        };

        match ids.iter().position(|selected| *selected == id) {
            Some(idx) => {
                ids.remove(idx);
                Ok(false)
            }
            None => {
                ids.push(id);
                Ok(true)
            }
        }
    }

    /// Moves the entry at `from` to `to`, shifting everything in between by one.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        let Selection::Ordering(ids) = self else {
            return Err(SessionError::ModeMismatch);
        };

        let len = ids.len();
        for index in [from, to] {
            if index >= len {
                return Err(SessionError::PositionOutOfRange { index, len });
            }
        }

        let moved = ids.remove(from);
        ids.insert(to, moved);
        Ok(())
    }

    pub fn ids(&self) -> &[Uuid] {
        match self {
            Selection::Toggle(ids) | Selection::Ordering(ids) => ids,
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids().contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}
