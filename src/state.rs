use uuid::Uuid;

use crate::{runtime::SessionRegistry, source::QuizSource};

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,
    Selection,
    ReadyToRun {
        source: QuizSource,
    },
    Running {
        session_id: Uuid,
        source: QuizSource,
    },
}

impl QuizState {
    pub fn session_id(&self) -> Option<&Uuid> {
        match self {
            QuizState::Running { session_id, .. } => Some(session_id),
            _ => None,
        }
    }

    /// Abandons the quiz this state is running, stopping its countdown.
    /// Returns whether there was one to stop.
    pub async fn release(&self, registry: &SessionRegistry) -> bool {
        match self.session_id() {
            Some(session_id) => registry.abandon(session_id).await,
            None => false,
        }
    }
}
