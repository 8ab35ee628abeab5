use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    TimeUp,
    Completed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot start a quiz without questions")]
    EmptyQuestionSet,
    #[error("the quiz session is already complete")]
    SessionAlreadyComplete,
    #[error("the quiz session was abandoned")]
    SessionAbandoned,
    #[error("answers are locked ({0:?})")]
    InvalidMutationWhileLocked(LockReason),
    #[error("answer {0} does not belong to the current question")]
    UnknownAnswer(Uuid),
    #[error("position {index} is out of range for {len} answers")]
    PositionOutOfRange { index: usize, len: usize },
    #[error("operation does not apply to this kind of question")]
    ModeMismatch,
    #[error("question #{index} is no longer active (now at #{current})")]
    StaleQuestion { index: usize, current: usize },
}
