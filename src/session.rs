use std::fmt;

use uuid::Uuid;

use crate::{
    analysis::{AnalysisRecord, QuestionResult, Totals},
    answer::Selection,
    catalog::quiz::{Answer, Question},
    config::SessionConfig,
    error::{LockReason, SessionError},
    evaluate::evaluate,
    shuffle::{shuffled, Shuffler},
    timer::{Countdown, TimerState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Answering,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    TimeUp { question_index: usize },
}

/// What `advance` leads to.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Next { index: usize, last_correct: bool },
    Completed(AnalysisRecord),
}

/// One attempt at a fixed, shuffled sequence of questions.
///
/// Progression is one-directional: the only way forward is `advance`, and
/// there is no way back.
pub struct QuizSession {
    id: Uuid,
    config: SessionConfig,
    shuffler: Box<dyn Shuffler>,
    questions: Vec<Question>,
    current: usize,
    displayed: Vec<Answer>,
    selection: Selection,
    countdown: Countdown,
    results: Vec<QuestionResult>,
    totals: Totals,
    phase: Phase,
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("len", &self.questions.len())
            .field("phase", &self.phase)
            .field("timer", &self.countdown.state())
            .field("totals", &self.totals)
            .finish_non_exhaustive()
    }
}

impl QuizSession {
    pub fn start(
        questions: Vec<Question>,
        config: SessionConfig,
        mut shuffler: Box<dyn Shuffler>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }

        let questions = shuffled(&questions, shuffler.as_mut());
        let mut session = Self {
            id: Uuid::new_v4(),
            config,
            shuffler,
            questions,
            current: 0,
            displayed: vec![],
            selection: Selection::Toggle(vec![]),
            countdown: Countdown::new(),
            results: vec![],
            totals: Totals::default(),
            phase: Phase::Answering,
        };
        session.activate();

        tracing::debug!(id = %session.id, questions = session.questions.len(), "quiz session started");
        Ok(session)
    }

    /// Shuffles the current question's answers, resets the selection and
    /// restarts the countdown.
    fn activate(&mut self) {
        let question = &self.questions[self.current];
        self.displayed = shuffled(question.answers(), self.shuffler.as_mut());
        self.selection = Selection::for_question(question.kind(), &self.displayed);
        self.countdown.start(self.config.time_limit_secs);
    }

    fn ensure_mutable(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Completed => Err(SessionError::InvalidMutationWhileLocked(LockReason::Completed)),
            Phase::Abandoned => Err(SessionError::SessionAbandoned),
            Phase::Answering if self.countdown.is_expired() => {
                Err(SessionError::InvalidMutationWhileLocked(LockReason::TimeUp))
            }
            Phase::Answering => Ok(()),
        }
    }

    /// Fails when input aimed at question `index` arrives after the session
    /// has moved on. Finished sessions report their own error instead.
    pub fn expect_question(&self, index: usize) -> Result<(), SessionError> {
        if self.phase == Phase::Answering && index != self.current {
            return Err(SessionError::StaleQuestion {
                index,
                current: self.current,
            });
        }
        Ok(())
    }

    /// Toggles an answer of a choice question. Returns whether it is now selected.
    pub fn select_option(&mut self, answer_id: Uuid) -> Result<bool, SessionError> {
        self.ensure_mutable()?;
        if self.questions[self.current].answer(&answer_id).is_none() {
            return Err(SessionError::UnknownAnswer(answer_id));
        }
        self.selection.toggle(answer_id)
    }

    /// Moves an answer of an ordering question from one slot to another.
    pub fn reorder_options(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        self.ensure_mutable()?;
        self.selection.move_item(from, to)
    }

    /// Submits the current answer and moves on.
    pub fn advance(&mut self) -> Result<Progress, SessionError> {
        match self.phase {
            Phase::Completed => return Err(SessionError::SessionAlreadyComplete),
            Phase::Abandoned => return Err(SessionError::SessionAbandoned),
            Phase::Answering => {}
        }

        let elapsed = self.countdown.stop();
        let question = &self.questions[self.current];
        let is_correct = evaluate(question, &self.selection);
        let selected = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| question.answer(id).cloned())
            .collect();

        self.results
            .push(QuestionResult::new(question.clone(), is_correct, selected, elapsed));
        self.totals.elapsed_secs += elapsed;
        if is_correct {
            self.totals.score += self.config.score_per_correct;
        }

        tracing::debug!(
            id = %self.id,
            index = self.current,
            is_correct,
            elapsed,
            "question submitted"
        );

        if self.current + 1 == self.questions.len() {
            self.current = self.questions.len();
            self.phase = Phase::Completed;
            tracing::info!(
                id = %self.id,
                score = self.totals.score,
                elapsed = self.totals.elapsed_secs,
                "quiz session completed"
            );
            return Ok(Progress::Completed(AnalysisRecord {
                results: self.results.clone(),
                totals: self.totals,
            }));
        }

        self.current += 1;
        self.activate();
        Ok(Progress::Next {
            index: self.current,
            last_correct: is_correct,
        })
    }

    /// One second passes on the active question. Reports the moment time runs out.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.phase != Phase::Answering {
            return None;
        }

        let before = self.countdown.state();
        let after = self.countdown.tick();
        if before == TimerState::Running && after == TimerState::Expired {
            tracing::debug!(id = %self.id, index = self.current, "time is up");
            return Some(TimerEvent::TimeUp {
                question_index: self.current,
            });
        }
        None
    }

    /// Stops the countdown and closes the session without a result.
    pub fn abandon(&mut self) {
        if self.phase == Phase::Answering {
            self.countdown.stop();
            self.phase = Phase::Abandoned;
            tracing::debug!(id = %self.id, index = self.current, "quiz session abandoned");
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase != Phase::Answering
    }

    /// Whether answer input is currently rejected.
    pub fn is_locked(&self) -> bool {
        self.ensure_mutable().is_err()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Answers of the current question in display order. For ordering
    /// questions this is the player's current arrangement.
    pub fn displayed_answers(&self) -> Vec<&Answer> {
        match &self.selection {
            Selection::Ordering(ids) => self
                .current_question()
                .map(|question| ids.iter().filter_map(|id| question.answer(id)).collect())
                .unwrap_or_default(),
            Selection::Toggle(_) => self.displayed.iter().collect(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn timer_state(&self) -> TimerState {
        self.countdown.state()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::quiz::QuestionKind,
        shuffle::{NoShuffle, RandomShuffler},
    };

    const CONFIG: SessionConfig = SessionConfig {
        time_limit_secs: 60,
        score_per_correct: 5,
    };

    fn single(text: &str) -> Question {
        Question::new(
            text,
            QuestionKind::Single,
            vec![Answer::new("right", true), Answer::new("wrong", false)],
        )
    }

    fn right_answer(session: &QuizSession) -> Uuid {
        let question = session.current_question().unwrap();
        *question.answers().iter().find(|a| a.is_correct()).unwrap().id()
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = QuizSession::start(vec![], CONFIG, Box::new(RandomShuffler)).unwrap_err();
        assert_eq!(err, SessionError::EmptyQuestionSet);
    }

    #[test]
    fn start_keeps_every_question() {
        let questions: Vec<Question> = (0..6).map(|i| single(&i.to_string())).collect();
        let session = QuizSession::start(questions.clone(), CONFIG, Box::new(RandomShuffler)).unwrap();

        let mut ids: Vec<Uuid> = session.questions().iter().map(|q| *q.id()).collect();
        let mut expected: Vec<Uuid> = questions.iter().map(|q| *q.id()).collect();
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.timer_state(), TimerState::Running);
        assert_eq!(session.remaining_secs(), 60);
    }

    #[test]
    fn index_never_moves_backwards() {
        let questions: Vec<Question> = (0..4).map(|i| single(&i.to_string())).collect();
        let mut session = QuizSession::start(questions, CONFIG, Box::new(RandomShuffler)).unwrap();

        let mut last = session.current_index();
        loop {
            let progress = session.advance().unwrap();
            assert!(session.current_index() >= last);
            assert!(session.current_index() <= session.len());
            last = session.current_index();
            if matches!(progress, Progress::Completed(_)) {
                break;
            }
        }
        assert_eq!(session.current_index(), session.len());
        assert!(session.current_question().is_none());
    }

    #[test]
    fn advance_after_completion_is_rejected() {
        let mut session = QuizSession::start(vec![single("only")], CONFIG, Box::new(NoShuffle)).unwrap();
        assert!(matches!(session.advance(), Ok(Progress::Completed(_))));

        assert_eq!(session.advance(), Err(SessionError::SessionAlreadyComplete));
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn expiry_locks_answers_until_advance() {
        let config = SessionConfig {
            time_limit_secs: 2,
            score_per_correct: 5,
        };
        let mut session =
            QuizSession::start(vec![single("a"), single("b")], config, Box::new(NoShuffle)).unwrap();

        assert_eq!(session.tick(), None);
        assert_eq!(session.tick(), Some(TimerEvent::TimeUp { question_index: 0 }));
        assert_eq!(session.tick(), None);
        assert!(session.is_locked());

        let answer = right_answer(&session);
        assert_eq!(
            session.select_option(answer),
            Err(SessionError::InvalidMutationWhileLocked(LockReason::TimeUp))
        );
        assert!(session.selection().is_empty());

        // Advancing stays possible and unlocks the next question.
        let progress = session.advance().unwrap();
        assert_eq!(progress, Progress::Next { index: 1, last_correct: false });
        assert_eq!(session.results()[0].elapsed_secs(), 2);
        assert!(!session.is_locked());
        assert!(session.select_option(right_answer(&session)).unwrap());
    }

    #[test]
    fn foreign_answer_is_rejected() {
        let mut session = QuizSession::start(vec![single("a")], CONFIG, Box::new(NoShuffle)).unwrap();
        let stranger = Uuid::new_v4();
        assert_eq!(
            session.select_option(stranger),
            Err(SessionError::UnknownAnswer(stranger))
        );
    }

    #[test]
    fn reorder_on_choice_question_is_a_mode_mismatch() {
        let mut session = QuizSession::start(vec![single("a")], CONFIG, Box::new(NoShuffle)).unwrap();
        assert_eq!(session.reorder_options(0, 1), Err(SessionError::ModeMismatch));
    }

    #[test]
    fn abandoned_session_rejects_everything() {
        let mut session = QuizSession::start(vec![single("a")], CONFIG, Box::new(NoShuffle)).unwrap();
        session.abandon();

        assert_eq!(session.phase(), Phase::Abandoned);
        assert_eq!(session.timer_state(), TimerState::Stopped);
        assert_eq!(session.tick(), None);
        assert_eq!(session.advance(), Err(SessionError::SessionAbandoned));
        assert_eq!(
            session.select_option(right_answer(&session)),
            Err(SessionError::SessionAbandoned)
        );
    }

    #[test]
    fn ordering_question_starts_with_displayed_order() {
        let question = Question::new(
            "Sort",
            QuestionKind::Ordering,
            vec![Answer::ranked("x", 1), Answer::ranked("y", 2), Answer::ranked("z", 3)],
        );
        let session = QuizSession::start(vec![question], CONFIG, Box::new(RandomShuffler)).unwrap();

        let displayed: Vec<Uuid> = session.displayed_answers().iter().map(|a| *a.id()).collect();
        assert_eq!(session.selection().ids(), displayed.as_slice());
        assert_eq!(displayed.len(), 3);
    }

    #[test]
    fn expiry_locks_ordering_moves() {
        let config = SessionConfig {
            time_limit_secs: 1,
            score_per_correct: 5,
        };
        let question = Question::new(
            "Sort",
            QuestionKind::Ordering,
            vec![Answer::ranked("x", 1), Answer::ranked("y", 2), Answer::ranked("z", 3)],
        );
        let mut session = QuizSession::start(vec![question], config, Box::new(NoShuffle)).unwrap();
        session.reorder_options(2, 0).unwrap();
        let arranged = session.selection().ids().to_vec();

        assert_eq!(session.tick(), Some(TimerEvent::TimeUp { question_index: 0 }));
        assert_eq!(
            session.reorder_options(0, 1),
            Err(SessionError::InvalidMutationWhileLocked(LockReason::TimeUp))
        );
        assert_eq!(session.selection().ids(), arranged.as_slice());

        let Ok(Progress::Completed(record)) = session.advance() else {
            panic!("expected the session to complete");
        };
        assert!(!record.results[0].is_correct());
    }

    #[test]
    fn input_for_an_earlier_question_is_stale() {
        let mut session =
            QuizSession::start(vec![single("a"), single("b")], CONFIG, Box::new(NoShuffle)).unwrap();
        assert_eq!(session.expect_question(0), Ok(()));

        session.advance().unwrap();
        assert_eq!(
            session.expect_question(0),
            Err(SessionError::StaleQuestion { index: 0, current: 1 })
        );
        assert_eq!(session.expect_question(1), Ok(()));

        session.advance().unwrap();
        assert_eq!(session.expect_question(1), Ok(()));
    }
}
