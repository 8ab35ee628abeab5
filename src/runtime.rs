use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::{mpsc, Mutex, Notify},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    error::SessionError,
    session::{Progress, QuizSession, TimerEvent},
    timer::TimerState,
};

pub const TICK: Duration = Duration::from_secs(1);

/// A running session together with the task that drives its countdown.
///
/// Every mutation and every tick take the same lock. Dropping the handle
/// stops the ticker.
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    session: Arc<Mutex<QuizSession>>,
    restart: Arc<Notify>,
    ticker: JoinHandle<()>,
}

impl SessionHandle {
    pub fn spawn(session: QuizSession, events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self::spawn_with_tick(session, TICK, events)
    }

    pub fn spawn_with_tick(
        session: QuizSession,
        tick: Duration,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let id = *session.id();
        let armed = session.current_index();
        let session = Arc::new(Mutex::new(session));
        let restart = Arc::new(Notify::new());

        let ticker = tokio::spawn(run_ticker(
            Arc::downgrade(&session),
            restart.clone(),
            tick,
            armed,
            events,
        ));

        Self {
            id,
            session,
            restart,
            ticker,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Input carries the index of the question it was made for. Input for a
    /// question the session already left fails with `StaleQuestion`.
    pub async fn select_option(&self, question: usize, answer_id: Uuid) -> Result<bool, SessionError> {
        let mut session = self.session.lock().await;
        session.expect_question(question)?;
        session.select_option(answer_id)
    }

    pub async fn reorder_options(&self, question: usize, from: usize, to: usize) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        session.expect_question(question)?;
        session.reorder_options(from, to)
    }

    pub async fn advance(&self, question: usize) -> Result<Progress, SessionError> {
        let mut session = self.session.lock().await;
        session.expect_question(question)?;
        let progress = session.advance()?;
        match progress {
            Progress::Next { .. } => self.restart.notify_one(),
            Progress::Completed(_) => self.ticker.abort(),
        }
        Ok(progress)
    }

    /// Runs `f` against the session under the lock, e.g. to render it.
    pub async fn read<R>(&self, f: impl FnOnce(&QuizSession) -> R) -> R {
        f(&*self.session.lock().await)
    }

    pub async fn abandon(&self) {
        self.session.lock().await.abandon();
        self.ticker.abort();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

async fn run_ticker(
    session: Weak<Mutex<QuizSession>>,
    restart: Arc<Notify>,
    tick: Duration,
    mut armed: usize,
    events: mpsc::UnboundedSender<TimerEvent>,
) {
    let mut interval = interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Set once the active question has expired. Nothing is left to count
    // until `advance` moves on, so the loop parks on `restart` instead.
    let mut idle = false;

    loop {
        let restarted = if idle {
            restart.notified().await;
            true
        } else {
            tokio::select! {
                biased;
                _ = restart.notified() => true,
                _ = interval.tick() => false,
            }
        };

        let Some(strong) = session.upgrade() else {
            break;
        };
        let mut guard = strong.lock().await;
        if guard.is_finished() {
            break;
        }

        // A new question gets a full first second. A tick that raced with
        // `advance` belongs to the previous question and is dropped.
        if restarted || guard.current_index() != armed {
            armed = guard.current_index();
            idle = false;
            interval.reset();
            continue;
        }

        if let Some(event) = guard.tick() {
            if events.send(event).is_err() {
                tracing::debug!(id = %guard.id(), "timer event receiver is gone");
            }
        }
        idle = guard.timer_state() != TimerState::Running;
    }
}

/// Live sessions by id. Removing a session cancels its countdown.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: SessionHandle) -> Arc<SessionHandle> {
        let handle = Arc::new(handle);
        self.sessions
            .lock()
            .await
            .insert(*handle.id(), handle.clone());
        handle
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().await.remove(id)
    }

    /// Removes the session and stops its countdown even if another task
    /// still holds a reference.
    pub async fn abandon(&self, id: &Uuid) -> bool {
        match self.remove(id).await {
            Some(handle) => {
                handle.abandon().await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
