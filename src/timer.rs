#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Expired,
    Stopped,
}

/// Per-question countdown. Ticks are fed from outside, one per second.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts from `limit` regardless of the current state.
    pub fn start(&mut self, limit: u32) {
        self.limit = limit;
        self.remaining = limit;
        self.state = if limit == 0 {
            TimerState::Expired
        } else {
            TimerState::Running
        };
    }

    /// Advances one second. Only a running countdown moves.
    pub fn tick(&mut self) -> TimerState {
        if self.state == TimerState::Running {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.state = TimerState::Expired;
            }
        }
        self.state
    }

    /// Halts the countdown and reports the seconds spent. Repeated calls
    /// return the same value.
    pub fn stop(&mut self) -> u32 {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
        self.elapsed()
    }

    pub fn elapsed(&self) -> u32 {
        self.limit - self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_down_to_expiry() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.state(), TimerState::Idle);

        countdown.start(3);
        assert_eq!(countdown.tick(), TimerState::Running);
        assert_eq!(countdown.tick(), TimerState::Running);
        assert_eq!(countdown.tick(), TimerState::Expired);
        assert_eq!(countdown.remaining(), 0);

        // Further ticks keep it expired.
        assert_eq!(countdown.tick(), TimerState::Expired);
        assert_eq!(countdown.stop(), 3);
        assert!(countdown.is_expired());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut countdown = Countdown::new();
        countdown.start(60);
        for _ in 0..5 {
            countdown.tick();
        }

        assert_eq!(countdown.stop(), 5);
        assert_eq!(countdown.tick(), TimerState::Stopped);
        assert_eq!(countdown.stop(), 5);
        assert_eq!(countdown.state(), TimerState::Stopped);
    }

    #[test]
    fn start_resets_from_any_state() {
        let mut countdown = Countdown::new();
        countdown.start(2);
        countdown.tick();
        countdown.tick();
        assert!(countdown.is_expired());

        countdown.start(10);
        assert_eq!(countdown.state(), TimerState::Running);
        assert_eq!(countdown.remaining(), 10);
        assert_eq!(countdown.elapsed(), 0);
    }

    #[test]
    fn zero_limit_is_already_expired() {
        let mut countdown = Countdown::new();
        countdown.start(0);
        assert!(countdown.is_expired());
        assert_eq!(countdown.stop(), 0);
    }
}
