//! RC-005: Per-step countdown timer state machine.
//!
//! `Idle -> Running <-> Paused`, with `Running -> Expired` on the last tick.
//! `Expired` behaves exactly like `Idle` except for how it was reached.
//! Transitions are pure; the periodic tick source lives in [`super::ticker`].

use std::fmt;

/// Countdown timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        remaining: u64,
    },
    Paused {
        remaining: u64,
    },
    Expired,
}

impl TimerState {
    /// Seconds left on the countdown.
    pub fn remaining(&self) -> u64 {
        match self {
            Self::Running { remaining } | Self::Paused { remaining } => *remaining,
            Self::Idle | Self::Expired => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Idle or Expired: a new countdown may start.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle | Self::Expired)
    }

    /// Start a countdown of `minutes`. Only from Idle/Expired; zero minutes is ignored.
    pub fn start(self, minutes: u32) -> Self {
        if !self.is_idle() || minutes == 0 {
            return self;
        }
        Self::Running {
            remaining: u64::from(minutes) * 60,
        }
    }

    /// Pause a running timer or resume a paused one.
    pub fn toggle(self) -> Self {
        match self {
            Self::Running { remaining } => Self::Paused { remaining },
            Self::Paused { remaining } => Self::Running { remaining },
            other => other,
        }
    }

    /// Back to Idle from any state.
    pub fn reset(self) -> Self {
        Self::Idle
    }

    /// One second of wall-clock time. Only Running counts down.
    pub fn tick(self) -> Self {
        match self {
            Self::Running { remaining } if remaining <= 1 => Self::Expired,
            Self::Running { remaining } => Self::Running {
                remaining: remaining - 1,
            },
            other => other,
        }
    }

    /// `m:ss` display of the remaining time.
    pub fn clock(&self) -> String {
        format_clock(self.remaining())
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { remaining } => write!(f, "running {}", format_clock(*remaining)),
            Self::Paused { remaining } => write!(f, "paused {}", format_clock(*remaining)),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rc005_start_five_minutes() {
        let t = TimerState::Idle.start(5);
        assert_eq!(t, TimerState::Running { remaining: 300 });
        assert!(t.is_running());
    }

    #[test]
    fn test_rc005_runs_to_expiry() {
        let mut t = TimerState::Idle.start(5);
        for _ in 0..300 {
            t = t.tick();
        }
        assert_eq!(t, TimerState::Expired);
        assert!(t.is_idle());
        assert_eq!(t.remaining(), 0);
        // Further ticks do nothing
        assert_eq!(t.tick(), TimerState::Expired);
    }

    #[test]
    fn test_rc005_start_only_from_idle() {
        let running = TimerState::Running { remaining: 42 };
        assert_eq!(running.start(10), running);
        let paused = TimerState::Paused { remaining: 42 };
        assert_eq!(paused.start(10), paused);
        assert_eq!(TimerState::Expired.start(1), TimerState::Running { remaining: 60 });
    }

    #[test]
    fn test_rc005_start_zero_minutes_ignored() {
        assert_eq!(TimerState::Idle.start(0), TimerState::Idle);
    }

    #[test]
    fn test_rc005_toggle() {
        let t = TimerState::Running { remaining: 10 };
        assert_eq!(t.toggle(), TimerState::Paused { remaining: 10 });
        assert_eq!(t.toggle().toggle(), t);
        assert_eq!(TimerState::Idle.toggle(), TimerState::Idle);
        assert_eq!(TimerState::Expired.toggle(), TimerState::Expired);
    }

    #[test]
    fn test_rc005_paused_does_not_tick() {
        let t = TimerState::Paused { remaining: 10 };
        assert_eq!(t.tick(), t);
        assert_eq!(TimerState::Idle.tick(), TimerState::Idle);
    }

    #[test]
    fn test_rc005_reset_from_any() {
        for t in [
            TimerState::Idle,
            TimerState::Running { remaining: 5 },
            TimerState::Paused { remaining: 5 },
            TimerState::Expired,
        ] {
            assert_eq!(t.reset(), TimerState::Idle);
        }
    }

    #[test]
    fn test_rc005_clock_format() {
        assert_eq!(format_clock(300), "5:00");
        assert_eq!(format_clock(61), "1:01");
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(TimerState::Paused { remaining: 125 }.to_string(), "paused 2:05");
    }

    proptest! {
        #[test]
        fn prop_rc005_running_decrements_by_one(remaining in 2u64..100_000) {
            let t = TimerState::Running { remaining };
            prop_assert_eq!(t.tick(), TimerState::Running { remaining: remaining - 1 });
        }

        #[test]
        fn prop_rc005_expires_after_exact_ticks(minutes in 1u32..30) {
            let mut t = TimerState::Idle.start(minutes);
            let total = u64::from(minutes) * 60;
            for _ in 0..total - 1 {
                t = t.tick();
                prop_assert!(t.is_running());
            }
            prop_assert_eq!(t.tick(), TimerState::Expired);
        }
    }
}
