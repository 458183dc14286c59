//! RC-004: Guided cook-mode session — step stepper, completion prefix, timer.
//!
//! [`CookingSession`] is a value type; every transition is a pure reducer
//! returning the next state plus the journal event it produced (`None` for a
//! no-op). Completed steps always form a prefix `{0, ..., k}` of the step
//! sequence.
//!
//! [`CookingSessionController`] owns one session for the lifetime of a cook
//! view, together with the tick task that drives the countdown while it runs.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;

use super::ticker::{self, Tick, TickReceiver, TickSender, TickerHandle};
use super::timer::TimerState;
use super::types::{Recipe, SessionEvent, Step, TimerPolicy};

// ============================================================================
// Reducer
// ============================================================================

/// Input to the session reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Advance,
    Retreat,
    JumpTo(usize),
    ToggleStepComplete(usize),
    StartTimer { minutes: u32 },
    ToggleTimer,
    ResetTimer,
    Tick,
}

/// Display status of a step in the step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Current,
    Completed,
    Pending,
}

/// Outcome of a reducer call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: CookingSession,
    pub event: Option<SessionEvent>,
}

/// State of one guided cooking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookingSession {
    recipe_id: String,
    step_count: usize,
    current_step: usize,
    completed: BTreeSet<usize>,
    timer: TimerState,
}

impl CookingSession {
    /// Fresh session at the first step. `step_count` must be non-zero.
    pub fn new(recipe_id: &str, step_count: usize) -> Result<Self, String> {
        if step_count == 0 {
            return Err(format!("recipe '{}' has no steps to cook", recipe_id));
        }
        Ok(Self {
            recipe_id: recipe_id.to_string(),
            step_count,
            current_step: 0,
            completed: BTreeSet::new(),
            timer: TimerState::Idle,
        })
    }

    /// Apply one action. Invalid actions return an unchanged session and no event.
    pub fn reduce(&self, action: SessionAction) -> Transition {
        let mut next = self.clone();
        let event = match action {
            SessionAction::Advance => next.advance(),
            SessionAction::Retreat => next.retreat(),
            SessionAction::JumpTo(i) => next.jump_to(i),
            SessionAction::ToggleStepComplete(i) => next.toggle_step_complete(i),
            SessionAction::StartTimer { minutes } => next.start_timer(minutes),
            SessionAction::ToggleTimer => next.toggle_timer(),
            SessionAction::ResetTimer => next.reset_timer(),
            SessionAction::Tick => next.tick(),
        };
        Transition {
            session: next,
            event,
        }
    }

    fn advance(&mut self) -> Option<SessionEvent> {
        let from = self.current_step;
        if from + 1 >= self.step_count {
            return None;
        }
        self.completed.extend(0..=from);
        self.move_to(from + 1);
        Some(SessionEvent::StepAdvanced { from, to: from + 1 })
    }

    fn retreat(&mut self) -> Option<SessionEvent> {
        let from = self.current_step;
        if from == 0 {
            return None;
        }
        let to = from - 1;
        self.uncomplete_from(to);
        self.move_to(to);
        Some(SessionEvent::StepRetreated { from, to })
    }

    fn jump_to(&mut self, to: usize) -> Option<SessionEvent> {
        let from = self.current_step;
        if to >= self.step_count || to == from {
            return None;
        }
        self.move_to(to);
        Some(SessionEvent::StepJumped { from, to })
    }

    fn toggle_step_complete(&mut self, step: usize) -> Option<SessionEvent> {
        if step >= self.step_count {
            return None;
        }
        if self.completed.contains(&step) {
            self.uncomplete_from(step);
        } else {
            self.completed.extend(0..=step);
        }
        Some(SessionEvent::CompletionToggled {
            step,
            completed: self.completed.iter().copied().collect(),
        })
    }

    fn start_timer(&mut self, minutes: u32) -> Option<SessionEvent> {
        let next = self.timer.start(minutes);
        if next == self.timer {
            return None;
        }
        self.timer = next;
        Some(SessionEvent::TimerStarted {
            step: self.current_step,
            seconds: next.remaining(),
        })
    }

    fn toggle_timer(&mut self) -> Option<SessionEvent> {
        let step = self.current_step;
        let event = match self.timer {
            TimerState::Running { remaining } => SessionEvent::TimerPaused { step, remaining },
            TimerState::Paused { remaining } => SessionEvent::TimerResumed { step, remaining },
            TimerState::Idle | TimerState::Expired => return None,
        };
        self.timer = self.timer.toggle();
        Some(event)
    }

    fn reset_timer(&mut self) -> Option<SessionEvent> {
        if self.timer == TimerState::Idle {
            return None;
        }
        self.timer = self.timer.reset();
        Some(SessionEvent::TimerReset {
            step: self.current_step,
        })
    }

    fn tick(&mut self) -> Option<SessionEvent> {
        if !self.timer.is_running() {
            return None;
        }
        self.timer = self.timer.tick();
        if self.timer == TimerState::Expired {
            return Some(SessionEvent::TimerExpired {
                step: self.current_step,
            });
        }
        None
    }

    /// Change step; a timer never carries over to another step.
    fn move_to(&mut self, step: usize) {
        self.current_step = step;
        self.timer = TimerState::Idle;
    }

    fn uncomplete_from(&mut self, step: usize) {
        self.completed.retain(|&i| i < step);
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    /// Number of steps; never zero.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Index of the current step.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Completed step indices, always a prefix `0..k`.
    pub fn completed(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn timer(&self) -> TimerState {
        self.timer
    }

    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Completion as a percentage of all steps.
    pub fn progress_percent(&self) -> f64 {
        self.completed.len() as f64 / self.step_count as f64 * 100.0
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == self.step_count
    }

    /// Finishing is only offered on the last step.
    pub fn can_finish(&self) -> bool {
        self.is_last_step()
    }

    pub fn step_status(&self, step: usize) -> StepStatus {
        if step == self.current_step {
            StepStatus::Current
        } else if self.completed.contains(&step) {
            StepStatus::Completed
        } else {
            StepStatus::Pending
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Owns one cooking session and its tick task.
///
/// Ticks arrive on the [`TickReceiver`] returned by [`Self::new`]; the owner
/// forwards each one to [`Self::on_tick`]. The tick task is cancelled on every
/// exit from `Running` and when the controller is dropped or closed.
#[derive(Debug)]
pub struct CookingSessionController {
    recipe: Recipe,
    session: CookingSession,
    tick_period: Duration,
    tick_tx: TickSender,
    ticker: Option<TickerHandle>,
    generation: u64,
}

impl CookingSessionController {
    /// Open a session for `recipe`. Steps are taken in `order`.
    pub fn new(recipe: Recipe, policy: &TimerPolicy) -> Result<(Self, TickReceiver), String> {
        let mut recipe = recipe;
        recipe.steps.sort_by_key(|s| s.order);
        let session = CookingSession::new(&recipe.id, recipe.steps.len())?;
        let (tick_tx, tick_rx) = ticker::tick_channel();
        let controller = Self {
            recipe,
            session,
            tick_period: policy.tick_period(),
            tick_tx,
            ticker: None,
            generation: 0,
        };
        Ok((controller, tick_rx))
    }

    pub fn session(&self) -> &CookingSession {
        &self.session
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn current_step(&self) -> &Step {
        &self.recipe.steps[self.session.current_step]
    }

    pub fn steps(&self) -> &[Step] {
        &self.recipe.steps
    }

    /// Whether a tick task is currently live.
    pub fn ticker_active(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn advance(&mut self) -> Option<SessionEvent> {
        self.dispatch(SessionAction::Advance)
    }

    pub fn retreat(&mut self) -> Option<SessionEvent> {
        self.dispatch(SessionAction::Retreat)
    }

    pub fn jump_to(&mut self, step: usize) -> Option<SessionEvent> {
        self.dispatch(SessionAction::JumpTo(step))
    }

    pub fn toggle_step_complete(&mut self, step: usize) -> Option<SessionEvent> {
        self.dispatch(SessionAction::ToggleStepComplete(step))
    }

    pub fn start_timer(&mut self, minutes: u32) -> Option<SessionEvent> {
        self.dispatch(SessionAction::StartTimer { minutes })
    }

    /// Start the countdown for the current step's own duration, if it has one.
    pub fn start_step_timer(&mut self) -> Option<SessionEvent> {
        let minutes = self.current_step().duration_minutes?;
        self.start_timer(minutes)
    }

    pub fn toggle_timer(&mut self) -> Option<SessionEvent> {
        self.dispatch(SessionAction::ToggleTimer)
    }

    pub fn reset_timer(&mut self) -> Option<SessionEvent> {
        self.dispatch(SessionAction::ResetTimer)
    }

    /// Advance the countdown by one tick without a tick task.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        self.dispatch(SessionAction::Tick)
    }

    /// Handle a tick from the channel. Ticks of a cancelled generation are dropped.
    pub fn on_tick(&mut self, tick: Tick) -> Option<SessionEvent> {
        let live = self
            .ticker
            .as_ref()
            .is_some_and(|t| t.generation() == tick.generation && !t.is_cancelled());
        if !live {
            debug!(generation = tick.generation, "dropped stale tick");
            return None;
        }
        self.tick()
    }

    /// Tear the session down, cancelling any tick task.
    pub fn close(mut self) -> SessionEvent {
        self.stop_ticker();
        SessionEvent::SessionClosed {
            completed: self.session.completed_count(),
            step_count: self.session.step_count,
        }
    }

    fn dispatch(&mut self, action: SessionAction) -> Option<SessionEvent> {
        let was_running = self.session.timer.is_running();
        let Transition { session, event } = self.session.reduce(action);
        self.session = session;
        let is_running = self.session.timer.is_running();

        if was_running && !is_running {
            self.stop_ticker();
        } else if !was_running && is_running {
            self.start_ticker();
        }
        event
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();
        self.generation += 1;
        self.ticker = ticker::spawn_ticker(self.tick_period, self.generation, self.tick_tx.clone());
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.cancel();
        }
    }
}

impl Drop for CookingSessionController {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
