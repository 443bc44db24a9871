//! Cancellable countdown that reports progress at a fixed cadence.
//!
//! Each [`CountdownTimer::arm`] opens a new *cycle*. A cycle ends with exactly
//! one terminal event: either the timer emits [`TimerNotification::Expired`]
//! or [`CountdownTimer::disarm`] cancels it. The notification task checks the
//! cycle state and sends under the same lock that `disarm` takes, so the two
//! can never both happen.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};

/// Progress notifications per countdown (1% steps).
pub const DEFAULT_TICK_STEPS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerNotification {
    Tick { remaining: Duration },
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub cycle: u64,
    pub notification: TimerNotification,
}

#[derive(Debug, Default)]
struct CycleState {
    cycle: u64,
    armed: bool,
}

pub struct CountdownTimer {
    state: Arc<Mutex<CycleState>>,
    task: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<TimerEvent>,
    steps: u32,
}

impl CountdownTimer {
    pub fn with_steps(events: mpsc::UnboundedSender<TimerEvent>, steps: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(CycleState::default())),
            task: None,
            events,
            steps: steps.max(1),
        }
    }

    pub fn channel(steps: u32) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_steps(tx, steps), rx)
    }

    /// Starts a new countdown, cancelling any countdown still running.
    /// Returns the id of the new cycle. Must be called inside a tokio runtime.
    pub fn arm(&mut self, duration: Duration) -> u64 {
        self.disarm();
        let cycle = {
            let mut state = lock(&self.state);
            state.cycle += 1;
            state.armed = true;
            state.cycle
        };
        self.task = Some(tokio::spawn(run_countdown(
            Arc::clone(&self.state),
            self.events.clone(),
            cycle,
            duration,
            self.steps,
        )));
        cycle
    }

    /// Cancels the running countdown. Returns `true` when this call ended the
    /// cycle, `false` when nothing was armed or expiry already fired.
    pub fn disarm(&mut self) -> bool {
        let was_armed = std::mem::replace(&mut lock(&self.state).armed, false);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.state).armed
    }

    pub fn current_cycle(&self) -> u64 {
        lock(&self.state).cycle
    }

    /// Whether `event` belongs to the most recent cycle.
    pub fn is_current(&self, event: &TimerEvent) -> bool {
        event.cycle == self.current_cycle()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn lock(state: &Mutex<CycleState>) -> MutexGuard<'_, CycleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_countdown(
    state: Arc<Mutex<CycleState>>,
    events: mpsc::UnboundedSender<TimerEvent>,
    cycle: u64,
    duration: Duration,
    steps: u32,
) {
    let started = Instant::now();
    let interval = duration / steps;

    if !interval.is_zero() {
        for step in 1..steps {
            sleep_until(started + interval * step).await;
            // Counted in whole intervals so the last tick never reports more
            // than one interval when `steps` does not divide `duration`.
            let tick = TimerNotification::Tick {
                remaining: interval * (steps - step),
            };
            if !notify(&state, &events, cycle, tick) {
                return;
            }
        }
    }

    sleep_until(started + duration).await;
    notify(&state, &events, cycle, TimerNotification::Expired);
}

fn notify(
    state: &Mutex<CycleState>,
    events: &mpsc::UnboundedSender<TimerEvent>,
    cycle: u64,
    notification: TimerNotification,
) -> bool {
    let mut state = lock(state);
    if !state.armed || state.cycle != cycle {
        return false;
    }
    if notification == TimerNotification::Expired {
        state.armed = false;
    }
    events.send(TimerEvent { cycle, notification }).is_ok()
}

#[cfg(test)]
#[path = "tests/timer_tests.rs"]
mod tests;
