//! Session state machine for one player working through a timed quiz.
//!
//! All inputs funnel through [`SessionController::dispatch`]: presentation
//! commands, countdown notifications and transport completions. Timer events
//! carry their arm cycle and transport completions carry the id of the request
//! that produced them, so anything arriving after the controller moved on is
//! dropped instead of resurrecting an abandoned question.

use std::{future::Future, sync::Arc, time::Duration};

use shared::{
    domain::{AnswerSubmission, GameOverReason, Question, ScoreEntry, TransportResponse},
    error::{QuizError, TransportError},
};
use storage::Leaderboard;
use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    timer::{CountdownTimer, TimerEvent, TimerNotification, DEFAULT_TICK_STEPS},
    transport::QuizTransport,
};

pub const DEFAULT_START_URL: &str = "https://courselab.lnu.se/quiz/question/1";
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub start_url: String,
    /// Used for questions that do not carry their own limit.
    pub time_limit: Duration,
    pub tick_steps: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.into(),
            time_limit: DEFAULT_TIME_LIMIT,
            tick_steps: DEFAULT_TICK_STEPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingNickname,
    Loading {
        url: String,
    },
    Presenting {
        question: Arc<Question>,
        time_limit: Duration,
        remaining: Duration,
    },
    Submitting,
    Victory {
        elapsed: Duration,
        /// 1-based leaderboard position, if the result made the list.
        rank: Option<usize>,
    },
    GameOver {
        reason: GameOverReason,
        detail: String,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingNickname => "awaiting_nickname",
            Self::Loading { .. } => "loading",
            Self::Presenting { .. } => "presenting",
            Self::Submitting => "submitting",
            Self::Victory { .. } => "victory",
            Self::GameOver { .. } => "game_over",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Victory { .. } | Self::GameOver { .. })
    }
}

/// Immutable view of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub nickname: Option<String>,
    /// 1-based index of the live (or last) question.
    pub question_number: u32,
    pub total_elapsed: Duration,
    /// Validation feedback for the current phase.
    pub notice: Option<String>,
    /// Remark the server attached to the last accepted answer.
    pub server_message: Option<String>,
    pub leaderboard: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open,
    ConfirmNickname(String),
    SubmitAnswer(String),
    Restart,
    Shutdown,
}

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    Question(Result<Question, TransportError>),
    Answer(Result<TransportResponse, TransportError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCompletion {
    pub request: RequestId,
    pub outcome: TransportOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Command(SessionCommand),
    Timer(TimerEvent),
    Transport(TransportCompletion),
}

#[derive(Debug)]
struct SessionState {
    nickname: Option<String>,
    total_elapsed: Duration,
    question_started_at: Option<Instant>,
    question_number: u32,
    phase: Phase,
    notice: Option<String>,
    server_message: Option<String>,
}

impl SessionState {
    fn new(phase: Phase) -> Self {
        Self {
            nickname: None,
            total_elapsed: Duration::ZERO,
            question_started_at: None,
            question_number: 0,
            phase,
            notice: None,
            server_message: None,
        }
    }
}

pub struct SessionController {
    config: SessionConfig,
    transport: Arc<dyn QuizTransport>,
    leaderboard: Arc<Leaderboard>,
    timer: CountdownTimer,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    completions_tx: mpsc::UnboundedSender<TransportCompletion>,
    completions_rx: mpsc::UnboundedReceiver<TransportCompletion>,
    pending_request: Option<RequestId>,
    last_request: RequestId,
    state: SessionState,
    scores: Vec<ScoreEntry>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn QuizTransport>,
        leaderboard: Arc<Leaderboard>,
    ) -> Self {
        let (timer, timer_rx) = CountdownTimer::channel(config.tick_steps);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let state = SessionState::new(Phase::Idle);
        let (snapshots, _) = watch::channel(project(&state, &[]));

        Self {
            config,
            transport,
            leaderboard,
            timer,
            timer_rx,
            completions_tx,
            completions_rx,
            pending_request: None,
            last_request: 0,
            state,
            scores: Vec::new(),
            snapshots,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.state.phase
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Waits for the next timer notification or transport completion.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        tokio::select! {
            Some(event) = self.timer_rx.recv() => Some(SessionEvent::Timer(event)),
            Some(done) = self.completions_rx.recv() => Some(SessionEvent::Transport(done)),
            else => None,
        }
    }

    /// Drives the controller until `commands` closes or a shutdown arrives.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        info!(start_url = %self.config.start_url, "session: controller started");
        loop {
            let event = tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => SessionEvent::Command(command),
                },
                event = self.next_event() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.dispatch(event).await;
        }
        self.timer.disarm();
        info!("session: controller stopped");
    }

    /// Single state-transition entry point.
    pub async fn dispatch(&mut self, event: SessionEvent) {
        let accepted = match event {
            SessionEvent::Command(command) => self.on_command(command).await,
            SessionEvent::Timer(event) => self.on_timer(event),
            SessionEvent::Transport(done) => self.on_transport(done).await,
        };
        if accepted {
            self.publish();
        }
    }

    async fn on_command(&mut self, command: SessionCommand) -> bool {
        match (&self.state.phase, command) {
            (Phase::Idle, SessionCommand::Open) => {
                self.scores = self.leaderboard.list().await;
                self.state.phase = Phase::AwaitingNickname;
                true
            }
            (Phase::AwaitingNickname, SessionCommand::ConfirmNickname(raw)) => {
                match validate_nickname(&raw) {
                    Ok(nickname) => {
                        info!(nickname = %nickname, "session: nickname confirmed");
                        self.state.nickname = Some(nickname);
                        self.state.total_elapsed = Duration::ZERO;
                        self.state.question_number = 0;
                        self.state.notice = None;
                        let start_url = self.config.start_url.clone();
                        self.request_question(start_url);
                    }
                    Err(err) => self.state.notice = Some(err.to_string()),
                }
                true
            }
            (Phase::Presenting { question, .. }, SessionCommand::SubmitAnswer(raw)) => {
                let answer = match validate_answer(question, &raw) {
                    Ok(answer) => answer,
                    Err(err) => {
                        self.state.notice = Some(err.to_string());
                        return true;
                    }
                };
                let submit_url = question.submit_url.clone();
                let time_limit = self.current_time_limit();

                if !self.leave_presenting() {
                    // Expiry fired before the answer got here.
                    let err = QuizError::Timeout {
                        limit_ms: duration_ms(time_limit),
                    };
                    self.game_over(GameOverReason::Timeout, err.to_string());
                    return true;
                }
                self.submit(submit_url, AnswerSubmission::new(answer));
                true
            }
            (Phase::Victory { .. } | Phase::GameOver { .. }, SessionCommand::Restart) => {
                self.timer.disarm();
                self.pending_request = None;
                self.state = SessionState::new(Phase::AwaitingNickname);
                self.scores = self.leaderboard.list().await;
                info!("session: restarted");
                true
            }
            (_, SessionCommand::Shutdown) => {
                self.timer.disarm();
                false
            }
            (phase, command) => {
                debug!(phase = phase.name(), ?command, "session: command ignored");
                false
            }
        }
    }

    fn on_timer(&mut self, event: TimerEvent) -> bool {
        if !self.timer.is_current(&event) {
            debug!(cycle = event.cycle, "session: stale timer event ignored");
            return false;
        }
        let Phase::Presenting {
            remaining,
            time_limit,
            ..
        } = &mut self.state.phase
        else {
            debug!(
                phase = self.state.phase.name(),
                "session: timer event outside presenting ignored"
            );
            return false;
        };

        match event.notification {
            TimerNotification::Tick { remaining: left } => {
                *remaining = left;
                true
            }
            TimerNotification::Expired => {
                let limit_ms = duration_ms(*time_limit);
                self.leave_presenting();
                let err = QuizError::Timeout { limit_ms };
                self.game_over(GameOverReason::Timeout, err.to_string());
                true
            }
        }
    }

    async fn on_transport(&mut self, done: TransportCompletion) -> bool {
        if self.pending_request != Some(done.request) {
            debug!(request = done.request, "session: stale transport completion ignored");
            return false;
        }
        self.pending_request = None;

        match (&self.state.phase, done.outcome) {
            (Phase::Loading { .. }, TransportOutcome::Question(Ok(question))) => {
                self.present(question);
            }
            (Phase::Loading { url }, TransportOutcome::Question(Err(err))) => {
                warn!(url = %url, error = %err, "session: question fetch failed");
                self.game_over(GameOverReason::Network, QuizError::from(err).to_string());
            }
            (
                Phase::Submitting,
                TransportOutcome::Answer(Ok(TransportResponse::Continue { next_url, message })),
            ) => {
                info!(
                    question_number = self.state.question_number,
                    message = ?message,
                    "session: answer accepted"
                );
                self.state.server_message = message;
                self.request_question(next_url);
            }
            (Phase::Submitting, TransportOutcome::Answer(Ok(TransportResponse::Finished { message }))) => {
                self.state.server_message = message;
                self.victory().await;
            }
            (Phase::Submitting, TransportOutcome::Answer(Err(err))) => {
                info!(error = %err, "session: answer rejected");
                self.game_over(GameOverReason::Rejected, QuizError::from(err).to_string());
            }
            (phase, outcome) => {
                debug!(phase = phase.name(), ?outcome, "session: transport outcome ignored");
                return false;
            }
        }
        true
    }

    fn request_question(&mut self, url: String) {
        let transport = Arc::clone(&self.transport);
        let target = url.clone();
        self.state.phase = Phase::Loading { url };
        self.spawn_request(async move {
            TransportOutcome::Question(transport.fetch_question(&target).await)
        });
    }

    fn submit(&mut self, url: String, submission: AnswerSubmission) {
        let transport = Arc::clone(&self.transport);
        self.state.phase = Phase::Submitting;
        self.spawn_request(async move {
            TransportOutcome::Answer(transport.submit_answer(&url, &submission).await)
        });
    }

    fn spawn_request<F>(&mut self, request: F)
    where
        F: Future<Output = TransportOutcome> + Send + 'static,
    {
        self.last_request += 1;
        let id = self.last_request;
        self.pending_request = Some(id);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome = request.await;
            // The receiver lives as long as the controller.
            let _ = completions.send(TransportCompletion {
                request: id,
                outcome,
            });
        });
    }

    fn present(&mut self, question: Question) {
        let time_limit = question.time_limit.unwrap_or(self.config.time_limit);
        self.state.question_number += 1;
        info!(
            question_number = self.state.question_number,
            question_id = ?question.id,
            closed_choice = question.is_closed_choice(),
            time_limit_ms = duration_ms(time_limit),
            message = ?question.message,
            "session: presenting question"
        );

        self.timer.disarm();
        self.timer.arm(time_limit);
        self.state.question_started_at = Some(Instant::now());
        self.state.notice = None;
        self.state.phase = Phase::Presenting {
            question: Arc::new(question),
            time_limit,
            remaining: time_limit,
        };
    }

    /// Stops the countdown and commits the question's elapsed time. Returns
    /// `false` when expiry had already fired.
    fn leave_presenting(&mut self) -> bool {
        let cancelled = self.timer.disarm();
        if let Some(started) = self.state.question_started_at.take() {
            self.state.total_elapsed += started.elapsed();
        }
        self.state.notice = None;
        self.state.server_message = None;
        cancelled
    }

    async fn victory(&mut self) {
        let elapsed = self.state.total_elapsed;
        let nickname = self.state.nickname.clone().unwrap_or_default();
        let rank = self
            .leaderboard
            .record(ScoreEntry::new(nickname.clone(), elapsed))
            .await;
        self.scores = self.leaderboard.list().await;
        info!(
            nickname = %nickname,
            elapsed_ms = duration_ms(elapsed),
            rank = ?rank,
            "session: victory"
        );
        self.state.phase = Phase::Victory { elapsed, rank };
    }

    fn game_over(&mut self, reason: GameOverReason, detail: String) {
        self.timer.disarm();
        self.state.question_started_at = None;
        info!(reason = ?reason, detail = %detail, "session: game over");
        self.state.phase = Phase::GameOver { reason, detail };
    }

    fn current_time_limit(&self) -> Duration {
        match &self.state.phase {
            Phase::Presenting { time_limit, .. } => *time_limit,
            _ => self.config.time_limit,
        }
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(project(&self.state, &self.scores));
    }
}

fn project(state: &SessionState, scores: &[ScoreEntry]) -> SessionSnapshot {
    SessionSnapshot {
        phase: state.phase.clone(),
        nickname: state.nickname.clone(),
        question_number: state.question_number,
        total_elapsed: state.total_elapsed,
        notice: state.notice.clone(),
        server_message: state.server_message.clone(),
        leaderboard: scores.to_vec(),
    }
}

fn validate_nickname(raw: &str) -> Result<String, QuizError> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(QuizError::validation("Please enter a nickname to start."));
    }
    Ok(nickname.to_string())
}

/// Choice keys are matched trimmed; free text is submitted exactly as typed.
fn validate_answer(question: &Question, raw: &str) -> Result<String, QuizError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QuizError::validation("Please enter an answer."));
    }
    if !question.is_closed_choice() {
        return Ok(raw.to_string());
    }
    if !question.has_choice(trimmed) {
        return Err(QuizError::validation(format!(
            "'{trimmed}' is not one of the alternatives."
        )));
    }
    Ok(trimmed.to_string())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
