use anyhow::{anyhow, Result};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

pub mod session;
pub mod timer;
pub mod transport;

pub use session::{
    Phase, SessionCommand, SessionConfig, SessionController, SessionEvent, SessionSnapshot,
};
pub use timer::{CountdownTimer, TimerEvent, TimerNotification};
pub use transport::{HttpQuizTransport, QuizTransport};

const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Presentation-side handle to a running session controller.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("session controller has stopped"))
    }

    pub async fn open(&self) -> Result<()> {
        self.send(SessionCommand::Open).await
    }

    pub async fn confirm_nickname(&self, nickname: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::ConfirmNickname(nickname.into()))
            .await
    }

    pub async fn submit_answer(&self, answer: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::SubmitAnswer(answer.into())).await
    }

    pub async fn restart(&self) -> Result<()> {
        self.send(SessionCommand::Restart).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Moves `controller` onto its own task and returns the handle used to drive it.
pub fn spawn_session(controller: SessionController) -> (SessionHandle, JoinHandle<()>) {
    let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let snapshots = controller.subscribe();
    let task = tokio::spawn(controller.run(command_rx));
    (
        SessionHandle {
            commands,
            snapshots,
        },
        task,
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
