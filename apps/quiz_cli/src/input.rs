//! Maps typed lines onto session commands for the phase on screen.

use client_core::{Phase, SessionCommand, SessionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(SessionCommand),
    Quit,
    Ignore,
}

pub fn interpret(line: &str, snapshot: &SessionSnapshot) -> Input {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("/quit") {
        return Input::Quit;
    }

    match &snapshot.phase {
        Phase::AwaitingNickname => Input::Command(SessionCommand::ConfirmNickname(line.to_string())),
        Phase::Presenting { question, .. } => {
            let answer = match question.alternatives.as_deref() {
                // Accept the 1-based position shown on screen, or the raw key.
                Some(alternatives) => trimmed
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| alternatives.get(index))
                    .map(|alt| alt.key.clone())
                    .unwrap_or_else(|| trimmed.to_string()),
                None => line.to_string(),
            };
            Input::Command(SessionCommand::SubmitAnswer(answer))
        }
        Phase::Victory { .. } | Phase::GameOver { .. } => match trimmed.to_ascii_lowercase().as_str() {
            "" | "r" | "restart" => Input::Command(SessionCommand::Restart),
            "q" | "quit" => Input::Quit,
            _ => Input::Ignore,
        },
        Phase::Idle | Phase::Loading { .. } | Phase::Submitting => Input::Ignore,
    }
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
