use super::*;
use shared::domain::{Alternative, GameOverReason, Question};
use std::{sync::Arc, time::Duration};

fn snapshot(phase: Phase) -> SessionSnapshot {
    SessionSnapshot {
        phase,
        nickname: None,
        question_number: 1,
        total_elapsed: Duration::ZERO,
        notice: None,
        server_message: None,
        leaderboard: Vec::new(),
    }
}

fn presenting(alternatives: Option<Vec<Alternative>>) -> SessionSnapshot {
    snapshot(Phase::Presenting {
        question: Arc::new(Question {
            id: None,
            text: "?".into(),
            alternatives,
            submit_url: "http://quiz/answer/1".into(),
            time_limit: None,
            message: None,
        }),
        time_limit: Duration::from_secs(10),
        remaining: Duration::from_secs(10),
    })
}

fn choices() -> Option<Vec<Alternative>> {
    Some(vec![
        Alternative {
            key: "alt1".into(),
            text: "yes".into(),
        },
        Alternative {
            key: "alt2".into(),
            text: "no".into(),
        },
    ])
}

fn answer(text: &str) -> Input {
    Input::Command(SessionCommand::SubmitAnswer(text.into()))
}

#[test]
fn nickname_line_is_forwarded_untrimmed() {
    assert_eq!(
        interpret(" Ada ", &snapshot(Phase::AwaitingNickname)),
        Input::Command(SessionCommand::ConfirmNickname(" Ada ".into()))
    );
}

#[test]
fn numeric_choice_maps_to_alternative_key() {
    let view = presenting(choices());
    assert_eq!(interpret("2", &view), answer("alt2"));
    assert_eq!(interpret("alt1", &view), answer("alt1"));
    // Out of range positions go through as-is and are rejected by the controller.
    assert_eq!(interpret("0", &view), answer("0"));
    assert_eq!(interpret("3", &view), answer("3"));
}

#[test]
fn free_text_answer_is_not_translated() {
    assert_eq!(interpret("2", &presenting(None)), answer("2"));
}

#[test]
fn terminal_phases_accept_restart_and_quit() {
    let over = snapshot(Phase::GameOver {
        reason: GameOverReason::Rejected,
        detail: String::new(),
    });
    assert_eq!(interpret("", &over), Input::Command(SessionCommand::Restart));
    assert_eq!(interpret("R", &over), Input::Command(SessionCommand::Restart));
    assert_eq!(interpret("q", &over), Input::Quit);
    assert_eq!(interpret("maybe", &over), Input::Ignore);
}

#[test]
fn busy_phases_ignore_input_but_quit_always_works() {
    let loading = snapshot(Phase::Loading {
        url: "http://quiz/question/1".into(),
    });
    assert_eq!(interpret("alt1", &loading), Input::Ignore);
    assert_eq!(interpret("alt1", &snapshot(Phase::Submitting)), Input::Ignore);
    assert_eq!(interpret("/quit", &loading), Input::Quit);
    assert_eq!(interpret("/QUIT", &presenting(None)), Input::Quit);
}
