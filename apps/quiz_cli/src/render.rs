//! Terminal projection of session snapshots.

use std::{
    io::{self, Write},
    time::Duration,
};

use client_core::{Phase, SessionSnapshot};
use shared::domain::ScoreEntry;
use tokio::sync::watch;

const PROGRESS_WIDTH: usize = 30;

/// Prints every published snapshot. The screen is redrawn only when its text
/// changes; the countdown line is rewritten in place.
pub async fn run(mut snapshots: watch::Receiver<SessionSnapshot>) {
    let mut last_screen = String::new();
    let mut last_progress = String::new();

    loop {
        let (screen, progress) = {
            let snapshot = snapshots.borrow_and_update();
            (render_screen(&snapshot), render_progress(&snapshot))
        };

        {
            let mut out = io::stdout().lock();
            if screen != last_screen {
                let _ = writeln!(out, "\n{screen}");
                last_progress.clear();
                last_screen = screen;
            }
            if let Some(progress) = progress {
                if progress != last_progress {
                    let _ = write!(out, "\r{progress} > ");
                    last_progress = progress;
                }
            }
            let _ = out.flush();
        }

        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

pub fn render_screen(snapshot: &SessionSnapshot) -> String {
    let mut screen = match &snapshot.phase {
        Phase::Idle => "Starting...".to_string(),
        Phase::AwaitingNickname => {
            let mut text = String::from("== Welcome to the Quiz! ==\n");
            if !snapshot.leaderboard.is_empty() {
                text.push_str(&render_leaderboard(&snapshot.leaderboard));
                text.push('\n');
            }
            text.push_str("Enter your nickname to start:");
            text
        }
        Phase::Loading { .. } => "Loading question...".to_string(),
        Phase::Presenting { question, .. } => {
            let mut text = format!(
                "Question {}: {}",
                snapshot.question_number, question.text
            );
            match question.alternatives.as_deref() {
                Some(alternatives) => {
                    for (index, alt) in alternatives.iter().enumerate() {
                        text.push_str(&format!("\n  {}) {}", index + 1, alt.text));
                    }
                    text.push_str("\nPick an alternative by number:");
                }
                None => text.push_str("\nType your answer:"),
            }
            text
        }
        Phase::Submitting => "Checking answer...".to_string(),
        Phase::Victory { elapsed, rank } => {
            let mut text = format!(
                "== You won, {}! ==\nTotal time: {}",
                snapshot.nickname.as_deref().unwrap_or("player"),
                format_elapsed(*elapsed)
            );
            if let Some(rank) = rank {
                text.push_str(&format!("\nNew high score at place {rank}!"));
            }
            text.push('\n');
            text.push_str(&render_leaderboard(&snapshot.leaderboard));
            text.push_str("\n[r]estart or [q]uit:");
            text
        }
        Phase::GameOver { reason, .. } => {
            format!("== Game Over ==\n{reason}\n[r]estart or [q]uit:")
        }
    };

    if let Some(remark) = &snapshot.server_message {
        screen = format!("Server: {remark}\n{screen}");
    }
    if let Some(notice) = &snapshot.notice {
        screen.push_str(&format!("\n! {notice}"));
    }
    screen
}

pub fn render_progress(snapshot: &SessionSnapshot) -> Option<String> {
    let Phase::Presenting {
        remaining,
        time_limit,
        ..
    } = &snapshot.phase
    else {
        return None;
    };
    Some(format!(
        "[{}] {:>2}s",
        progress_bar(*remaining, *time_limit, PROGRESS_WIDTH),
        remaining.as_secs_f64().ceil() as u64
    ))
}

pub fn progress_bar(remaining: Duration, limit: Duration, width: usize) -> String {
    let fraction = if limit.is_zero() {
        0.0
    } else {
        (remaining.as_secs_f64() / limit.as_secs_f64()).clamp(0.0, 1.0)
    };
    let filled = (fraction * width as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn render_leaderboard(entries: &[ScoreEntry]) -> String {
    if entries.is_empty() {
        return "High scores: none yet".to_string();
    }
    let mut text = String::from("High scores:");
    for (index, entry) in entries.iter().enumerate() {
        text.push_str(&format!(
            "\n  {}. {:<16} {}",
            index + 1,
            entry.nickname,
            format_elapsed(entry.elapsed())
        ));
    }
    text
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2} s", elapsed.as_secs_f64())
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
