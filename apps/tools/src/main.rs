use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::{Leaderboard, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/quiz.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored high scores, fastest first.
    Scores,
    /// Remove every stored high score.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;
    let leaderboard = Leaderboard::new(Arc::new(storage));

    match cli.command {
        Command::Scores => {
            let scores = leaderboard.list().await;
            if scores.is_empty() {
                println!("no high scores recorded");
            }
            for (index, entry) in scores.iter().enumerate() {
                println!(
                    "{}. {} {:.2}s",
                    index + 1,
                    entry.nickname,
                    entry.elapsed().as_secs_f64()
                );
            }
        }
        Command::Clear => {
            leaderboard.clear().await;
            println!("cleared high scores");
        }
    }

    Ok(())
}
