use std::sync::Arc;

use shared::domain::ScoreEntry;
use storage::{Leaderboard, Storage};

#[tokio::test]
async fn leaderboard_survives_process_restart() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("quiz.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let storage = Storage::new(&database_url).await.expect("db");
        let leaderboard = Leaderboard::new(Arc::new(storage));
        leaderboard
            .record(ScoreEntry {
                nickname: "Ada".into(),
                elapsed_ms: 4200,
            })
            .await;
        leaderboard
            .record(ScoreEntry {
                nickname: "Grace".into(),
                elapsed_ms: 3100,
            })
            .await;
    }

    let reopened = Storage::new(&database_url).await.expect("reopen db");
    let leaderboard = Leaderboard::new(Arc::new(reopened));
    let listed = leaderboard.list().await;

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].nickname, "Grace");
    assert_eq!(listed[1].nickname, "Ada");
}
