use super::*;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    answers: Arc<Mutex<Vec<Value>>>,
}

async fn question_one(State(_): State<ServerState>) -> Json<Value> {
    Json(json!({
        "id": 1,
        "question": "What is 2 + 2?",
        "nextURL": "/answer/1",
        "message": "You got your question!"
    }))
}

async fn answer_one(State(state): State<ServerState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let correct = body.get("answer") == Some(&json!("4"));
    state.answers.lock().await.push(body);
    if correct {
        (StatusCode::OK, Json(json!({"nextURL": "/question/2", "message": "Correct answer!"})))
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"message": "Wrong answer! :("})))
    }
}

async fn last_answer() -> Json<Value> {
    Json(json!({"message": "Correct answer!"}))
}

async fn broken_question() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_quiz_server() -> (String, ServerState) {
    let state = ServerState::default();
    let app = Router::new()
        .route("/question/1", get(question_one))
        .route("/answer/1", post(answer_one))
        .route("/answer/last", post(last_answer))
        .route("/question/broken", get(broken_question))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn fetches_and_decodes_question() {
    let (base, _) = spawn_quiz_server().await;
    let transport = HttpQuizTransport::new();

    let question = transport
        .fetch_question(&format!("{base}/question/1"))
        .await
        .expect("question");
    assert_eq!(question.id, Some(1));
    assert_eq!(question.text, "What is 2 + 2?");
    assert_eq!(question.submit_url, format!("{base}/answer/1"));
    assert!(!question.is_closed_choice());
    assert_eq!(question.message.as_deref(), Some("You got your question!"));
}

#[tokio::test]
async fn submits_answer_as_json_body() {
    let (base, state) = spawn_quiz_server().await;
    let transport = HttpQuizTransport::new();

    let response = transport
        .submit_answer(&format!("{base}/answer/1"), &AnswerSubmission::new("4"))
        .await
        .expect("response");
    assert_eq!(
        response,
        TransportResponse::Continue {
            next_url: format!("{base}/question/2"),
            message: Some("Correct answer!".into()),
        }
    );
    assert_eq!(state.answers.lock().await.as_slice(), [json!({"answer": "4"})]);
}

#[tokio::test]
async fn response_without_next_url_finishes() {
    let (base, _) = spawn_quiz_server().await;
    let response = HttpQuizTransport::new()
        .submit_answer(&format!("{base}/answer/last"), &AnswerSubmission::new("x"))
        .await
        .expect("response");
    assert_eq!(
        response,
        TransportResponse::Finished {
            message: Some("Correct answer!".into())
        }
    );
}

#[tokio::test]
async fn rejected_answer_maps_to_status_error() {
    let (base, _) = spawn_quiz_server().await;
    let err = HttpQuizTransport::new()
        .submit_answer(&format!("{base}/answer/1"), &AnswerSubmission::new("5"))
        .await
        .expect_err("wrong answer");
    assert_eq!(err, TransportError::Status(400));
}

#[tokio::test]
async fn missing_route_maps_to_status_error() {
    let (base, _) = spawn_quiz_server().await;
    let err = HttpQuizTransport::new()
        .fetch_question(&format!("{base}/question/404"))
        .await
        .expect_err("not found");
    assert_eq!(err, TransportError::Status(404));
}

#[tokio::test]
async fn malformed_body_maps_to_decode_error() {
    let (base, _) = spawn_quiz_server().await;
    let err = HttpQuizTransport::new()
        .fetch_question(&format!("{base}/question/broken"))
        .await
        .expect_err("bad body");
    assert!(matches!(err, TransportError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_server_maps_to_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = HttpQuizTransport::new()
        .fetch_question(&format!("http://{addr}/question/1"))
        .await
        .expect_err("refused");
    assert!(matches!(err, TransportError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn malformed_url_maps_to_invalid_url_error() {
    let err = HttpQuizTransport::new()
        .fetch_question("not a url")
        .await
        .expect_err("bad url");
    assert!(matches!(err, TransportError::InvalidUrl(_)), "{err:?}");
}

#[test]
fn absolute_links_are_kept_and_relative_links_resolved() {
    assert_eq!(
        resolve_url("http://quiz.test/question/1", "http://other.test/answer/1").expect("absolute"),
        "http://other.test/answer/1"
    );
    assert_eq!(
        resolve_url("http://quiz.test/question/1", "/answer/1").expect("relative"),
        "http://quiz.test/answer/1"
    );
}
