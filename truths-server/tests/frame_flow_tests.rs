
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::json;
use test_helpers::*;
use truths_core::{GameStore, Opponent, StoreError, StoreResult, encode_state};
use truths_types::{GameState, GameView, Guess, Statement, User};

const AUTHOR: u64 = 2002;
const GUESSER: u64 = 1001;

/// Store whose every call fails
struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Backend(anyhow::anyhow!("database is down")))
}

#[async_trait::async_trait]
impl GameStore for FailingStore {
    async fn upsert_user(&self, _identity: &str, _display_name: &str) -> StoreResult<User> {
        unavailable()
    }

    async fn create_statements(
        &self,
        _user_id: &str,
        _truth1: &str,
        _truth2: &str,
        _lie: &str,
    ) -> StoreResult<Vec<Statement>> {
        unavailable()
    }

    async fn find_opponent_with_statements(
        &self,
        _excluding_user_id: &str,
    ) -> StoreResult<Option<Opponent>> {
        unavailable()
    }

    async fn record_guess(&self, _user_id: &str, _statement_id: &str) -> StoreResult<Guess> {
        unavailable()
    }

    async fn top_users(&self, _limit: u64) -> StoreResult<Vec<User>> {
        unavailable()
    }
}

/// Signs the author in and submits a statement set, leaving them on play
async fn author_creates_statements(server: &TestFrameServer) {
    let create = server.sign_in(AUTHOR, "author").await;
    let play = server
        .submit(&create, AUTHOR, "I ran a marathon|I play the cello|I met the Queen")
        .await;
    assert_eq!(play.state().current_view, GameView::Play);
}

#[tokio::test]
async fn test_sign_in_reaches_create() {
    let server = TestFrameServer::new();

    let create = server.sign_in(GUESSER, "guesser").await;

    assert_eq!(create.status, 200);
    assert_eq!(create.title(), "Create Your Statements");
    assert_eq!(create.buttons(), vec!["Submit", "Skip to Play", "View Leaderboard"]);
    assert_eq!(
        create.meta("fc:frame:input:text").as_deref(),
        Some("Enter your statements")
    );

    let state = create.state();
    let user = state.user.unwrap();
    assert_eq!(user.id, "1001");
    assert_eq!(user.username, "guesser");
    assert!(server.store.find_user("1001").is_some());
}

#[tokio::test]
async fn test_sign_in_without_fid_returns_to_welcome() {
    let server = TestFrameServer::new();
    let token = encode_state(&GameState::at(GameView::Auth));

    let frame = server
        .post(json!({ "isValid": true, "button": 1, "state": token }))
        .await;

    assert_eq!(frame.state().current_view, GameView::Welcome);
    assert_eq!(frame.buttons(), vec!["Sign in with Farcaster"]);
}

#[tokio::test]
async fn test_full_round_over_http() {
    let server = TestFrameServer::new();
    author_creates_statements(&server).await;

    let create = server.sign_in(GUESSER, "guesser").await;
    let empty_play = server.press(&create, GUESSER, 2).await;
    assert_eq!(empty_play.buttons(), vec!["Show Statements"]);

    let play = server.press(&empty_play, GUESSER, 1).await;
    assert_eq!(play.title(), "Which one is the lie?");
    let buttons = play.buttons();
    assert_eq!(buttons.len(), 4);
    assert_eq!(buttons[3], "View Leaderboard");

    let lie_button = buttons
        .iter()
        .position(|label| label == "I met the Queen")
        .unwrap() as u32
        + 1;
    let result = server.press(&play, GUESSER, lie_button).await;

    assert_eq!(result.title(), "Correct! 🎉");
    assert_eq!(
        result.meta("og:description").as_deref(),
        Some("You earned 100 points! Your total: 100")
    );
    assert_eq!(server.store.find_user("1001").unwrap().total_points, 100);

    let leaderboard = server.press(&result, GUESSER, 3).await;
    assert_eq!(leaderboard.title(), "Leaderboard");
    assert_eq!(
        leaderboard.meta("og:description").as_deref(),
        Some("Top players:\n1. guesser: 100 points\n2. author: 0 points")
    );
}

#[tokio::test]
async fn test_wrong_guess_scores_nothing() {
    let server = TestFrameServer::new();
    author_creates_statements(&server).await;

    let create = server.sign_in(GUESSER, "guesser").await;
    let empty_play = server.press(&create, GUESSER, 2).await;
    let play = server.press(&empty_play, GUESSER, 1).await;

    let truth_button = play
        .buttons()
        .iter()
        .position(|label| label == "I play the cello")
        .unwrap() as u32
        + 1;
    let result = server.press(&play, GUESSER, truth_button).await;

    assert_eq!(result.title(), "Wrong! 😢");
    assert_eq!(server.store.find_user("1001").unwrap().total_points, 0);
    assert_eq!(server.store.guesses_for("1001").len(), 1);
}

#[tokio::test]
async fn test_malformed_statements_stay_on_create() {
    let server = TestFrameServer::new();
    let create = server.sign_in(AUTHOR, "author").await;

    let frame = server.submit(&create, AUTHOR, "only|two").await;

    assert_eq!(frame.state().current_view, GameView::Create);
    assert!(server.store.statements_for("2002").is_empty());
}

#[tokio::test]
async fn test_play_without_opponents_routes_to_create() {
    let server = TestFrameServer::new();
    let create = server.sign_in(GUESSER, "guesser").await;
    let empty_play = server.press(&create, GUESSER, 2).await;

    let frame = server.press(&empty_play, GUESSER, 1).await;

    assert_eq!(frame.state().current_view, GameView::Create);
}

#[tokio::test]
async fn test_garbage_state_starts_over() {
    let server = TestFrameServer::new();

    let frame = server
        .post(json!({ "isValid": true, "button": 1, "state": "%%%not-a-token%%%", "fid": 1 }))
        .await;

    assert_eq!(frame.status, 200);
    // Welcome plus any button moves to auth
    assert_eq!(frame.state().current_view, GameView::Auth);
}

#[tokio::test]
async fn test_signed_body_in_dev_mode() {
    let server = TestFrameServer::new();
    let token = encode_state(&GameState::at(GameView::Auth));

    let frame = server
        .post(json!({
            "untrustedData": { "fid": 4242, "buttonIndex": 1, "state": token },
            "trustedData": { "messageBytes": "0a0b" }
        }))
        .await;

    assert_eq!(frame.state().current_view, GameView::Create);
    assert_eq!(frame.state().user.unwrap().username, "User_4242");
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = create_app(Arc::new(FailingStore));
    let routes = truths_server::create_routes(app);
    let token = encode_state(&GameState::at(GameView::Auth));

    let response = warp::test::request()
        .method("POST")
        .path("/api/frames")
        .json(&frame_message(Some(token), GUESSER, 1, None))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_leaderboard_failure_still_renders() {
    let app = create_app(Arc::new(FailingStore));
    let routes = truths_server::create_routes(app);
    let token = encode_state(&GameState::at(GameView::Create));

    let response = warp::test::request()
        .method("POST")
        .path("/api/frames")
        .json(&frame_message(Some(token), GUESSER, 3, None))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let html = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(html.contains("Could not load leaderboard."));
}

#[tokio::test]
async fn test_concurrent_guessers_keep_every_point() {
    let server = TestFrameServer::new();
    author_creates_statements(&server).await;

    let create = server.sign_in(GUESSER, "guesser").await;
    let empty_play = server.press(&create, GUESSER, 2).await;
    let play = server.press(&empty_play, GUESSER, 1).await;
    let lie_button = play
        .buttons()
        .iter()
        .position(|label| label == "I met the Queen")
        .unwrap() as u32
        + 1;

    // The same frame submitted several times at once
    let presses = (0..8).map(|_| server.press(&play, GUESSER, lie_button));
    for frame in join_all(presses).await {
        assert_eq!(frame.title(), "Correct! 🎉");
    }

    assert_eq!(server.store.find_user("1001").unwrap().total_points, 800);
}
