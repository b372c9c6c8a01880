use std::sync::Arc;

use truths_core::{GameEngine, MemoryStore};
use truths_types::{FrameAction, GameState, GameView, Statement, User, VerifiedIdentity};

pub const GUESSER_ID: &str = "1001";
pub const OPPONENT_ID: &str = "2002";

/// Creates a store holding a guesser and one opponent with a full statement set
pub async fn create_seeded_store() -> (Arc<MemoryStore>, Vec<Statement>) {
    use truths_core::GameStore;

    let store = Arc::new(MemoryStore::new());
    store.upsert_user(GUESSER_ID, "guesser").await.unwrap();
    store.upsert_user(OPPONENT_ID, "opponent").await.unwrap();
    let statements = store
        .create_statements(OPPONENT_ID, "I ran a marathon", "I play the cello", "I met the Queen")
        .await
        .unwrap();
    (store, statements)
}

pub fn create_engine(store: &Arc<MemoryStore>) -> GameEngine<MemoryStore> {
    GameEngine::new(store.clone())
}

pub fn guesser() -> User {
    User::new(GUESSER_ID, "guesser")
}

pub fn identity(fid: &str, username: &str) -> VerifiedIdentity {
    VerifiedIdentity::new(fid, Some(username.to_string()))
}

/// State on the given view with the guesser signed in
pub fn signed_in_at(view: GameView) -> GameState {
    GameState::at(view).with_user(guesser())
}

pub fn press(button: u32) -> FrameAction {
    FrameAction::button(button)
}
