//! The frame state machine.
//!
//! [`GameEngine::advance`] maps `(state, action)` to the next state. Actions
//! that make no sense for the current view hold the state where it is; only
//! store failures are reported as errors.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info};
use truths_types::{FrameAction, GameState, GameView, STATEMENTS_PER_SET};

use crate::error::StoreResult;
use crate::store::GameStore;

/// Why an action left the state at its current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// The button has no meaning on this view.
    UnmappedButton,
    /// Submitted statements did not split into three non-empty parts.
    MalformedStatements,
    /// The view needs a signed-in user and the state has none.
    MissingUser,
    /// The opponent's statements were loaded; the action was not used as a guess.
    RoundLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Advanced,
    Held(HoldReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: GameState,
    pub outcome: Outcome,
}

impl Transition {
    fn advanced(state: GameState) -> Self {
        Self {
            state,
            outcome: Outcome::Advanced,
        }
    }

    fn held(state: GameState, reason: HoldReason) -> Self {
        Self {
            state,
            outcome: Outcome::Held(reason),
        }
    }

    pub fn view(&self) -> GameView {
        self.state.current_view
    }
}

pub struct GameEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for GameEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: GameStore + ?Sized> GameEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn advance(&self, state: GameState, action: &FrameAction) -> StoreResult<Transition> {
        let from = state.current_view;
        let transition = match from {
            GameView::Welcome => Ok(Self::move_to(state, GameView::Auth)),
            GameView::Auth => self.authenticate(state, action).await,
            GameView::Create => self.create(state, action).await,
            GameView::Play => self.play(state, action).await,
            GameView::Result => Ok(Self::result(state, action)),
            GameView::Leaderboard => Ok(Self::leaderboard(state, action)),
            GameView::Unrecognized => Ok(Self::move_to(state, GameView::Welcome)),
        }?;

        debug!(
            "Frame transition {} -> {} (button {}, {:?})",
            from,
            transition.view(),
            action.button_index,
            transition.outcome
        );
        Ok(transition)
    }

    fn move_to(mut state: GameState, view: GameView) -> Transition {
        state.current_view = view;
        Transition::advanced(state)
    }

    async fn authenticate(&self, state: GameState, action: &FrameAction) -> StoreResult<Transition> {
        let Some(identity) = &action.identity else {
            return Ok(Self::move_to(state, GameView::Welcome));
        };

        let user = self.store.upsert_user(&identity.fid, &identity.username).await?;
        info!("User {} ({}) signed in", user.id, user.username);

        Ok(Self::move_to(state.with_user(user), GameView::Create))
    }

    async fn create(&self, mut state: GameState, action: &FrameAction) -> StoreResult<Transition> {
        match action.button_index {
            1 => {
                let Some(input) = action.input() else {
                    return Ok(Transition::held(state, HoldReason::UnmappedButton));
                };
                let Some([truth1, truth2, lie]) = split_statements(input) else {
                    return Ok(Transition::held(state, HoldReason::MalformedStatements));
                };
                let Some(user) = &state.user else {
                    return Ok(Transition::held(state, HoldReason::MissingUser));
                };

                self.store
                    .create_statements(&user.id, truth1, truth2, lie)
                    .await?;
                info!("User {} created a statement set", user.id);

                state.clear_round();
                Ok(Self::move_to(state, GameView::Play))
            }
            2 => Ok(Self::move_to(state, GameView::Play)),
            3 => Ok(Self::move_to(state, GameView::Leaderboard)),
            _ => Ok(Transition::held(state, HoldReason::UnmappedButton)),
        }
    }

    async fn play(&self, mut state: GameState, action: &FrameAction) -> StoreResult<Transition> {
        let Some(user) = state.user.clone() else {
            return Ok(Self::move_to(state, GameView::Welcome));
        };

        if !state.has_full_round() {
            if state.statements.is_some() {
                debug!("Discarding incomplete round for {}", user.id);
            }
            let Some(opponent) = self.store.find_opponent_with_statements(&user.id).await? else {
                debug!("No opponent available for {}, sending to create", user.id);
                return Ok(Self::move_to(state, GameView::Create));
            };

            let mut statements = opponent.statements;
            statements.shuffle(&mut rand::thread_rng());
            debug!("Loaded statements of {} for {}", opponent.user.id, user.id);

            return Ok(Transition::held(
                state.with_statements(statements),
                HoldReason::RoundLoaded,
            ));
        }

        match action.button_index {
            button @ 1..=3 => {
                let target = state
                    .statements
                    .as_ref()
                    .and_then(|statements| statements.get((button - 1) as usize));
                let Some(statement_id) = target.map(|statement| statement.id.clone()) else {
                    return Ok(Transition::held(state, HoldReason::UnmappedButton));
                };

                let guess = self.store.record_guess(&user.id, &statement_id).await?;
                info!(
                    "User {} guessed {} ({})",
                    user.id,
                    statement_id,
                    if guess.is_correct { "correct" } else { "wrong" }
                );

                if guess.is_correct {
                    if let Some(snapshot) = state.user.as_mut() {
                        // The token total is client-supplied; never let it go negative or wrap
                        snapshot.total_points =
                            snapshot.total_points.max(0).saturating_add(guess.points_earned);
                    }
                }
                state.last_guess = Some(guess);
                Ok(Self::move_to(state, GameView::Result))
            }
            4 => Ok(Self::move_to(state, GameView::Leaderboard)),
            _ => Ok(Transition::held(state, HoldReason::UnmappedButton)),
        }
    }

    fn result(mut state: GameState, action: &FrameAction) -> Transition {
        match action.button_index {
            1 => {
                state.clear_round();
                Self::move_to(state, GameView::Play)
            }
            2 => Self::move_to(state, GameView::Create),
            3 => Self::move_to(state, GameView::Leaderboard),
            _ => Transition::held(state, HoldReason::UnmappedButton),
        }
    }

    fn leaderboard(mut state: GameState, action: &FrameAction) -> Transition {
        match action.button_index {
            1 => {
                state.clear_round();
                Self::move_to(state, GameView::Play)
            }
            2 => Self::move_to(state, GameView::Create),
            _ => Transition::held(state, HoldReason::UnmappedButton),
        }
    }
}

/// Splits `truth|truth|lie` into exactly three trimmed, non-empty parts.
pub fn split_statements(input: &str) -> Option<[&str; STATEMENTS_PER_SET]> {
    let parts: Vec<&str> = input.split('|').map(str::trim).collect();
    let parts: [&str; STATEMENTS_PER_SET] = parts.try_into().ok()?;
    if parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(parts)
}
