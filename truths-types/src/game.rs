use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::user::{User, UserId};

pub type StatementId = String;
pub type GuessId = String;

pub const POINTS_PER_CORRECT_GUESS: i32 = 100;
pub const STATEMENTS_PER_SET: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Statement {
    pub id: StatementId,
    pub user_id: UserId,
    pub text: String,
    pub is_lie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Guess {
    pub id: GuessId,
    pub user_id: UserId,
    pub statement_id: StatementId,
    pub is_correct: bool,
    pub points_earned: i32,
}

impl Guess {
    /// Points awarded for guessing a statement with the given lie flag.
    pub fn points_for(is_correct: bool) -> i32 {
        if is_correct { POINTS_PER_CORRECT_GUESS } else { 0 }
    }
}

/// Phase of the frame state machine.
///
/// Serialized as the lowercase view name. Any other string decodes to
/// [`GameView::Unrecognized`], which the engine routes back to welcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TS)]
#[ts(export, rename_all = "lowercase")]
pub enum GameView {
    #[default]
    Welcome,
    Auth,
    Create,
    Play,
    Result,
    Leaderboard,
    #[ts(skip)]
    Unrecognized,
}

impl GameView {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameView::Welcome => "welcome",
            GameView::Auth => "auth",
            GameView::Create => "create",
            GameView::Play => "play",
            GameView::Result => "result",
            GameView::Leaderboard => "leaderboard",
            GameView::Unrecognized => "unrecognized",
        }
    }

    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "welcome" => GameView::Welcome,
            "auth" => GameView::Auth,
            "create" => GameView::Create,
            "play" => GameView::Play,
            "result" => GameView::Result,
            "leaderboard" => GameView::Leaderboard,
            _ => GameView::Unrecognized,
        }
    }
}

impl fmt::Display for GameView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GameView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GameView {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(GameView::from_wire(&raw))
    }
}

/// The whole session, carried by the client between rounds.
///
/// There is no server-side session store: every request receives one of these
/// by value and the response carries the next one back out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameState {
    pub current_view: GameView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Opponent statements in the order shown for this round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<Statement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_statement_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_guess: Option<Guess>,
}

impl GameState {
    pub fn at(view: GameView) -> Self {
        Self {
            current_view: view,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_statements(mut self, statements: Vec<Statement>) -> Self {
        self.statements = Some(statements);
        self.current_statement_index = Some(0);
        self
    }

    /// Drops the loaded opponent so the next play round selects a new one.
    pub fn clear_round(&mut self) {
        self.statements = None;
        self.current_statement_index = None;
        self.last_guess = None;
    }

    pub fn has_full_round(&self) -> bool {
        self.statements
            .as_ref()
            .is_some_and(|statements| statements.len() >= STATEMENTS_PER_SET)
    }
}
