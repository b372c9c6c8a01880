//! Opaque state tokens carried between frame rounds.
//!
//! A token is the JSON form of [`GameState`] in standard base64. Decoding never
//! fails from the caller's point of view: anything that does not parse falls
//! back to a fresh welcome state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use truths_types::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    Empty,
    Base64,
    Utf8,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Decoded(GameState),
    Fallback(DecodeFailure),
}

impl DecodeResult {
    pub fn into_state(self) -> GameState {
        match self {
            DecodeResult::Decoded(state) => state,
            DecodeResult::Fallback(_) => GameState::default(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, DecodeResult::Fallback(_))
    }
}

pub fn encode_state(state: &GameState) -> String {
    // GameState only holds strings, integers and booleans, so this cannot fail.
    let json = serde_json::to_vec(state).unwrap_or_default();
    STANDARD.encode(json)
}

pub fn decode_state(token: &str) -> DecodeResult {
    let token = token.trim();
    if token.is_empty() {
        return DecodeResult::Fallback(DecodeFailure::Empty);
    }

    let bytes = match STANDARD.decode(token) {
        Ok(bytes) => bytes,
        Err(_) => return DecodeResult::Fallback(DecodeFailure::Base64),
    };

    let json = match String::from_utf8(bytes) {
        Ok(json) => json,
        Err(_) => return DecodeResult::Fallback(DecodeFailure::Utf8),
    };

    match serde_json::from_str::<GameState>(&json) {
        Ok(state) => DecodeResult::Decoded(state),
        Err(_) => DecodeResult::Fallback(DecodeFailure::Json),
    }
}

pub fn decode_state_or_default(token: &str) -> GameState {
    let result = decode_state(token);
    if let DecodeResult::Fallback(reason) = &result {
        tracing::debug!("Discarding undecodable state token ({:?}), starting at welcome", reason);
    }
    result.into_state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use truths_types::{GameView, Guess, Statement, User};

    fn sample_states() -> Vec<GameState> {
        let statements: Vec<Statement> = (1..=3)
            .map(|i| Statement {
                id: format!("s{}", i),
                user_id: "99".to_string(),
                text: format!("Statement number {} | with a pipe and ünïcödé", i),
                is_lie: i == 3,
            })
            .collect();

        let mut result = GameState::at(GameView::Result)
            .with_user(User {
                id: "12345".to_string(),
                username: "alice".to_string(),
                total_points: 300,
            })
            .with_statements(statements.clone());
        result.last_guess = Some(Guess {
            id: "g1".to_string(),
            user_id: "12345".to_string(),
            statement_id: "s3".to_string(),
            is_correct: true,
            points_earned: 100,
        });

        vec![
            GameState::default(),
            GameState::at(GameView::Auth),
            GameState::at(GameView::Create).with_user(User::new("1", "bob")),
            GameState::at(GameView::Play)
                .with_user(User::new("1", "bob"))
                .with_statements(statements),
            result,
            GameState::at(GameView::Leaderboard),
            GameState::at(GameView::Unrecognized),
        ]
    }

    #[test]
    fn test_round_trip_preserves_state() {
        for state in sample_states() {
            let token = encode_state(&state);
            assert_eq!(decode_state(&token), DecodeResult::Decoded(state));
        }
    }

    #[test]
    fn test_token_is_compatible_with_plain_json_base64() {
        let token = STANDARD.encode(r#"{"currentView":"create","user":{"id":"7","username":"carol","totalPoints":200}}"#);
        let state = decode_state_or_default(&token);

        assert_eq!(state.current_view, GameView::Create);
        assert_eq!(state.user.unwrap().total_points, 200);
    }

    #[test]
    fn test_garbage_falls_back_to_welcome() {
        let garbage = vec![
            String::new(),
            "   ".to_string(),
            "not base64 at all!!".to_string(),
            "e30".to_string(), // unpadded
            STANDARD.encode([0xff, 0xfe, 0x00]),
            STANDARD.encode("{}"),
            STANDARD.encode("[1,2,3]"),
            STANDARD.encode(r#"{"currentView":42}"#),
            STANDARD.encode(r#"{"currentView":"play","user":"nobody"}"#),
        ];

        for token in &garbage {
            assert!(decode_state(token).is_fallback(), "token {:?} should fall back", token);
            assert_eq!(decode_state_or_default(token), GameState::at(GameView::Welcome));
        }
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(decode_state(""), DecodeResult::Fallback(DecodeFailure::Empty));
        assert_eq!(decode_state("%%%"), DecodeResult::Fallback(DecodeFailure::Base64));
        assert_eq!(
            decode_state(&STANDARD.encode([0xc3, 0x28])),
            DecodeResult::Fallback(DecodeFailure::Utf8)
        );
        assert_eq!(
            decode_state(&STANDARD.encode("{")),
            DecodeResult::Fallback(DecodeFailure::Json)
        );
    }

    #[test]
    fn test_whitespace_around_token_is_ignored() {
        let state = GameState::at(GameView::Leaderboard);
        let token = format!("  {}\n", encode_state(&state));
        assert_eq!(decode_state_or_default(&token), state);
    }
}
