//! Turns a [`GameState`] into frame content.
//!
//! Only the content is decided here. The HTML document and the preview image
//! are produced by the server from [`FrameContent`] and [`PreviewCard`].

use truths_types::{FrameContent, GameState, GameView, PreviewCard, STATEMENTS_PER_SET, User};

use crate::codec::encode_state;
use crate::store::GameStore;

pub const GAME_TITLE: &str = "Two Truths and a Lie";
pub const DEFAULT_LEADERBOARD_SIZE: u64 = 10;
pub const MAX_BUTTONS: usize = 4;

const CREATE_INSTRUCTIONS: &str = "Enter 2 truths and 1 lie separated by | (pipe character).";
const CREATE_EXAMPLE: &str =
    "Example: I can speak 3 languages|I've been to Japan|I have a pet tiger";

#[derive(Debug, Clone)]
pub struct FramePresenter {
    public_url: String,
    leaderboard_size: u64,
}

impl FramePresenter {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    pub fn with_leaderboard_size(mut self, size: u64) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn post_url(&self) -> String {
        format!("{}/api/frames", self.public_url)
    }

    /// Preview image URL; it embeds the token so the preview shows the same state.
    pub fn image_url(&self, token: &str) -> String {
        format!(
            "{}/api/frames/image?state={}",
            self.public_url,
            urlencoding::encode(token)
        )
    }

    pub async fn present<S: GameStore + ?Sized>(&self, state: &GameState, store: &S) -> FrameContent {
        let leaderboard = if state.current_view == GameView::Leaderboard {
            match store.top_users(self.leaderboard_size).await {
                Ok(users) => Some(users),
                Err(err) => {
                    tracing::error!("Failed to fetch leaderboard: {}", err);
                    None
                }
            }
        } else {
            None
        };

        self.render(state, leaderboard.as_deref())
    }

    /// Builds the content for `state`. `leaderboard` is only consulted on the
    /// leaderboard view; `None` there means it could not be loaded.
    pub fn render(&self, state: &GameState, leaderboard: Option<&[User]>) -> FrameContent {
        let token = encode_state(state);
        let mut title = GAME_TITLE.to_string();
        let mut accepts_input = false;

        let (description, buttons): (String, Vec<String>) = match state.current_view {
            GameView::Auth => ("Authenticating with Farcaster...".to_string(), Vec::new()),
            GameView::Create => {
                title = "Create Your Statements".to_string();
                accepts_input = true;
                (
                    format!("{}\n{}", CREATE_INSTRUCTIONS, CREATE_EXAMPLE),
                    labels(&["Submit", "Skip to Play", "View Leaderboard"]),
                )
            }
            GameView::Play => match &state.statements {
                Some(statements) if state.has_full_round() => {
                    title = "Which one is the lie?".to_string();
                    let buttons = statements
                        .iter()
                        .take(STATEMENTS_PER_SET)
                        .map(|statement| statement.text.clone())
                        .chain(std::iter::once("View Leaderboard".to_string()))
                        .collect();
                    ("Select the statement you think is a lie:".to_string(), buttons)
                }
                _ => (
                    "Find someone to play against.".to_string(),
                    labels(&["Show Statements"]),
                ),
            },
            GameView::Result => match &state.last_guess {
                Some(guess) if guess.is_correct => {
                    title = "Correct! 🎉".to_string();
                    (
                        format!(
                            "You earned {} points! Your total: {}",
                            guess.points_earned,
                            total_points(state)
                        ),
                        labels(&["Play Again", "Create New Statements", "View Leaderboard"]),
                    )
                }
                Some(_) => {
                    title = "Wrong! 😢".to_string();
                    (
                        "Better luck next time!".to_string(),
                        labels(&["Play Again", "Create New Statements", "View Leaderboard"]),
                    )
                }
                None => ("Something went wrong...".to_string(), labels(&["Play Again"])),
            },
            GameView::Leaderboard => {
                title = "Leaderboard".to_string();
                (
                    leaderboard_description(leaderboard),
                    labels(&["Play", "Create New Statements"]),
                )
            }
            GameView::Welcome | GameView::Unrecognized => (
                "Play the classic game of Two Truths and a Lie with your Farcaster friends!"
                    .to_string(),
                labels(&["Sign in with Farcaster"]),
            ),
        };

        FrameContent {
            title,
            description,
            buttons,
            accepts_input,
            image_url: self.image_url(&token),
            post_url: self.post_url(),
            state: token,
        }
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn total_points(state: &GameState) -> i32 {
    state.user.as_ref().map(|user| user.total_points).unwrap_or(0)
}

/// `"<rank>. <username>: <points> points"` per line, in the given order.
pub fn leaderboard_lines(users: &[User]) -> Vec<String> {
    users
        .iter()
        .enumerate()
        .map(|(index, user)| format!("{}. {}: {} points", index + 1, user.username, user.total_points))
        .collect()
}

fn leaderboard_description(leaderboard: Option<&[User]>) -> String {
    match leaderboard {
        Some([]) => "No players yet. Be the first!".to_string(),
        Some(users) => format!("Top players:\n{}", leaderboard_lines(users).join("\n")),
        None => "Could not load leaderboard.".to_string(),
    }
}

/// Text drawn on the preview image. Depends on the decoded state alone.
pub fn preview_card(state: &GameState) -> PreviewCard {
    let (headline, lines): (&str, Vec<String>) = match state.current_view {
        GameView::Auth => ("Authenticating with Farcaster...", Vec::new()),
        GameView::Create => (
            "Create Your Statements",
            vec![CREATE_INSTRUCTIONS.to_string(), CREATE_EXAMPLE.to_string()],
        ),
        GameView::Play => match &state.statements {
            Some(statements) if state.has_full_round() => (
                "Which one is the lie?",
                statements
                    .iter()
                    .take(STATEMENTS_PER_SET)
                    .enumerate()
                    .map(|(index, statement)| format!("{}. {}", index + 1, statement.text))
                    .collect(),
            ),
            _ => ("Which one is the lie?", vec!["Loading statements...".to_string()]),
        },
        GameView::Result => match &state.last_guess {
            Some(guess) if guess.is_correct => {
                let mut lines = vec![format!("You earned {} points!", guess.points_earned)];
                if let Some(user) = &state.user {
                    lines.push(format!("Your total: {} points", user.total_points));
                }
                ("Correct! 🎉", lines)
            }
            Some(_) => ("Wrong! 😢", vec!["Better luck next time!".to_string()]),
            None => ("Something went wrong...", Vec::new()),
        },
        GameView::Leaderboard => ("Leaderboard", Vec::new()),
        GameView::Welcome | GameView::Unrecognized => (
            GAME_TITLE,
            vec![
                "Play the classic game with your Farcaster friends!".to_string(),
                "Sign in with Farcaster to get started".to_string(),
            ],
        ),
    };

    PreviewCard {
        headline: headline.to_string(),
        lines,
    }
}
