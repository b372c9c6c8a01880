use serde::Deserialize;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{Filter, Reply};

use truths_core::{
    DEFAULT_LEADERBOARD_SIZE, FramePresenter, GameEngine, GameStore, decode_state_or_default,
    preview_card,
};
use truths_persistence::LeaderboardEntry;
use truths_types::{ErrorBody, FrameRequest, GameState};

use crate::frame_html::render_frame_document;
use crate::image::render_preview_svg;
use crate::verification::FrameVerifier;

pub mod config;
pub mod frame_html;
pub mod image;
pub mod verification;

const MAX_LEADERBOARD_LIMIT: u64 = 100;
const MAX_FRAME_BODY_BYTES: u64 = 64 * 1024;

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<u64>,
}

#[derive(Deserialize)]
struct ImageQuery {
    state: Option<String>,
}

/// Everything a request handler needs, shared across requests.
pub struct AppState {
    pub engine: GameEngine<dyn GameStore>,
    pub store: Arc<dyn GameStore>,
    pub presenter: FramePresenter,
    pub verifier: FrameVerifier,
}

impl AppState {
    pub fn new(store: Arc<dyn GameStore>, presenter: FramePresenter, verifier: FrameVerifier) -> Self {
        Self {
            engine: GameEngine::new(store.clone()),
            store,
            presenter,
            verifier,
        }
    }
}

pub fn create_routes(
    app: Arc<AppState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let app_filter = warp::any().map({
        let app = app.clone();
        move || app.clone()
    });

    // Frame action endpoint
    let frame_action = warp::path!("api" / "frames")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_FRAME_BODY_BYTES))
        .and(warp::body::bytes())
        .and(app_filter.clone())
        .and_then(handle_frame_request);

    // Preview image for a state token
    let frame_image = warp::path!("api" / "frames" / "image")
        .and(warp::get())
        .and(warp::query::<ImageQuery>())
        .and_then(handle_image_request);

    // Landing frame
    let landing = warp::path::end()
        .and(warp::get())
        .and(app_filter.clone())
        .and_then(handle_landing_request);

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let leaderboard = warp::path("leaderboard")
        .and(warp::get())
        .and(warp::query::<LeaderboardQuery>())
        .and(app_filter.clone())
        .and_then(handle_leaderboard_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    frame_action
        .or(frame_image)
        .or(landing)
        .or(health)
        .or(leaderboard)
        .with(cors)
        .with(warp::log("truths"))
}

fn error_reply(message: &str, status: warp::http::StatusCode) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(&ErrorBody::new(message)), status).into_response()
}

async fn handle_frame_request(
    body: Bytes,
    app: Arc<AppState>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let request: FrameRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!("Unreadable frame request: {}", err);
            return Ok(error_reply(
                "Invalid frame request",
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    let frame = match app.verifier.verify(request).await {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!("Frame verification failed: {}", err);
            return Ok(error_reply(
                "Invalid frame request",
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    let state = match frame.state_token.as_deref() {
        Some(token) => decode_state_or_default(token),
        None => GameState::default(),
    };

    let transition = match app.engine.advance(state, &frame.action).await {
        Ok(transition) => transition,
        Err(err) => {
            tracing::error!("Failed to advance frame state: {}", err);
            return Ok(error_reply(
                "Internal server error",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let content = app
        .presenter
        .present(&transition.state, app.store.as_ref())
        .await;

    Ok(warp::reply::html(render_frame_document(&content)).into_response())
}

async fn handle_image_request(query: ImageQuery) -> Result<impl warp::Reply, warp::Rejection> {
    let state = decode_state_or_default(query.state.as_deref().unwrap_or_default());
    let svg = render_preview_svg(&preview_card(&state));

    Ok(warp::reply::with_header(
        warp::reply::with_header(svg, "content-type", "image/svg+xml"),
        "cache-control",
        "public, max-age=60",
    ))
}

async fn handle_landing_request(app: Arc<AppState>) -> Result<impl warp::Reply, warp::Rejection> {
    let content = app.presenter.render(&GameState::default(), None);
    Ok(warp::reply::html(render_frame_document(&content)))
}

async fn handle_leaderboard_request(
    query: LeaderboardQuery,
    app: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE).min(MAX_LEADERBOARD_LIMIT);

    match app.store.top_users(limit).await {
        Ok(users) => {
            let leaderboard: Vec<LeaderboardEntry> = users
                .into_iter()
                .enumerate()
                .map(|(index, user)| LeaderboardEntry {
                    user,
                    rank: (index + 1) as u32,
                })
                .collect();
            Ok(warp::reply::with_status(
                warp::reply::json(&leaderboard),
                warp::http::StatusCode::OK,
            ))
        }
        Err(err) => {
            tracing::error!("Failed to fetch leaderboard: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorBody::new("Failed to fetch leaderboard")),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
