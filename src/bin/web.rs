use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prediction_widgets::config::Config;
use prediction_widgets::data::{FileStore, KeyValueStore};
use prediction_widgets::league_metrics::load_league_metrics;
use prediction_widgets::live_matches::{LiveMatchesWidget, LiveSnapshot};
use prediction_widgets::login::LicenseGate;
use prediction_widgets::news_feed::NewsFeedWidget;
use prediction_widgets::weekly_results::WeeklyResultsWidget;
use prediction_widgets::{
    fetch_league_overview, find_league, supported_leagues, AccessorError, HttpTransport, LeagueId,
    LoadState, RemoteAccessor,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

type Api = RemoteAccessor<HttpTransport>;

#[derive(Clone)]
struct AppState {
    api: Arc<Api>,
    live: Arc<Mutex<LiveMatchesWidget<HttpTransport>>>,
    store: Arc<dyn KeyValueStore>,
    request_timeout: Duration,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn known_league(id: u32) -> Result<LeagueId, Response> {
    let league = LeagueId(id);
    match find_league(league) {
        Some(_) => Ok(league),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown league {}", id),
        )),
    }
}

fn load_state_response<T: serde::Serialize>(state: &LoadState<T>) -> Response {
    match state {
        LoadState::Failed(msg) => error_response(StatusCode::BAD_GATEWAY, msg.clone()),
        other => Json(other).into_response(),
    }
}

async fn leagues() -> impl IntoResponse {
    Json(supported_leagues())
}

async fn overview(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    let league = match known_league(id) {
        Ok(league) => league,
        Err(response) => return response,
    };
    Json(fetch_league_overview(&state.api, league).await).into_response()
}

async fn live(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    let league = match known_league(id) {
        Ok(league) => league,
        Err(response) => return response,
    };

    let mut rx = {
        let mut widget = state.live.lock().await;
        if widget.active_league() == Some(league) {
            return Json(widget.snapshot()).into_response();
        }
        let rx = widget.subscribe();
        widget.activate(league);
        rx
    };

    // First request for this league: wait for the immediate fetch
    let first = tokio::time::timeout(
        state.request_timeout,
        rx.wait_for(|s: &LiveSnapshot| s.league_id == Some(league) && s.updated_at.is_some()),
    )
    .await
    .ok()
    .and_then(|r| r.ok().map(|snapshot| snapshot.clone()));
    match first {
        Some(snapshot) => Json(snapshot).into_response(),
        None => Json(state.live.lock().await.snapshot()).into_response(),
    }
}

async fn standings(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    let league = match known_league(id) {
        Ok(league) => league,
        Err(response) => return response,
    };
    let result = state.api.fetch_standings(league).await;
    load_state_response(&LoadState::from_result("standings", result))
}

async fn news(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    let league = match known_league(id) {
        Ok(league) => league,
        Err(response) => return response,
    };
    let mut feed = NewsFeedWidget::new(Arc::clone(&state.api));
    if let LoadState::Failed(msg) = feed.load(league).await {
        return error_response(StatusCode::BAD_GATEWAY, msg.clone());
    }
    Json(json!({
        "items": feed.view(),
        "trending": feed.trending(),
    }))
    .into_response()
}

async fn metrics(State(state): State<AppState>, Path(id): Path<u32>) -> impl IntoResponse {
    Json(load_league_metrics(&state.api, LeagueId(id)).await)
}

async fn upcoming(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    let league = match known_league(id) {
        Ok(league) => league,
        Err(response) => return response,
    };
    let result = state.api.fetch_upcoming_matches(league).await;
    load_state_response(&LoadState::from_result("upcoming matches", result))
}

async fn results(
    State(state): State<AppState>,
    Path((id, year)): Path<(u32, i32)>,
) -> Response {
    let league = match known_league(id) {
        Ok(league) => league,
        Err(response) => return response,
    };
    let mut widget = WeeklyResultsWidget::new(Arc::clone(&state.api));
    widget.load(league, year).await;
    match widget.view() {
        LoadState::Failed(msg) => error_response(StatusCode::BAD_GATEWAY, msg.clone()),
        view => Json(json!({
            "weeks": view,
            "overall_accuracy": widget.overall_accuracy(),
        }))
        .into_response(),
    }
}

#[derive(Deserialize)]
struct LoginForm {
    license_key: String,
}

async fn login(State(state): State<AppState>, Json(form): Json<LoginForm>) -> Response {
    let mut gate = LicenseGate::new(Arc::clone(&state.api), Arc::clone(&state.store));
    gate.set_input(&form.license_key);
    match gate.submit().await {
        Ok(session) => Json(session).into_response(),
        Err(e) => {
            let status = match e {
                AccessorError::Validation(_) => StatusCode::BAD_REQUEST,
                AccessorError::Server(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            error_response(status, e.user_message())
        }
    }
}

async fn logout(State(state): State<AppState>) -> Response {
    let mut gate = LicenseGate::new(Arc::clone(&state.api), Arc::clone(&state.store));
    match gate.logout() {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!("logout failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
        }
    }
}

async fn session(State(state): State<AppState>) -> Response {
    let mut gate = LicenseGate::new(Arc::clone(&state.api), Arc::clone(&state.store));
    match gate.restore() {
        Some(session) => Json(session).into_response(),
        None => Json(json!({ "remembered_key": gate.remembered_key() })).into_response(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::load();
    let transport = HttpTransport::new(&config)?;
    let api = Arc::new(RemoteAccessor::new(transport).with_timeout(config.request_timeout));

    let state = AppState {
        live: Arc::new(Mutex::new(LiveMatchesWidget::with_interval(
            Arc::clone(&api),
            config.live_poll_interval,
        ))),
        api,
        store: Arc::new(FileStore::new(&config.session_store_path)),
        request_timeout: config.request_timeout,
    };

    let app = Router::new()
        // This will serve files from the "static" directory at the "/static" URL path
        .nest_service("/static", ServeDir::new("static"))
        .route("/leagues", get(leagues))
        .route("/leagues/:id", get(overview))
        .route("/leagues/:id/live", get(live))
        .route("/leagues/:id/standings", get(standings))
        .route("/leagues/:id/news", get(news))
        .route("/leagues/:id/metrics", get(metrics))
        .route("/leagues/:id/upcoming", get(upcoming))
        .route("/leagues/:id/results/:year", get(results))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    info!("starting web server at http://{}", config.web_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(config.web_addr.as_str()).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
