use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

const DEFAULT_FUNCTIONS_BASE_URL: &str = "https://europe-west1-match-predictor.cloudfunctions.net";
const DEFAULT_LIVE_SCORES_URL: &str = "https://live.match-predictor.app/api/live-matches";
const MIN_POLL_SECS: u64 = 5;

/// Endpoints and tunables. In the browser bundle these were compiled in;
/// here they come from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub functions_base_url: String,
    pub live_scores_url: String,
    pub request_timeout: Duration,
    pub live_poll_interval: Duration,
    pub session_store_path: PathBuf,
    pub web_addr: String,
    /// Publishable key of the hosted payment page; checkout works without it
    pub payment_publishable_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            functions_base_url: DEFAULT_FUNCTIONS_BASE_URL.to_string(),
            live_scores_url: DEFAULT_LIVE_SCORES_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            live_poll_interval: Duration::from_secs(60),
            session_store_path: PathBuf::from("cache/session.json"),
            web_addr: "127.0.0.1:3000".to_string(),
            payment_publishable_key: None,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let poll_secs: u64 = try_load("LIVE_POLL_SECS", 60);
        if poll_secs < MIN_POLL_SECS {
            warn!("LIVE_POLL_SECS={poll_secs} is below {MIN_POLL_SECS}, clamping");
        }

        Self {
            functions_base_url: try_load("FUNCTIONS_BASE_URL", defaults.functions_base_url),
            live_scores_url: try_load("LIVE_SCORES_URL", defaults.live_scores_url),
            request_timeout: Duration::from_secs(try_load("REQUEST_TIMEOUT_SECS", 15u64).max(1)),
            live_poll_interval: Duration::from_secs(poll_secs.max(MIN_POLL_SECS)),
            session_store_path: PathBuf::from(try_load(
                "SESSION_STORE_PATH",
                "cache/session.json".to_string(),
            )),
            web_addr: try_load("WEB_ADDR", defaults.web_addr),
            payment_publishable_key: try_load_optional("PAYMENT_PUBLISHABLE_KEY"),
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

fn try_load_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        _ => {
            info!("{key} not set");
            None
        }
    }
}
