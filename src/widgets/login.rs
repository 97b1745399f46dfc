use crate::api::{AccessorError, ApiResult, RemoteAccessor, Transport};
use crate::models::LicenseSession;
use crate::utils::data::{load_json, save_json, KeyValueStore, REMEMBERED_KEY, SESSION_KEY};
use crate::utils::license_key::{format_license_key, normalize_license_key};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Login widget state: `idle -> verifying -> authenticated`, or back to idle with an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    Idle { error: Option<String> },
    Verifying,
    Authenticated { session: LicenseSession },
}

impl Default for GateState {
    fn default() -> Self {
        GateState::Idle { error: None }
    }
}

pub struct LicenseGate<T> {
    api: Arc<RemoteAccessor<T>>,
    store: Arc<dyn KeyValueStore>,
    /// Display form of what the user typed
    input: String,
    state: GateState,
}

impl<T: Transport> LicenseGate<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            input: String::new(),
            state: GateState::default(),
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Keystroke handler: the field always shows the grouped form
    pub fn set_input(&mut self, raw: &str) -> &str {
        self.input = format_license_key(raw);
        &self.input
    }

    /// Pre-fill the field with the key remembered at last logout
    pub fn prefill_remembered(&mut self) -> Option<String> {
        let remembered = self.remembered_key();
        if let Some(key) = &remembered {
            self.input = format_license_key(key);
        }
        remembered
    }

    pub fn remembered_key(&self) -> Option<String> {
        match self.store.get(REMEMBERED_KEY) {
            Ok(key) => key,
            Err(e) => {
                warn!("Failed to read remembered key: {:#}", e);
                None
            }
        }
    }

    /// Pick up a session persisted by an earlier login
    pub fn restore(&mut self) -> Option<LicenseSession> {
        match load_json::<LicenseSession>(self.store.as_ref(), SESSION_KEY) {
            Ok(Some(session)) => {
                self.state = GateState::Authenticated {
                    session: session.clone(),
                };
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable stored session: {:#}", e);
                None
            }
        }
    }

    /// Verify the current input. On failure the state returns to idle with a
    /// message and storage is left untouched.
    pub async fn submit(&mut self) -> ApiResult<LicenseSession> {
        let key = normalize_license_key(&self.input);
        if key.is_empty() {
            let err = AccessorError::Validation("Please enter your license key".to_string());
            self.state = GateState::Idle {
                error: Some(err.user_message()),
            };
            return Err(err);
        }

        self.state = GateState::Verifying;
        match self.verify(&key).await {
            Ok(session) => {
                info!(subscription = %session.subscription_type, "license verified");
                self.state = GateState::Authenticated {
                    session: session.clone(),
                };
                Ok(session)
            }
            Err(e) => {
                warn!("license verification failed: {}", e);
                self.state = GateState::Idle {
                    error: Some(e.user_message()),
                };
                Err(e)
            }
        }
    }

    async fn verify(&self, key: &str) -> ApiResult<LicenseSession> {
        let verification = self.api.verify_license(key).await?.data;
        let session = LicenseSession {
            license_key: key.to_string(),
            expires_at: verification.expires_at,
            subscription_type: verification.subscription_type,
            email: verification.email,
            authenticated_at: Utc::now(),
        };
        save_json(self.store.as_ref(), SESSION_KEY, &session)
            .map_err(|e| AccessorError::Storage(format!("{:#}", e)))?;
        if let Err(e) = self.store.remove(REMEMBERED_KEY) {
            warn!("Failed to clear remembered key: {:#}", e);
        }
        Ok(session)
    }

    /// Drop the session and remember its key for the next login form
    pub fn logout(&mut self) -> ApiResult<()> {
        let session = load_json::<LicenseSession>(self.store.as_ref(), SESSION_KEY)
            .ok()
            .flatten();
        self.store
            .remove(SESSION_KEY)
            .map_err(|e| AccessorError::Storage(format!("{:#}", e)))?;
        if let Some(session) = session {
            self.store
                .set(REMEMBERED_KEY, &session.license_key)
                .map_err(|e| AccessorError::Storage(format!("{:#}", e)))?;
        }
        self.input.clear();
        self.state = GateState::default();
        info!("logged out");
        Ok(())
    }
}
