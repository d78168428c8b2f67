//! Persisted login session: a bearer token plus the cached user profile.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::StoreError;
use crate::ports::KeyValueStore;
use crate::types::session::User;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Anything that can produce the headers for an authenticated request.
pub trait HeaderSource {
    fn auth_headers(&self) -> HeaderMap;
}

impl HeaderSource for HeaderMap {
    fn auth_headers(&self) -> HeaderMap {
        self.clone()
    }
}

pub fn bearer_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return headers;
    };
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(value) => {
            headers.insert(AUTHORIZATION, value);
        }
        Err(err) => warn!("stored token is not a valid header value: {err}"),
    }
    headers
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(User),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub success: bool,
    pub message: String,
}

pub struct AuthContext<S> {
    store: S,
    api: ApiClient,
    user: Option<User>,
}

impl<S: KeyValueStore> AuthContext<S> {
    /// Restores the session from storage. Anything short of a token plus a
    /// JSON object for the user clears both entries.
    pub fn load(store: S, api: ApiClient) -> Self {
        let mut context = Self {
            store,
            api,
            user: None,
        };
        match context.read_stored_user() {
            Ok(Some(user)) => {
                debug!(username = %user.username, "restored session");
                context.user = Some(user);
            }
            Ok(None) => context.clear(),
            Err(err) => {
                warn!("failed to read stored session: {err}");
                context.clear();
            }
        }
        context
    }

    fn read_stored_user(&self) -> Result<Option<User>, StoreError> {
        let token = self.store.get(TOKEN_KEY)?;
        let raw_user = self.store.get(USER_KEY)?;
        let (Some(token), Some(raw_user)) = (token, raw_user) else {
            return Ok(None);
        };
        if token.is_empty() || raw_user == "undefined" || raw_user == "null" {
            return Ok(None);
        }
        Ok(parse_user(&raw_user))
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }

    fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                warn!("failed to read stored token: {err}");
                None
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> LoginOutcome {
        let response = match self.api.login(username, password).await {
            Ok(response) => response,
            Err(err) => {
                warn!("login failed: {err}");
                return LoginOutcome::Failure(err.user_message("Login failed"));
            }
        };

        let raw_user = response.user.to_string();
        if let Err(err) = self.persist(&response.token, &raw_user) {
            warn!("failed to persist session: {err}");
            self.clear();
            return LoginOutcome::Failure(err.to_string());
        }

        let user = parse_user(&raw_user).unwrap_or_default();
        info!(username = %user.username, "logged in");
        self.user = Some(user.clone());
        LoginOutcome::Success(user)
    }

    fn persist(&self, token: &str, raw_user: &str) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_KEY, raw_user)
    }

    /// Creates an account. Does not sign the new user in.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> RegisterOutcome {
        match self.api.register(username, email, password).await {
            Ok(response) => RegisterOutcome {
                success: true,
                message: response
                    .message
                    .unwrap_or_else(|| "Account created successfully!".to_string()),
            },
            Err(err) => {
                warn!("registration failed: {err}");
                RegisterOutcome {
                    success: false,
                    message: err.user_message("Registration failed"),
                }
            }
        }
    }

    pub fn logout(&mut self) {
        self.clear();
        info!("logged out");
    }

    fn clear(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!("failed to clear stored {key}: {err}");
            }
        }
        self.user = None;
    }
}

impl<S: KeyValueStore> HeaderSource for AuthContext<S> {
    fn auth_headers(&self) -> HeaderMap {
        bearer_headers(self.token().as_deref())
    }
}

fn parse_user(raw: &str) -> Option<User> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("stored user is not valid JSON: {err}");
            return None;
        }
    };
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}
