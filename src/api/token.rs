use super::prompt::CredentialPrompt;
use crate::config::Config;
use crate::error::{BeatportError, Result};
use crate::util::redact;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// OAuth bearer token as persisted in the token file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_at: f64, // epoch seconds
    pub refresh_token: Option<String>,
}

impl OAuthToken {
    /// Parse a token JSON as written to the token file or as returned by
    /// Beatport's `/auth/o/token/` endpoint. Only `access_token` is required;
    /// `expires_at` wins over `expires_in`, and with neither the token lives
    /// for `default_lifetime` seconds from now.
    pub fn from_json(raw: &str, default_lifetime: i64) -> Result<Self> {
        let v: Value = serde_json::from_str(raw.trim())
            .map_err(|e| BeatportError::AuthenticationInvalid(format!("not valid JSON: {}", e)))?;
        Self::from_value(&v, default_lifetime)
    }

    pub fn from_value(v: &Value, default_lifetime: i64) -> Result<Self> {
        if !v.is_object() {
            return Err(BeatportError::AuthenticationInvalid(
                "token must be a JSON object".into(),
            ));
        }
        let access_token = v["access_token"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| BeatportError::AuthenticationInvalid("missing access_token".into()))?
            .trim()
            .to_string();
        let now = Utc::now().timestamp() as f64;
        let expires_at = match (seconds_of(&v["expires_at"]), seconds_of(&v["expires_in"])) {
            (Some(at), _) => at,
            (None, Some(secs)) => now + secs,
            (None, None) => now + default_lifetime as f64,
        };
        Ok(Self {
            access_token,
            expires_at,
            refresh_token: v["refresh_token"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(String::from),
        })
    }

    /// True when the token is expired or will be within `buffer_secs`.
    pub fn is_expired(&self, buffer_secs: i64) -> bool {
        let now = Utc::now().timestamp() as f64;
        now + buffer_secs as f64 >= self.expires_at
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Epoch or duration seconds, given as a JSON number or a numeric string.
fn seconds_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// The token file on disk. Reads tolerate absence; writes replace the file
/// atomically.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
    default_lifetime: i64,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>, default_lifetime: i64) -> Self {
        Self {
            path: path.into(),
            default_lifetime,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_lifetime(&self) -> i64 {
        self.default_lifetime
    }

    /// `Ok(None)` when there is no token file yet.
    pub fn load(&self) -> Result<Option<OAuthToken>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BeatportError::TokenFile {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        OAuthToken::from_json(&raw, self.default_lifetime).map(Some)
    }

    pub fn save(&self, token: &OAuthToken) -> Result<()> {
        let io_err = |source| BeatportError::TokenFile {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(token).map_err(|e| io_err(e.into()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Owns the current token and the operator prompt. Injected into the API
/// client; nothing else reads or writes the token file.
pub struct TokenManager {
    store: TokenStore,
    prompt: Box<dyn CredentialPrompt>,
    current: Option<OAuthToken>,
    loaded: bool,
    expiry_buffer_secs: i64,
    max_prompt_attempts: u32,
}

impl TokenManager {
    pub fn new(store: TokenStore, prompt: Box<dyn CredentialPrompt>) -> Self {
        Self {
            store,
            prompt,
            current: None,
            loaded: false,
            expiry_buffer_secs: 30,
            max_prompt_attempts: 3,
        }
    }

    pub fn from_config(cfg: &Config, prompt: Box<dyn CredentialPrompt>) -> Self {
        let store = TokenStore::new(cfg.token_path(), cfg.default_token_lifetime_secs);
        let mut mgr = Self::new(store, prompt);
        mgr.expiry_buffer_secs = cfg.expiry_buffer_secs;
        mgr.max_prompt_attempts = cfg.max_prompt_attempts.max(1);
        mgr
    }

    pub fn with_expiry_buffer(mut self, secs: i64) -> Self {
        self.expiry_buffer_secs = secs;
        self
    }

    pub fn with_max_prompt_attempts(mut self, attempts: u32) -> Self {
        self.max_prompt_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// The token as currently known, loading the token file on first use.
    /// A corrupt or unreadable file counts as no token.
    pub fn current(&mut self) -> Option<&OAuthToken> {
        if !self.loaded {
            self.loaded = true;
            match self.store.load() {
                Ok(Some(t)) => {
                    debug!("Loaded beatport token from {}", self.store.path().display());
                    self.current = Some(t);
                }
                Ok(None) => {
                    debug!(
                        "Token file not found at {}; will authenticate",
                        self.store.path().display()
                    );
                }
                Err(e) => {
                    warn!("Ignoring token file: {}", e);
                }
            }
        }
        self.current.as_ref()
    }

    /// The current token if it is still usable, logging why it is not.
    pub fn usable(&mut self) -> Option<OAuthToken> {
        let buffer = self.expiry_buffer_secs;
        match self.current() {
            Some(t) if !t.is_expired(buffer) => Some(t.clone()),
            Some(_) => {
                info!("Beatport token expired");
                None
            }
            None => {
                info!("No beatport token available");
                None
            }
        }
    }

    /// A non-expired token, prompting the operator when there is none.
    pub fn valid_token(&mut self) -> Result<OAuthToken> {
        if let Some(t) = self.usable() {
            return Ok(t);
        }
        self.prompt_for_token("Beatport token is missing or expired.")
    }

    /// Refresh token of the current token, even an expired one.
    pub fn refresh_token(&mut self) -> Option<String> {
        self.current().and_then(|t| t.refresh_token.clone())
    }

    /// Drop the in-memory token so the next `valid_token` prompts.
    pub fn invalidate(&mut self) {
        self.loaded = true;
        self.current = None;
    }

    /// Persist a new token and adopt it.
    pub fn replace(&mut self, token: OAuthToken) -> Result<()> {
        self.store.save(&token)?;
        debug!(
            "Saved beatport token {} to {}",
            redact(&token.access_token),
            self.store.path().display()
        );
        self.loaded = true;
        self.current = Some(token);
        Ok(())
    }

    /// Ask the operator for a token JSON until one is accepted or attempts
    /// run out. Rejected input never touches the token file.
    pub fn prompt_for_token(&mut self, reason: &str) -> Result<OAuthToken> {
        let mut last_error = String::from("no token supplied");
        for attempt in 1..=self.max_prompt_attempts {
            let message = if attempt == 1 {
                format!(
                    "{} Login at https://api.beatport.com/v4/docs/ \
                     and paste the /token endpoint response from the browser:",
                    reason
                )
            } else {
                format!(
                    "Token rejected ({}). Paste the /token endpoint response again:",
                    last_error
                )
            };
            let raw = match self.prompt.request_token_json(&message) {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    return Err(BeatportError::AuthenticationInvalid(
                        "no token supplied".into(),
                    ))
                }
                Err(e) => return Err(BeatportError::Prompt(e)),
            };
            match OAuthToken::from_json(&raw, self.store.default_lifetime()) {
                Ok(t) if t.is_expired(self.expiry_buffer_secs) => {
                    warn!("Supplied beatport token is already expired");
                    last_error = "token already expired".into();
                }
                Ok(t) => {
                    self.replace(t.clone())?;
                    info!("Accepted new beatport token");
                    return Ok(t);
                }
                Err(e) => {
                    warn!("Manual token entry failed: {}", e);
                    last_error = e.to_string();
                }
            }
        }
        Err(BeatportError::AuthenticationInvalid(last_error))
    }
}
