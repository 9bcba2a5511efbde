#![allow(dead_code)]

use beatport4_source::api::prompt::CredentialPrompt;
use beatport4_source::config::Config;
use serde_json::json;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hands out canned token JSON and counts how often it was asked.
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Arc<AtomicUsize>,
}

impl ScriptedPrompt {
    pub fn new<I: IntoIterator<Item = String>>(answers: I) -> (Self, Arc<AtomicUsize>) {
        let asked = Arc::new(AtomicUsize::new(0));
        (
            Self {
                answers: answers.into_iter().collect(),
                asked: asked.clone(),
            },
            asked,
        )
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn request_token_json(&mut self, _message: &str) -> std::io::Result<Option<String>> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.answers.pop_front())
    }
}

pub fn asked(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn test_config(api_base: &str, dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.api_base = api_base.to_string();
    cfg.tokenfile = dir.join("beatport_token.json");
    cfg.log_dir = dir.to_path_buf();
    cfg
}

pub fn now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}

/// Token JSON as pasted from the browser: relative expiry.
pub fn pasted_token(access: &str) -> String {
    json!({
        "access_token": access,
        "expires_in": 36000,
        "token_type": "Bearer",
        "scope": "app:locker user:dj",
        "refresh_token": format!("{}-refresh", access)
    })
    .to_string()
}

pub fn write_token_file(path: &Path, access: &str, expires_at: f64) {
    let body = json!({
        "access_token": access,
        "expires_at": expires_at,
        "refresh_token": format!("{}-refresh", access)
    })
    .to_string();
    std::fs::write(path, body).expect("write token file");
}

pub fn read_token_file(path: &Path) -> serde_json::Value {
    let s = std::fs::read_to_string(path).expect("read token file");
    serde_json::from_str(&s).expect("token file json")
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("read fixture")
}
