use std::io::{self, BufRead, Write};

/// Something that can hand over a Beatport token JSON on request.
///
/// Beatport does not register third-party OAuth clients, so the usual way
/// to get a token is to log in on the API docs page and copy the `/token`
/// response out of the browser's network inspector. This trait hides where
/// that JSON comes from.
pub trait CredentialPrompt: Send {
    /// Return the raw token JSON, or `None` when nothing will be supplied.
    fn request_token_json(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Interactive paste on the terminal.
pub struct StdinPrompt;

impl CredentialPrompt for StdinPrompt {
    fn request_token_json(&mut self, message: &str) -> io::Result<Option<String>> {
        eprintln!("{}", message);
        io::stderr().flush()?;
        let mut input = String::new();
        let n = io::stdin().lock().read_line(&mut input)?;
        let s = input.trim();
        if n == 0 || s.is_empty() {
            return Ok(None);
        }
        Ok(Some(s.to_string()))
    }
}

/// Reads the token JSON from an environment variable, for unattended runs.
pub struct EnvPrompt {
    var: String,
}

impl EnvPrompt {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvPrompt {
    fn default() -> Self {
        Self::new("BEATPORT_TOKEN_JSON")
    }
}

impl CredentialPrompt for EnvPrompt {
    fn request_token_json(&mut self, _message: &str) -> io::Result<Option<String>> {
        Ok(std::env::var(&self.var).ok().filter(|s| !s.trim().is_empty()))
    }
}

/// Never supplies a token; authentication fails instead of blocking.
pub struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn request_token_json(&mut self, _message: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}
