use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How an expired or rejected token gets replaced.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenRenewal {
    /// Always ask the operator for a new token JSON.
    #[default]
    Prompt,
    /// Try the OAuth refresh grant first, prompt if that fails.
    Refresh,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SingletonAlbumMetadata {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub year: bool,
    #[serde(default = "default_true")]
    pub album: bool,
    #[serde(default = "default_true")]
    pub label: bool,
    #[serde(default = "default_true")]
    pub catalognum: bool,
    #[serde(default = "default_true")]
    pub albumartist: bool,
    #[serde(default = "default_true")]
    pub track_number: bool,
}

impl Default for SingletonAlbumMetadata {
    fn default() -> Self {
        Self {
            enabled: false,
            year: true,
            album: true,
            label: true,
            catalognum: true,
            albumartist: true,
            track_number: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Token file; relative paths resolve against the host config dir.
    #[serde(default = "default_tokenfile")]
    pub tokenfile: PathBuf,
    /// Beatport API client id, only needed for `token_renewal = "refresh"`.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_site_base")]
    pub site_base: String,

    // Token lifecycle
    #[serde(default)]
    pub token_renewal: TokenRenewal,
    #[serde(default = "default_expiry_buffer")]
    pub expiry_buffer_secs: i64,
    #[serde(default = "default_token_lifetime")]
    pub default_token_lifetime_secs: i64,
    #[serde(default = "default_max_prompt_attempts")]
    pub max_prompt_attempts: u32,

    // HTTP
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_search_results_per_page")]
    pub search_results_per_page: u32,
    #[serde(default = "default_release_tracks_per_page")]
    pub release_tracks_per_page: u32,

    // Cover art
    #[serde(default)]
    pub art: bool,
    #[serde(default)]
    pub art_overwrite: bool,
    #[serde(default)]
    pub art_width: Option<u32>,
    #[serde(default)]
    pub art_height: Option<u32>,

    #[serde(default)]
    pub singletons_with_album_metadata: SingletonAlbumMetadata,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_true() -> bool { true }
fn default_tokenfile() -> PathBuf { "beatport_token.json".into() }
fn default_api_base() -> String { "https://api.beatport.com/v4".into() }
fn default_site_base() -> String { "https://beatport.com".into() }
fn default_expiry_buffer() -> i64 { 30 }
// Beatport v4 tokens are issued for ten hours.
fn default_token_lifetime() -> i64 { 36000 }
fn default_max_prompt_attempts() -> u32 { 3 }
fn default_http_timeout() -> u64 { 30 }
fn default_search_results_per_page() -> u32 { 5 }
fn default_release_tracks_per_page() -> u32 { 100 }
fn default_log_dir() -> PathBuf { host_config_dir().join("logs") }

impl Default for Config {
    fn default() -> Self {
        Self {
            tokenfile: default_tokenfile(),
            client_id: None,
            api_base: default_api_base(),
            site_base: default_site_base(),
            token_renewal: TokenRenewal::default(),
            expiry_buffer_secs: default_expiry_buffer(),
            default_token_lifetime_secs: default_token_lifetime(),
            max_prompt_attempts: default_max_prompt_attempts(),
            http_timeout_secs: default_http_timeout(),
            search_results_per_page: default_search_results_per_page(),
            release_tracks_per_page: default_release_tracks_per_page(),
            art: false,
            art_overwrite: false,
            art_width: None,
            art_height: None,
            singletons_with_album_metadata: SingletonAlbumMetadata::default(),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        Ok(cfg)
    }

    /// Absolute location of the token file.
    pub fn token_path(&self) -> PathBuf {
        if self.tokenfile.is_absolute() {
            self.tokenfile.clone()
        } else {
            host_config_dir().join(&self.tokenfile)
        }
    }

    /// API base with the `BEATPORT_API_BASE` override applied.
    pub fn resolved_api_base(&self) -> String {
        std::env::var("BEATPORT_API_BASE")
            .unwrap_or_else(|_| self.api_base.clone())
            .trim_end_matches('/')
            .to_string()
    }
}

/// The tagging host's configuration directory: `$BEETSDIR`, else
/// `<config dir>/beets`.
pub fn host_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("BEETSDIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beets")
}
