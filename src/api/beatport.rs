use super::catalog::{MyAccount, Release, Track};
use super::token::{OAuthToken, TokenManager};
use crate::config::{Config, TokenRenewal};
use crate::error::{BeatportError, Result};
use crate::util::redact;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};

const USER_AGENT: &str = concat!("beatport4-source/", env!("CARGO_PKG_VERSION"));

/// Beatport API v4 client.
///
/// Every request carries the bearer token held by the injected
/// [`TokenManager`]. A 401 renews the token once (refresh grant or operator
/// prompt, per `token_renewal`) and retries; any other failure goes back to
/// the caller untouched.
pub struct BeatportClient {
    client: Client,
    api_base: String,
    site_base: String,
    client_id: Option<String>,
    renewal: TokenRenewal,
    search_results_per_page: u32,
    release_tracks_per_page: u32,
    tokens: tokio::sync::Mutex<TokenManager>,
}

impl BeatportClient {
    pub fn new(cfg: &Config, tokens: TokenManager) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: cfg.resolved_api_base(),
            site_base: cfg.site_base.trim_end_matches('/').to_string(),
            client_id: cfg.client_id.clone().filter(|c| !c.is_empty()),
            renewal: cfg.token_renewal,
            search_results_per_page: cfg.search_results_per_page,
            release_tracks_per_page: cfg.release_tracks_per_page,
            tokens: tokio::sync::Mutex::new(tokens),
        })
    }

    pub fn site_base(&self) -> &str {
        &self.site_base
    }

    fn make_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.api_base, endpoint)
        } else {
            format!("{}/{}", self.api_base, endpoint)
        }
    }

    /// Current token, renewing first if it is missing or expired.
    async fn token(&self) -> Result<OAuthToken> {
        let mut tokens = self.tokens.lock().await;
        if let Some(t) = tokens.usable() {
            return Ok(t);
        }
        self.renew(&mut tokens, "Beatport token is missing or expired.")
            .await
    }

    /// Replace a token the API refused.
    async fn renew_token(&self) -> Result<OAuthToken> {
        let mut tokens = self.tokens.lock().await;
        self.renew(&mut tokens, "Beatport rejected the stored token.")
            .await
    }

    /// Refresh grant when the policy allows it and a refresh token is
    /// known, otherwise (or on failure) the operator prompt.
    async fn renew(&self, tokens: &mut TokenManager, reason: &str) -> Result<OAuthToken> {
        if self.renewal == TokenRenewal::Refresh {
            let refresh_token = tokens.refresh_token();
            match (refresh_token, self.client_id.as_deref()) {
                (Some(rt), Some(client_id)) => {
                    let lifetime = tokens.store().default_lifetime();
                    match self.refresh_grant(&rt, client_id, lifetime).await {
                        Ok(t) => {
                            tokens.replace(t.clone())?;
                            debug!("Refreshed beatport token {}", redact(&t.access_token));
                            return Ok(t);
                        }
                        Err(e) => warn!("Beatport token refresh failed: {}", e),
                    }
                }
                _ => debug!("No refresh token or client_id; falling back to prompt"),
            }
        }
        tokens.invalidate();
        prompt_off_runtime(tokens, reason)
    }

    async fn refresh_grant(
        &self,
        refresh_token: &str,
        client_id: &str,
        default_lifetime: i64,
    ) -> Result<OAuthToken> {
        let path = "/auth/o/token/";
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ];
        let resp = self
            .client
            .post(self.make_url(path))
            .form(&params)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BeatportError::HttpStatus {
                status: status.as_u16(),
                path: path.into(),
            });
        }
        let j = Self::parse_json(resp, path).await?;
        let mut token = OAuthToken::from_value(&j, default_lifetime)?;
        // Beatport may omit the refresh token when it is not rotated.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    async fn send_get(
        &self,
        url: &str,
        query: &[(&str, String)],
        token: &OAuthToken,
    ) -> Result<Response> {
        let mut req = self
            .client
            .get(url)
            .header(AUTHORIZATION, token.bearer())
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        Ok(req.send().await?)
    }

    async fn parse_json(resp: Response, path: &str) -> Result<Value> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| BeatportError::MalformedResponse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// GET an endpoint and return its JSON body, unwrapped from `results`
    /// when the endpoint is paginated.
    async fn get_json(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.make_url(endpoint);
        let token = self.token().await?;
        let mut resp = self.send_get(&url, query, &token).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!("Got 401 for {}; renewing beatport token", endpoint);
            let token = self.renew_token().await?;
            resp = self.send_get(&url, query, &token).await?;
            if resp.status() == StatusCode::UNAUTHORIZED {
                return Err(BeatportError::AuthenticationExpired);
            }
        }
        let status = resp.status();
        if !status.is_success() {
            return Err(BeatportError::HttpStatus {
                status: status.as_u16(),
                path: endpoint.to_string(),
            });
        }
        let mut j = Self::parse_json(resp, endpoint).await?;
        if let Some(results) = j.as_object_mut().and_then(|m| m.remove("results")) {
            return Ok(results);
        }
        Ok(j)
    }

    /// Information about the account the token belongs to.
    pub async fn get_my_account(&self) -> Result<MyAccount> {
        let j = self.get_json("/my/account", &[]).await?;
        let account = MyAccount::from_api(&j);
        debug!(
            "Beatport authorized as {} <{}>",
            redact(&account.username),
            redact(&account.email)
        );
        Ok(account)
    }

    async fn search(&self, query: &str, kind: &str) -> Result<Vec<Value>> {
        let params = [
            ("q", query.to_string()),
            ("per_page", self.search_results_per_page.to_string()),
            ("type", kind.to_string()),
        ];
        let j = self.get_json("/catalog/search", &params).await?;
        Ok(j[kind].as_array().cloned().unwrap_or_default())
    }

    /// Search releases. With `details`, each hit is re-fetched with its
    /// tracklist; hits that have since disappeared are skipped.
    pub async fn search_releases(&self, query: &str, details: bool) -> Result<Vec<Release>> {
        let hits = self.search(query, "releases").await?;
        let mut releases = Vec::with_capacity(hits.len());
        for hit in &hits {
            if !details {
                releases.push(Release::from_api(hit, &self.site_base));
                continue;
            }
            let id = Release::from_api(hit, &self.site_base).id;
            match self.get_release(&id).await {
                Ok(r) => releases.push(r),
                Err(e) if e.is_not_found() => debug!("Release {} vanished: {}", id, e),
                Err(e) => return Err(e),
            }
        }
        Ok(releases)
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        let hits = self.search(query, "tracks").await?;
        Ok(hits
            .iter()
            .filter(|t| t.is_object())
            .map(|t| Track::from_api(t, &self.site_base))
            .collect())
    }

    /// A single release including its tracks.
    pub async fn get_release(&self, beatport_id: &str) -> Result<Release> {
        let j = self
            .get_json(&format!("/catalog/releases/{}/", beatport_id), &[])
            .await?;
        let mut release = Release::from_api(&j, &self.site_base);
        release.tracks = match self.get_release_tracks(beatport_id).await {
            Ok(tracks) => tracks,
            Err(e) if e.is_not_found() => {
                debug!("No tracklist for release {}: {}", beatport_id, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(release)
    }

    /// All tracks of a release. The listing endpoint returns abbreviated
    /// tracks without their position, so each one is fetched in full.
    pub async fn get_release_tracks(&self, beatport_id: &str) -> Result<Vec<Track>> {
        let params = [("per_page", self.release_tracks_per_page.to_string())];
        let j = self
            .get_json(&format!("/catalog/releases/{}/tracks/", beatport_id), &params)
            .await?;
        let mut tracks = Vec::new();
        for abbreviated in j.as_array().map(Vec::as_slice).unwrap_or_default() {
            let id = match &abbreviated["id"] {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                _ => continue,
            };
            match self.get_track(&id).await {
                Ok(t) => tracks.push(t),
                Err(e) if e.is_not_found() => debug!("Failed to fetch track {}: {}", id, e),
                Err(e) => return Err(e),
            }
        }
        Ok(tracks)
    }

    pub async fn get_track(&self, beatport_id: &str) -> Result<Track> {
        let j = self
            .get_json(&format!("/catalog/tracks/{}/", beatport_id), &[])
            .await?;
        Ok(Track::from_api(&j, &self.site_base))
    }

    /// Release artwork for a track. A size request uses the dynamic image
    /// URI; a missing dimension copies the other and 0 means unset.
    pub async fn get_image(
        &self,
        track_id: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Option<Vec<u8>>> {
        let track = match self.get_track(track_id).await {
            Ok(t) => t,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let width = width.filter(|w| *w > 0);
        let height = height.filter(|h| *h > 0);
        let image_url = match (width.or(height), track.image_dynamic_url.as_deref()) {
            (Some(w), Some(dynamic)) => {
                let h = height.unwrap_or(w);
                Some(
                    dynamic
                        .replace("{w}", &w.to_string())
                        .replace("{h}", &h.to_string()),
                )
            }
            _ => track.image_url.clone(),
        };
        let Some(image_url) = image_url else {
            return Ok(None);
        };

        debug!("Fetching image from URL: {}", image_url);
        let token = self.token().await?;
        let resp = self
            .client
            .get(&image_url)
            .header(AUTHORIZATION, token.bearer())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BeatportError::HttpStatus {
                status: status.as_u16(),
                path: image_url,
            });
        }
        Ok(Some(resp.bytes().await?.to_vec()))
    }
}

/// Run the operator prompt without stalling other tasks on a multi-threaded
/// runtime. A current-thread runtime cannot hand off its only worker.
fn prompt_off_runtime(tokens: &mut TokenManager, reason: &str) -> Result<OAuthToken> {
    match Handle::try_current() {
        Ok(h) if h.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| tokens.prompt_for_token(reason))
        }
        _ => tokens.prompt_for_token(reason),
    }
}
