use crate::api::beatport::BeatportClient;
use crate::api::catalog::{Artist, MyAccount, Release, Track};
use crate::api::prompt::CredentialPrompt;
use crate::api::token::TokenManager;
use crate::api::MetadataSource;
use crate::art;
use crate::config::{Config, SingletonAlbumMetadata};
use crate::error::Result;
use crate::models::{AlbumInfo, TrackInfo};
use crate::util;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Datelike;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DATA_SOURCE: &str = "Beatport";
pub const MEDIA_TYPE: &str = "Digital";
pub const VA_ARTIST_NAME: &str = "Various Artists";
/// Releases credited to at least this many artists are compilations.
pub const VA_ARTIST_THRESHOLD: usize = 4;

fn artist_credit(artists: &[Artist]) -> (String, Option<String>) {
    util::join_artists(artists.iter().map(|a| (a.id.as_str(), a.name.as_str())))
}

/// Beatport as an autotagger metadata source.
pub struct BeatportSource {
    client: BeatportClient,
    singletons: SingletonAlbumMetadata,
    art: bool,
    art_overwrite: bool,
    art_width: Option<u32>,
    art_height: Option<u32>,
}

impl BeatportSource {
    pub fn new(client: BeatportClient, cfg: &Config) -> Self {
        Self {
            client,
            singletons: cfg.singletons_with_album_metadata.clone(),
            art: cfg.art,
            art_overwrite: cfg.art_overwrite,
            art_width: cfg.art_width,
            art_height: cfg.art_height,
        }
    }

    /// Wire the token file, the prompt and the API client together.
    pub fn from_config(cfg: &Config, prompt: Box<dyn CredentialPrompt>) -> Result<Self> {
        let tokens = TokenManager::from_config(cfg, prompt);
        let client = BeatportClient::new(cfg, tokens)?;
        Ok(Self::new(client, cfg))
    }

    pub fn client(&self) -> &BeatportClient {
        &self.client
    }

    /// Make sure a working token is in place before the host starts an
    /// import; prompts if needed.
    pub async fn setup(&self) -> Result<MyAccount> {
        let account = self.client.get_my_account().await?;
        info!("Beatport source ready");
        Ok(account)
    }

    pub fn album_info(&self, release: &Release) -> AlbumInfo {
        let va = release.artists.len() >= VA_ARTIST_THRESHOLD;
        let (mut artist, artist_id) = artist_credit(&release.artists);
        if va {
            artist = VA_ARTIST_NAME.to_string();
        }
        let date = release.publish_date;
        AlbumInfo {
            album: release.name.clone(),
            album_id: release.id.clone(),
            artist,
            artist_id,
            tracks: release.tracks.iter().map(Self::base_track_info).collect(),
            albumtype: release.release_type.clone(),
            va,
            year: date.map(|d| d.year()),
            month: date.map(|d| d.month()),
            day: date.map(|d| d.day()),
            label: release.label.as_ref().map(|l| l.name.clone()),
            catalognum: release.catalog_number.clone(),
            media: MEDIA_TYPE.to_string(),
            data_source: DATA_SOURCE.to_string(),
            data_url: release.url.clone(),
            genre: None,
        }
    }

    /// Track record without singleton enrichment.
    pub fn base_track_info(track: &Track) -> TrackInfo {
        let (artist, artist_id) = artist_credit(&track.artists);
        TrackInfo {
            title: track.title(),
            track_id: track.id.clone(),
            artist,
            artist_id,
            length: track.length.as_secs_f64(),
            index: track.number,
            medium_index: track.number,
            media: MEDIA_TYPE.to_string(),
            data_source: DATA_SOURCE.to_string(),
            data_url: track.url.clone(),
            bpm: track.bpm,
            initial_key: track.initial_key.clone(),
            genre: track.genre.clone(),
            album: None,
            albumartist: None,
            label: None,
            catalognum: None,
            year: None,
            month: None,
            day: None,
            track: None,
        }
    }

    /// Track record for a singleton import, with album fields copied from
    /// the track's release when enabled.
    pub async fn track_info(&self, track: &Track) -> TrackInfo {
        let mut info = Self::base_track_info(track);
        let opts = &self.singletons;
        if !opts.enabled {
            return info;
        }
        let Some(partial) = track.release.as_ref() else {
            return info;
        };

        // The release embedded in a track payload has no tracklist.
        let release = if partial.tracks.is_empty() && !partial.id.is_empty() {
            match self.client.get_release(&partial.id).await {
                Ok(full) => full,
                Err(e) => {
                    warn!("Could not fetch release {} for track {}: {}", partial.id, track.id, e);
                    partial.clone()
                }
            }
        } else {
            partial.clone()
        };

        if opts.year {
            if let Some(d) = release.publish_date {
                info.year = Some(d.year());
                info.month = Some(d.month());
                info.day = Some(d.day());
            }
        }
        if opts.album && !release.name.is_empty() {
            info.album = Some(release.name.clone());
        }
        if opts.label {
            info.label = release
                .label
                .as_ref()
                .map(|l| l.name.clone())
                .filter(|n| !n.is_empty());
        }
        if opts.catalognum {
            info.catalognum = release.catalog_number.clone();
        }
        if opts.albumartist && !release.artists.is_empty() {
            info.albumartist = Some(artist_credit(&release.artists).0);
        }
        if opts.track_number && track.number.is_none() {
            info.track = release
                .tracks
                .iter()
                .find(|t| t.id == track.id)
                .and_then(|t| t.number);
        }
        info
    }

    /// Embed the Beatport cover of `track_id` into the file at `path`.
    /// Returns whether artwork was written.
    pub async fn embed_art(&self, track_id: &str, path: &Path) -> anyhow::Result<bool> {
        if !self.art {
            debug!("Art embedding disabled");
            return Ok(false);
        }
        if !self.art_overwrite && art::has_cover(path)? {
            debug!("File already contains an art, skipping fetching new");
            return Ok(false);
        }
        let Some(image) = self
            .client
            .get_image(track_id, self.art_width, self.art_height)
            .await?
        else {
            debug!("No Beatport image for track {}", track_id);
            return Ok(false);
        };
        art::embed_cover(path, image)
            .with_context(|| format!("embedding art into {}", path.display()))?;
        info!("Embedded Beatport art into {}", path.display());
        Ok(true)
    }
}

#[async_trait]
impl MetadataSource for BeatportSource {
    fn data_source(&self) -> &str {
        DATA_SOURCE
    }

    async fn candidates(&self, artist: &str, album: &str, va_likely: bool) -> Result<Vec<AlbumInfo>> {
        let query = if va_likely {
            album.to_string()
        } else {
            format!("{} {}", artist, album)
        };
        let query = util::sanitize_release_query(&query);
        debug!("Searching Beatport releases for {:?}", query);
        let releases = self.client.search_releases(&query, true).await?;
        Ok(releases.iter().map(|r| self.album_info(r)).collect())
    }

    async fn item_candidates(&self, artist: &str, title: &str) -> Result<Vec<TrackInfo>> {
        let query = format!("{} {}", artist, title);
        debug!("Searching Beatport tracks for {:?}", query);
        let tracks = self.client.search_tracks(&query).await?;
        let mut infos = Vec::with_capacity(tracks.len());
        for t in &tracks {
            infos.push(self.track_info(t).await);
        }
        Ok(infos)
    }

    async fn album_for_id(&self, album_id: &str) -> Result<Option<AlbumInfo>> {
        debug!("Searching for release {}", album_id);
        let Some(id) = util::parse_release_id(album_id) else {
            debug!("Not a valid Beatport release ID.");
            return Ok(None);
        };
        match self.client.get_release(id).await {
            Ok(release) => Ok(Some(self.album_info(&release))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn track_for_id(&self, track_id: &str) -> Result<Option<TrackInfo>> {
        debug!("Searching for track {}", track_id);
        let Some(id) = util::parse_track_id(track_id) else {
            debug!("Not a valid Beatport track ID.");
            return Ok(None);
        };
        match self.client.get_track(id).await {
            Ok(track) => Ok(Some(self.track_info(&track).await)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
