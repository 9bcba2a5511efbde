//! Beatport v4 catalog shapes.
//!
//! Parsing is lenient: Beatport adds, renames and drops fields between
//! deployments, so every field read from a payload falls back to an empty
//! or absent value instead of failing the whole lookup.
use crate::util;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;

pub const ORIGINAL_MIX_NAME: &str = "Original Mix";

/// Ids arrive as numbers on most endpoints and as strings on a few.
fn id_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn str_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn name_of(v: &Value) -> Option<String> {
    str_of(&v["name"]).filter(|s| !s.is_empty())
}

fn artists_of(v: &Value) -> Vec<Artist> {
    v["artists"]
        .as_array()
        .map(|a| a.iter().filter(|x| x.is_object()).map(Artist::from_api).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

impl Artist {
    pub fn from_api(v: &Value) -> Self {
        Self {
            id: id_of(&v["id"]),
            name: str_of(&v["name"]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: String,
    pub name: String,
}

impl Label {
    pub fn from_api(v: &Value) -> Self {
        Self {
            id: id_of(&v["id"]),
            name: str_of(&v["name"]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Release {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
    pub release_type: Option<String>,
    pub label: Option<Label>,
    pub catalog_number: Option<String>,
    pub url: Option<String>,
    pub publish_date: Option<NaiveDate>,
}

impl Release {
    /// Build a release from an API object. `site_base` is used to derive the
    /// public release URL from the slug.
    pub fn from_api(v: &Value, site_base: &str) -> Self {
        let id = id_of(&v["id"]);
        let url = v["slug"]
            .as_str()
            .map(|slug| format!("{}/release/{}/{}", site_base, slug, id));
        Self {
            name: str_of(&v["name"]).unwrap_or_default(),
            artists: artists_of(v),
            tracks: Vec::new(),
            release_type: name_of(&v["type"]),
            label: v.get("label").filter(|l| l.is_object()).map(Label::from_api),
            catalog_number: str_of(&v["catalog_number"]).filter(|s| !s.is_empty()),
            url,
            publish_date: v["publish_date"]
                .as_str()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
    pub length: Duration,
    pub number: Option<u32>,
    pub initial_key: Option<String>,
    pub url: Option<String>,
    pub bpm: Option<u32>,
    pub genre: Option<String>,
    pub image_url: Option<String>,
    pub image_dynamic_url: Option<String>,
    pub mix_name: Option<String>,
    pub release: Option<Release>,
    pub remixers: Vec<Artist>,
}

impl Track {
    pub fn from_api(v: &Value, site_base: &str) -> Self {
        let id = id_of(&v["id"]);

        let length = match v["length_ms"].as_u64() {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => v["length"].as_str().and_then(parse_min_sec).unwrap_or_default(),
        };

        let release = v.get("release").filter(|r| r.is_object());
        let image = release.map(|r| &r["image"]);

        Self {
            name: str_of(&v["name"]).unwrap_or_default(),
            artists: artists_of(v),
            length,
            number: v["number"].as_u64().and_then(|n| u32::try_from(n).ok()),
            initial_key: name_of(&v["key"]).and_then(|k| util::normalize_key(&k)),
            url: v["slug"]
                .as_str()
                .map(|slug| format!("{}/track/{}/{}", site_base, slug, id)),
            bpm: v["bpm"]
                .as_f64()
                .filter(|b| *b > 0.0)
                .map(|b| b as u32),
            genre: name_of(&v["sub_genre"]).or_else(|| name_of(&v["genre"])),
            image_url: image.and_then(|i| i["uri"].as_str()).map(String::from),
            image_dynamic_url: image
                .and_then(|i| i["dynamic_uri"].as_str())
                .map(String::from),
            mix_name: v["mix_name"].as_str().map(String::from),
            release: release.map(|r| Release::from_api(r, site_base)),
            remixers: v["remixers"]
                .as_array()
                .map(|a| a.iter().filter(|x| x.is_object()).map(Artist::from_api).collect())
                .unwrap_or_default(),
            id,
        }
    }

    /// Display title: the track name, with the mix appended unless it is the
    /// original mix.
    pub fn title(&self) -> String {
        match self.mix_name.as_deref() {
            Some(mix) if !mix.is_empty() && mix != ORIGINAL_MIX_NAME => {
                format!("{} ({})", self.name, mix)
            }
            _ => self.name.clone(),
        }
    }
}

fn parse_min_sec(s: &str) -> Option<Duration> {
    let (min, sec) = s.split_once(':')?;
    let min: u64 = min.trim().parse().ok()?;
    let sec: u64 = sec.trim().parse().ok()?;
    Some(Duration::from_secs(min * 60 + sec))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MyAccount {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl MyAccount {
    pub fn from_api(v: &Value) -> Self {
        Self {
            id: id_of(&v["id"]),
            email: str_of(&v["email"]).unwrap_or_default(),
            username: str_of(&v["username"]).unwrap_or_default(),
        }
    }
}
