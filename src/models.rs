use serde::{Deserialize, Serialize};

/// Candidate album match handed to the tagging host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub album: String,
    pub album_id: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub tracks: Vec<TrackInfo>,
    pub albumtype: Option<String>,
    pub va: bool,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub label: Option<String>,
    pub catalognum: Option<String>,
    pub media: String,
    pub data_source: String,
    pub data_url: Option<String>,
    pub genre: Option<String>,
}

/// Candidate track match handed to the tagging host.
///
/// The album-level fields at the bottom are only filled for singletons when
/// album enrichment is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub track_id: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub length: f64, // seconds
    pub index: Option<u32>,
    pub medium_index: Option<u32>,
    pub media: String,
    pub data_source: String,
    pub data_url: Option<String>,
    pub bpm: Option<u32>,
    pub initial_key: Option<String>,
    pub genre: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albumartist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalognum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<u32>,
}
