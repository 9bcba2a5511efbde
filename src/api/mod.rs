pub mod beatport;
pub mod catalog;
pub mod prompt;
pub mod token;

use crate::error::Result;
use crate::models::{AlbumInfo, TrackInfo};

/// MetadataSource trait: the autotagger-source contract of the tagging host.
/// Implementations: source::BeatportSource.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name the host records in `data_source` of every match.
    fn data_source(&self) -> &str;

    /// Album candidates for the given artist and album. When the album is
    /// likely a compilation the artist is left out of the query.
    async fn candidates(&self, artist: &str, album: &str, va_likely: bool) -> Result<Vec<AlbumInfo>>;

    /// Track candidates for a single item.
    async fn item_candidates(&self, artist: &str, title: &str) -> Result<Vec<TrackInfo>>;

    /// Lookup by release id or URL. `None` when the id is not one of ours or
    /// the release does not exist.
    async fn album_for_id(&self, album_id: &str) -> Result<Option<AlbumInfo>>;

    /// Lookup by track id or URL.
    async fn track_for_id(&self, track_id: &str) -> Result<Option<TrackInfo>>;
}
