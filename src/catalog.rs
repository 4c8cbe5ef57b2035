//! Collaborator interfaces for the player and the music catalog.
//!
//! The recommendation pipeline only talks to these traits.  The BluOS client
//! in [`crate::bluos`] implements both; tests substitute in-memory fakes.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The track currently playing on the device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Position of the song in the play queue
    pub song_id: Option<u32>,
    /// Seconds played
    pub secs: Option<u32>,
    /// Total length in seconds
    pub totlen: Option<u32>,
}

impl TrackMetadata {
    pub fn new(artist: &str, album: &str) -> Self {
        TrackMetadata {
            artist: artist.to_string(),
            album: album.to_string(),
            ..Default::default()
        }
    }
}

/// An album as reported by the catalog search.
///
/// Every field is kept as the raw string the service returned; the id is
/// only interpreted when a match is turned into a [`crate::artist_match::MatchResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub tracks: String,
}

impl CatalogRecord {
    pub fn new(id: &str, artist: &str, title: &str, date: &str, tracks: &str) -> Self {
        CatalogRecord {
            id: id.to_string(),
            artist: artist.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            tracks: tracks.to_string(),
        }
    }
}

impl fmt::Display for CatalogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// An artist as reported by the catalog search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: String,
    pub name: String,
}

/// Free-text search against the subscription catalog.
pub trait CatalogSearch {
    /// Search albums.  No results is an empty list, not an error.
    fn search_albums(&self, query: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>>;

    /// Search artists.  An empty query lists the user's favourite artists.
    fn search_artists(&self, query: &str) -> Result<Vec<ArtistRecord>, Box<dyn Error>>;

    /// All albums of one artist.  Backends without artist browsing return nothing.
    fn artist_albums(&self, _artist_id: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        Ok(Vec::new())
    }
}

impl<T: CatalogSearch + ?Sized> CatalogSearch for &T {
    fn search_albums(&self, query: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        (**self).search_albums(query)
    }

    fn search_artists(&self, query: &str) -> Result<Vec<ArtistRecord>, Box<dyn Error>> {
        (**self).search_artists(query)
    }

    fn artist_albums(&self, artist_id: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        (**self).artist_albums(artist_id)
    }
}

/// Playback and queue control on the device.
pub trait Playback {
    fn current_track(&self) -> Result<TrackMetadata, Box<dyn Error>>;

    /// Append a catalog album to the end of the play queue.
    fn enqueue_album(&self, album_id: u64) -> Result<(), Box<dyn Error>>;
}
