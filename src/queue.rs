//! Album-level view and editing of the play queue.
//!
//! The player only knows about songs at numbered positions.  [`PlayQueue`]
//! groups them back into albums, and the free functions here edit the queue
//! through [`QueueControl`] one `Delete` or `Play` request at a time.

use std::error::Error;

use tracing::debug;

use crate::catalog::TrackMetadata;

/// One song in the play queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueEntry {
    /// 0-based position in the queue
    pub position: u32,
    pub artist: String,
    pub album: String,
    pub title: String,
    /// 0 when the service did not report one
    pub album_id: u64,
}

/// An album in the play queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAlbum {
    pub artist: String,
    pub album: String,
    pub album_id: u64,
    pub song_count: usize,
    /// Position of the album's first song
    pub first_position: u32,
}

impl QueueAlbum {
    pub fn is_playing(&self, current: &TrackMetadata) -> bool {
        self.artist == current.artist && self.album == current.album
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayQueue {
    pub entries: Vec<QueueEntry>,
}

impl PlayQueue {
    pub fn new(entries: Vec<QueueEntry>) -> Self {
        PlayQueue { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One entry per album id, in queue order, with its song count.
    pub fn albums(&self) -> Vec<QueueAlbum> {
        let mut albums: Vec<QueueAlbum> = Vec::new();

        for entry in &self.entries {
            match albums.iter_mut().find(|a| a.album_id == entry.album_id) {
                Some(album) => album.song_count += 1,
                None => albums.push(QueueAlbum {
                    artist: entry.artist.clone(),
                    album: entry.album.clone(),
                    album_id: entry.album_id,
                    song_count: 1,
                    first_position: entry.position,
                }),
            }
        }

        albums
    }

    /// Albums for the queue listing.  The playing album is left out when its
    /// first queued song comes after the playing position.
    pub fn albums_up_to_current(&self, current: &TrackMetadata) -> Vec<QueueAlbum> {
        let position = current.song_id.unwrap_or(0);
        self.albums()
            .into_iter()
            .filter(|album| !(album.is_playing(current) && album.first_position > position))
            .collect()
    }

    /// First song of the album after the one at `position`.
    ///
    /// Wraps around to the start of the queue when the current album is the
    /// last one.  `None` when `position` is not in the queue.
    pub fn next_album_entry(&self, position: u32) -> Option<&QueueEntry> {
        let index = self.entries.iter().position(|e| e.position == position)?;
        let album = &self.entries[index].album;

        self.entries[index + 1..]
            .iter()
            .find(|e| &e.album != album)
            .or_else(|| self.entries.first())
    }

    pub fn first_position_of_album(&self, album_id: u64) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.album_id == album_id)
            .map(|e| e.position)
    }
}

/// Queue editing on the device.
pub trait QueueControl {
    fn play_queue(&self) -> Result<PlayQueue, Box<dyn Error>>;

    /// Position of the song playing now, if any.
    fn current_position(&self) -> Result<Option<u32>, Box<dyn Error>>;

    /// Remove the entry at `position`; later entries move up by one.
    fn delete_entry(&self, position: u32) -> Result<(), Box<dyn Error>>;

    fn play_position(&self, position: u32) -> Result<(), Box<dyn Error>>;
}

/// Delete the songs before the one playing now.  Returns how many went.
pub fn remove_played(queue: &dyn QueueControl) -> Result<u32, Box<dyn Error>> {
    let played = queue.current_position()?.unwrap_or(0);
    let mut removed = 0;

    // Each delete moves the playing song up by one; stop as soon as it is
    // first, and never delete more than were played to begin with.
    while removed < played {
        if queue.current_position()?.unwrap_or(0) == 0 {
            break;
        }
        queue.delete_entry(0)?;
        removed += 1;
    }

    debug!("removed {} played songs", removed);
    Ok(removed)
}

/// Delete every song of one album.  Returns how many went.
pub fn remove_album(queue: &dyn QueueControl, album_id: u64) -> Result<usize, Box<dyn Error>> {
    let queued = queue
        .play_queue()?
        .entries
        .iter()
        .filter(|e| e.album_id == album_id)
        .count();
    let mut removed = 0;

    while removed < queued {
        let Some(position) = queue.play_queue()?.first_position_of_album(album_id) else {
            break;
        };
        queue.delete_entry(position)?;
        removed += 1;
    }

    debug!("removed {} songs of album {}", removed, album_id);
    Ok(removed)
}

/// Jump to the first song of the next album in the queue.
pub fn skip_to_next_album(queue: &dyn QueueControl) -> Result<Option<QueueEntry>, Box<dyn Error>> {
    let Some(position) = queue.current_position()? else {
        return Ok(None);
    };
    let play_queue = queue.play_queue()?;
    let Some(next) = play_queue.next_album_entry(position).cloned() else {
        return Ok(None);
    };

    queue.play_position(next.position)?;
    Ok(Some(next))
}
