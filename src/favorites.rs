//! Queue albums from the user's favourite artists.

use std::error::Error;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::catalog::{CatalogRecord, CatalogSearch, Playback};

/// An album added from a favourite artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteAlbum {
    pub artist: String,
    pub title: String,
    pub date: String,
}

/// Newest album by release date; the first listed wins a tie.
fn latest_album(albums: &[CatalogRecord]) -> Option<&CatalogRecord> {
    albums.iter().rev().max_by(|a, b| a.date.cmp(&b.date))
}

/// Enqueue one album for each of the first `count` favourite artists.
///
/// With `shuffle` the favourites are visited in random order instead of
/// most-recent first.  Each artist contributes their latest album, or a
/// random one with `random_album`.  Artists whose albums cannot be listed
/// or queued are skipped.
pub fn enqueue_from_favorites<R: Rng + ?Sized>(
    catalog: &dyn CatalogSearch,
    playback: &dyn Playback,
    count: usize,
    shuffle: bool,
    random_album: bool,
    rng: &mut R,
) -> Result<Vec<FavoriteAlbum>, Box<dyn Error>> {
    let mut artists = catalog.search_artists("")?;
    debug!("{} favourite artists", artists.len());

    if shuffle {
        artists.shuffle(rng);
    }

    let mut added = Vec::new();

    for artist in artists.iter().take(count) {
        let albums = match catalog.artist_albums(&artist.id) {
            Ok(albums) => albums,
            Err(e) => {
                warn!("cannot list albums of {}: {}", artist.name, e);
                continue;
            }
        };

        let chosen = if random_album {
            albums.choose(rng)
        } else {
            latest_album(&albums)
        };
        let Some(album) = chosen else {
            debug!("{} has no albums", artist.name);
            continue;
        };

        let id = match album.id.parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                warn!("skipping {} with album id {:?}", album, album.id);
                continue;
            }
        };

        if let Err(e) = playback.enqueue_album(id) {
            warn!("cannot enqueue {}: {}", album, e);
            continue;
        }

        added.push(FavoriteAlbum {
            artist: artist.name.clone(),
            title: album.title.clone(),
            date: album.date.clone(),
        });
    }

    Ok(added)
}
