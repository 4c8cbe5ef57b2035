//! HTTP client for BluOS players (Bluesound, NAD, ...).
//!
//! The player exposes a plain HTTP API on port 11000 that answers with XML.
//! [`BluosClient`] covers playback control, the play queue and the Tidal
//! catalog search the player proxies, and implements both [`Playback`] and
//! [`CatalogSearch`].

use std::error::Error;
use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::{ArtistRecord, CatalogRecord, CatalogSearch, Playback, TrackMetadata};
use crate::queue::{PlayQueue, QueueControl, QueueEntry};
use crate::xml::{self, Element, XmlError};

/// Streaming service used for catalog searches and queue additions.
pub const SERVICE: &str = "Tidal";

/// Raising the volume by more than this many steps is done gradually.
const VOLUME_RAMP_THRESHOLD: u8 = 5;
const VOLUME_RAMP_STEP: Duration = Duration::from_millis(100);

/// Upper bound on followed `nextlink`s, in case the player keeps pointing at itself.
const MAX_PAGES: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum BluosError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP Error {0}")]
    Http(u16),

    #[error("Output parsing error: {0}")]
    Xml(#[from] XmlError),

    #[error("Unexpected value for {field}: {value:?}")]
    InvalidField { field: String, value: String },

    #[error("Unexpected response: <{0}>")]
    UnexpectedRoot(String),

    #[error("The player has a fixed volume")]
    FixedVolume,
}

/// Volume as reported by `/Status`.  Players with a fixed line-level
/// output report `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    Level(u8),
    Fixed,
}

impl Volume {
    fn from_raw(raw: i16) -> Self {
        match u8::try_from(raw) {
            Ok(level) => Volume::Level(level.min(100)),
            Err(_) if raw < 0 => Volume::Fixed,
            Err(_) => Volume::Level(100),
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volume::Level(level) => write!(f, "{}", level),
            Volume::Fixed => write!(f, "fixed"),
        }
    }
}

/// Snapshot of `/Status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatus {
    pub track: TrackMetadata,
    pub volume: Option<Volume>,
    /// `play`, `pause`, `stop`, `stream`, ...
    pub state: String,
}

/// Result of a volume command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeChange {
    pub previous: Volume,
    pub current: Volume,
}

/// A song from a catalog search or an album track listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongRecord {
    /// Raw id as reported, e.g. `Tidal:12345`
    pub id: String,
    pub track: String,
    pub artist: String,
    pub album: String,
    pub title: String,
    pub date: String,
    pub quality: String,
    /// Length in seconds
    pub duration: Option<u32>,
}

impl SongRecord {
    /// Numeric id accepted by `Add?songid=`.
    pub fn song_id(&self) -> Option<u64> {
        self.id.rsplit(':').next()?.trim().parse().ok()
    }
}

impl fmt::Display for SongRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

pub struct BluosClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BluosClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .build(),
            base_url: format!("http://{}:{}", host, port),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` (relative to the player root) and return the body.
    fn get(&self, endpoint: &str) -> Result<String, BluosError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        debug!("GET {}", url);

        let response = self.agent.get(&url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => BluosError::Http(status),
            ureq::Error::Transport(t) => BluosError::Connection(t.to_string()),
        })?;

        response
            .into_string()
            .map_err(|e| BluosError::Connection(e.to_string()))
    }

    fn get_xml(&self, endpoint: &str) -> Result<Element, BluosError> {
        Ok(xml::parse(&self.get(endpoint)?)?)
    }

    // ── Playback ─────────────────────────────────────────────────────────────

    pub fn status(&self) -> Result<PlayerStatus, BluosError> {
        parse_status(&self.get_xml("Status")?)
    }

    /// Toggle between play and pause.
    pub fn pause(&self) -> Result<(), BluosError> {
        self.get("Pause?toggle=1").map(drop)
    }

    pub fn skip(&self) -> Result<(), BluosError> {
        self.get("Skip").map(drop)
    }

    pub fn back(&self) -> Result<(), BluosError> {
        self.get("Back").map(drop)
    }

    /// Read the volume and, with a `level`, change it.
    ///
    /// Large increases are stepped up one unit at a time so the speakers do
    /// not jump to full level.  A fixed-volume player can be read but not set.
    pub fn volume(&self, level: Option<u8>) -> Result<VolumeChange, BluosError> {
        let status = self.status()?;
        let previous = status.volume.ok_or_else(|| BluosError::InvalidField {
            field: "volume".to_string(),
            value: String::new(),
        })?;

        let Some(level) = level else {
            return Ok(VolumeChange {
                previous,
                current: previous,
            });
        };
        let steps = volume_steps(previous, level)?;
        let ramp = steps.len() > 1;
        for step in &steps {
            self.get(&format!("Volume?level={}", step))?;
            if ramp {
                thread::sleep(VOLUME_RAMP_STEP);
            }
        }

        let current = Volume::Level(steps.last().copied().unwrap_or(level));
        info!("volume {} -> {}", previous, current);
        Ok(VolumeChange { previous, current })
    }

    // ── Queue ────────────────────────────────────────────────────────────────

    pub fn play_queue(&self) -> Result<PlayQueue, BluosError> {
        let entries = self.collect_pages("Playlist".to_string(), parse_playlist_page)?;
        Ok(PlayQueue::new(entries))
    }

    /// Start playing the queue entry at `position`.
    pub fn play_position(&self, position: u32) -> Result<(), BluosError> {
        self.get(&format!("Play?id={}", position)).map(drop)
    }

    pub fn clear_queue(&self) -> Result<(), BluosError> {
        self.get("Clear").map(drop)
    }

    /// Remove the queue entry at `index` (0-based).
    pub fn delete_entry(&self, index: u32) -> Result<(), BluosError> {
        self.get(&format!("Delete?id={}", index)).map(drop)
    }

    /// Append a catalog album to the end of the queue.
    pub fn enqueue_album(&self, album_id: u64) -> Result<(), BluosError> {
        self.get(&format!(
            "Add?service={}&albumid={}&playnow=-1&where=last",
            SERVICE, album_id
        ))
        .map(drop)
    }

    pub fn enqueue_song(&self, song_id: u64) -> Result<(), BluosError> {
        self.get(&format!(
            "Add?service={}&songid={}&playnow=-1&where=last",
            SERVICE, song_id
        ))
        .map(drop)
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    pub fn search_albums(&self, query: &str) -> Result<Vec<CatalogRecord>, BluosError> {
        let url = format!("Albums?service={}&expr={}", SERVICE, quoted_expr(query));
        self.collect_pages(url, parse_album_page)
    }

    pub fn search_songs(&self, query: &str) -> Result<Vec<SongRecord>, BluosError> {
        let url = format!("Songs?service={}&expr={}", SERVICE, quoted_expr(query));
        self.collect_pages(url, parse_song_page)
    }

    /// Track listing of one catalog album.
    pub fn album_tracks(&self, album_id: u64) -> Result<Vec<SongRecord>, BluosError> {
        let url = format!("Songs?service={}&albumid={}", SERVICE, album_id);
        self.collect_pages(url, parse_song_page)
    }

    /// Search artists; an empty query lists favourite artists, most recent first.
    pub fn search_artists(&self, query: &str) -> Result<Vec<ArtistRecord>, BluosError> {
        let url = if query.trim().is_empty() {
            format!("Artists?service={}&category=FAVOURITES&sort=recent", SERVICE)
        } else {
            format!("Artists?service={}&expr={}", SERVICE, quoted_expr(query))
        };
        self.collect_pages(url, parse_artist_page)
    }

    pub fn artist_albums(&self, artist_id: &str) -> Result<Vec<CatalogRecord>, BluosError> {
        let url = format!(
            "Albums?service={}&artistid={}",
            SERVICE,
            percent_encode(artist_id)
        );
        self.collect_pages(url, parse_album_page)
    }

    /// Follow `nextlink` until the listing is exhausted.
    fn collect_pages<T>(
        &self,
        first: String,
        parse_page: fn(&Element) -> Result<Page<T>, BluosError>,
    ) -> Result<Vec<T>, BluosError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(url) = next.take() {
            let page = parse_page(&self.get_xml(&url)?)?;
            items.extend(page.items);
            pages += 1;

            if pages >= MAX_PAGES {
                debug!("stopping after {} pages", pages);
                break;
            }
            next = page.next;
        }

        Ok(items)
    }
}

impl Playback for BluosClient {
    fn current_track(&self) -> Result<TrackMetadata, Box<dyn Error>> {
        Ok(self.status()?.track)
    }

    fn enqueue_album(&self, album_id: u64) -> Result<(), Box<dyn Error>> {
        Ok(BluosClient::enqueue_album(self, album_id)?)
    }
}

impl QueueControl for BluosClient {
    fn play_queue(&self) -> Result<PlayQueue, Box<dyn Error>> {
        Ok(BluosClient::play_queue(self)?)
    }

    fn current_position(&self) -> Result<Option<u32>, Box<dyn Error>> {
        Ok(self.status()?.track.song_id)
    }

    fn delete_entry(&self, position: u32) -> Result<(), Box<dyn Error>> {
        Ok(BluosClient::delete_entry(self, position)?)
    }

    fn play_position(&self, position: u32) -> Result<(), Box<dyn Error>> {
        Ok(BluosClient::play_position(self, position)?)
    }
}

impl CatalogSearch for BluosClient {
    fn search_albums(&self, query: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        Ok(BluosClient::search_albums(self, query)?)
    }

    fn search_artists(&self, query: &str) -> Result<Vec<ArtistRecord>, Box<dyn Error>> {
        Ok(BluosClient::search_artists(self, query)?)
    }

    fn artist_albums(&self, artist_id: &str) -> Result<Vec<CatalogRecord>, Box<dyn Error>> {
        Ok(BluosClient::artist_albums(self, artist_id)?)
    }
}

/// Levels to send, in order, to go from `previous` to `level`.
fn volume_steps(previous: Volume, level: u8) -> Result<Vec<u8>, BluosError> {
    let Volume::Level(from) = previous else {
        return Err(BluosError::FixedVolume);
    };
    let target = level.min(100);

    if target.saturating_sub(from) > VOLUME_RAMP_THRESHOLD {
        Ok((from + 1..=target).collect())
    } else {
        Ok(vec![target])
    }
}

// ── Response parsing ─────────────────────────────────────────────────────────

fn optional_number<T: std::str::FromStr>(
    element: &Element,
    field: &str,
) -> Result<Option<T>, BluosError> {
    match element.field(field).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| BluosError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn text_field(element: &Element, field: &str) -> String {
    element.field(field).unwrap_or_default().to_string()
}

pub fn parse_status(root: &Element) -> Result<PlayerStatus, BluosError> {
    if root.name != "status" {
        return Err(BluosError::UnexpectedRoot(root.name.clone()));
    }

    Ok(PlayerStatus {
        track: TrackMetadata {
            artist: text_field(root, "artist"),
            album: text_field(root, "album"),
            title: text_field(root, "name"),
            song_id: optional_number(root, "song")?,
            secs: optional_number(root, "secs")?,
            totlen: optional_number(root, "totlen")?,
        },
        volume: optional_number::<i16>(root, "volume")?.map(Volume::from_raw),
        state: text_field(root, "state"),
    })
}

fn next_link(root: &Element) -> Option<String> {
    root.field("nextlink")
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
}

/// `<albums>` listing.  An `<error>` answer is an empty listing.
pub fn parse_album_page(root: &Element) -> Result<Page<CatalogRecord>, BluosError> {
    match root.name.as_str() {
        "albums" => {}
        "error" => {
            debug!("album listing answered with error: {}", root.text);
            return Ok(Page { items: Vec::new(), next: None });
        }
        other => return Err(BluosError::UnexpectedRoot(other.to_string())),
    }

    let items = root
        .children_named("album")
        .map(|album| CatalogRecord {
            id: text_field(album, "albumid"),
            artist: text_field(album, "art"),
            title: text_field(album, "title"),
            date: text_field(album, "date"),
            tracks: text_field(album, "tracks"),
        })
        .collect();

    Ok(Page {
        items,
        next: next_link(root),
    })
}

/// `<artists>` listing; each `<art artistid="…">` carries the name as text.
pub fn parse_artist_page(root: &Element) -> Result<Page<ArtistRecord>, BluosError> {
    match root.name.as_str() {
        "artists" => {}
        "error" => return Ok(Page { items: Vec::new(), next: None }),
        other => return Err(BluosError::UnexpectedRoot(other.to_string())),
    }

    let items = root
        .children_named("art")
        .map(|art| ArtistRecord {
            id: text_field(art, "artistid"),
            name: art.text.clone(),
        })
        .collect();

    Ok(Page {
        items,
        next: next_link(root),
    })
}

/// `<playlist>` listing of the play queue.
pub fn parse_playlist_page(root: &Element) -> Result<Page<QueueEntry>, BluosError> {
    match root.name.as_str() {
        "playlist" => {}
        "error" => return Ok(Page { items: Vec::new(), next: None }),
        other => return Err(BluosError::UnexpectedRoot(other.to_string())),
    }

    let items = root
        .children_named("song")
        .map(|song| -> Result<QueueEntry, BluosError> {
            let position = optional_number(song, "id")?.ok_or_else(|| BluosError::InvalidField {
                field: "id".to_string(),
                value: String::new(),
            })?;
            Ok(QueueEntry {
                position,
                artist: text_field(song, "art"),
                album: text_field(song, "alb"),
                title: text_field(song, "title"),
                album_id: optional_number(song, "albumid")?.unwrap_or(0),
            })
        })
        .collect::<Result<_, BluosError>>()?;

    Ok(Page {
        items,
        next: next_link(root),
    })
}

/// `<songs>` listing.  Search results are direct `<song>` children; an album
/// listing nests them in `<album>`, whose fields fill in what a song lacks.
pub fn parse_song_page(root: &Element) -> Result<Page<SongRecord>, BluosError> {
    match root.name.as_str() {
        "songs" => {}
        "error" => return Ok(Page { items: Vec::new(), next: None }),
        other => return Err(BluosError::UnexpectedRoot(other.to_string())),
    }

    let empty = Element::default();
    let direct = root.children_named("song").map(|song| (song, &empty));
    let nested = root
        .children_named("album")
        .flat_map(|album| album.children_named("song").map(move |song| (song, album)));

    let items = direct
        .chain(nested)
        .map(|(song, album)| -> Result<SongRecord, BluosError> {
            let field = |name: &str| {
                let value = text_field(song, name);
                if value.is_empty() {
                    text_field(album, name)
                } else {
                    value
                }
            };
            let album_title = match field("alb") {
                alb if alb.is_empty() => text_field(album, "title"),
                alb => alb,
            };
            Ok(SongRecord {
                id: text_field(song, "songid"),
                track: text_field(song, "track"),
                artist: field("art"),
                album: album_title,
                title: text_field(song, "title"),
                date: field("date"),
                quality: field("quality"),
                duration: optional_number(song, "time")?,
            })
        })
        .collect::<Result<_, BluosError>>()?;

    Ok(Page {
        items,
        next: next_link(root),
    })
}

/// `"query"`, double-quoted for an exact phrase search and percent-encoded.
fn quoted_expr(query: &str) -> String {
    percent_encode(&format!("\"{}\"", query.trim()))
}

/// Percent-encode everything except unreserved characters and `/`.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(doc: &str) -> Element {
        xml::parse(doc).unwrap()
    }

    #[test]
    fn test_parse_status() {
        let root = parse(
            r#"<status etag="abc">
                 <album>Souvlaki</album><artist>Slowdive</artist><name>Alison</name>
                 <secs>42</secs><song>3</song><state>play</state>
                 <totlen>231</totlen><volume>25</volume>
               </status>"#,
        );

        let status = parse_status(&root).unwrap();
        assert_eq!(status.track.artist, "Slowdive");
        assert_eq!(status.track.album, "Souvlaki");
        assert_eq!(status.track.title, "Alison");
        assert_eq!(status.track.song_id, Some(3));
        assert_eq!(status.track.secs, Some(42));
        assert_eq!(status.track.totlen, Some(231));
        assert_eq!(status.volume, Some(Volume::Level(25)));
        assert_eq!(status.state, "play");
    }

    #[test]
    fn test_parse_status_when_idle() {
        let status = parse_status(&parse("<status><state>stop</state><volume>10</volume></status>")).unwrap();
        assert_eq!(status.track.artist, "");
        assert_eq!(status.track.album, "");
        assert_eq!(status.track.song_id, None);
        assert_eq!(status.volume, Some(Volume::Level(10)));
    }

    #[test]
    fn test_parse_status_fixed_volume() {
        let status = parse_status(&parse(
            "<status><artist>Slowdive</artist><album>Souvlaki</album><volume>-1</volume></status>",
        ))
        .unwrap();
        assert_eq!(status.track.artist, "Slowdive");
        assert_eq!(status.track.album, "Souvlaki");
        assert_eq!(status.volume, Some(Volume::Fixed));
        assert_eq!(status.volume.unwrap().to_string(), "fixed");
    }

    #[test]
    fn test_volume_from_raw() {
        assert_eq!(Volume::from_raw(0), Volume::Level(0));
        assert_eq!(Volume::from_raw(100), Volume::Level(100));
        assert_eq!(Volume::from_raw(140), Volume::Level(100));
        assert_eq!(Volume::from_raw(300), Volume::Level(100));
        assert_eq!(Volume::from_raw(-1), Volume::Fixed);
    }

    #[test]
    fn test_volume_steps() {
        assert_eq!(volume_steps(Volume::Level(20), 25).unwrap(), vec![25]);
        assert_eq!(volume_steps(Volume::Level(20), 23).unwrap(), vec![23]);
        assert_eq!(volume_steps(Volume::Level(40), 10).unwrap(), vec![10]);
        assert_eq!(volume_steps(Volume::Level(20), 26).unwrap(), vec![21, 22, 23, 24, 25, 26]);
        assert_eq!(volume_steps(Volume::Level(98), 200).unwrap(), vec![100]);
    }

    #[test]
    fn test_fixed_volume_cannot_be_set() {
        let err = volume_steps(Volume::Fixed, 30).unwrap_err();
        assert!(matches!(err, BluosError::FixedVolume));
    }

    #[test]
    fn test_parse_status_rejects_garbage() {
        let err = parse_status(&parse("<status><song>three</song></status>")).unwrap_err();
        assert!(matches!(err, BluosError::InvalidField { ref field, .. } if field == "song"));

        let err = parse_status(&parse("<sync/>")).unwrap_err();
        assert!(matches!(err, BluosError::UnexpectedRoot(_)));
    }

    #[test]
    fn test_parse_album_page() {
        let root = parse(
            r#"<albums service="Tidal" nextlink="/Albums?service=Tidal&amp;expr=%2269%22&amp;start=2">
                 <album albumid="305664133" date="1988-01-01" tracks="10">
                   <title>69</title><art>A. R. Kane</art>
                 </album>
                 <album albumid="37267701">
                   <title>69 Love Songs</title><art>The Magnetic Fields</art>
                   <date>1999-09-07</date><tracks>69</tracks>
                 </album>
               </albums>"#,
        );

        let page = parse_album_page(&root).unwrap();
        assert_eq!(
            page.items,
            vec![
                CatalogRecord::new("305664133", "A. R. Kane", "69", "1988-01-01", "10"),
                CatalogRecord::new("37267701", "The Magnetic Fields", "69 Love Songs", "1999-09-07", "69"),
            ]
        );
        assert_eq!(page.next.as_deref(), Some("/Albums?service=Tidal&expr=%2269%22&start=2"));
    }

    #[test]
    fn test_parse_album_page_empty_and_error() {
        let page = parse_album_page(&parse("<albums/>")).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());

        let page = parse_album_page(&parse("<error>No results</error>")).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_parse_artist_page() {
        let root = parse(
            r#"<artists><art artistid="3528">Slowdive</art><art artistid="4001">Ride</art>
               <nextlink>/Artists?service=Tidal&amp;start=2</nextlink></artists>"#,
        );

        let page = parse_artist_page(&root).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0], ArtistRecord { id: "3528".into(), name: "Slowdive".into() });
        assert_eq!(page.items[1].name, "Ride");
        assert_eq!(page.next.as_deref(), Some("/Artists?service=Tidal&start=2"));
    }

    #[test]
    fn test_parse_playlist_page() {
        let root = parse(
            r#"<playlist name="Queue" length="3" id="1721">
                 <song id="0" albumid="37267701" service="Tidal">
                   <title>Absolutely Cuckoo</title><art>The Magnetic Fields</art><alb>69 Love Songs</alb>
                 </song>
                 <song id="1" albumid="37267701" service="Tidal">
                   <title>I Don't Believe In The Sun</title><art>The Magnetic Fields</art><alb>69 Love Songs</alb>
                 </song>
                 <song id="2" service="LocalMusic">
                   <title>Alison</title><art>Slowdive</art><alb>Souvlaki</alb>
                 </song>
               </playlist>"#,
        );

        let page = parse_playlist_page(&root).unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(
            page.items[1],
            QueueEntry {
                position: 1,
                artist: "The Magnetic Fields".into(),
                album: "69 Love Songs".into(),
                title: "I Don't Believe In The Sun".into(),
                album_id: 37267701,
            }
        );
        assert_eq!(page.items[2].album_id, 0);
        assert!(page.next.is_none());

        let queue = PlayQueue::new(page.items);
        assert_eq!(queue.albums().len(), 2);
        assert_eq!(queue.next_album_entry(0).unwrap().title, "Alison");
    }

    #[test]
    fn test_parse_playlist_page_empty_and_broken() {
        assert!(parse_playlist_page(&parse(r#"<playlist length="0"/>"#)).unwrap().items.is_empty());

        let err = parse_playlist_page(&parse("<playlist><song><title>x</title></song></playlist>")).unwrap_err();
        assert!(matches!(err, BluosError::InvalidField { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_parse_song_search_page() {
        let root = parse(
            r#"<songs service="Tidal" nextlink="/Songs?service=Tidal&amp;expr=%22alison%22&amp;start=2">
                 <song songid="Tidal:5236413" artistid="Tidal:3528">
                   <title>Alison</title><art>Slowdive</art><alb>Souvlaki</alb>
                   <quality>cd</quality><time>231</time>
                 </song>
               </songs>"#,
        );

        let page = parse_song_page(&root).unwrap();
        assert_eq!(page.items.len(), 1);
        let song = &page.items[0];
        assert_eq!(song.song_id(), Some(5236413));
        assert_eq!(song.to_string(), "Slowdive - Alison");
        assert_eq!(song.duration, Some(231));
        assert_eq!(song.quality, "cd");
        assert_eq!(page.next.as_deref(), Some("/Songs?service=Tidal&expr=%22alison%22&start=2"));
    }

    #[test]
    fn test_parse_album_track_page() {
        let root = parse(
            r#"<songs service="Tidal">
                 <album albumid="5236402">
                   <title>Souvlaki</title><art>Slowdive</art><date>1993-05-17</date>
                   <song songid="Tidal:5236413"><track>1</track><title>Alison</title>
                     <art>Slowdive</art><alb>Souvlaki</alb><quality>hd</quality><time>231</time></song>
                   <song songid="Tidal:5236414"><track>2</track><title>Machine Gun</title><time>268</time></song>
                 </album>
               </songs>"#,
        );

        let tracks = parse_song_page(&root).unwrap().items;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track, "1");
        assert_eq!(tracks[0].quality, "hd");
        assert_eq!(tracks[1].title, "Machine Gun");
        assert_eq!(tracks[1].artist, "Slowdive");
        assert_eq!(tracks[1].album, "Souvlaki");
        assert_eq!(tracks[1].date, "1993-05-17");
        assert_eq!(tracks[1].duration, Some(268));

        assert!(parse_song_page(&parse("<error>none</error>")).unwrap().items.is_empty());
    }

    #[test]
    fn test_song_id() {
        let song = |id: &str| SongRecord { id: id.to_string(), ..Default::default() };
        assert_eq!(song("Tidal:12345").song_id(), Some(12345));
        assert_eq!(song("12345").song_id(), Some(12345));
        assert_eq!(song("Tidal:").song_id(), None);
        assert_eq!(song("").song_id(), None);
    }

    #[test]
    fn test_quoted_expr() {
        assert_eq!(quoted_expr("A.R. Kane 69"), "%22A.R.%20Kane%2069%22");
        assert_eq!(quoted_expr("Tom & Jerry"), "%22Tom%20%26%20Jerry%22");
        assert_eq!(quoted_expr("Sigur Rós"), "%22Sigur%20R%C3%B3s%22");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(BluosClient::new("192.168.88.15", 11000).base_url(), "http://192.168.88.15:11000");
    }
}
