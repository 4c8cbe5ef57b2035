//! Picking the catalog album whose artist best matches a recommendation.
//!
//! The model and the catalog rarely spell an artist the same way
//! ("A.R. Kane" vs "A. R. Kane", "Magnetic Fields" vs "The Magnetic Fields"),
//! so candidates are compared in three passes of decreasing strictness:
//!
//! 1. case-insensitive equality
//! 2. case-insensitive containment, in either direction
//! 3. equality after removing periods and spaces
//!
//! The first candidate that satisfies a pass wins.  When none does, the
//! catalog's own ranking is trusted and the first candidate is used.

use crate::album_search::SearchError;
use crate::catalog::CatalogRecord;

/// A catalog album chosen for a recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub id: u64,
    pub artist: String,
    pub title: String,
    pub date: String,
    pub tracks: String,
    pub found: bool,
}

impl MatchResult {
    /// Build a result from a catalog record.  The record id must be numeric.
    pub fn from_record(record: &CatalogRecord) -> Result<Self, SearchError> {
        let id = record
            .id
            .trim()
            .parse::<u64>()
            .map_err(|_| SearchError::InvalidId(record.id.clone()))?;

        Ok(MatchResult {
            id,
            artist: record.artist.clone(),
            title: record.title.clone(),
            date: record.date.clone(),
            tracks: record.tracks.clone(),
            found: true,
        })
    }
}

/// Lowercase and drop periods and spaces: "A. R. Kane" -> "arkane".
pub fn normalize_artist(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != ' ')
        .collect()
}

/// Run the three matching passes; `None` when no candidate satisfies any of them.
pub fn find_artist_match<'a>(
    candidates: &'a [CatalogRecord],
    target_artist: &str,
) -> Option<&'a CatalogRecord> {
    let target_lower = target_artist.to_lowercase();

    if let Some(exact) = candidates
        .iter()
        .find(|c| c.artist.to_lowercase() == target_lower)
    {
        return Some(exact);
    }

    if let Some(partial) = candidates.iter().find(|c| {
        let artist_lower = c.artist.to_lowercase();
        target_lower.contains(&artist_lower) || artist_lower.contains(&target_lower)
    }) {
        return Some(partial);
    }

    let target_normalized = normalize_artist(target_artist);
    candidates
        .iter()
        .find(|c| normalize_artist(&c.artist) == target_normalized)
}

/// Best candidate for `target_artist`, falling back to the first candidate.
/// Only an empty list yields `None`.
pub fn select_best<'a>(
    candidates: &'a [CatalogRecord],
    target_artist: &str,
) -> Option<&'a CatalogRecord> {
    find_artist_match(candidates, target_artist).or_else(|| candidates.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_albums() -> Vec<CatalogRecord> {
        vec![
            CatalogRecord::new("305664133", "A. R. Kane", "69", "1988-01-01", "10"),
            CatalogRecord::new("37267701", "The Magnetic Fields", "69 Love Songs", "1999-09-07", "69"),
            CatalogRecord::new("108681532", "Wilson Tanner", "69", "2016-04-01", "8"),
        ]
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let albums = sample_albums();
        let best = find_artist_match(&albums, "a. r. kane").unwrap();
        assert_eq!(best.artist, "A. R. Kane");
        assert_eq!(best.title, "69");
    }

    #[test]
    fn test_exact_match_beats_earlier_partial_match() {
        let albums = vec![
            CatalogRecord::new("1", "Slowdive Tribute Band", "Souvlaki", "", ""),
            CatalogRecord::new("2", "Slowdive", "Souvlaki", "", ""),
        ];
        assert_eq!(select_best(&albums, "slowdive").unwrap().id, "2");
    }

    #[test]
    fn test_partial_match() {
        let albums = sample_albums();
        let best = find_artist_match(&albums, "Magnetic Fields").unwrap();
        assert_eq!(best.artist, "The Magnetic Fields");
        assert_eq!(best.title, "69 Love Songs");
    }

    #[test]
    fn test_normalized_match() {
        let albums = sample_albums();
        let best = find_artist_match(&albums, "A.R. Kane").unwrap();
        assert_eq!(best.artist, "A. R. Kane");

        let best = find_artist_match(&albums, "ARKane").unwrap();
        assert_eq!(best.artist, "A. R. Kane");
    }

    #[test]
    fn test_normalized_match_is_not_first_result_fallback() {
        let albums = vec![
            CatalogRecord::new("37267701", "The Magnetic Fields", "69 Love Songs", "", ""),
            CatalogRecord::new("305664133", "A. R. Kane", "69", "", ""),
        ];
        let best = select_best(&albums, "A.R. Kane").unwrap();
        assert_eq!(best.artist, "A. R. Kane");
    }

    #[test]
    fn test_no_match() {
        let albums = sample_albums();
        assert!(find_artist_match(&albums, "Nonexistent Artist").is_none());
    }

    #[test]
    fn test_fallback_to_first_candidate() {
        let albums = sample_albums();
        let best = select_best(&albums, "Nonexistent Artist").unwrap();
        assert_eq!(best, &albums[0]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(find_artist_match(&[], "Any Artist").is_none());
        assert!(select_best(&[], "Any Artist").is_none());
    }

    #[test]
    fn test_normalize_artist() {
        assert_eq!(normalize_artist("A. R. Kane"), "arkane");
        assert_eq!(normalize_artist("A.R. Kane"), "arkane");
        assert_eq!(normalize_artist("R.E.M."), "rem");
    }

    #[test]
    fn test_match_result_from_record() {
        let record = CatalogRecord::new("305664133", "A. R. Kane", "69", "1988-01-01", "10");
        let result = MatchResult::from_record(&record).unwrap();
        assert_eq!(result.id, 305664133);
        assert_eq!(result.artist, "A. R. Kane");
        assert_eq!(result.title, "69");
        assert_eq!(result.date, "1988-01-01");
        assert_eq!(result.tracks, "10");
        assert!(result.found);
    }

    #[test]
    fn test_match_result_rejects_non_numeric_id() {
        let record = CatalogRecord::new("album:42", "Artist", "Title", "", "");
        match MatchResult::from_record(&record) {
            Err(SearchError::InvalidId(id)) => assert_eq!(id, "album:42"),
            other => panic!("expected InvalidId, got {:?}", other),
        }
    }
}
