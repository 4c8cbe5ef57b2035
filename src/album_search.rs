//! Resolving a recommendation to a catalog album with fallback queries.
//!
//! A recommendation is searched with a fixed chain of queries, stopping at
//! the first one that returns any candidates:
//!
//! 1. **Basic** – `"{artist} {album}"`
//! 2. **Album only** – `"{album}"`, for when the model spells the artist
//!    differently from the catalog
//! 3. **Artist variations** – `"{variant} {album}"` for each spelling of the
//!    artist with periods removed, periods turned into spaces, and spaces
//!    removed (spellings identical to the original are skipped)
//!
//! The candidates of the winning query are ranked by
//! [`crate::artist_match::select_best`].

use tracing::debug;

use crate::artist_match::{self, MatchResult};
use crate::catalog::CatalogSearch;
use crate::recommendation::Recommendation;

/// Failure while resolving one recommendation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The catalog search itself failed.
    #[error("Error searching for {artist} - {album}: {cause}")]
    Catalog {
        artist: String,
        album: String,
        cause: String,
    },

    /// The chosen catalog record carries an id that is not a number.
    #[error("Catalog returned a non-numeric album id: {0:?}")]
    InvalidId(String),
}

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Basic,
    AlbumOnly,
    ArtistVariations,
}

impl Strategy {
    /// All strategies in the order they are tried.
    pub const ALL: [Strategy; 3] = [Strategy::Basic, Strategy::AlbumOnly, Strategy::ArtistVariations];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Basic => "artist + album",
            Strategy::AlbumOnly => "album only",
            Strategy::ArtistVariations => "artist variations",
        }
    }

    /// Queries this strategy issues for `query`, in order.
    pub fn queries<'q>(&self, query: &'q SearchQuery) -> Box<dyn Iterator<Item = String> + 'q> {
        match self {
            Strategy::Basic => Box::new(std::iter::once(query.combined())),
            Strategy::AlbumOnly => Box::new(std::iter::once(query.album_only())),
            Strategy::ArtistVariations => Box::new(
                query
                    .artist_variants()
                    .map(move |variant| format!("{} {}", variant, query.album)),
            ),
        }
    }
}

/// The query material derived from one recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub artist: String,
    pub album: String,
}

impl SearchQuery {
    pub fn new(recommendation: &Recommendation) -> Self {
        SearchQuery {
            artist: recommendation.artist.clone(),
            album: recommendation.album.clone(),
        }
    }

    pub fn combined(&self) -> String {
        format!("{} {}", self.artist, self.album)
    }

    pub fn album_only(&self) -> String {
        self.album.clone()
    }

    /// Alternative spellings of the artist, generated on demand.
    ///
    /// Spellings equal to the original artist string are skipped so that no
    /// query is sent twice.
    pub fn artist_variants(&self) -> impl Iterator<Item = String> + '_ {
        let transforms: [fn(&str) -> String; 3] = [
            |a| a.replace('.', ""),
            |a| a.replace('.', " "),
            |a| a.replace(' ', ""),
        ];
        transforms
            .into_iter()
            .map(move |transform| transform(&self.artist))
            .filter(move |variant| *variant != self.artist)
    }
}

/// Looks up recommendations in the catalog.
pub struct AlbumSearchService<'a> {
    catalog: &'a dyn CatalogSearch,
}

impl<'a> AlbumSearchService<'a> {
    pub fn new(catalog: &'a dyn CatalogSearch) -> Self {
        AlbumSearchService { catalog }
    }

    /// Resolve a recommendation to the best catalog album.
    ///
    /// `Ok(None)` means every strategy came back empty.
    pub fn find_best_match(
        &self,
        recommendation: &Recommendation,
    ) -> Result<Option<MatchResult>, SearchError> {
        let query = SearchQuery::new(recommendation);

        for strategy in Strategy::ALL {
            for search_query in strategy.queries(&query) {
                debug!(strategy = strategy.name(), "find_best_match search_query: {}", search_query);

                let candidates = self.catalog.search_albums(&search_query).map_err(|e| {
                    SearchError::Catalog {
                        artist: recommendation.artist.clone(),
                        album: recommendation.album.clone(),
                        cause: e.to_string(),
                    }
                })?;

                if candidates.is_empty() {
                    continue;
                }

                debug!(
                    "{} candidate(s) for {:?} via {}",
                    candidates.len(),
                    search_query,
                    strategy.name()
                );

                // Non-empty, so a candidate is always selected.
                return match artist_match::select_best(&candidates, &recommendation.artist) {
                    Some(best) => MatchResult::from_record(best).map(Some),
                    None => Ok(None),
                };
            }
        }

        debug!("no catalog match for {}", recommendation);
        Ok(None)
    }
}
