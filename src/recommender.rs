//! AI recommendations for the album that is currently playing.
//!
//! One run goes through five stages:
//!
//! 1. **Validate** – an empty artist or album stops the run before any request.
//! 2. **Fetch** – ask the model for similar artists.  A failure ends the run.
//! 3. **Parse** – turn the answer into [`Recommendation`]s.  Nothing parsed,
//!    nothing to do.
//! 4. **Resolve** – look every recommendation up in the catalog, in order,
//!    and enqueue it (apply mode) or just report it (dry run).  A failing
//!    item is reported and the loop moves on.
//! 5. **Explain** – one explanation for the whole list, then one per item.
//!    Failed explanations are reported quietly and skipped.
//!
//! Nothing is retried; every request runs once, one at a time.

use tracing::{debug, warn};

use crate::album_search::AlbumSearchService;
use crate::catalog::{CatalogSearch, Playback};
use crate::display::RecommendationDisplay;
use crate::model_gateway::{ModelGateway, ModelResponse};
use crate::prompts::{self, DEFAULT_RECOMMENDATION_COUNT};
use crate::recommendation::{parse_recommendations, Recommendation};

const RECOMMENDATION_INTENT: &str = "AI recommendations";
const GENERAL_EXPLANATION_INTENT: &str = "general explanation";

/// Outcome of a dry run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DryRunSummary {
    pub found: usize,
    pub total: usize,
}

pub struct Recommender<'a> {
    gateway: ModelGateway,
    catalog: &'a dyn CatalogSearch,
    playback: &'a dyn Playback,
    display: &'a mut dyn RecommendationDisplay,
    count: usize,
}

impl<'a> Recommender<'a> {
    pub fn new(
        gateway: ModelGateway,
        catalog: &'a dyn CatalogSearch,
        playback: &'a dyn Playback,
        display: &'a mut dyn RecommendationDisplay,
    ) -> Self {
        Recommender {
            gateway,
            catalog,
            playback,
            display,
            count: DEFAULT_RECOMMENDATION_COUNT,
        }
    }

    /// Number of recommendations to ask the model for.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Fetch recommendations and enqueue every album found in the catalog.
    ///
    /// Returns the number of albums added to the queue.
    pub fn recommend_and_enqueue(&mut self, artist: &str, album: &str) -> usize {
        let (artist, album) = (artist.trim(), album.trim());
        let recommendations = match self.fetch_recommendations(artist, album, false) {
            Some(recs) => recs,
            None => return 0,
        };

        let search = AlbumSearchService::new(self.catalog);
        let mut added = 0;

        for rec in &recommendations {
            self.display.searching(rec);

            match search.find_best_match(rec) {
                Ok(Some(result)) => match self.playback.enqueue_album(result.id) {
                    Ok(()) => {
                        self.display.added(&result);
                        added += 1;
                    }
                    Err(e) => {
                        warn!("enqueue of album {} failed: {}", result.id, e);
                        self.display.enqueue_failed(&result, &e.to_string());
                    }
                },
                Ok(None) => self.display.not_found(rec),
                Err(e) => self.display.search_failed(rec, &e),
            }
        }

        self.display.apply_summary(added);
        self.explain(artist, album, &recommendations);

        added
    }

    /// Fetch recommendations and report which ones the catalog has,
    /// without touching the queue.
    pub fn recommend_dry_run(&mut self, artist: &str, album: &str) -> DryRunSummary {
        let (artist, album) = (artist.trim(), album.trim());
        let recommendations = match self.fetch_recommendations(artist, album, true) {
            Some(recs) => recs,
            None => return DryRunSummary::default(),
        };

        let search = AlbumSearchService::new(self.catalog);
        let mut summary = DryRunSummary {
            found: 0,
            total: recommendations.len(),
        };

        for rec in &recommendations {
            self.display.searching(rec);

            match search.find_best_match(rec) {
                Ok(Some(result)) => {
                    self.display.found(&result);
                    summary.found += 1;
                }
                Ok(None) => self.display.not_found(rec),
                Err(e) => self.display.search_failed(rec, &e),
            }
        }

        self.display.dry_run_summary(summary.found, summary.total);
        self.explain(artist, album, &recommendations);

        summary
    }

    /// Stages 1-3.  `None` ends the run.
    fn fetch_recommendations(
        &mut self,
        artist: &str,
        album: &str,
        dry_run: bool,
    ) -> Option<Vec<Recommendation>> {
        if artist.is_empty() || album.is_empty() {
            self.display.missing_metadata();
            return None;
        }

        self.display.getting_recommendations(artist, album, dry_run);

        let prompt = prompts::recommendation_prompt(artist, album, self.count);
        let text = match self.gateway.make_request(&prompt, RECOMMENDATION_INTENT) {
            ModelResponse::Success(text) => text,
            ModelResponse::Failure(failure) => {
                self.display.model_failure(&failure);
                return None;
            }
        };

        self.display.raw_recommendations(&text);

        let recommendations = parse_recommendations(&text);
        debug!("parsed {} recommendation(s)", recommendations.len());

        if recommendations.is_empty() {
            return None;
        }
        Some(recommendations)
    }

    /// Stage 5.
    fn explain(&mut self, artist: &str, album: &str, recommendations: &[Recommendation]) {
        if recommendations.is_empty() {
            return;
        }

        self.display.explanation_header();

        let prompt = prompts::general_explanation_prompt(artist, album, recommendations);
        match self.gateway.make_request(&prompt, GENERAL_EXPLANATION_INTENT) {
            ModelResponse::Success(text) => self.display.general_explanation(&text),
            ModelResponse::Failure(failure) => {
                self.display.explanation_failed(&failure.to_string())
            }
        }

        self.display.individual_header();

        for (i, rec) in recommendations.iter().enumerate() {
            let prompt =
                prompts::specific_explanation_prompt(artist, album, &rec.artist, &rec.album);
            let intent = format!("explanation for {}", rec.artist);

            match self.gateway.make_request(&prompt, &intent) {
                ModelResponse::Success(text) => self.display.specific_explanation(i + 1, rec, &text),
                ModelResponse::Failure(failure) => {
                    self.display.explanation_failed(&failure.to_string())
                }
            }
        }
    }
}
