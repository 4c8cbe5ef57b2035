pub mod album_search;
pub mod artist_match;
pub mod bluos;
pub mod catalog;
pub mod config;
pub mod display;
pub mod favorites;
pub mod model_gateway;
pub mod prompts;
pub mod queue;
pub mod recommendation;
pub mod recommender;
pub mod search_cache;
pub mod xml;

pub use album_search::{AlbumSearchService, SearchError, Strategy};
pub use artist_match::{find_artist_match, MatchResult};
pub use bluos::{BluosClient, BluosError, PlayerStatus, SongRecord, Volume};
pub use catalog::{ArtistRecord, CatalogRecord, CatalogSearch, Playback, TrackMetadata};
pub use config::{Config, KeysFile};
pub use display::{ConsoleDisplay, RecommendationDisplay};
pub use favorites::{enqueue_from_favorites, FavoriteAlbum};
pub use model_gateway::{CredentialSource, ModelGateway, ModelResponse, ModelSettings};
pub use queue::{PlayQueue, QueueAlbum, QueueControl, QueueEntry};
pub use recommendation::{parse_recommendations, Recommendation};
pub use recommender::{DryRunSummary, Recommender};
pub use search_cache::CachedCatalog;
