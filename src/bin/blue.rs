use bluerec::config::ConfigError;
use bluerec::queue::{remove_album, remove_played, skip_to_next_album};
use bluerec::{
    enqueue_from_favorites, BluosClient, CachedCatalog, CatalogSearch, Config, ConsoleDisplay,
    CredentialSource, KeysFile, ModelGateway, Recommender, TrackMetadata,
};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use std::error::Error;
use std::process;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Control a BluOS player and fill its queue
#[derive(Parser)]
#[command(name = "blue", version, about, long_about = None)]
struct Cli {
    /// Player host name or address
    #[arg(long, global = true, env = "BLUE_HOST")]
    host: Option<String>,

    /// Player HTTP port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Model used for recommendations
    #[arg(long, global = true)]
    model: Option<String>,

    /// Output token limit per model request
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Bypass the catalog search cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current track
    Status,
    /// Show the queue album by album
    Queue,
    /// Toggle play/pause
    Pause,
    /// Skip to the next track
    Next {
        /// Skip to the first track of the next album
        #[arg(short, long)]
        album: bool,
    },
    /// Go back to the previous track
    Back,
    /// Show the volume, or set it
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: Option<u8>,
    },
    /// Clear the play queue
    Clear,
    /// Remove played tracks from the queue, or one whole album
    Cleanup {
        /// List queued albums with their numbers
        #[arg(long, conflicts_with = "album")]
        list: bool,
        /// Remove album number N of the listing
        #[arg(long, value_name = "N")]
        album: Option<usize>,
    },
    /// Remove one entry from the play queue
    Remove {
        /// Queue position, starting at 0
        index: u32,
    },
    /// Add a catalog song to the queue
    AddSong {
        id: u64,
    },
    /// Search albums, or songs, in the catalog
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Search songs instead of albums
        #[arg(long)]
        song: bool,
        /// Add result number N to the queue
        #[arg(long, value_name = "N")]
        add: Option<usize>,
    },
    /// List the tracks of a catalog album
    #[command(visible_alias = "preview")]
    Tracks {
        album_id: u64,
    },
    /// Search artists in the catalog
    Artists {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Queue albums from favourite artists
    Favorites {
        /// Number of artists to take albums from
        #[arg(default_value_t = 5)]
        count: usize,
        /// Pick favourite artists in random order
        #[arg(long)]
        shuffle: bool,
        /// Pick a random album instead of the latest
        #[arg(long)]
        random: bool,
    },
    /// Queue AI recommendations based on the playing album
    Ai {
        /// Only show what would be queued
        #[arg(long)]
        test: bool,
        /// Number of recommendations to ask for
        #[arg(long, default_value_t = bluerec::prompts::DEFAULT_RECOMMENDATION_COUNT)]
        count: usize,
    },
    /// Show effective settings, or save defaults
    Config {
        /// Also show the saved defaults file
        #[arg(long, conflicts_with = "save_defaults")]
        show: bool,
        /// Save the global options given on this command line
        #[arg(long)]
        save_defaults: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "bluerec=debug" } else { "bluerec=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Options given on the command line, as a config layer.
fn cmdline_config(cli: &Cli) -> Config {
    Config {
        host: cli.host.clone(),
        port: cli.port,
        model: cli.model.clone(),
        max_tokens: cli.max_tokens,
        base_url: cli.base_url.clone(),
        no_cache: cli.no_cache.then_some(true),
        ..Config::new()
    }
}

/// Format seconds as M:SS
fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// " [1:02 / 3:51 (26%)]", or nothing without timing
fn progress(track: &TrackMetadata) -> String {
    match (track.secs, track.totlen) {
        (Some(secs), Some(totlen)) => {
            let percentage = if totlen > 0 { u64::from(secs) * 100 / u64::from(totlen) } else { 0 };
            format!(" [{} / {} ({}%)]", format_time(secs), format_time(totlen), percentage)
        }
        _ => String::new(),
    }
}

/// Result number `n` (1-based) of a listing.
fn pick<T>(items: &[T], n: usize) -> Result<&T, String> {
    n.checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or_else(|| format!("no result number {} (1-{})", n, items.len()))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    // Built-in defaults, then saved config, then the command line
    let saved_config = Config::load().unwrap_or_else(|e| {
        warn!("ignoring saved config: {}", e);
        Config::new()
    });
    let cmdline = cmdline_config(&cli);
    let mut config = Config::builtin();
    config.merge(&saved_config);
    config.merge(&cmdline);
    debug!("effective config: {:?}", config);

    let client = BluosClient::new(config.host(), config.port());
    let ttl = config.cache_ttl();
    let cached;
    let catalog: &dyn CatalogSearch = if config.no_cache.unwrap_or(false) {
        &client
    } else {
        cached = CachedCatalog::new(&client, ttl);
        &cached
    };

    match cli.command {
        Commands::Status => {
            let status = client.status()?;
            let track = &status.track;
            if track.artist.is_empty() && track.title.is_empty() {
                println!("Nothing playing ({})", status.state);
                return Ok(());
            }

            println!(
                "{} {} - {} - {}{}",
                format!("{}:", track.song_id.unwrap_or(0)).red(),
                track.artist.as_str().blue().bold(),
                track.album.as_str().yellow(),
                track.title,
                progress(track)
            );
        }

        Commands::Queue => {
            let status = client.status()?;
            let queue = client.play_queue()?;
            if queue.is_empty() {
                println!("Queue is empty.");
                return Ok(());
            }

            let track = &status.track;
            let mut current_album = None;
            for (i, album) in queue.albums_up_to_current(track).iter().enumerate() {
                let line = format!("{} - {}", album.artist, album.album);
                if album.is_playing(track) {
                    current_album = Some(i + 1);
                    let number = format!("{:02}/{:03}", i + 1, track.song_id.unwrap_or(0));
                    println!("{} {}", number.red(), line);
                } else {
                    let number = format!("{:02}/{:03}", i + 1, album.first_position);
                    println!("{} {}", number.green(), line);
                }
            }

            if let Some(number) = current_album {
                println!(
                    "Playing Album No. {} Song No. {} {}: {} - {}{}",
                    number.to_string().red(),
                    track.song_id.unwrap_or(0),
                    track.album,
                    track.title,
                    track.artist,
                    progress(track)
                );
            }
        }

        Commands::Pause => client.pause()?,
        Commands::Next { album: false } => client.skip()?,
        Commands::Next { album: true } => match skip_to_next_album(&client)? {
            Some(entry) => println!("Playing {} - {}", entry.artist.as_str().blue().bold(), entry.album),
            None => println!("Nothing to skip to."),
        },
        Commands::Back => client.back()?,

        Commands::Volume { level } => {
            let change = client.volume(level)?;
            println!("Volume is {}", change.previous);
            if level.is_some() {
                println!("Volume new {}", change.current);
            }
        }

        Commands::Clear => {
            client.clear_queue()?;
            println!("Queue cleaned up.");
        }

        Commands::Cleanup { list, album } => {
            if !list && album.is_none() {
                let removed = remove_played(&client)?;
                println!("Removed {} played songs. Queue cleaned up.", removed);
                return Ok(());
            }

            let albums = client.play_queue()?.albums();
            if albums.is_empty() {
                println!("Queue is empty.");
                return Ok(());
            }
            match album {
                Some(n) => {
                    let target = pick(&albums, n)?;
                    let removed = remove_album(&client, target.album_id)?;
                    println!(
                        "Removed {} songs of {} - {} from queue.",
                        removed, target.artist, target.album
                    );
                }
                None => {
                    for (i, album) in albums.iter().enumerate() {
                        println!(
                            "{:3}. {} - {} ({} songs)",
                            i + 1,
                            album.artist.as_str().blue().bold(),
                            album.album,
                            album.song_count
                        );
                    }
                }
            }
        }

        Commands::Remove { index } => {
            client.delete_entry(index)?;
            println!("Removed queue entry {}.", index);
        }

        Commands::AddSong { id } => {
            client.enqueue_song(id)?;
            println!("Added song {} to queue.", id);
        }

        Commands::Search { query, song: true, add } => {
            let songs = client.search_songs(&query.join(" "))?;
            if songs.is_empty() {
                println!("No songs found.");
                return Ok(());
            }

            match add {
                Some(n) => {
                    let song = pick(&songs, n)?;
                    let id = song
                        .song_id()
                        .ok_or_else(|| format!("song {} has no numeric id", song))?;
                    client.enqueue_song(id)?;
                    println!("Added {} to queue.", song.to_string().green());
                }
                None => {
                    for (i, song) in songs.iter().enumerate() {
                        println!(
                            "{:3}. {} - {} {} {}",
                            i + 1,
                            song.artist.as_str().blue().bold(),
                            song.title,
                            song.duration.map(format_time).unwrap_or_default().dim(),
                            song.quality.as_str().dim()
                        );
                    }
                }
            }
        }

        Commands::Search { query, song: false, add } => {
            let albums = catalog.search_albums(&query.join(" "))?;
            if albums.is_empty() {
                println!("No albums found.");
                return Ok(());
            }

            match add {
                Some(n) => {
                    let album = pick(&albums, n)?;
                    let id: u64 = album
                        .id
                        .parse()
                        .map_err(|_| format!("album {} has no numeric id", album))?;
                    client.enqueue_album(id)?;
                    println!("Added {} to queue.", album.to_string().green());
                }
                None => {
                    for (i, album) in albums.iter().enumerate() {
                        println!(
                            "{:3}. {} - {} {} {} tracks {}",
                            i + 1,
                            album.artist.as_str().blue().bold(),
                            album.title,
                            album.date.as_str().dim(),
                            album.tracks,
                            album.id.as_str().dim()
                        );
                    }
                }
            }
        }

        Commands::Tracks { album_id } => {
            let tracks = client.album_tracks(album_id)?;
            let Some(first) = tracks.first() else {
                println!("No tracks found.");
                return Ok(());
            };

            println!("{} {}", "Artist:".green().bold(), first.artist);
            println!("{} {} {}", "Album:".blue().bold(), first.album, first.date);
            for track in &tracks {
                println!(
                    " {} {} {} {}",
                    track.track.as_str().cyan().bold(),
                    track.title,
                    track.duration.map(format_time).unwrap_or_default().red().bold(),
                    track.quality.as_str().yellow().bold()
                );
            }
        }

        Commands::Artists { query } => {
            let artists = catalog.search_artists(&query.join(" "))?;
            if artists.is_empty() {
                println!("No artists found.");
            }
            for artist in artists {
                println!("{} {}", artist.name.as_str().blue().bold(), artist.id.as_str().dim());
            }
        }

        Commands::Favorites { count, shuffle, random } => {
            let added = enqueue_from_favorites(
                catalog,
                &client,
                count,
                shuffle,
                random,
                &mut rand::thread_rng(),
            )?;
            println!(
                "{}",
                format!(
                    "Added {} albums from favorite artists:",
                    if random { "random" } else { "latest" }
                )
                .green()
                .bold()
            );
            for album in added {
                println!("- {}: {}", album.artist, album.title);
            }
        }

        Commands::Ai { test, count } => {
            let track = client.status()?.track;
            let keys = KeysFile::load_default();
            let gateway = ModelGateway::new(config.model_settings(&keys), CredentialSource::default());
            let mut display = ConsoleDisplay;
            let mut recommender = Recommender::new(gateway, catalog, &client, &mut display).with_count(count);

            if test {
                recommender.recommend_dry_run(&track.artist, &track.album);
            } else {
                recommender.recommend_and_enqueue(&track.artist, &track.album);
            }
        }

        Commands::Config { show, save_defaults } => {
            if save_defaults {
                let mut config_to_save = saved_config.clone();
                config_to_save.merge(&cmdline);
                let path = config_to_save.save()?;
                println!("Defaults saved to {:?}", path);
                println!();
                config_to_save.print("Saved configuration");
                return Ok(());
            }

            if show {
                match Config::get_config_path() {
                    Ok(path) if path.exists() => {
                        println!("Saved defaults from {:?}:", path);
                        saved_config.print("Configuration");
                    }
                    Ok(path) => println!("No saved defaults file found at {:?}", path),
                    Err(ConfigError::NoHome) => println!("Could not determine config file path"),
                    Err(e) => return Err(e.into()),
                }
                println!();
            }
            config.print("Effective settings");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("blue").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_become_config_layer() {
        let cli = parse(&["config", "--show", "--base-url", "http://localhost:8080/v1", "--port", "11001"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { show: true, save_defaults: false }));

        let config = cmdline_config(&cli);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.port, Some(11001));
        assert_eq!(config.no_cache, None);

        assert!(parse(&["config", "--show", "--save-defaults"]).is_err());
    }

    #[test]
    fn test_queue_commands() {
        assert!(matches!(parse(&["next"]).unwrap().command, Commands::Next { album: false }));
        assert!(matches!(parse(&["next", "--album"]).unwrap().command, Commands::Next { album: true }));
        assert!(matches!(
            parse(&["cleanup"]).unwrap().command,
            Commands::Cleanup { list: false, album: None }
        ));
        assert!(matches!(
            parse(&["cleanup", "--album", "2"]).unwrap().command,
            Commands::Cleanup { album: Some(2), .. }
        ));
        assert!(parse(&["cleanup", "--list", "--album", "2"]).is_err());
        assert!(matches!(parse(&["preview", "5236402"]).unwrap().command, Commands::Tracks { album_id: 5236402 }));
    }

    #[test]
    fn test_search_and_volume_arguments() {
        let cli = parse(&["search", "--song", "alison", "--add", "1"]).unwrap();
        match cli.command {
            Commands::Search { query, song, add } => {
                assert_eq!(query, vec!["alison"]);
                assert!(song);
                assert_eq!(add, Some(1));
            }
            _ => panic!("expected search"),
        }

        assert!(parse(&["volume", "101"]).is_err());
        assert!(matches!(parse(&["volume"]).unwrap().command, Commands::Volume { level: None }));
    }

    #[test]
    fn test_pick_and_progress() {
        let items = ["a", "b"];
        assert_eq!(pick(&items, 2), Ok(&"b"));
        assert!(pick(&items, 0).is_err());
        assert!(pick(&items, 3).is_err());

        let track = TrackMetadata {
            secs: Some(62),
            totlen: Some(231),
            ..Default::default()
        };
        assert_eq!(progress(&track), " [1:02 / 3:51 (26%)]");
        assert_eq!(progress(&TrackMetadata::default()), "");
    }
}
