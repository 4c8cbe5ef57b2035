//! User-facing output of the recommendation run.
//!
//! The orchestrator reports every step through [`RecommendationDisplay`];
//! [`ConsoleDisplay`] renders it to the terminal with crossterm colours.

use crossterm::style::Stylize;

use crate::album_search::SearchError;
use crate::artist_match::MatchResult;
use crate::model_gateway::ModelFailure;
use crate::recommendation::Recommendation;

pub trait RecommendationDisplay {
    fn missing_metadata(&mut self);
    fn getting_recommendations(&mut self, artist: &str, album: &str, dry_run: bool);
    fn model_failure(&mut self, failure: &ModelFailure);
    fn raw_recommendations(&mut self, text: &str);

    fn searching(&mut self, recommendation: &Recommendation);
    fn added(&mut self, result: &MatchResult);
    fn found(&mut self, result: &MatchResult);
    fn not_found(&mut self, recommendation: &Recommendation);
    fn search_failed(&mut self, recommendation: &Recommendation, error: &SearchError);
    fn enqueue_failed(&mut self, result: &MatchResult, error: &str);

    fn apply_summary(&mut self, added: usize);
    fn dry_run_summary(&mut self, found: usize, total: usize);

    fn explanation_header(&mut self);
    fn general_explanation(&mut self, text: &str);
    fn individual_header(&mut self);
    fn specific_explanation(&mut self, index: usize, recommendation: &Recommendation, text: &str);
    /// Low-priority notice for an explanation that could not be fetched.
    fn explanation_failed(&mut self, message: &str);
}

/// Renders to stdout.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl RecommendationDisplay for ConsoleDisplay {
    fn missing_metadata(&mut self) {
        println!(
            "{} Unable to determine the current artist and album. \
             Start playback of an album and try again.",
            "Error:".red()
        );
    }

    fn getting_recommendations(&mut self, artist: &str, album: &str, dry_run: bool) {
        if dry_run {
            print!("{} ", "TEST MODE:".yellow().bold());
        }
        println!(
            "Getting AI recommendations for: {} - {}",
            artist.blue().bold(),
            album.yellow().bold()
        );
    }

    fn model_failure(&mut self, failure: &ModelFailure) {
        match failure {
            ModelFailure::MissingCredential { env_var, key_file } => {
                println!("{} OpenAI API key not found", "Error:".red());
                println!("Please set your OpenAI API key:");
                println!("  - Environment: export {}=your_key_here", env_var);
                println!("  - Or add \"api_key\" to: {}", key_file);
            }
            other => println!("{}", other.to_string().red()),
        }
    }

    fn raw_recommendations(&mut self, text: &str) {
        println!("\n{}\n{}\n", "AI Recommendations:".green().bold(), text);
    }

    fn searching(&mut self, recommendation: &Recommendation) {
        println!(
            "Searching for: {} - {}",
            recommendation.artist.as_str().cyan(),
            recommendation.album.as_str().yellow()
        );
    }

    fn added(&mut self, result: &MatchResult) {
        println!(
            "  Added: {}",
            format!("{} - {}", result.artist, result.title).green()
        );
    }

    fn found(&mut self, result: &MatchResult) {
        println!(
            "  Found: {} ({}) - {} tracks",
            format!("{} - {}", result.artist, result.title).green(),
            result.date,
            result.tracks
        );
    }

    fn not_found(&mut self, recommendation: &Recommendation) {
        println!(
            "  {}",
            format!("No results found for {}", recommendation).red()
        );
    }

    fn search_failed(&mut self, _recommendation: &Recommendation, error: &SearchError) {
        println!("  {}", error.to_string().red());
    }

    fn enqueue_failed(&mut self, result: &MatchResult, error: &str) {
        println!(
            "  {}",
            format!("Could not add {} - {}: {}", result.artist, result.title, error).red()
        );
    }

    fn apply_summary(&mut self, added: usize) {
        println!(
            "\n{}",
            format!("Successfully added {} albums to queue!", added).green().bold()
        );
    }

    fn dry_run_summary(&mut self, found: usize, total: usize) {
        println!(
            "\n{} Found {} out of {} recommendations in the catalog",
            "Test Summary:".blue().bold(),
            found,
            total
        );
        println!("{}", "Run without --test to actually add albums to queue".dim());
    }

    fn explanation_header(&mut self) {
        println!("\n{}", "AI Explanation".magenta().bold());
    }

    fn general_explanation(&mut self, text: &str) {
        println!("\n{}\n{}", "Why these recommendations?".cyan().bold(), text);
    }

    fn individual_header(&mut self) {
        println!("\n{}", "Individual explanations:".cyan().bold());
    }

    fn specific_explanation(&mut self, index: usize, recommendation: &Recommendation, text: &str) {
        println!("\n{}", format!("{}. {}", index, recommendation).yellow());
        println!("   {}", text);
    }

    fn explanation_failed(&mut self, message: &str) {
        println!("{}", message.dim());
    }
}
