//! CLI module for tuberag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// tuberag - ask questions about YouTube videos
///
/// Fetches a video's transcript, indexes it in memory and answers questions
/// grounded in what was said.
#[derive(Parser, Debug)]
#[command(name = "tuberag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TUBERAG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a question about a video
    Ask {
        /// YouTube URL or 11-character video ID
        video: String,

        /// The question to ask
        question: String,

        /// Also print the transcript chunks the answer was based on
        #[arg(short, long)]
        sources: bool,
    },

    /// Show the transcript chunks most similar to a query
    Search {
        /// YouTube URL or 11-character video ID
        video: String,

        /// Search query
        query: String,

        /// Number of chunks to return (defaults to retrieval.k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Fetch a video's transcript
    Transcript {
        /// YouTube URL or 11-character video ID
        video: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Emit JSON with source and language metadata
        #[arg(long)]
        json: bool,
    },

    /// Check credentials, browser and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["tuberag", "-v", "ask", "dQw4w9WgXcQ", "What is this?"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ask { video, question, sources } => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(question, "What is this?");
                assert!(!sources);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_with_k() {
        let cli = Cli::try_parse_from(["tuberag", "search", "https://youtu.be/dQw4w9WgXcQ", "ownership", "-k", "5"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Search { k: Some(5), .. }));
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["tuberag", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
