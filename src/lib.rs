//! Promptlist Library
//!
//! Turns a free-text prompt into a playlist on the user's Spotify account.
//! A language model drafts the playlist, the draft is matched against the
//! Spotify catalog, and the matched tracks are saved into a new playlist
//! while a per-account free quota is enforced.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the playlist service
//! - `catalog` - Music-service capability used by the pipeline
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error types for every layer
//! - `fakes` - In-process collaborators for tests (`test-utils` feature)
//! - `llm` - Language-model capability and the OpenAI client
//! - `management` - Persisted per-account usage records
//! - `pipeline` - The playlist generation pipeline
//! - `server` - HTTP server wiring
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```ignore
//! use promptlist::{config, cli, types::Credential};
//!
//! #[tokio::main]
//! async fn main() -> promptlist::Res<()> {
//!     config::load_env().await?;
//!     let credential = Credential::new("BQD...", None);
//!     cli::generate("rainy sunday jazz", "acct-1", credential, false).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod fakes;
pub mod llm;
pub mod management;
pub mod pipeline;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for the binary and CLI glue.
///
/// Library layers return their own error enums from [`error`]; this alias is
/// for the outer edges where any of them may surface.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```ignore
/// info!("Found {} accounts", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for command-line paths where recovery is not possible. Library code
/// and the HTTP server never use it.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
