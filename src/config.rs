//! Configuration management for promptlist.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the platform-specific local data directory:
//!
//! - Linux: `~/.local/share/promptlist/.env`
//! - macOS: `~/Library/Application Support/promptlist/.env`
//! - Windows: `%LOCALAPPDATA%/promptlist/.env`
//!
//! Variables already present in the process environment take precedence over
//! the file. [`Settings::from_env`] collects everything the server and CLI need
//! and reports the first missing required variable.

use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 20;

/// Returns the application directory inside the local data directory.
///
/// Falls back to the current directory when the platform has no local data
/// directory.
///
/// # Example
///
/// ```ignore
/// let env_file = data_dir().join(".env"); // e.g. ~/.local/share/promptlist/.env
/// ```
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("promptlist");
    path
}

/// Loads environment variables from `<data_dir>/.env`.
///
/// Creates the data directory if needed and loads the `.env` file found
/// there. Variables already set in the process environment are not
/// overwritten.
///
/// # Returns
///
/// Returns `Ok(())` when the file was loaded or does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Env`] if:
/// - The data directory cannot be created
/// - The `.env` file exists but cannot be read or parsed
///
/// # Example
///
/// ```ignore
/// use promptlist::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<(), ConfigError> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| ConfigError::Env(e.to_string()))?;

    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| ConfigError::Env(e.to_string()))
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the address the HTTP server binds to.
///
/// Reads `SERVER_ADDRESS` and falls back to [`DEFAULT_SERVER_ADDRESS`].
///
/// # Example
///
/// ```ignore
/// let addr = server_addr(); // e.g. "127.0.0.1:8080"
/// ```
pub fn server_addr() -> String {
    optional("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Returns the Spotify Web API base URL.
///
/// Reads `SPOTIFY_API_URL` and falls back to [`DEFAULT_SPOTIFY_API_URL`].
/// Tests point it at a local mock server.
///
/// # Example
///
/// ```ignore
/// let url = spotify_apiurl(); // e.g. "https://api.spotify.com/v1"
/// ```
pub fn spotify_apiurl() -> String {
    optional("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string())
}

/// Returns the Spotify accounts endpoint used for refresh grants.
///
/// Reads `SPOTIFY_API_TOKEN_URL` and falls back to
/// [`DEFAULT_SPOTIFY_TOKEN_URL`].
///
/// # Example
///
/// ```ignore
/// let url = spotify_apitoken_url(); // e.g. "https://accounts.spotify.com/api/token"
/// ```
pub fn spotify_apitoken_url() -> String {
    optional("SPOTIFY_API_TOKEN_URL").unwrap_or_else(|| DEFAULT_SPOTIFY_TOKEN_URL.to_string())
}

/// Returns the Spotify API client ID.
///
/// Reads `SPOTIFY_API_AUTH_CLIENT_ID`, the client ID obtained when
/// registering the application on Spotify's developer platform. It is sent
/// with every refresh grant.
///
/// # Errors
///
/// Returns [`ConfigError::Missing`] if the variable is unset or blank.
///
/// # Example
///
/// ```ignore
/// let client_id = spotify_client_id()?; // e.g. "abc123..."
/// ```
pub fn spotify_client_id() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Returns the Spotify API client secret, if configured.
///
/// Reads `SPOTIFY_API_AUTH_CLIENT_SECRET`. Only confidential Spotify apps
/// have a secret; PKCE apps refresh without one.
///
/// # Example
///
/// ```ignore
/// if spotify_client_secret().is_none() {
///     // refresh grants carry only the client id
/// }
/// ```
pub fn spotify_client_secret() -> Option<String> {
    optional("SPOTIFY_API_AUTH_CLIENT_SECRET")
}

/// Returns the base URL of the OpenAI-compatible chat completions API.
///
/// Reads `OPENAI_API_URL` and falls back to [`DEFAULT_OPENAI_API_URL`]. Any
/// server speaking the same protocol can be used.
///
/// # Example
///
/// ```ignore
/// let url = openai_apiurl(); // e.g. "https://api.openai.com/v1"
/// ```
pub fn openai_apiurl() -> String {
    optional("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string())
}

/// Returns the API key for the language model service.
///
/// Reads `OPENAI_API_KEY`.
///
/// # Errors
///
/// Returns [`ConfigError::Missing`] if the variable is unset or blank.
pub fn openai_api_key() -> Result<String, ConfigError> {
    required("OPENAI_API_KEY")
}

/// Returns the model used to draft playlists.
///
/// Reads `OPENAI_MODEL` and falls back to [`DEFAULT_OPENAI_MODEL`]. The model
/// must support JSON schema response formats.
pub fn openai_model() -> String {
    optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
}

/// Returns the upper bound applied to every external call.
///
/// Reads `CALL_TIMEOUT_SECS` as whole seconds and falls back to
/// [`DEFAULT_CALL_TIMEOUT_SECS`]. The bound covers the language model call,
/// each catalog request and each token refresh.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the value is not a positive integer.
///
/// # Example
///
/// ```ignore
/// let timeout = call_timeout()?; // e.g. Duration::from_secs(20)
/// ```
pub fn call_timeout() -> Result<Duration, ConfigError> {
    match optional("CALL_TIMEOUT_SECS") {
        None => Ok(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS)),
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::Invalid {
                name: "CALL_TIMEOUT_SECS",
                value: v,
            }),
    }
}

/// Returns whether concurrent runs of one account are admitted strictly.
///
/// Reads `STRICT_QUOTA` and defaults to `true`. Accepted values are
/// `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, case-insensitive.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for any other value.
pub fn strict_quota() -> Result<bool, ConfigError> {
    match optional("STRICT_QUOTA") {
        None => Ok(true),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name: "STRICT_QUOTA",
                value: v,
            }),
        },
    }
}

/// Returns the location of the persisted account usage file.
///
/// Reads `USAGE_STORE_PATH` and falls back to `accounts.json` inside
/// [`data_dir`].
///
/// # Example
///
/// ```ignore
/// let path = usage_store_path(); // e.g. ~/.local/share/promptlist/accounts.json
/// ```
pub fn usage_store_path() -> PathBuf {
    optional("USAGE_STORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir().join("accounts.json"))
}

/// Spotify endpoints and client credentials.
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub api_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl SpotifySettings {
    /// Collects the Spotify settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `SPOTIFY_API_AUTH_CLIENT_ID` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: spotify_apiurl(),
            token_url: spotify_apitoken_url(),
            client_id: spotify_client_id()?,
            client_secret: spotify_client_secret(),
        })
    }
}

/// Language model endpoint, key and model name.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl OpenAiSettings {
    /// Collects the language model settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: openai_apiurl(),
            api_key: openai_api_key()?,
            model: openai_model(),
        })
    }
}

/// Everything needed to run the server or a CLI pipeline run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub spotify: SpotifySettings,
    pub openai: OpenAiSettings,
    pub call_timeout: Duration,
    pub strict_quota: bool,
    pub usage_store_path: PathBuf,
}

impl Settings {
    /// Collects all settings from the environment.
    ///
    /// Call [`load_env`] first so values from the `.env` file are visible.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] hit: a missing required variable or
    /// an unparseable `CALL_TIMEOUT_SECS` / `STRICT_QUOTA`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// config::load_env().await?;
    /// let settings = Settings::from_env()?;
    /// println!("Listening on {}", settings.server_addr);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_addr: server_addr(),
            spotify: SpotifySettings::from_env()?,
            openai: OpenAiSettings::from_env()?,
            call_timeout: call_timeout()?,
            strict_quota: strict_quota()?,
            usage_store_path: usage_store_path(),
        })
    }
}
