//! # API Module
//!
//! HTTP endpoints of the playlist service, built on [Axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! - [`create_playlist`] - `POST /create-playlist`. Runs one pipeline for the
//!   account named in the `Authorization: Bearer` header and answers with the
//!   playlist's URL, name and track count.
//! - [`health`] - `GET /health`. Status and version for monitoring.
//!
//! ## Errors
//!
//! Failures are returned as [`ApiError`], which maps pipeline failure kinds to
//! status codes: invalid prompt `400`, missing session `401`, quota exceeded
//! `402`, unknown account `404`, anything else `500`. Bodies are JSON with
//! `error` and `kind`; server errors add a `detail`. Credentials never appear
//! in a body.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use promptlist::server::{AppState, build_router};
//!
//! let app = build_router(AppState { pipeline });
//! ```

mod error;
mod health;
mod playlist;

pub use error::ApiError;
pub use health::health;
pub use playlist::{bearer_account, create_playlist};
