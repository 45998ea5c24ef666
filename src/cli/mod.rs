//! # CLI Module
//!
//! Command-line front end for promptlist. Every command loads its settings
//! from the environment (see [`crate::config`]), prints colored status lines
//! and exits non-zero on fatal errors.
//!
//! ## Commands
//!
//! - [`serve`] - Runs the HTTP playlist service
//! - [`generate`] - Runs one pipeline for a prompt and prints the playlist URL,
//!   optionally opening it in the browser
//! - [`whoami`] - Verifies a Spotify credential, refreshing it if needed
//! - [`list_accounts`], [`add_account`], [`subscribe_account`] - Manage the
//!   persisted usage records that the free quota is checked against
//!
//! ## Usage Patterns
//!
//! ```bash
//! promptlist accounts add me
//! promptlist generate "late night city drive" --account me --access-token $TOKEN --open
//! promptlist accounts list
//! promptlist serve
//! ```

mod accounts;
mod context;
mod generate;
mod serve;
mod whoami;

pub use accounts::add_account;
pub use accounts::list_accounts;
pub use accounts::subscribe_account;
pub use context::build_pipeline;
pub use generate::generate;
pub use serve::serve;
pub use whoami::whoami;
