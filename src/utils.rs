use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{AccountTableRow, AccountUsage, DraftTrack};

/// Random id used to correlate the log lines of one pipeline run.
pub fn generate_run_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Short, non-reversible tag for a secret so it can appear in logs.
pub fn fingerprint(secret: &str) -> String {
    let hash = Sha256::digest(secret.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(hash);
    encoded.truncate(10);
    encoded
}

/// Builds the field-scoped catalog query for a suggested track.
///
/// Double quotes inside the values would end the quoted field early, so they
/// are dropped.
pub fn build_track_query(track: &DraftTrack) -> String {
    format!(
        "track:\"{name}\" artist:\"{artist}\"",
        name = strip_quotes(&track.name),
        artist = strip_quotes(&track.artist)
    )
}

fn strip_quotes(value: &str) -> String {
    value.trim().replace('"', "")
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://open.spotify.com/playlist/{}", playlist_id)
}

/// Sorts accounts by id for table output.
pub fn account_table_rows(mut accounts: Vec<AccountUsage>) -> Vec<AccountTableRow> {
    accounts.sort_by(|a, b| a.account_id.cmp(&b.account_id));
    accounts
        .into_iter()
        .map(|a| AccountTableRow {
            account: a.account_id,
            playlists: a.playlist_count,
            subscribed: if a.is_subscribed { "yes" } else { "no" }.to_string(),
        })
        .collect()
}
