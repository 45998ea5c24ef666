use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    error,
    error::FailureKind,
    info,
    pipeline::{Degradation, RunRequest},
    success,
    types::Credential,
    warning,
};

use super::context::build_pipeline;

/// Runs one pipeline from the command line. Ctrl-C cancels the run at its
/// next checkpoint.
pub async fn generate(
    prompt: &str,
    account_id: &str,
    credential: Credential,
    open: bool,
) {
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    let pipeline = match build_pipeline(&settings).await {
        Ok(p) => p,
        Err(e) => error!("Cannot set up the playlist pipeline. Err: {}", e),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let pb = ProgressBar::new_spinner();
    pb.set_message("Building your playlist...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let request = RunRequest {
        account_id: account_id.to_string(),
        prompt: prompt.to_string(),
        credential,
    };
    let result = pipeline.run(request, cancel).await;
    pb.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.kind() == FailureKind::AccountNotFound => error!(
            "Unknown account '{}'. Add it with `promptlist accounts add {}`",
            account_id, account_id
        ),
        Err(e) => error!("Playlist could not be created ({}). Err: {}", e.kind().as_str(), e),
    };

    let playlist = &outcome.playlist;
    success!(
        "Created playlist '{}' with {} tracks",
        playlist.name,
        playlist.resolved_track_count
    );
    info!("{}", playlist.public_url);

    if outcome.unmatched > 0 {
        warning!(
            "{} suggested tracks were not found on Spotify",
            outcome.unmatched
        );
    }

    for degradation in &outcome.degradations {
        match degradation {
            Degradation::AssemblyPartial(e) => {
                warning!("The playlist was created but its tracks could not be added: {}", e)
            }
            Degradation::RecordingFailed(e) => {
                warning!("The playlist was not counted against your quota: {}", e)
            }
        }
    }

    if open {
        if let Err(e) = webbrowser::open(&playlist.public_url) {
            warning!("Failed to open browser. Err: {}", e);
        }
    }
}
