use std::sync::Arc;

use crate::{
    Res,
    config::Settings,
    llm::OpenAiClient,
    management::AccountUsageManager,
    pipeline::{EntitlementGate, PlaylistPipeline},
    spotify::SpotifyClient,
};

/// Wires the production collaborators into one pipeline.
pub async fn build_pipeline(settings: &Settings) -> Res<PlaylistPipeline> {
    let catalog = SpotifyClient::new(settings.spotify.clone(), settings.call_timeout)?;
    let model = OpenAiClient::new(settings.openai.clone(), settings.call_timeout)?;
    let store = AccountUsageManager::load(&settings.usage_store_path).await?;
    let gate = EntitlementGate::new(Arc::new(store), settings.strict_quota);

    Ok(PlaylistPipeline::new(
        Arc::new(model),
        Arc::new(catalog),
        Arc::new(gate),
        settings.call_timeout,
    ))
}
