use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    error::{GenerationError, LlmError},
    llm::LanguageModel,
    types::{CompletionRequest, DraftPlaylist, MAX_DRAFT_TRACKS},
};

const SYSTEM_INSTRUCTION: &str = "You are a music curator. Build a playlist for the user's \
request. Reply only with the JSON document described by the response schema: a short \
playlist name, a one-sentence description, and an ordered list of real, released songs \
with the name of the performing artist. Suggest at most 99 tracks and match the number \
of tracks the user asks for when they give one.";

/// JSON schema the model's answer must satisfy.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "description": { "type": "string" },
            "tracks": {
                "type": "array",
                "maxItems": MAX_DRAFT_TRACKS,
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "artist": { "type": "string" }
                    },
                    "required": ["name", "artist"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["name", "description", "tracks"],
        "additionalProperties": false
    })
}

/// Parses and validates the model's document.
///
/// The `description` key must be present but may be empty. Track lists over
/// the limit are cut to the first [`MAX_DRAFT_TRACKS`] entries.
pub fn parse_draft(raw: &str) -> Result<DraftPlaylist, GenerationError> {
    let mut draft: DraftPlaylist = serde_json::from_str(raw.trim())
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    draft.name = draft.name.trim().to_string();
    if draft.name.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "playlist name is empty".to_string(),
        ));
    }

    for (i, track) in draft.tracks.iter_mut().enumerate() {
        track.name = track.name.trim().to_string();
        track.artist = track.artist.trim().to_string();
        if track.name.is_empty() || track.artist.is_empty() {
            return Err(GenerationError::MalformedResponse(format!(
                "track {} is missing a name or artist",
                i + 1
            )));
        }
    }

    if draft.tracks.len() > MAX_DRAFT_TRACKS {
        warn!(
            suggested = draft.tracks.len(),
            "Model suggested too many tracks, keeping the first {}", MAX_DRAFT_TRACKS
        );
        draft.tracks.truncate(MAX_DRAFT_TRACKS);
    }

    Ok(draft)
}

/// Maps a prompt to a [`DraftPlaylist`] with one language-model round-trip.
///
/// Nothing is cached and nothing is retried: a network failure surfaces as
/// `UpstreamUnavailable`, a bad document as `MalformedResponse`.
pub struct TrackSuggestionEngine {
    model: Arc<dyn LanguageModel>,
    call_timeout: Duration,
}

impl TrackSuggestionEngine {
    pub fn new(model: Arc<dyn LanguageModel>, call_timeout: Duration) -> Self {
        Self {
            model,
            call_timeout,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<DraftPlaylist, GenerationError> {
        let request = CompletionRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            user_prompt: prompt.to_string(),
            response_schema: response_schema(),
        };

        let raw = match timeout(self.call_timeout, self.model.complete(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::Timeout.into()),
        };

        let draft = parse_draft(&raw)?;
        debug!(name = %draft.name, tracks = draft.tracks.len(), "Draft playlist generated");
        Ok(draft)
    }
}
