//! Language-model collaborator.
//!
//! [`LanguageModel`] turns one [`CompletionRequest`] into the raw structured
//! document the model produced. Parsing and validation of that document is
//! the job of [`crate::pipeline::TrackSuggestionEngine`].

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;

use crate::{error::LlmError, types::CompletionRequest};

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
