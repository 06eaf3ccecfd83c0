use anyhow::Result;
use async_trait::async_trait;

use super::types::{SynthesizedAudio, Voice};

/// Trait for text-to-speech providers
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// The voice used when a synthesis call does not name one
    fn default_voice(&self) -> Voice;

    /// Synthesize text into an audio stream, returned whole once the
    /// service finishes the turn
    async fn synthesize(&self, text: &str, voice: Option<&Voice>) -> Result<SynthesizedAudio>;
}
