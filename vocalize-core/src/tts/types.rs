use serde::{Deserialize, Serialize};

/// Audio returned from a synthesis call, byte-for-byte as the service sent it
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    /// Service-side name of the container format,
    /// e.g. "audio-24khz-48kbitrate-mono-mp3"
    pub format: String,
}

/// A named voice on the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub language_code: String,
}
