pub mod tts;

// Public library API - the CLI consumes these, but the synthesis layer is
// usable as a library on its own.
pub use tts::edge::{EdgeTts, EdgeTtsConfig};
pub use tts::provider::TextToSpeech;
pub use tts::types::{SynthesizedAudio, Voice};
