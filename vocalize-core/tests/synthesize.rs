//! Integration tests against the live Edge speech service
//!
//! # Running these tests
//!
//! They spend real network calls, so they are marked #[ignore] and won't
//! run in normal CI.
//!
//! To run:
//! ```sh
//! cargo test -p vocalize-core -- --ignored
//! ```

use vocalize_core::tts::edge::{EdgeTts, EdgeTtsConfig};
use vocalize_core::tts::provider::TextToSpeech;

#[tokio::test]
#[ignore] // Requires network access to the speech service
async fn synthesizes_nonempty_audio() {
    tracing_subscriber::fmt::init();

    let tts = EdgeTts::new(EdgeTtsConfig::default());
    let audio = tts
        .synthesize("Selamat pagi, ini adalah pengumuman dari laboratorium.", None)
        .await
        .expect("Failed to synthesize speech");

    assert!(!audio.data.is_empty(), "Expected non-empty audio");
    assert_eq!(audio.format, "audio-24khz-48kbitrate-mono-mp3");
}

#[tokio::test]
#[ignore] // Requires network access to the speech service
async fn empty_text_fails_with_no_audio() {
    let tts = EdgeTts::new(EdgeTtsConfig::default());

    let result = tts.synthesize("", None).await;
    assert!(result.is_err(), "Expected synthesis of empty text to fail");
}

#[tokio::test]
#[ignore] // Requires network access to the speech service
async fn second_run_overwrites_the_output_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("announcement.mp3");

    let tts = EdgeTts::new(EdgeTtsConfig::default());
    for text in ["Pengumuman pertama.", "Pengumuman kedua."] {
        let audio = tts
            .synthesize(text, None)
            .await
            .expect("Failed to synthesize speech");
        tokio::fs::write(&out, &audio.data)
            .await
            .expect("Failed to write output file");
    }

    let written = tokio::fs::metadata(&out).await.expect("Output file missing");
    assert!(written.len() > 0, "Expected non-empty output file");
}
