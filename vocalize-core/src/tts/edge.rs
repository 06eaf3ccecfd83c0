//! Microsoft Edge read-aloud text-to-speech implementation
//!
//! Speaks the websocket protocol the Edge browser uses for read-aloud: one
//! `speech.config` message selecting the output format, one SSML message
//! carrying the text, then binary audio frames until the service signals
//! `turn.end`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use super::provider::TextToSpeech;
use super::types::{SynthesizedAudio, Voice};

const WSS_URL: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";

/// Fixed public token the service expects on every connection.
const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";
const SEC_MS_GEC_VERSION: &str = "1-130.0.2849.68";

/// The service only answers requests that look like they come from the
/// browser's read-aloud feature.
const ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 \
Edg/130.0.0.0";

/// Seconds between the Windows epoch (1601-01-01) and the Unix epoch.
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Configuration for the Edge read-aloud service
#[derive(Debug, Clone)]
pub struct EdgeTtsConfig {
    pub voice: String,
    pub output_format: String,
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            voice: "id-ID-GadisNeural".to_string(),
            output_format: "audio-24khz-48kbitrate-mono-mp3".to_string(),
        }
    }
}

/// Edge read-aloud text-to-speech provider
pub struct EdgeTts {
    config: EdgeTtsConfig,
}

/// Wire-level failures of the read-aloud protocol
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("binary frame shorter than its declared header block ({0} bytes)")]
    TruncatedFrame(usize),
    #[error("service closed the connection before turn.end")]
    ConnectionClosed,
    #[error("service produced no audio for this request")]
    NoAudioReceived,
}

#[derive(Serialize)]
struct SpeechConfig<'a> {
    context: SynthesisContext<'a>,
}

#[derive(Serialize)]
struct SynthesisContext<'a> {
    synthesis: Synthesis<'a>,
}

#[derive(Serialize)]
struct Synthesis<'a> {
    audio: AudioOutput<'a>,
}

#[derive(Serialize)]
struct AudioOutput<'a> {
    metadataoptions: MetadataOptions,
    #[serde(rename = "outputFormat")]
    output_format: &'a str,
}

// The service wants these booleans as strings.
#[derive(Serialize)]
struct MetadataOptions {
    #[serde(rename = "sentenceBoundaryEnabled")]
    sentence_boundary_enabled: &'static str,
    #[serde(rename = "wordBoundaryEnabled")]
    word_boundary_enabled: &'static str,
}

impl EdgeTts {
    pub fn new(config: EdgeTtsConfig) -> Self {
        Self { config }
    }

    fn build_url(&self) -> String {
        let connection_id = Uuid::new_v4().simple();
        let sec_ms_gec = sec_ms_gec_at(Utc::now().timestamp());
        format!(
            "{WSS_URL}?TrustedClientToken={TRUSTED_CLIENT_TOKEN}\
             &Sec-MS-GEC={sec_ms_gec}\
             &Sec-MS-GEC-Version={SEC_MS_GEC_VERSION}\
             &ConnectionId={connection_id}"
        )
    }
}

/// Clock-derived token required alongside the trusted client token: SHA-256
/// of the Windows file time (100 ns ticks, clock rounded down to five
/// minutes) concatenated with the token, as uppercase hex.
fn sec_ms_gec_at(unix_secs: i64) -> String {
    let rounded = unix_secs - unix_secs.rem_euclid(300);
    let ticks = (rounded + WINDOWS_EPOCH_OFFSET_SECS) as u128 * 10_000_000;
    Sha256::digest(format!("{ticks}{TRUSTED_CLIENT_TOKEN}"))
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect()
}

/// Header timestamp in the exact format the browser sends.
fn timestamp() -> String {
    Utc::now()
        .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn build_ssml(text: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{voice}'>\
         <prosody pitch='+0Hz' rate='+0%' volume='+0%'>{}</prosody>\
         </voice></speak>",
        escape_xml(text)
    )
}

fn speech_config_message(output_format: &str) -> Result<String> {
    let body = serde_json::to_string(&SpeechConfig {
        context: SynthesisContext {
            synthesis: Synthesis {
                audio: AudioOutput {
                    metadataoptions: MetadataOptions {
                        sentence_boundary_enabled: "false",
                        word_boundary_enabled: "false",
                    },
                    output_format,
                },
            },
        },
    })
    .context("Failed to serialize speech config")?;

    Ok(format!(
        "X-Timestamp:{}\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n{body}",
        timestamp()
    ))
}

fn ssml_message(request_id: &str, ssml: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\nX-Timestamp:{}\r\nPath:ssml\r\n\r\n{ssml}",
        timestamp()
    )
}

/// `Path:` header value of a text frame, if present.
fn message_path(message: &str) -> Option<&str> {
    let headers = message.split("\r\n\r\n").next()?;
    headers
        .lines()
        .find_map(|line| line.strip_prefix("Path:"))
        .map(str::trim)
}

/// Audio payload of a binary frame: two bytes of big-endian header length,
/// the ASCII header block, then the payload. Frames whose headers do not
/// name `Path:audio` carry no speech data and yield `None`.
fn audio_payload(frame: &[u8]) -> Result<Option<&[u8]>, ProtocolError> {
    if frame.len() < 2 {
        return Err(ProtocolError::TruncatedFrame(frame.len()));
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let payload = frame
        .get(2 + header_len..)
        .ok_or(ProtocolError::TruncatedFrame(frame.len()))?;
    if !frame_is_audio(&frame[2..2 + header_len]) {
        return Ok(None);
    }
    Ok(Some(payload))
}

fn frame_is_audio(headers: &[u8]) -> bool {
    String::from_utf8_lossy(headers)
        .lines()
        .any(|line| line.strip_prefix("Path:").map(str::trim) == Some("audio"))
}

#[async_trait]
impl TextToSpeech for EdgeTts {
    fn default_voice(&self) -> Voice {
        // Voice names carry their locale as a prefix, e.g. id-ID-GadisNeural.
        let language_code = self
            .config
            .voice
            .splitn(3, '-')
            .take(2)
            .collect::<Vec<_>>()
            .join("-");
        Voice {
            id: self.config.voice.clone(),
            name: self.config.voice.clone(),
            language_code,
        }
    }

    async fn synthesize(&self, text: &str, voice: Option<&Voice>) -> Result<SynthesizedAudio> {
        let default_voice = self.default_voice();
        let voice = voice.unwrap_or(&default_voice);

        let mut request = self
            .build_url()
            .into_client_request()
            .context("Failed to build websocket request")?;
        let headers = request.headers_mut();
        headers.insert("Pragma", HeaderValue::from_static("no-cache"));
        headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
        headers.insert("Origin", HeaderValue::from_static(ORIGIN));
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));

        let (ws_stream, _) = connect_async(request)
            .await
            .context("Failed to connect to the speech service")?;
        let (mut write, mut read) = ws_stream.split();

        write
            .send(Message::Text(speech_config_message(
                &self.config.output_format,
            )?))
            .await
            .context("Failed to send speech config")?;

        let request_id = Uuid::new_v4().simple().to_string();
        let ssml = build_ssml(text, &voice.id);
        write
            .send(Message::Text(ssml_message(&request_id, &ssml)))
            .await
            .context("Failed to send SSML request")?;

        let mut audio: Vec<u8> = Vec::new();
        let mut finished = false;

        while let Some(message) = read.next().await {
            let message = message.context("Websocket transport error")?;
            match message {
                Message::Text(body) => match message_path(&body) {
                    Some("turn.end") => {
                        finished = true;
                        break;
                    }
                    Some("turn.start") | Some("response") => {}
                    Some("audio.metadata") => {
                        tracing::debug!("skipping boundary metadata frame");
                    }
                    other => tracing::debug!(path = ?other, "unhandled service message"),
                },
                Message::Binary(frame) => {
                    if let Some(payload) = audio_payload(&frame)? {
                        audio.extend_from_slice(payload);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        if !finished {
            return Err(ProtocolError::ConnectionClosed.into());
        }
        if audio.is_empty() {
            return Err(ProtocolError::NoAudioReceived.into());
        }

        tracing::debug!(bytes = audio.len(), voice = %voice.id, "synthesis complete");

        Ok(SynthesizedAudio {
            data: audio,
            format: self.config.output_format.clone(),
        })
    }
}
