//! Voice collaborators
//!
//! Remote STT and TTS behind traits so the turn pipeline can be driven by
//! fakes in tests, plus the store that serves synthesized audio.

mod audio_store;
mod stt;
mod tts;
pub mod wav;

pub use audio_store::{AudioStore, STATIC_URL_PREFIX};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};

use async_trait::async_trait;

use crate::Result;

/// Outcome of a transcription that reached the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized speech
    Text(String),
    /// The audio was understood to contain no speech
    NoSpeech,
}

impl Transcript {
    /// Classify provider output; blank text means nothing was heard
    #[must_use]
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            Self::NoSpeech
        } else {
            Self::Text(text)
        }
    }

    /// Recognized text, empty for [`Transcript::NoSpeech`]
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::NoSpeech => String::new(),
        }
    }
}

/// Turns recorded audio into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be reached or rejects the request.
    /// Silence is not an error; it is [`Transcript::NoSpeech`].
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Turns text into MP3 audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize speech
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
