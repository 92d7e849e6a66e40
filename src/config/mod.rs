//! Configuration management for voicepal
//!
//! Precedence is env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::voice::{SpeechToText, SttProvider, TextToSpeech, TtsProvider};
use crate::Result;

use file::VoicepalConfigFile;

/// Port the HTTP server listens on by default
pub const DEFAULT_PORT: u16 = 5000;

/// Default bound on each STT/TTS round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Synthesized clips kept on disk by default
pub const DEFAULT_AUDIO_RETENTION: usize = 64;

/// voicepal configuration
#[derive(Debug)]
pub struct Config {
    /// Path to data directory (history, generated audio)
    pub data_dir: PathBuf,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Conversation history file
    pub state_file: PathBuf,

    /// Directory served under `/static` (generated audio lives in `tts/`)
    pub static_dir: PathBuf,

    /// Directory holding the web UI; `/` serves its `index.html`
    pub web_dir: Option<PathBuf>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier (OpenAI voice name or ElevenLabs voice id)
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0, OpenAI only)
    pub tts_speed: f32,

    /// Upper bound for each STT/TTS round trip
    pub timeout: Duration,

    /// Number of synthesized clips kept on disk
    pub audio_retention: usize,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with values from `env`
    ///
    /// # Errors
    ///
    /// Returns error if a provider name is not recognized
    pub fn resolve(fc: VoicepalConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Data directory (~/.local/share/voicepal on Linux)
        let data_dir = env("VOICEPAL_DATA_DIR").map_or_else(
            || {
                directories::BaseDirs::new()
                    .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("voicepal"))
            },
            PathBuf::from,
        );

        let server = ServerConfig {
            port: env("VOICEPAL_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            state_file: env("VOICEPAL_STATE_FILE")
                .or(fc.server.state_file)
                .map_or_else(|| data_dir.join("conversations.json"), PathBuf::from),
            static_dir: env("VOICEPAL_STATIC_DIR")
                .or(fc.server.static_dir)
                .map_or_else(|| data_dir.join("static"), PathBuf::from),
            web_dir: env("VOICEPAL_WEB_DIR")
                .or(fc.server.web_dir)
                .map(PathBuf::from),
        };

        let stt_provider = SttProvider::parse(
            &env("VOICEPAL_STT_PROVIDER")
                .or(fc.voice.stt_provider)
                .unwrap_or_else(|| "whisper".to_string()),
        )?;
        let tts_provider = TtsProvider::parse(
            &env("VOICEPAL_TTS_PROVIDER")
                .or(fc.voice.tts_provider)
                .unwrap_or_else(|| "openai".to_string()),
        )?;

        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("VOICEPAL_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| default_stt_model(stt_provider).to_string()),
            tts_provider,
            tts_model: env("VOICEPAL_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voice: env("VOICEPAL_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| default_tts_voice(tts_provider).to_string()),
            tts_speed: env("VOICEPAL_TTS_SPEED")
                .and_then(|s| s.parse().ok())
                .or(fc.voice.tts_speed)
                .unwrap_or(1.0)
                .clamp(0.25, 4.0),
            timeout: env("VOICEPAL_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .or(fc.voice.timeout_secs)
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            audio_retention: env("VOICEPAL_AUDIO_RETENTION")
                .and_then(|s| s.parse().ok())
                .or(fc.voice.audio_retention)
                .unwrap_or(DEFAULT_AUDIO_RETENTION),
        };

        let secret = |value: Option<String>| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
        };
        let api_keys = ApiKeys {
            openai: secret(env("OPENAI_API_KEY").or(fc.api_keys.openai)),
            deepgram: secret(env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram)),
            elevenlabs: secret(env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs)),
        };

        Ok(Self {
            data_dir,
            server,
            voice,
            api_keys,
        })
    }

    /// Build the configured STT client, or `None` when its key is missing
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn transcriber(&self) -> Result<Option<SpeechToText>> {
        let key = match self.voice.stt_provider {
            SttProvider::Whisper => &self.api_keys.openai,
            SttProvider::Deepgram => &self.api_keys.deepgram,
        };
        let Some(key) = key.as_ref().map(|k| SecretString::from(k.expose_secret().to_owned())) else {
            tracing::warn!(
                provider = ?self.voice.stt_provider,
                "no API key for STT, transcription disabled"
            );
            return Ok(None);
        };

        SpeechToText::new(
            self.voice.stt_provider,
            key,
            self.voice.stt_model.clone(),
            self.voice.timeout,
        )
        .map(Some)
    }

    /// Build the configured TTS client, or `None` when its key is missing
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn synthesizer(&self) -> Result<Option<TextToSpeech>> {
        let key = match self.voice.tts_provider {
            TtsProvider::OpenAI => &self.api_keys.openai,
            TtsProvider::ElevenLabs => &self.api_keys.elevenlabs,
        };
        let Some(key) = key.as_ref().map(|k| SecretString::from(k.expose_secret().to_owned())) else {
            tracing::warn!(
                provider = ?self.voice.tts_provider,
                "no API key for TTS, replies will have no audio"
            );
            return Ok(None);
        };

        TextToSpeech::new(
            self.voice.tts_provider,
            key,
            self.voice.tts_voice.clone(),
            self.voice.tts_speed,
            self.voice.tts_model.clone(),
            self.voice.timeout,
        )
        .map(Some)
    }
}

const fn default_stt_model(provider: SttProvider) -> &'static str {
    match provider {
        SttProvider::Whisper => "whisper-1",
        SttProvider::Deepgram => "nova-2",
    }
}

const fn default_tts_voice(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::OpenAI => "alloy",
        // "Rachel", the stock ElevenLabs voice
        TtsProvider::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
    }
}
