//! One voice-chat turn, end to end
//!
//! ```text
//! audio ─► Transcriber ─► record user ─► ReplyEngine ─► record assistant ─► persist
//!                                                            │
//!                                          sanitize ◄────────┘
//!                                             │
//!                                        Synthesizer ─► AudioStore ─► URL
//! ```
//!
//! Only a failed transcription aborts a turn. Persistence and synthesis
//! failures are logged and the caller still gets a text reply.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::DEFAULT_TIMEOUT;
use crate::conversation::{ConversationStore, DEFAULT_SESSION};
use crate::persona::Persona;
use crate::reply::ReplyEngine;
use crate::sanitize::sanitize;
use crate::voice::{AudioStore, Synthesizer, Transcriber, Transcript, wav};

/// Reasons a turn produced no reply at all
#[derive(Debug, Error)]
pub enum TurnError {
    /// No speech-to-text provider is configured
    #[error("speech recognition is not configured")]
    TranscriberUnavailable,

    /// The STT provider failed
    #[error("speech recognition failed: {0}")]
    Transcription(#[source] crate::Error),

    /// The STT provider did not answer in time
    #[error("speech recognition timed out after {0:?}")]
    Timeout(Duration),
}

/// Text result of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub user_text: String,
    pub assistant_text: String,
    pub persona: Persona,
}

/// Text and audio result of a voice turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceReply {
    pub session_id: String,
    pub user_text: String,
    pub assistant_text: String,
    pub persona: Persona,
    /// URL of the spoken reply, `None` when synthesis was skipped or failed
    pub audio: Option<String>,
}

/// Runs turns against shared conversation state and the voice collaborators
pub struct TurnOrchestrator {
    store: Arc<ConversationStore>,
    engine: ReplyEngine,
    transcriber: Option<Arc<dyn Transcriber>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    audio_store: Option<AudioStore>,
    timeout: Duration,
}

impl TurnOrchestrator {
    /// Text-only orchestrator over `store`
    #[must_use]
    pub fn new(store: Arc<ConversationStore>) -> Self {
        Self {
            store,
            engine: ReplyEngine::new(),
            transcriber: None,
            synthesizer: None,
            audio_store: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the speech-to-text collaborator
    #[must_use]
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Set the text-to-speech collaborator and where its audio goes
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>, audio_store: AudioStore) -> Self {
        self.synthesizer = Some(synthesizer);
        self.audio_store = Some(audio_store);
        self
    }

    /// Bound each STT/TTS round trip
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared conversation state
    #[must_use]
    pub const fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Whether speech recognition is available
    #[must_use]
    pub fn can_transcribe(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Whether spoken replies are available
    #[must_use]
    pub fn can_synthesize(&self) -> bool {
        self.synthesizer.is_some() && self.audio_store.is_some()
    }

    /// Record the user's words, answer in persona, record and persist the answer
    ///
    /// An absent session id means [`DEFAULT_SESSION`]; a given id, even `""`,
    /// is used as is. An absent or unknown persona means the narwhal.
    /// Persistence failures are logged and do not fail the turn.
    pub async fn handle_turn(
        &self,
        session_id: Option<&str>,
        user_text: &str,
        persona: Option<&str>,
    ) -> TurnOutcome {
        let session_id = session_id.unwrap_or(DEFAULT_SESSION).to_string();
        let persona = persona.map_or_else(Persona::default, Persona::parse);

        let reply = self.engine.respond(user_text, persona);
        tracing::info!(
            session_id = %session_id,
            persona = %persona,
            rule = ?reply.rule,
            "generated reply"
        );

        let store = Arc::clone(&self.store);
        let (sid, user, assistant) = (
            session_id.clone(),
            user_text.to_string(),
            reply.text.clone(),
        );
        let persisted =
            tokio::task::spawn_blocking(move || store.record_exchange(&sid, &user, &assistant))
                .await;

        match persisted {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(session_id = %session_id, error = %e, "could not save conversations");
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "conversation save task failed");
            }
        }

        TurnOutcome {
            session_id,
            user_text: user_text.to_string(),
            assistant_text: reply.text,
            persona,
        }
    }

    /// Full voice turn: transcribe, reply, speak
    ///
    /// # Errors
    ///
    /// Returns error if speech recognition is unavailable, fails, or times out.
    /// Audio that contains no speech is not an error; it is answered like an
    /// empty utterance.
    pub async fn process_voice(
        &self,
        audio: &[u8],
        session_id: Option<&str>,
        persona: Option<&str>,
    ) -> Result<VoiceReply, TurnError> {
        let user_text = self.transcribe(audio).await?.into_text();
        let outcome = self.handle_turn(session_id, &user_text, persona).await;
        let audio = self.speak(&outcome.assistant_text).await;

        Ok(VoiceReply {
            session_id: outcome.session_id,
            user_text: outcome.user_text,
            assistant_text: outcome.assistant_text,
            persona: outcome.persona,
            audio,
        })
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, TurnError> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or(TurnError::TranscriberUnavailable)?;

        if let Some(info) = wav::inspect(audio) {
            tracing::debug!(
                sample_rate = info.sample_rate,
                channels = info.channels,
                duration_secs = info.duration_secs(),
                "received WAV upload"
            );
            if info.is_empty() {
                return Ok(Transcript::NoSpeech);
            }
        }

        match tokio::time::timeout(self.timeout, transcriber.transcribe(audio)).await {
            Ok(Ok(transcript)) => Ok(transcript),
            Ok(Err(e)) => {
                tracing::error!(provider = transcriber.name(), error = %e, "transcription failed");
                Err(TurnError::Transcription(e))
            }
            Err(_) => {
                tracing::error!(provider = transcriber.name(), timeout = ?self.timeout, "transcription timed out");
                Err(TurnError::Timeout(self.timeout))
            }
        }
    }

    /// Synthesize the reply and store it, returning its URL on success
    async fn speak(&self, assistant_text: &str) -> Option<String> {
        let (Some(synthesizer), Some(audio_store)) = (&self.synthesizer, &self.audio_store) else {
            return None;
        };

        let speech = sanitize(assistant_text);
        if speech.is_empty() {
            return None;
        }

        let bytes = match tokio::time::timeout(self.timeout, synthesizer.synthesize(&speech)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                tracing::warn!(provider = synthesizer.name(), error = %e, "TTS failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(provider = synthesizer.name(), timeout = ?self.timeout, "TTS timed out");
                return None;
            }
        };

        let audio_store = audio_store.clone();
        match tokio::task::spawn_blocking(move || audio_store.save(&bytes)).await {
            Ok(Ok(url)) => Some(url),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "could not write synthesized audio");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio write task failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("store", &self.store)
            .field("transcriber", &self.transcriber.as_ref().map(|t| t.name()))
            .field("synthesizer", &self.synthesizer.as_ref().map(|s| s.name()))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
