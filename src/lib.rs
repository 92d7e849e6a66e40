//! Voicepal - persona voice chat over HTTP
//!
//! The browser records a clip and posts it; voicepal transcribes it, answers
//! in one of a few playful personas, remembers the exchange per session and
//! speaks the answer back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP (axum)                         │
//! │   POST /process_voice  │  /health  │  /static  │  /  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Turn orchestrator                     │
//! │   Reply engine  │  Conversation store  │  Sanitizer  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Voice collaborators                     │
//! │   Whisper / Deepgram STT  │  OpenAI / ElevenLabs TTS │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod reply;
pub mod sanitize;
pub mod turn;
pub mod voice;

pub use config::Config;
pub use conversation::{ConversationBackend, ConversationStore, JsonFileBackend, MemoryBackend};
pub use error::{Error, Result};
pub use persona::Persona;
pub use reply::ReplyEngine;
pub use sanitize::sanitize;
pub use turn::{TurnError, TurnOrchestrator, TurnOutcome, VoiceReply};
pub use voice::{AudioStore, Synthesizer, Transcriber, Transcript};
