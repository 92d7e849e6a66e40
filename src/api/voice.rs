//! Voice turn endpoint
//!
//! `POST /process_voice` takes a multipart form with the recorded `audio`
//! file and optional `session_id` and `persona` fields, and answers with the
//! transcript, the persona's reply and a URL for the spoken reply.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;

use super::ApiState;
use crate::persona::DEFAULT_PERSONA;
use crate::turn::TurnError;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/process_voice", post(process_voice))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Voice turn response
#[derive(Debug, Serialize)]
pub struct ProcessVoiceResponse {
    pub user_text: String,
    pub assistant_text: String,
    /// URL of the spoken reply, null when no audio was produced
    pub audio: Option<String>,
    /// Persona as the client sent it
    pub persona: String,
}

/// Fields collected from the multipart form
#[derive(Debug, Default)]
struct VoiceForm {
    audio: Option<Vec<u8>>,
    session_id: Option<String>,
    persona: Option<String>,
}

impl VoiceForm {
    async fn read(mut multipart: Multipart) -> Result<Self, VoiceError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| VoiceError::BadRequest(format!("invalid multipart body: {e}")))?
        {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("audio") => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| VoiceError::BadRequest(format!("failed to read audio: {e}")))?;
                    form.audio = Some(bytes.to_vec());
                }
                Some("session_id") => form.session_id = Some(text(field).await?),
                Some("persona") => form.persona = Some(text(field).await?),
                other => tracing::debug!(field = ?other, "ignoring form field"),
            }
        }

        Ok(form)
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, VoiceError> {
    field
        .text()
        .await
        .map_err(|e| VoiceError::BadRequest(format!("invalid form field: {e}")))
}

/// Run one voice turn
async fn process_voice(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<ProcessVoiceResponse>, VoiceError> {
    let form = VoiceForm::read(multipart).await?;

    let audio = form
        .audio
        .ok_or_else(|| VoiceError::BadRequest("No audio file".to_string()))?;
    if audio.is_empty() {
        return Err(VoiceError::BadRequest("Empty audio data".to_string()));
    }

    tracing::info!(
        audio_bytes = audio.len(),
        session_id = ?form.session_id,
        persona = ?form.persona,
        "voice turn"
    );

    let reply = state
        .turns
        .process_voice(&audio, form.session_id.as_deref(), form.persona.as_deref())
        .await?;

    Ok(Json(ProcessVoiceResponse {
        user_text: reply.user_text,
        assistant_text: reply.assistant_text,
        audio: reply.audio,
        persona: form.persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
    }))
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    NotConfigured(&'static str),
    BadRequest(String),
    TranscriptionFailed(String),
    Timeout(String),
}

impl From<TurnError> for VoiceError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::TranscriberUnavailable => {
                Self::NotConfigured("speech recognition is not configured")
            }
            TurnError::Transcription(e) => Self::TranscriptionFailed(e.to_string()),
            e @ TurnError::Timeout(_) => Self::Timeout(e.to_string()),
        }
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        /// `{"error": "<message>", "code": "<code>"}`
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            code: &'static str,
        }

        let (status, code, error) = match self {
            Self::NotConfigured(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg.to_string())
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::TranscriptionFailed(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "transcription_failed", msg)
            }
            Self::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "timeout", msg),
        };

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}
