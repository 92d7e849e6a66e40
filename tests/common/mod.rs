//! Shared test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use voicepal::{
    AudioStore, ConversationStore, Error, Result, Synthesizer, Transcriber, Transcript,
    TurnOrchestrator,
};

/// Scripted speech-to-text
pub enum FakeStt {
    Says(&'static str),
    Fails,
    Hangs,
}

/// Transcriber that follows a script and counts calls
pub struct FakeTranscriber {
    script: FakeStt,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(script: FakeStt) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            FakeStt::Says(text) => Ok(Transcript::from_text(text.to_string())),
            FakeStt::Fails => Err(Error::Stt("provider unavailable".to_string())),
            FakeStt::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Transcript::NoSpeech)
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake-stt"
    }
}

/// Scripted text-to-speech
#[derive(Clone, Copy)]
enum FakeTts {
    Speaks,
    Fails,
    Hangs,
}

/// Synthesizer that records what it was asked to say
pub struct FakeSynthesizer {
    script: FakeTts,
    spoken: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    fn scripted(script: FakeTts) -> Arc<Self> {
        Arc::new(Self {
            script,
            spoken: Mutex::new(Vec::new()),
        })
    }

    pub fn working() -> Arc<Self> {
        Self::scripted(FakeTts::Speaks)
    }

    pub fn failing() -> Arc<Self> {
        Self::scripted(FakeTts::Fails)
    }

    /// Never answers within the test timeout
    pub fn hangs() -> Arc<Self> {
        Self::scripted(FakeTts::Hangs)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.spoken.lock().unwrap().push(text.to_string());
        match self.script {
            FakeTts::Speaks => Ok(FAKE_MP3.to_vec()),
            FakeTts::Fails => Err(Error::Tts("quota exceeded".to_string())),
            FakeTts::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(FAKE_MP3.to_vec())
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake-tts"
    }
}

/// Bytes every working [`FakeSynthesizer`] returns
pub const FAKE_MP3: &[u8] = b"ID3\x03fake mp3 frames";

/// Orchestrator over an in-memory store with the given collaborators
pub fn orchestrator(
    stt: Option<Arc<FakeTranscriber>>,
    tts: Option<(Arc<FakeSynthesizer>, AudioStore)>,
) -> TurnOrchestrator {
    let mut turns = TurnOrchestrator::new(Arc::new(ConversationStore::in_memory()))
        .timeout(Duration::from_millis(200));
    if let Some(stt) = stt {
        turns = turns.transcriber(stt);
    }
    if let Some((tts, audio_store)) = tts {
        turns = turns.synthesizer(tts, audio_store);
    }
    turns
}

/// Encode mono f32 samples as 16-bit PCM WAV bytes
#[allow(clippy::cast_possible_truncation)]
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("failed to start test WAV");
    for &sample in samples {
        let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(sample_i16).expect("failed to write test sample");
    }
    writer.finalize().expect("failed to finish test WAV");
    cursor.into_inner()
}

/// Half a second of a 440Hz tone
#[allow(clippy::cast_precision_loss)]
pub fn tone_wav() -> Vec<u8> {
    let sample_rate = 16_000;
    let samples: Vec<f32> = (0..sample_rate / 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();
    samples_to_wav(&samples, sample_rate)
}

/// A valid WAV header with no samples
pub fn empty_wav() -> Vec<u8> {
    samples_to_wav(&[], 16_000)
}

pub const BOUNDARY: &str = "voicepal-test-boundary";

/// Build a `multipart/form-data` body for `/process_voice`
pub fn voice_form(audio: Option<&[u8]>, session_id: Option<&str>, persona: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(audio) = audio {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"recording.wav\"\r\nContent-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(audio);
        body.extend_from_slice(b"\r\n");
    }

    for (name, value) in [("session_id", session_id), ("persona", persona)] {
        if let Some(value) = value {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            );
        }
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
