//! WAV inspection and encoding

use std::io::Cursor;

/// Basic facts about an uploaded WAV clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel
    pub frames: u32,
}

impl WavInfo {
    /// Clip length in seconds
    #[must_use]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let secs = self.frames as f32 / self.sample_rate as f32;
        secs
    }

    /// A clip with no samples cannot contain speech
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

/// Read the WAV header of `audio`, or `None` if it is not a WAV file
///
/// Browsers may upload `WebM`/Ogg instead; those are passed to STT untouched.
#[must_use]
pub fn inspect(audio: &[u8]) -> Option<WavInfo> {
    let reader = hound::WavReader::new(Cursor::new(audio)).ok()?;
    let spec = reader.spec();
    Some(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames: reader.duration(),
    })
}
