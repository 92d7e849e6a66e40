//! Synthesized audio files served back to the browser

use std::path::{Path, PathBuf};

use crate::Result;

/// URL prefix the static directory is mounted under
pub const STATIC_URL_PREFIX: &str = "/static";

/// Subdirectory of the static directory holding generated speech
const TTS_SUBDIR: &str = "tts";

/// Writes each reply's audio to its own file and hands back a URL
///
/// Every turn gets a fresh file name, so concurrent turns never overwrite each
/// other's audio. Only the newest `retain` files are kept.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    retain: usize,
}

impl AudioStore {
    /// Store audio under `<static_dir>/tts`
    #[must_use]
    pub fn new(static_dir: &Path, retain: usize) -> Self {
        Self {
            dir: static_dir.join(TTS_SUBDIR),
            retain: retain.max(1),
        }
    }

    /// Directory audio files are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist MP3 bytes and return the URL they are served from
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, audio: &[u8]) -> Result<String> {
        std::fs::create_dir_all(&self.dir)?;

        let file_name = format!("{}.mp3", uuid::Uuid::new_v4());
        let path = self.dir.join(&file_name);
        std::fs::write(&path, audio)?;

        if let Err(e) = self.prune(&path) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to prune old audio");
        }

        Ok(format!("{STATIC_URL_PREFIX}/{TTS_SUBDIR}/{file_name}"))
    }

    /// Delete the oldest files beyond the retention limit, never `newest`
    fn prune(&self, newest: &Path) -> Result<()> {
        let mut files: Vec<(std::time::SystemTime, PathBuf)> = std::fs::read_dir(&self.dir)?
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                let path = entry.path();
                path != newest && path.extension().is_some_and(|ext| ext == "mp3")
            })
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((modified, entry.path()))
            })
            .collect();

        let keep = self.retain - 1;
        if files.len() <= keep {
            return Ok(());
        }

        files.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in files.into_iter().skip(keep) {
            tracing::debug!(path = %path.display(), "removing old audio");
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
