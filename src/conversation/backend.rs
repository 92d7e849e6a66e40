//! Durable storage for conversation history

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::Conversations;
use crate::{Error, Result};

/// Where conversation history lives between runs
///
/// `load` never fails: missing or corrupt history means "no history".
pub trait ConversationBackend: Send + Sync {
    /// Read every stored session
    fn load(&self) -> Conversations;

    /// Replace the stored sessions with `conversations`
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be written
    fn save(&self, conversations: &Conversations) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Human-editable JSON document mapping session id to messages
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConversationBackend for JsonFileBackend {
    fn load(&self) -> Conversations {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no conversation file yet");
                return Conversations::new();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read conversation file, starting empty"
                );
                return Conversations::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(conversations) => conversations,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to parse conversation file, starting empty"
                );
                Conversations::new()
            }
        }
    }

    fn save(&self, conversations: &Conversations) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(conversations)?;

        // Write-then-rename keeps the previous document intact on a crash
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            Error::Storage(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            sessions = conversations.len(),
            "saved conversations"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

/// Keeps history in memory only; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Conversations>>,
}

impl ConversationBackend for MemoryBackend {
    fn load(&self) -> Conversations {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, conversations: &Conversations) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = conversations.clone();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
