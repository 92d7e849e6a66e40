//! Speech-safe text cleanup
//!
//! Persona replies carry decorative glyphs that TTS engines would read out loud
//! ("smirking face"). This strips them before synthesis.

use std::sync::LazyLock;

use regex::Regex;

/// Spoken in place of a reply that was nothing but glyphs
pub const FALLBACK_SPEECH: &str = "Okay.";

/// Pictograph blocks removed before synthesis
static PICTOGRAPHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F300}-\x{1F5FF}", // symbols & pictographs
        r"\x{1F600}-\x{1F64F}", // emoticons
        r"\x{1F680}-\x{1F6FF}", // transport & map symbols
        r"\x{1F1E0}-\x{1F1FF}", // flags
        r"\x{2700}-\x{27BF}",   // dingbats
        r"\x{24C2}-\x{1F251}",
        "]+",
    ))
    .expect("valid regex")
});

/// Strip pictographs and normalize whitespace for speech synthesis
///
/// Empty input is returned as-is. Anything else that cleans down to nothing
/// becomes [`FALLBACK_SPEECH`], since TTS providers reject empty input.
#[must_use]
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let stripped = PICTOGRAPHS.replace_all(text, "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        FALLBACK_SPEECH.to_string()
    } else {
        cleaned
    }
}
