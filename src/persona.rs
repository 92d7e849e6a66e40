//! Persona phrasing table
//!
//! A persona is a pure selector: it owns no state, only the glyphs and canned
//! lines the reply engine decorates its answers with.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Persona identifier used when the caller supplies none
pub const DEFAULT_PERSONA: &str = "narwhal";

/// One of the avatars the assistant can speak as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Cat,
    Winnie,
    #[default]
    Narwhal,
}

/// Canned line for each reply rule, before decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Greeting,
    Wellbeing,
    Weather,
    MathFailed,
    Identity,
    Fallback,
}

impl Persona {
    /// All personas, in display order
    pub const ALL: [Self; 3] = [Self::Cat, Self::Winnie, Self::Narwhal];

    /// Resolve a caller-supplied persona name
    ///
    /// Names match exactly; anything else, including `"Cat"`, is the narwhal.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "cat" => Self::Cat,
            "winnie" => Self::Winnie,
            _ => Self::Narwhal,
        }
    }

    /// Stable lowercase identifier
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Cat => "cat",
            Self::Winnie => "winnie",
            Self::Narwhal => "narwhal",
        }
    }

    /// Glyph placed before every decorated reply
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Cat => "😼",
            Self::Winnie => "🧸",
            Self::Narwhal => "🐋",
        }
    }

    /// Glyph placed after every decorated reply
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Cat => "😏",
            Self::Winnie => "🌸",
            Self::Narwhal => "🎉",
        }
    }

    /// Reply for empty or inaudible input, returned verbatim (no decoration)
    #[must_use]
    pub const fn missed(self) -> &'static str {
        match self {
            Self::Cat => "😼 I didn’t catch that.",
            Self::Winnie => "🧸 I didn’t quite hear you, sweet one.",
            Self::Narwhal => "🐋 I didn’t quite catch that.",
        }
    }

    /// Undecorated canned line for a rule
    #[must_use]
    pub const fn line(self, line: Line) -> &'static str {
        match (self, line) {
            (Self::Cat, Line::Greeting) => "yo, what's up",
            (Self::Winnie, Line::Greeting) => "hi there, friend",
            (Self::Narwhal, Line::Greeting) => "hey hey! how's the ocean today",

            (Self::Cat, Line::Wellbeing) => "i'm chilling, as always",
            (Self::Winnie, Line::Wellbeing) => "i'm cozy and calm, thanks for asking",
            (Self::Narwhal, Line::Wellbeing) => "bubbly and fantastic!",

            (Self::Cat, Line::Weather) => "i don't check the weather — i make it cool",
            (Self::Winnie, Line::Weather) => "looks lovely in my little cloud world",
            (Self::Narwhal, Line::Weather) => "probably sunny somewhere, splash!",

            (Self::Cat, Line::MathFailed) => "nah, that expression's messy",
            (Self::Winnie, Line::MathFailed) => "hmm, couldn't solve that one",
            (Self::Narwhal, Line::MathFailed) => "whoopsie, math overflow!",

            (Self::Cat, Line::Identity) => "i'm the cat who knows things. that's all",
            (Self::Winnie, Line::Identity) => "i'm winnie, your gentle little helper",
            (Self::Narwhal, Line::Identity) => {
                "i'm narwhal! the splashy sidekick you never knew you needed!"
            }

            (Self::Cat, Line::Fallback) => "not my field, but sounds interesting",
            (Self::Winnie, Line::Fallback) => "sorry, i don't know that, but i'm happy to listen",
            (Self::Narwhal, Line::Fallback) => "no clue, but i bet it's fun!",
        }
    }

    /// Undecorated line announcing an arithmetic result
    #[must_use]
    pub fn solved(self, value: &str) -> String {
        match self {
            Self::Cat => format!("easy math. it's {value}"),
            Self::Winnie => format!("the answer is {value}, sweet one"),
            Self::Narwhal => format!("that makes {value}, splash math!"),
        }
    }

    /// Wrap a message in this persona's glyphs, capitalizing its first letter
    #[must_use]
    pub fn decorate(self, message: &str) -> String {
        format!("{} {} {}", self.prefix(), capitalize(message), self.suffix())
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<&str> for Persona {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// Upper-case the first character, leaving the rest as written
fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
