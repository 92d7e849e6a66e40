//! Rule-based persona replies
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. empty input
//! 2. greeting
//! 3. "how are you"
//! 4. weather
//! 5. arithmetic (never falls through once triggered)
//! 6. "who/what are you"
//! 7. fallback

pub mod arith;

use crate::persona::{Line, Persona};

/// Substrings that mark a greeting
const GREETINGS: [&str; 4] = ["hello", "hi", "hey", "hiya"];

/// Substrings that send the utterance down the arithmetic path
const MATH_TRIGGERS: [&str; 8] = ["+", "-", "*", "/", "plus", "minus", "times", "divide"];

/// Which rule produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Empty,
    Greeting,
    Wellbeing,
    Weather,
    Math,
    Identity,
    Fallback,
}

/// A reply together with the rule that chose it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub rule: Rule,
    pub text: String,
}

/// Deterministic reply generator over the fixed persona table
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyEngine;

impl ReplyEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Produce the assistant's answer to `user_text`
    ///
    /// Never returns an empty string.
    #[must_use]
    pub fn reply(&self, user_text: &str, persona: Persona) -> String {
        self.respond(user_text, persona).text
    }

    /// Like [`reply`](Self::reply), also reporting which rule matched
    #[must_use]
    pub fn respond(&self, user_text: &str, persona: Persona) -> Reply {
        if user_text.trim().is_empty() {
            return Reply {
                rule: Rule::Empty,
                text: persona.missed().to_string(),
            };
        }

        let normalized = user_text.trim().to_lowercase();
        let (rule, message) = classify(&normalized, persona);

        Reply {
            rule,
            text: persona.decorate(&message),
        }
    }
}

fn classify(text: &str, persona: Persona) -> (Rule, String) {
    let canned = |rule, line| (rule, persona.line(line).to_string());

    if GREETINGS.iter().any(|g| text.contains(g)) {
        return canned(Rule::Greeting, Line::Greeting);
    }
    if text.contains("how are you") {
        return canned(Rule::Wellbeing, Line::Wellbeing);
    }
    if text.contains("weather") {
        return canned(Rule::Weather, Line::Weather);
    }
    if MATH_TRIGGERS.iter().any(|op| text.contains(op)) {
        return (Rule::Math, solve(text, persona));
    }
    if text.contains("who are you") || text.contains("what are you") {
        return canned(Rule::Identity, Line::Identity);
    }

    canned(Rule::Fallback, Line::Fallback)
}

/// Pull the arithmetic out of an utterance and answer it in persona
fn solve(text: &str, persona: Persona) -> String {
    let expression = math_expression(text);

    match arith::evaluate(&expression) {
        Ok(value) => persona.solved(&arith::format_number(value)),
        Err(e) => {
            tracing::debug!(expression = %expression.trim(), error = %e, "could not evaluate");
            persona.line(Line::MathFailed).to_string()
        }
    }
}

/// Keep only the characters an arithmetic expression can contain
fn math_expression(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || "+-*/.() ".contains(*c))
        .collect()
}
