//! Offline fallback responder
//!
//! Produces a plausible reply from the last user utterance when the upstream
//! cannot be reached. Classification is keyword based and checked in a fixed
//! order; the first matching category wins. Matching is plain substring
//! search on the lower-cased input, so "this" counts as a greeting.

pub mod knowledge;

use knowledge::Entry;
use rand::Rng;
use rand::seq::IndexedRandom;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey"];
const WHO_KEYWORDS: &[&str] = &["who is", "who's", "tell me who", "do you know who"];
const WHAT_KEYWORDS: &[&str] = &["what is", "what's", "tell me what"];
const HOW_KEYWORDS: &[&str] = &["how do", "how can", "how to", "how does"];
const HELP_KEYWORDS: &[&str] = &["help", "assist", "support"];

// Each pattern consumes everything up to and including the last trigger phrase
static WHO_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^.*(?:who is|who's|tell me who|do you know who)\s*")
        .expect("Valid who-is regex")
});
static WHAT_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^.*(?:what is|what's|tell me what)\s*").expect("Valid what-is regex")
});
static HOW_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^.*(?:how do|how can|how to|how does)\s*").expect("Valid how-to regex")
});

/// What kind of utterance the responder thinks it is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Greeting,
    WhoIs,
    WhatIs,
    HowTo,
    Help,
    Generic,
}

fn contains_any(input: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| input.contains(k))
}

/// Classify a message (case-insensitive)
pub fn classify(message: &str) -> Category {
    let input = message.to_lowercase();
    if contains_any(&input, GREETING_KEYWORDS) {
        Category::Greeting
    } else if contains_any(&input, WHO_KEYWORDS) {
        Category::WhoIs
    } else if contains_any(&input, WHAT_KEYWORDS) {
        Category::WhatIs
    } else if contains_any(&input, HOW_KEYWORDS) {
        Category::HowTo
    } else if contains_any(&input, HELP_KEYWORDS) {
        Category::Help
    } else {
        Category::Generic
    }
}

/// Text following the trigger phrase, question marks removed
fn subject(input: &str, pattern: &Regex) -> String {
    let rest = pattern.replace(input, "");
    let subject = rest.replace('?', "").trim().to_string();
    if subject.is_empty() {
        "that".to_string()
    } else {
        subject
    }
}

fn lookup(table: &[Entry], subject: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|entry| contains_any(subject, entry.keywords))
        .map(|entry| entry.reply)
}

fn pick<R: Rng + ?Sized>(replies: &[&'static str], rng: &mut R) -> String {
    replies
        .choose(rng)
        .copied()
        .unwrap_or(knowledge::GENERIC_REPLIES[0])
        .to_string()
}

/// Reply to a message using the thread-local RNG
pub fn respond(message: &str) -> String {
    respond_with(message, &mut rand::rng())
}

/// Reply to a message, choosing among templates with `rng`
pub fn respond_with<R: Rng + ?Sized>(message: &str, rng: &mut R) -> String {
    let input = message.to_lowercase();
    let category = classify(&input);
    tracing::debug!(category = ?category, input_length = message.len(), "Generating fallback reply");

    match category {
        Category::Greeting => pick(knowledge::GREETINGS, rng),
        Category::WhoIs => {
            let subject = subject(&input, &WHO_SUBJECT);
            lookup(knowledge::PEOPLE, &subject)
                .map(str::to_string)
                .unwrap_or_else(|| knowledge::unknown_person(&subject))
        }
        Category::WhatIs => {
            let subject = subject(&input, &WHAT_SUBJECT);
            lookup(knowledge::CONCEPTS, &subject)
                .map(str::to_string)
                .unwrap_or_else(|| knowledge::unknown_concept(&subject))
        }
        Category::HowTo => {
            let subject = subject(&input, &HOW_SUBJECT);
            lookup(knowledge::PROCESSES, &subject)
                .map(str::to_string)
                .unwrap_or_else(|| knowledge::unknown_process(&subject))
        }
        Category::Help => pick(knowledge::HELP_REPLIES, rng),
        Category::Generic => pick(knowledge::GENERIC_REPLIES, rng),
    }
}
