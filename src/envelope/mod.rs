//! Response envelope parsing.
//!
//! Improve and rephrase responses carry a one-line explanation, a blank
//! line, then the rewritten text. Translations and misbehaving models
//! return the body alone.

use serde::{Deserialize, Serialize};

/// Longest explanation accepted, in characters.
pub const MAX_EXPLANATION_CHARS: usize = 60;

const BOUNDARY: &str = "\n\n";

/// A completed response split into explanation and body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Short summary of the changes. Empty when absent.
    pub explanation: String,
    /// The rewritten text.
    pub body: String,
}

/// Splits a completed response at its first blank line.
///
/// The text before the boundary is only taken as an explanation when it is
/// at most [`MAX_EXPLANATION_CHARS`] characters; otherwise the whole
/// trimmed response is the body.
///
/// ```
/// use polishr_client::envelope::parse_envelope;
///
/// let envelope = parse_envelope("Fixed subject-verb agreement\n\nThe cat sits.");
/// assert_eq!(envelope.explanation, "Fixed subject-verb agreement");
/// assert_eq!(envelope.body, "The cat sits.");
/// ```
pub fn parse_envelope(text: &str) -> Envelope {
    if let Some((head, tail)) = text.split_once(BOUNDARY) {
        let explanation = head.trim();
        if explanation.chars().count() <= MAX_EXPLANATION_CHARS {
            return Envelope {
                explanation: explanation.to_string(),
                body: tail.trim().to_string(),
            };
        }
    }

    Envelope {
        explanation: String::new(),
        body: text.trim().to_string(),
    }
}
