//! The session value type and its transitions.
//!
//! A [`Session`] only changes through the transition methods below. Each
//! one checks the current status and reports whether it applied, so an
//! event that arrives late (a delta after a cancel, a completion after a
//! reset) is a no-op rather than a corruption.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ProviderConfig;
use crate::diff::{compute_diff, has_changes, DiffSegment, DiffStats};
use crate::envelope::parse_envelope;
use crate::types::mode::PolishMode;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nothing started yet, or reset.
    #[default]
    Idle,
    /// A request is in flight.
    Streaming,
    /// The response arrived in full and was parsed.
    Completed,
    /// The user stopped the request.
    Cancelled,
    /// The request failed.
    Failed,
}

impl SessionStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Failed => "failed",
        }
    }

    /// True for Completed, Cancelled and Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Failed
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to (re)run a polish.
#[derive(Debug, Clone)]
pub struct PolishRequest {
    /// Text to transform.
    pub text: String,
    /// Transformation mode.
    pub mode: PolishMode,
    /// Provider to call.
    pub config: ProviderConfig,
    /// Optional free-form instruction appended to the user message.
    pub instruction: Option<String>,
}

impl PolishRequest {
    /// Creates a request without an extra instruction.
    pub fn new(text: impl Into<String>, mode: PolishMode, config: ProviderConfig) -> Self {
        Self {
            text: text.into(),
            mode,
            config,
            instruction: None,
        }
    }

    /// Adds a free-form instruction. Blank instructions are dropped.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        self.instruction = (!instruction.trim().is_empty()).then_some(instruction);
        self
    }
}

/// One transformation attempt and its derived state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    original_text: String,
    mode: PolishMode,
    instruction: Option<String>,
    raw_text: String,
    explanation: String,
    final_text: String,
    diff: Vec<DiffSegment>,
    status: SessionStatus,
    error: Option<String>,
}

impl Session {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Input text of the current or last attempt.
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Mode of the current or last attempt.
    pub fn mode(&self) -> PolishMode {
        self.mode
    }

    /// Instruction of the current or last attempt.
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    /// Text received so far.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Parsed explanation. Empty until completed.
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Parsed body, the text a paste collaborator receives. Empty until
    /// completed.
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    /// Diff of the original against the parsed body. Empty until
    /// completed.
    pub fn diff(&self) -> &[DiffSegment] {
        &self.diff
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Failure message. Only set when failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a request is in flight.
    pub fn is_streaming(&self) -> bool {
        self.status == SessionStatus::Streaming
    }

    /// True if the completed body differs from the original.
    pub fn has_changes(&self) -> bool {
        has_changes(&self.diff)
    }

    /// Character counts of the diff.
    pub fn diff_stats(&self) -> DiffStats {
        DiffStats::from_segments(&self.diff)
    }

    /// Enters Streaming for new input. Valid from any status.
    pub fn begin(&mut self, text: &str, mode: PolishMode, instruction: Option<String>) {
        self.clear_derived();
        self.original_text = text.to_string();
        self.mode = mode;
        self.instruction = instruction;
        self.status = SessionStatus::Streaming;
    }

    /// Appends a delta while Streaming.
    pub fn push_delta(&mut self, delta: &str) -> bool {
        if self.status != SessionStatus::Streaming {
            return false;
        }
        self.raw_text.push_str(delta);
        true
    }

    /// Parses the received text, diffs it and enters Completed.
    pub fn complete(&mut self) -> bool {
        if self.status != SessionStatus::Streaming {
            return false;
        }
        let envelope = parse_envelope(&self.raw_text);
        self.diff = compute_diff(&self.original_text, &envelope.body);
        self.explanation = envelope.explanation;
        self.final_text = envelope.body;
        self.status = SessionStatus::Completed;
        true
    }

    /// Enters Cancelled. No error is recorded. The partial text is kept for
    /// display only: no envelope is parsed and no diff is computed, so
    /// `final_text` stays empty as it was before `begin`.
    pub fn cancel(&mut self) -> bool {
        if self.status != SessionStatus::Streaming {
            return false;
        }
        self.status = SessionStatus::Cancelled;
        true
    }

    /// Records a failure message and enters Failed.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status != SessionStatus::Streaming {
            return false;
        }
        self.error = Some(message.into());
        self.status = SessionStatus::Failed;
        true
    }

    /// Returns to Idle and clears every derived field. The last input is
    /// kept for display.
    pub fn reset(&mut self) {
        self.clear_derived();
        self.status = SessionStatus::Idle;
    }

    fn clear_derived(&mut self) {
        self.raw_text.clear();
        self.explanation.clear();
        self.final_text.clear();
        self.diff.clear();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffKind;
    use pretty_assertions::assert_eq;

    fn streaming(text: &str) -> Session {
        let mut session = Session::new();
        session.begin(text, PolishMode::Improve, None);
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.diff().is_empty());
        assert!(!session.status().is_terminal());
    }

    #[test]
    fn test_completion_parses_and_diffs() {
        let mut session = streaming("The cat sit.");
        assert!(session.push_delta("Fixed subject-verb agreement\n\n"));
        assert!(session.push_delta("The cat sits."));
        assert!(session.diff().is_empty());

        assert!(session.complete());

        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.explanation(), "Fixed subject-verb agreement");
        assert_eq!(session.final_text(), "The cat sits.");
        assert!(session.has_changes());
        assert_eq!(session.diff_stats().inserted_chars, 1);
        assert!(session
            .diff()
            .iter()
            .any(|s| s.kind == DiffKind::Insert && s.text == "s"));
    }

    #[test]
    fn test_unchanged_result_has_no_changes() {
        let mut session = streaming("Already fine.");
        session.push_delta("Already fine.");
        session.complete();

        assert!(!session.has_changes());
        assert_eq!(session.diff(), &[DiffSegment::equal("Already fine.")]);
    }

    #[test]
    fn test_cancel_keeps_partial_text_without_error() {
        let mut session = streaming("hello");
        session.push_delta("Hel");

        assert!(session.cancel());
        assert_eq!(session.status(), SessionStatus::Cancelled);
        assert_eq!(session.raw_text(), "Hel");
        assert_eq!(session.error(), None);
        assert!(session.diff().is_empty());
        assert_eq!(session.final_text(), "");
        assert_eq!(session.explanation(), "");
        assert!(!session.has_changes());
    }

    #[test]
    fn test_fail_records_message() {
        let mut session = streaming("hello");

        assert!(session.fail("Rate limited. Please wait and try again."));
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.error(), Some("Rate limited. Please wait and try again."));
    }

    #[test]
    fn test_events_outside_streaming_are_ignored() {
        let mut session = Session::new();
        assert!(!session.push_delta("x"));
        assert!(!session.complete());
        assert!(!session.cancel());
        assert!(!session.fail("boom"));
        assert_eq!(session, Session::new());

        let mut cancelled = streaming("hello");
        cancelled.cancel();
        let before = cancelled.clone();
        assert!(!cancelled.push_delta("late"));
        assert!(!cancelled.complete());
        assert!(!cancelled.fail("late"));
        assert_eq!(cancelled, before);
    }

    #[test]
    fn test_reset_clears_derived_fields() {
        let mut session = streaming("The cat sit.");
        session.push_delta("The cat sits.");
        session.complete();

        session.reset();

        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.raw_text(), "");
        assert_eq!(session.final_text(), "");
        assert_eq!(session.explanation(), "");
        assert!(session.diff().is_empty());
        assert_eq!(session.error(), None);
        assert_eq!(session.original_text(), "The cat sit.");
    }

    #[test]
    fn test_begin_restarts_from_any_status() {
        let mut session = streaming("one");
        session.fail("boom");

        session.begin("two", PolishMode::Translate, Some("keep it short".to_string()));

        assert_eq!(session.status(), SessionStatus::Streaming);
        assert_eq!(session.original_text(), "two");
        assert_eq!(session.mode(), PolishMode::Translate);
        assert_eq!(session.instruction(), Some("keep it short"));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_blank_instruction_is_dropped() {
        let config = ProviderConfig::builder().api_key("sk-test").build().unwrap();
        let request = PolishRequest::new("hi", PolishMode::Improve, config).with_instruction("  ");
        assert_eq!(request.instruction, None);
    }
}
