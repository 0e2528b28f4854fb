//! Structural diff between the original text and the polished result.
//!
//! The alignment is computed per character with Myers' algorithm and then
//! cleaned up for human reading, so a rewritten word shows up as one
//! deletion and one insertion rather than a scatter of single letters.

mod cleanup;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// What a segment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present in both texts.
    Equal,
    /// Present only in the final text.
    Insert,
    /// Present only in the original text.
    Delete,
}

/// A typed span of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    /// Segment kind.
    pub kind: DiffKind,
    /// Segment text.
    pub text: String,
}

impl DiffSegment {
    /// Creates an equal segment.
    pub fn equal(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Equal,
            text: text.into(),
        }
    }

    /// Creates an insert segment.
    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Insert,
            text: text.into(),
        }
    }

    /// Creates a delete segment.
    pub fn delete(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Delete,
            text: text.into(),
        }
    }
}

/// Character counts over a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Characters kept.
    pub unchanged_chars: usize,
    /// Characters added.
    pub inserted_chars: usize,
    /// Characters removed.
    pub deleted_chars: usize,
}

impl DiffStats {
    /// Tallies a segment list.
    pub fn from_segments(segments: &[DiffSegment]) -> Self {
        segments.iter().fold(Self::default(), |mut stats, segment| {
            let len = segment.text.chars().count();
            match segment.kind {
                DiffKind::Equal => stats.unchanged_chars += len,
                DiffKind::Insert => stats.inserted_chars += len,
                DiffKind::Delete => stats.deleted_chars += len,
            }
            stats
        })
    }
}

/// Computes the diff from `original` to `revised`.
///
/// Identical inputs, including two empty strings, give a single equal
/// segment.
///
/// ```
/// use polishr_client::diff::{compute_diff, DiffSegment};
///
/// let segments = compute_diff("The cat sit.", "The cat sits.");
/// assert_eq!(
///     segments,
///     vec![
///         DiffSegment::equal("The cat sit"),
///         DiffSegment::insert("s"),
///         DiffSegment::equal("."),
///     ]
/// );
/// ```
pub fn compute_diff(original: &str, revised: &str) -> Vec<DiffSegment> {
    if original == revised {
        return vec![DiffSegment::equal(original)];
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(original, revised);

    let mut segments: Vec<DiffSegment> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => DiffKind::Equal,
            ChangeTag::Insert => DiffKind::Insert,
            ChangeTag::Delete => DiffKind::Delete,
        };
        match segments.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => segments.push(DiffSegment {
                kind,
                text: change.value().to_string(),
            }),
        }
    }

    cleanup::cleanup_merge(&mut segments);
    cleanup::cleanup_semantic(&mut segments);
    segments
}

/// True if any segment is an insertion or deletion.
pub fn has_changes(segments: &[DiffSegment]) -> bool {
    segments.iter().any(|s| s.kind != DiffKind::Equal)
}

/// Reconstructs the original text.
pub fn original_text(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != DiffKind::Insert)
        .map(|s| s.text.as_str())
        .collect()
}

/// Reconstructs the revised text.
pub fn final_text(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != DiffKind::Delete)
        .map(|s| s.text.as_str())
        .collect()
}
