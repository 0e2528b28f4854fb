//! Post-processing of a raw character alignment.
//!
//! A minimal edit script is rarely what a reader wants to see: it splits
//! words on coincidental shared letters. These passes coalesce runs of
//! edits, fold short equalities into the edits around them, and slide
//! single edits onto word or line boundaries. None of them changes what
//! the segments reconstruct.

use super::{DiffKind, DiffSegment};

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte length of the common prefix.
fn common_prefix(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// Byte length of the common suffix.
fn common_suffix(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// Folds equalities that are no longer than the edits on both sides into
/// those edits, then merges and realigns.
pub(crate) fn cleanup_semantic(segments: &mut Vec<DiffSegment>) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0usize;
    let (mut inserted_before, mut deleted_before) = (0usize, 0usize);
    let (mut inserted_after, mut deleted_after) = (0usize, 0usize);

    while pointer < segments.len() {
        if segments[pointer].kind == DiffKind::Equal {
            equalities.push(pointer);
            inserted_before = inserted_after;
            deleted_before = deleted_after;
            inserted_after = 0;
            deleted_after = 0;
            last_equality = Some(segments[pointer].text.clone());
            pointer += 1;
            continue;
        }

        let len = char_len(&segments[pointer].text);
        if segments[pointer].kind == DiffKind::Insert {
            inserted_after += len;
        } else {
            deleted_after += len;
        }

        let fold = match (&last_equality, equalities.last()) {
            (Some(equality), Some(&index)) if !equality.is_empty() => {
                let eq_len = char_len(equality);
                (eq_len <= inserted_before.max(deleted_before)
                    && eq_len <= inserted_after.max(deleted_after))
                .then_some(index)
            }
            _ => None,
        };

        match fold {
            Some(index) => {
                let text = segments[index].text.clone();
                segments.insert(index, DiffSegment::delete(text));
                segments[index + 1].kind = DiffKind::Insert;

                // The folded equality and the one before it are both stale.
                equalities.pop();
                equalities.pop();
                pointer = equalities.last().map_or(0, |&i| i + 1);

                inserted_before = 0;
                deleted_before = 0;
                inserted_after = 0;
                deleted_after = 0;
                last_equality = None;
                changed = true;
            }
            None => pointer += 1,
        }
    }

    if changed {
        cleanup_merge(segments);
    }
    cleanup_semantic_lossless(segments);
    extract_overlaps(segments);
}

/// Byte length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap(a: &str, b: &str) -> usize {
    b.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .filter(|&end| end <= a.len() && a.ends_with(&b[..end]))
        .max()
        .unwrap_or(0)
}

/// Turns the overlap between a deletion and the insertion after it into an
/// equality, e.g. "<del>abcxxx</del><ins>xxxdef</ins>" becomes
/// "<del>abc</del>xxx<ins>def</ins>". The overlap must cover at least half
/// of one of the two edits.
fn extract_overlaps(segments: &mut Vec<DiffSegment>) {
    let mut pointer = 1usize;

    while pointer < segments.len() {
        if segments[pointer - 1].kind == DiffKind::Delete
            && segments[pointer].kind == DiffKind::Insert
        {
            let deletion = segments[pointer - 1].text.clone();
            let insertion = segments[pointer].text.clone();
            let forward = common_overlap(&deletion, &insertion);
            let reverse = common_overlap(&insertion, &deletion);
            let covers = |overlap: &str| {
                let n = char_len(overlap) * 2;
                n > 0 && (n >= char_len(&deletion) || n >= char_len(&insertion))
            };

            if forward >= reverse {
                let shared = &insertion[..forward];
                if covers(shared) {
                    segments.insert(pointer, DiffSegment::equal(shared));
                    segments[pointer - 1].text = deletion[..deletion.len() - forward].to_string();
                    segments[pointer + 1].text = insertion[forward..].to_string();
                    pointer += 1;
                }
            } else {
                let shared = &deletion[..reverse];
                if covers(shared) {
                    segments.insert(pointer, DiffSegment::equal(shared));
                    segments[pointer - 1] =
                        DiffSegment::insert(&insertion[..insertion.len() - reverse]);
                    segments[pointer + 1] = DiffSegment::delete(&deletion[reverse..]);
                    pointer += 1;
                }
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Coalesces adjacent edits into one delete followed by one insert,
/// factoring shared prefixes and suffixes into the neighbouring
/// equalities, and drops empty segments.
pub(crate) fn cleanup_merge(segments: &mut Vec<DiffSegment>) {
    segments.retain(|s| !s.text.is_empty());
    segments.push(DiffSegment::equal(""));

    let mut pointer = 0usize;
    let (mut count_delete, mut count_insert) = (0usize, 0usize);
    let (mut text_delete, mut text_insert) = (String::new(), String::new());

    while pointer < segments.len() {
        match segments[pointer].kind {
            DiffKind::Insert => {
                count_insert += 1;
                text_insert.push_str(&segments[pointer].text);
                pointer += 1;
            }
            DiffKind::Delete => {
                count_delete += 1;
                text_delete.push_str(&segments[pointer].text);
                pointer += 1;
            }
            DiffKind::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let prefix = common_prefix(&text_insert, &text_delete);
                        if prefix != 0 {
                            let shared = text_insert[..prefix].to_string();
                            let start = pointer - count_delete - count_insert;
                            if start > 0 && segments[start - 1].kind == DiffKind::Equal {
                                segments[start - 1].text.push_str(&shared);
                            } else {
                                segments.insert(0, DiffSegment::equal(shared));
                                pointer += 1;
                            }
                            text_insert.drain(..prefix);
                            text_delete.drain(..prefix);
                        }

                        let suffix = common_suffix(&text_insert, &text_delete);
                        if suffix != 0 {
                            let shared = text_insert[text_insert.len() - suffix..].to_string();
                            segments[pointer].text.insert_str(0, &shared);
                            text_insert.truncate(text_insert.len() - suffix);
                            text_delete.truncate(text_delete.len() - suffix);
                        }
                    }

                    pointer -= count_delete + count_insert;
                    segments.drain(pointer..pointer + count_delete + count_insert);
                    if !text_delete.is_empty() {
                        segments.insert(pointer, DiffSegment::delete(std::mem::take(&mut text_delete)));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        segments.insert(pointer, DiffSegment::insert(std::mem::take(&mut text_insert)));
                        pointer += 1;
                    }
                    pointer += 1;
                } else if pointer != 0 && segments[pointer - 1].kind == DiffKind::Equal {
                    let text = segments.remove(pointer).text;
                    segments[pointer - 1].text.push_str(&text);
                } else {
                    pointer += 1;
                }

                count_delete = 0;
                count_insert = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if segments.last().is_some_and(|s| s.text.is_empty()) {
        segments.pop();
    }

    // A single edit between two equalities may slide over one of them
    // entirely, e.g. "A<ins>BA</ins>C" becomes "<ins>AB</ins>AC".
    let mut shifted = false;
    let mut pointer = 1usize;
    while pointer + 1 < segments.len() {
        if segments[pointer - 1].kind == DiffKind::Equal
            && segments[pointer + 1].kind == DiffKind::Equal
        {
            let previous = segments[pointer - 1].text.clone();
            let next = segments[pointer + 1].text.clone();
            let current = segments[pointer].text.clone();

            if current.ends_with(previous.as_str()) {
                let head = &current[..current.len() - previous.len()];
                segments[pointer].text = format!("{}{}", previous, head);
                segments[pointer + 1].text = format!("{}{}", previous, next);
                segments.remove(pointer - 1);
                shifted = true;
            } else if current.starts_with(next.as_str()) {
                segments[pointer - 1].text.push_str(&next);
                segments[pointer].text = format!("{}{}", &current[next.len()..], next);
                segments.remove(pointer + 1);
                shifted = true;
            }
        }
        pointer += 1;
    }

    if shifted {
        cleanup_merge(segments);
    }
}

/// Slides single edits surrounded by equalities to the most natural
/// boundary, e.g. "The c<ins>ow and the c</ins>at." becomes
/// "The <ins>cow and the </ins>cat.".
pub(crate) fn cleanup_semantic_lossless(segments: &mut Vec<DiffSegment>) {
    let mut pointer = 1usize;

    while pointer + 1 < segments.len() {
        if segments[pointer - 1].kind == DiffKind::Equal
            && segments[pointer + 1].kind == DiffKind::Equal
        {
            let mut before = segments[pointer - 1].text.clone();
            let mut edit = segments[pointer].text.clone();
            let mut after = segments[pointer + 1].text.clone();

            // Shift the edit as far left as possible.
            let offset = common_suffix(&before, &edit);
            if offset > 0 {
                let shared = edit[edit.len() - offset..].to_string();
                before.truncate(before.len() - offset);
                edit = format!("{}{}", shared, &edit[..edit.len() - offset]);
                after.insert_str(0, &shared);
            }

            // Then step right one character at a time.
            let mut best = (before.clone(), edit.clone(), after.clone());
            let mut best_score = boundary_score(&before, &edit) + boundary_score(&edit, &after);

            while let (Some(e), Some(a)) = (edit.chars().next(), after.chars().next()) {
                if e != a {
                    break;
                }
                before.push(e);
                edit = format!("{}{}", &edit[e.len_utf8()..], e);
                after.drain(..e.len_utf8());

                let score = boundary_score(&before, &edit) + boundary_score(&edit, &after);
                // Ties favour the rightmost position.
                if score >= best_score {
                    best_score = score;
                    best = (before.clone(), edit.clone(), after.clone());
                }
            }

            let (best_before, best_edit, best_after) = best;
            if segments[pointer - 1].text != best_before {
                if best_before.is_empty() {
                    segments.remove(pointer - 1);
                    pointer -= 1;
                } else {
                    segments[pointer - 1].text = best_before;
                }
                segments[pointer].text = best_edit;
                if best_after.is_empty() {
                    segments.remove(pointer + 1);
                    pointer = pointer.saturating_sub(1);
                } else {
                    segments[pointer + 1].text = best_after;
                }
            }
        }
        pointer += 1;
    }
}

/// Scores how natural the boundary between `one` and `two` is, from 6
/// (edge of the text) down to 0 (inside a word).
fn boundary_score(one: &str, two: &str) -> u8 {
    let (Some(c1), Some(c2)) = (one.chars().last(), two.chars().next()) else {
        return 6;
    };

    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let whitespace1 = non_alnum1 && c1.is_whitespace();
    let whitespace2 = non_alnum2 && c2.is_whitespace();
    let line_break1 = whitespace1 && (c1 == '\r' || c1 == '\n');
    let line_break2 = whitespace2 && (c2 == '\r' || c2 == '\n');
    let blank_line1 = line_break1 && (one.ends_with("\n\n") || one.ends_with("\n\r\n"));
    let blank_line2 = line_break2
        && ["\n\n", "\n\r\n", "\r\n\n", "\r\n\r\n"]
            .iter()
            .any(|p| two.starts_with(p));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}
