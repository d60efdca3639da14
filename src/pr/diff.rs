use std::borrow::Cow;

use super::types::DiffStats;

/// Count files and changed lines in a unified diff.
///
/// The input is the raw text from GitHub's diff endpoint and is never
/// rejected: anything that doesn't look like a diff simply counts as zero.
///
/// Each file section starts with `diff --git a/{path} b/{path}`. Until the
/// first `@@` hunk header of a file, `--- /dev/null` marks a new file and
/// `+++ /dev/null` a deleted one. Inside hunks, lines prefixed with `+` or
/// `-` are additions and deletions.
pub fn summarize(raw_diff: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    let mut in_header = false;

    for line in raw_diff.lines() {
        if line.starts_with("diff --git ") {
            stats.files += 1;
            in_header = true;
            continue;
        }

        if line.starts_with("@@") {
            in_header = false;
            continue;
        }

        if in_header {
            match line {
                "--- /dev/null" => stats.new_files += 1,
                "+++ /dev/null" => stats.deleted_files += 1,
                _ => {}
            }
            continue;
        }

        if line.starts_with('+') {
            stats.additions += 1;
        } else if line.starts_with('-') {
            stats.deletions += 1;
        }
    }

    stats
}

/// Cut `diff` down to at most `max_chars` characters, appending a marker line
/// saying how much was dropped. Short diffs are returned untouched.
pub fn truncate(diff: &str, max_chars: usize) -> Cow<'_, str> {
    let Some((cut, _)) = diff.char_indices().nth(max_chars) else {
        return Cow::Borrowed(diff);
    };
    let total = diff.chars().count();
    let mut truncated = String::with_capacity(cut + 64);
    truncated.push_str(&diff[..cut]);
    if !truncated.ends_with('\n') {
        truncated.push('\n');
    }
    truncated.push_str(&format!(
        "[diff truncated: {} of {} characters omitted]\n",
        total - max_chars,
        total
    ));
    Cow::Owned(truncated)
}
