//! The change-set render pipeline (C8): per-change titles, opened bodies
//! (line grid / binary notice / symlink target), hunk merging with
//! omitted-line collapsing, and LCS-based underlining of changed
//! substrings.

use std::collections::HashSet;

use jjdiff_change::{get_change_refs, Change, Line, Ref};
use core_state::{hunks, Cursor};

use crate::drawable::{BoxDrawable, Drawable, Marker, RawLine, Rows, Text};
use crate::style::{Style, TextColor};

/// Unchanged lines shorter than this, between two hunks, are kept visible
/// rather than collapsed — the two hunks are treated as one.
const MIN_OMITTED: usize = 2;
/// Unchanged lines of context kept on each side of a hunk that isn't
/// merged with its neighbor.
const MIN_CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeIncluded {
    Full,
    Partial,
    None,
}

fn change_included_state(index: usize, change: &Change, included: &HashSet<Ref>) -> ChangeIncluded {
    let refs = get_change_refs(index, change);
    if refs.is_empty() {
        return ChangeIncluded::Full;
    }
    let included_count = refs.iter().filter(|r| included.contains(r)).count();
    if included_count == 0 {
        ChangeIncluded::None
    } else if included_count == refs.len() {
        ChangeIncluded::Full
    } else {
        ChangeIncluded::Partial
    }
}

fn glyph_and_color(state: ChangeIncluded) -> (char, TextColor) {
    match state {
        ChangeIncluded::Full => ('\u{2713}', TextColor::Green),
        ChangeIncluded::Partial => ('-', TextColor::Yellow),
        ChangeIncluded::None => ('\u{2717}', TextColor::Red),
    }
}

fn mode_label(is_exec: bool) -> &'static str {
    if is_exec {
        "executable"
    } else {
        "normal"
    }
}

fn title_text(change: &Change) -> String {
    match change {
        Change::Rename { old_path, new_path } => format!("{} -> {}", old_path.display(), new_path.display()),
        Change::ChangeMode { path, old_is_exec, new_is_exec } => {
            format!("{} (mode {} -> {})", path.display(), mode_label(*old_is_exec), mode_label(*new_is_exec))
        }
        Change::AddFile { path, .. } => format!("{} (added)", path.display()),
        Change::ModifyFile { path, .. } => format!("{} (modified)", path.display()),
        Change::DeleteFile { path, .. } => format!("{} (deleted)", path.display()),
        Change::AddBinary { path, .. } => format!("{} (added, binary)", path.display()),
        Change::ModifyBinary { path, .. } => format!("{} (modified, binary)", path.display()),
        Change::DeleteBinary { path, .. } => format!("{} (deleted, binary)", path.display()),
        Change::AddSymlink { path, .. } => format!("{} (added, symlink)", path.display()),
        Change::ModifySymlink { path, .. } => format!("{} (modified, symlink)", path.display()),
        Change::DeleteSymlink { path, .. } => format!("{} (deleted, symlink)", path.display()),
    }
}

enum RowSpec {
    Line(usize),
    Omitted(usize),
}

fn merge_hunks(hunks: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for &(start, end) in hunks {
        if let Some(last) = merged.last_mut() {
            if start.saturating_sub(last.1) < MIN_OMITTED {
                last.1 = end;
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}

fn shown_ranges(merged: &[(usize, usize)], len: usize) -> Vec<(usize, usize)> {
    let padded = merged.iter().map(|&(s, e)| (s.saturating_sub(MIN_CONTEXT), (e + MIN_CONTEXT).min(len)));

    let mut result: Vec<(usize, usize)> = Vec::new();
    for (s, e) in padded {
        if let Some(last) = result.last_mut() {
            if s <= last.1 {
                last.1 = last.1.max(e);
                continue;
            }
        }
        result.push((s, e));
    }
    result
}

fn build_rows(lines: &[Line]) -> Vec<RowSpec> {
    let found = hunks(lines);
    if found.is_empty() {
        return (0..lines.len()).map(RowSpec::Line).collect();
    }

    let merged = merge_hunks(&found);
    let shown = shown_ranges(&merged, lines.len());

    let mut rows = Vec::new();
    let mut cursor = 0;
    for (start, end) in shown {
        if start > cursor {
            rows.push(RowSpec::Omitted(start - cursor));
        }
        rows.extend((start..end).map(RowSpec::Line));
        cursor = end;
    }
    if cursor < lines.len() {
        rows.push(RowSpec::Omitted(lines.len() - cursor));
    }
    rows
}

/// Character ranges in `old`/`new` that differ, via an LCS opcode pass.
fn diff_underline_ranges(old: &str, new: &str) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    let diff = similar::TextDiff::from_chars(old, new);
    let mut old_ranges = Vec::new();
    let mut new_ranges = Vec::new();

    for op in diff.ops() {
        match *op {
            similar::DiffOp::Equal { .. } => {}
            similar::DiffOp::Delete { old_index, old_len, .. } => {
                old_ranges.push((old_index, old_index + old_len));
            }
            similar::DiffOp::Insert { new_index, new_len, .. } => {
                new_ranges.push((new_index, new_index + new_len));
            }
            similar::DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                old_ranges.push((old_index, old_index + old_len));
                new_ranges.push((new_index, new_index + new_len));
            }
        }
    }

    (old_ranges, new_ranges)
}

fn paint_with_underlines(content: &str, base: Style, ranges: &[(usize, usize)]) -> String {
    let chars: Vec<char> = content.chars().collect();
    let underlined = base.update(&Style::underline());
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let marked = ranges.iter().any(|&(s, e)| i >= s && i < e);
        let mut j = i;
        while j < chars.len() && ranges.iter().any(|&(s, e)| j >= s && j < e) == marked {
            j += 1;
        }
        let segment: String = chars[i..j].iter().collect();
        let style = if marked { underlined } else { base };
        out.push_str(&style.paint(&segment));
        i = j;
    }
    out
}

fn render_line(line: &Line) -> Vec<BoxDrawable> {
    match (&line.old, &line.new) {
        (Some(old), Some(new)) if old == new => vec![Box::new(RawLine(format!(" {old}")))],
        (Some(old), Some(new)) => {
            let (old_ranges, new_ranges) = diff_underline_ranges(old, new);
            let old_line = format!(
                "{}{}",
                Style::fg(TextColor::Red).paint("-"),
                paint_with_underlines(old, Style::fg(TextColor::Red), &old_ranges)
            );
            let new_line = format!(
                "{}{}",
                Style::fg(TextColor::Green).paint("+"),
                paint_with_underlines(new, Style::fg(TextColor::Green), &new_ranges)
            );
            vec![Box::new(RawLine(old_line)), Box::new(RawLine(new_line))]
        }
        (None, Some(new)) => vec![Box::new(RawLine(Style::fg(TextColor::Green).paint(&format!("+{new}"))))],
        (Some(old), None) => vec![Box::new(RawLine(Style::fg(TextColor::Red).paint(&format!("-{old}"))))],
        (None, None) => vec![],
    }
}

fn render_line_grid(lines: &[Line], selected_range: Option<(usize, usize)>) -> Rows {
    let mut rows = Rows::new();
    for spec in build_rows(lines) {
        match spec {
            RowSpec::Omitted(n) => {
                let label = format!("  ... {n} unchanged line{} omitted ...", if n == 1 { "" } else { "s" });
                rows.push(Box::new(Text::styled(label, Style { italic: Some(true), ..Style::default() })));
            }
            RowSpec::Line(index) => {
                let marked = selected_range.is_some_and(|(s, e)| index >= s && index < e);
                if marked {
                    rows.push(Box::new(Marker));
                }
                for row in render_line(&lines[index]) {
                    rows.push(row);
                }
            }
        }
    }
    rows
}

/// Renders the whole change set as a single drawable. `opened` controls
/// which file changes show their body; `None` opens every file change
/// (the `--print` path). `cursor` places a selection marker; `None`
/// renders with no selection (also `--print`).
pub fn render_changes(
    changes: &[Change],
    included: &HashSet<Ref>,
    opened: Option<&HashSet<usize>>,
    cursor: Option<Cursor>,
) -> Rows {
    let mut root = Rows::new();

    for (index, change) in changes.iter().enumerate() {
        let state = change_included_state(index, change, included);
        let (glyph, color) = glyph_and_color(state);

        if cursor == Some(Cursor::Change(index)) {
            root.push(Box::new(Marker));
        }
        root.push(Box::new(Text::styled(format!("{glyph} {}", title_text(change)), Style::fg(color))));

        let is_opened = match opened {
            Some(set) => change.is_file_change() && set.contains(&index),
            None => change.is_file_change(),
        };
        if !is_opened {
            continue;
        }

        let selected_range = match cursor {
            Some(Cursor::Hunk { change: c, start, end }) if c == index => Some((start, end)),
            Some(Cursor::Line { change: c, line }) if c == index => Some((line, line + 1)),
            _ => None,
        };

        match change {
            Change::AddFile { lines, .. } | Change::ModifyFile { lines, .. } | Change::DeleteFile { lines, .. } => {
                root.push(Box::new(render_line_grid(lines, selected_range)));
            }
            Change::AddBinary { .. } | Change::ModifyBinary { .. } | Change::DeleteBinary { .. } => {
                root.push(Box::new(Text::new("  (cannot display binary file)")));
            }
            Change::AddSymlink { to, .. } | Change::DeleteSymlink { to, .. } => {
                root.push(Box::new(Text::new(format!("  -> {}", to.display()))));
            }
            Change::ModifySymlink { new_to, .. } => {
                root.push(Box::new(Text::new(format!("  -> {}", new_to.display()))));
            }
            Change::Rename { .. } | Change::ChangeMode { .. } => {}
        }
    }

    root
}
