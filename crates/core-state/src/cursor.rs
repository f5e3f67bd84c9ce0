//! The cursor state machine (C7): a position into the rendered change set
//! at one of three granularities. Navigation stays within the currently
//! opened file change and wraps to an adjacent opened file change once
//! exhausted.

use std::collections::HashSet;

use jjdiff_change::{Change, Line, LineStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Change(usize),
    Hunk { change: usize, start: usize, end: usize },
    Line { change: usize, line: usize },
}

/// A hunk is a maximal run of non-unchanged lines. Returns `(start, end)`
/// ranges (end-exclusive) in line order.
pub fn hunks(lines: &[Line]) -> Vec<(usize, usize)> {
    let mut hunks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].status() == LineStatus::Unchanged {
            i += 1;
            continue;
        }
        let start = i;
        while i < lines.len() && lines[i].status() != LineStatus::Unchanged {
            i += 1;
        }
        hunks.push((start, i));
    }
    hunks
}

fn lines_of(changes: &[Change], index: usize) -> &[Line] {
    changes[index].lines().unwrap_or(&[])
}

fn is_opened_file_change(changes: &[Change], opened: &HashSet<usize>, index: usize) -> bool {
    changes[index].is_file_change() && opened.contains(&index)
}

/// The nearest other opened file change, searching forward or backward
/// (modulo the change count) from `from`.
fn adjacent_opened_file_change(
    changes: &[Change],
    opened: &HashSet<usize>,
    from: usize,
    forward: bool,
) -> Option<usize> {
    let n = changes.len();
    for step in 1..n {
        let index = if forward { (from + step) % n } else { (from + n - step) % n };
        if is_opened_file_change(changes, opened, index) {
            return Some(index);
        }
    }
    None
}

impl Cursor {
    pub fn change_index(&self) -> usize {
        match self {
            Cursor::Change(i) => *i,
            Cursor::Hunk { change, .. } => *change,
            Cursor::Line { change, .. } => *change,
        }
    }

    pub fn next(&self, changes: &[Change], opened: &HashSet<usize>) -> Cursor {
        self.step(changes, opened, true)
    }

    pub fn prev(&self, changes: &[Change], opened: &HashSet<usize>) -> Cursor {
        self.step(changes, opened, false)
    }

    fn step(&self, changes: &[Change], opened: &HashSet<usize>, forward: bool) -> Cursor {
        let n = changes.len();
        if n == 0 {
            return *self;
        }

        match self {
            Cursor::Change(i) => Cursor::Change(if forward { (i + 1) % n } else { (i + n - 1) % n }),
            Cursor::Hunk { change, start, end } => {
                let own_hunks = hunks(lines_of(changes, *change));
                if let Some(pos) = own_hunks.iter().position(|h| h == &(*start, *end)) {
                    let next_pos = if forward { pos.checked_add(1) } else { pos.checked_sub(1) };
                    if let Some(next_pos) = next_pos {
                        if let Some(&(s, e)) = own_hunks.get(next_pos) {
                            return Cursor::Hunk { change: *change, start: s, end: e };
                        }
                    }
                }

                if let Some(target) = adjacent_opened_file_change(changes, opened, *change, forward) {
                    let target_hunks = hunks(lines_of(changes, target));
                    let picked = if forward { target_hunks.first() } else { target_hunks.last() };
                    if let Some(&(s, e)) = picked {
                        return Cursor::Hunk { change: target, start: s, end: e };
                    }
                }

                let picked = if forward { own_hunks.first() } else { own_hunks.last() };
                match picked {
                    Some(&(s, e)) => Cursor::Hunk { change: *change, start: s, end: e },
                    None => Cursor::Change(*change),
                }
            }
            Cursor::Line { change, line } => {
                let own_lines = lines_of(changes, *change);
                let next_line = if forward { line.checked_add(1) } else { line.checked_sub(1) };
                if let Some(next_line) = next_line {
                    if next_line < own_lines.len() {
                        return Cursor::Line { change: *change, line: next_line };
                    }
                }

                if let Some(target) = adjacent_opened_file_change(changes, opened, *change, forward) {
                    let target_lines = lines_of(changes, target);
                    let line = if forward { 0 } else { target_lines.len().saturating_sub(1) };
                    return Cursor::Line { change: target, line };
                }

                if !own_lines.is_empty() {
                    let line = if forward { 0 } else { own_lines.len() - 1 };
                    Cursor::Line { change: *change, line }
                } else {
                    Cursor::Change(*change)
                }
            }
        }
    }

    pub fn first(&self, changes: &[Change], opened: &HashSet<usize>) -> Cursor {
        self.edge(changes, opened, true)
    }

    pub fn last(&self, changes: &[Change], opened: &HashSet<usize>) -> Cursor {
        self.edge(changes, opened, false)
    }

    fn edge(&self, changes: &[Change], opened: &HashSet<usize>, first: bool) -> Cursor {
        let n = changes.len();
        if n == 0 {
            return *self;
        }

        let fallback = Cursor::Change(if first { 0 } else { n - 1 });

        match self {
            Cursor::Change(_) => fallback,
            Cursor::Hunk { .. } => {
                let indices: Box<dyn Iterator<Item = usize>> =
                    if first { Box::new(0..n) } else { Box::new((0..n).rev()) };
                for index in indices {
                    if is_opened_file_change(changes, opened, index) {
                        let hunks = hunks(lines_of(changes, index));
                        let picked = if first { hunks.first() } else { hunks.last() };
                        if let Some(&(s, e)) = picked {
                            return Cursor::Hunk { change: index, start: s, end: e };
                        }
                    }
                }
                fallback
            }
            Cursor::Line { .. } => {
                let indices: Box<dyn Iterator<Item = usize>> =
                    if first { Box::new(0..n) } else { Box::new((0..n).rev()) };
                for index in indices {
                    if is_opened_file_change(changes, opened, index) {
                        let lines = lines_of(changes, index);
                        if !lines.is_empty() {
                            let line = if first { 0 } else { lines.len() - 1 };
                            return Cursor::Line { change: index, line };
                        }
                    }
                }
                fallback
            }
        }
    }

    /// Closes an opened change, or zooms out one granularity level.
    pub fn grow(&self, changes: &[Change], opened: &mut HashSet<usize>) -> Cursor {
        match self {
            Cursor::Change(i) => {
                opened.remove(i);
                Cursor::Change(*i)
            }
            Cursor::Hunk { change, .. } => Cursor::Change(*change),
            Cursor::Line { change, line } => {
                let own_hunks = hunks(lines_of(changes, *change));
                let (start, end) = own_hunks
                    .into_iter()
                    .find(|(s, e)| *s <= *line && *line < *e)
                    .unwrap_or((*line, *line + 1));
                Cursor::Hunk { change: *change, start, end }
            }
        }
    }

    /// Opens a change, or zooms in one granularity level.
    pub fn shrink(&self, changes: &[Change], opened: &mut HashSet<usize>) -> Cursor {
        match self {
            Cursor::Change(i) => {
                if changes[*i].is_file_change() {
                    opened.insert(*i);
                    if let Some(&(s, e)) = hunks(lines_of(changes, *i)).first() {
                        return Cursor::Hunk { change: *i, start: s, end: e };
                    }
                }
                Cursor::Change(*i)
            }
            Cursor::Hunk { change, start, .. } => Cursor::Line { change: *change, line: *start },
            Cursor::Line { .. } => *self,
        }
    }
}
