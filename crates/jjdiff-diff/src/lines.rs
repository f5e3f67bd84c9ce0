//! Line alignment (C3): a shortest-path search over insert/delete/substitute
//! moves, after peeling off a shared prefix/suffix.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;

use jjdiff_change::Line;

use crate::similarity::{get_line_similarity, SIMILARITY_THRESHOLD};

pub fn diff_lines(old: &[String], new: &[String]) -> Vec<Line> {
    let mut start = 0;
    while start < old.len() && start < new.len() && old[start] == new[start] {
        start += 1;
    }

    let mut old_end = old.len();
    let mut new_end = new.len();
    while old_end > start && new_end > start && old[old_end - 1] == new[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    let mut lines: Vec<Line> = old[..start]
        .iter()
        .map(|line| Line { old: Some(line.clone()), new: Some(line.clone()) })
        .collect();
    lines.extend(diff_lines_base(&old[start..old_end], &new[start..new_end]));
    lines.extend(old[old_end..].iter().map(|line| Line { old: Some(line.clone()), new: Some(line.clone()) }));
    lines
}

/// Move kind, used only to break cost ties in a fixed, reproducible order:
/// substitute before add before delete.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MoveKind {
    Substitute = 0,
    Add = 1,
    Delete = 2,
}

struct State {
    cost: i64,
    kind: MoveKind,
    old_index: usize,
    new_index: usize,
    line: Option<Line>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.kind == other.kind
    }
}
impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert cost/kind to get the lowest
        // cost (and lowest kind on ties) popped first.
        other.cost.cmp(&self.cost).then_with(|| (other.kind as u8).cmp(&(self.kind as u8)))
    }
}
impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over the edit graph, admissible heuristic `100 * |len(old) - len(new)|`,
/// with substitution costed by line similarity (cheaper the more alike the
/// two lines are) and a fixed threshold below which substitution isn't
/// offered at all.
fn diff_lines_base(old: &[String], new: &[String]) -> Vec<Line> {
    let min_cost = 100 * (old.len() as i64 - new.len() as i64).abs();
    let mut heap = BinaryHeap::new();
    heap.push(State { cost: min_cost, kind: MoveKind::Substitute, old_index: 0, new_index: 0, line: None });

    let mut line_to: HashMap<(usize, usize), Option<Line>> = HashMap::new();

    loop {
        let State { cost: min_cost, old_index, new_index, line, .. } = heap.pop().expect("search space is finite and goal is reachable");

        if line_to.contains_key(&(old_index, new_index)) {
            continue;
        }
        line_to.insert((old_index, new_index), line.clone());

        let old_todo = old.len() - old_index;
        let new_todo = new.len() - new_index;

        if old_todo == 0 && new_todo == 0 {
            let mut lines = Vec::new();
            let mut cursor_old = old_index;
            let mut cursor_new = new_index;
            let mut current = line;

            while let Some(l) = current {
                let has_old = l.old.is_some();
                let has_new = l.new.is_some();
                lines.push(l);
                if has_old {
                    cursor_old -= 1;
                }
                if has_new {
                    cursor_new -= 1;
                }
                current = line_to.get(&(cursor_old, cursor_new)).cloned().flatten();
            }

            lines.reverse();
            return lines;
        }

        if old_todo > 0 {
            let bump = if old_todo <= new_todo { 0 } else { 200 };
            heap.push(State {
                cost: min_cost + bump,
                kind: MoveKind::Delete,
                old_index: old_index + 1,
                new_index,
                line: Some(Line { old: Some(old[old_index].clone()), new: None }),
            });
        }

        if new_todo > 0 {
            let bump = if new_todo <= old_todo { 0 } else { 200 };
            heap.push(State {
                cost: min_cost + bump,
                kind: MoveKind::Add,
                old_index,
                new_index: new_index + 1,
                line: Some(Line { old: None, new: Some(new[new_index].clone()) }),
            });
        }

        if old_todo > 0 && new_todo > 0 {
            let similarity = get_line_similarity(&old[old_index], &new[new_index]);
            if similarity >= SIMILARITY_THRESHOLD {
                let cost = min_cost + (200 - (similarity * 200.0).round() as i64);
                heap.push(State {
                    cost,
                    kind: MoveKind::Substitute,
                    old_index: old_index + 1,
                    new_index: new_index + 1,
                    line: Some(Line { old: Some(old[old_index].clone()), new: Some(new[new_index].clone()) }),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_sequences_are_all_unchanged() {
        let old = strs(&["a", "b", "c"]);
        let new = old.clone();
        let lines = diff_lines(&old, &new);
        assert!(lines.iter().all(|l| l.old == l.new));
    }

    #[test]
    fn pure_insertion_is_all_added_lines() {
        let old = strs(&[]);
        let new = strs(&["a", "b"]);
        let lines = diff_lines(&old, &new);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.old.is_none()));
    }

    #[test]
    fn pure_deletion_is_all_deleted_lines() {
        let old = strs(&["a", "b"]);
        let new = strs(&[]);
        let lines = diff_lines(&old, &new);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.new.is_none()));
    }

    #[test]
    fn similar_lines_align_as_a_change_not_delete_plus_add() {
        let old = strs(&["hello world"]);
        let new = strs(&["hello world!"]);
        let lines = diff_lines(&old, &new);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].old.as_deref(), Some("hello world"));
        assert_eq!(lines[0].new.as_deref(), Some("hello world!"));
    }

    #[test]
    fn common_prefix_and_suffix_are_preserved_as_unchanged() {
        let old = strs(&["same", "middle-old", "tail"]);
        let new = strs(&["same", "middle-new", "tail"]);
        let lines = diff_lines(&old, &new);
        assert_eq!(lines.first().unwrap().old.as_deref(), Some("same"));
        assert_eq!(lines.last().unwrap().old.as_deref(), Some("tail"));
    }
}
