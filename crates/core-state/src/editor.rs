//! The editor: owns the change set, the include/open state, the cursor,
//! and the undo/redo history. This is the model half of the interactive
//! selector; rendering and key dispatch live in other crates.

use std::collections::{HashMap, HashSet};

use jjdiff_change::{get_all_refs, get_dependencies, Change, Ref};

use crate::cursor::Cursor;

/// A single reversible mutation of `included`, as decided by a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddIncludes(HashSet<Ref>),
    RemoveIncludes(HashSet<Ref>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorResult {
    Confirmed(HashSet<Ref>),
    Cancelled,
}

type UndoEntry = (Action, HashSet<usize>, Cursor);

pub struct Editor {
    changes: Vec<Change>,
    included: HashSet<Ref>,
    opened: HashSet<usize>,
    cursor: Cursor,
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    result: Option<EditorResult>,
    deps: HashMap<Ref, Vec<Ref>>,
    dependants: HashMap<Ref, Vec<Ref>>,
}

impl Editor {
    pub fn new(changes: Vec<Change>) -> Editor {
        let mut deps: HashMap<Ref, Vec<Ref>> = HashMap::new();
        let mut dependants: HashMap<Ref, Vec<Ref>> = HashMap::new();
        for (dependent, dependency) in get_dependencies(&changes) {
            deps.entry(dependent).or_default().push(dependency);
            dependants.entry(dependency).or_default().push(dependent);
        }

        Editor {
            changes,
            included: HashSet::new(),
            opened: HashSet::new(),
            cursor: Cursor::Change(0),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            result: None,
            deps,
            dependants,
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn included(&self) -> &HashSet<Ref> {
        &self.included
    }

    pub fn opened(&self) -> &HashSet<usize> {
        &self.opened
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn result(&self) -> Option<&EditorResult> {
        self.result.as_ref()
    }

    pub fn next_cursor(&mut self) {
        self.cursor = self.cursor.next(&self.changes, &self.opened);
    }

    pub fn prev_cursor(&mut self) {
        self.cursor = self.cursor.prev(&self.changes, &self.opened);
    }

    pub fn first_cursor(&mut self) {
        self.cursor = self.cursor.first(&self.changes, &self.opened);
    }

    pub fn last_cursor(&mut self) {
        self.cursor = self.cursor.last(&self.changes, &self.opened);
    }

    pub fn grow_cursor(&mut self) {
        self.cursor = self.cursor.grow(&self.changes, &mut self.opened);
    }

    pub fn shrink_cursor(&mut self) {
        self.cursor = self.cursor.shrink(&self.changes, &mut self.opened);
    }

    /// The refs a toggle at the current cursor would act on: a whole
    /// `ChangeRef` unless the change is a `ModifyFile`, whose selection is
    /// always per-line.
    fn refs_at_cursor(&self) -> Vec<Ref> {
        match self.cursor {
            Cursor::Change(index) => match &self.changes[index] {
                Change::ModifyFile { lines, .. } => (0..lines.len()).map(|line| Ref::Line(index, line)).collect(),
                _ => vec![Ref::Change(index)],
            },
            Cursor::Hunk { change, start, end } => (start..end).map(|line| Ref::Line(change, line)).collect(),
            Cursor::Line { change, line } => vec![Ref::Line(change, line)],
        }
    }

    fn expand_closure(&self, seeds: &[Ref], adjacency: &HashMap<Ref, Vec<Ref>>) -> HashSet<Ref> {
        let mut closure: HashSet<Ref> = seeds.iter().copied().collect();
        let mut frontier: Vec<Ref> = seeds.to_vec();
        while let Some(r) = frontier.pop() {
            if let Some(neighbors) = adjacency.get(&r) {
                for &neighbor in neighbors {
                    if closure.insert(neighbor) {
                        frontier.push(neighbor);
                    }
                }
            }
        }
        closure
    }

    /// Toggles a set of refs: if any aren't fully included, add the
    /// transitive dependency closure; otherwise remove the transitive
    /// dependant closure (intersected with what's actually included).
    fn select_refs(&mut self, refs: &[Ref]) {
        if refs.is_empty() {
            return;
        }

        let action = if !refs.iter().all(|r| self.included.contains(r)) {
            Action::AddIncludes(self.expand_closure(refs, &self.deps))
        } else {
            let closure = self.expand_closure(refs, &self.dependants);
            let to_remove = closure.into_iter().filter(|r| self.included.contains(r)).collect();
            Action::RemoveIncludes(to_remove)
        };

        self.push_action(action);
    }

    pub fn select_cursor(&mut self) {
        let refs = self.refs_at_cursor();
        self.select_refs(&refs);
    }

    pub fn select_all(&mut self) {
        let refs = get_all_refs(&self.changes);
        self.select_refs(&refs);
    }

    fn apply_forward(&mut self, action: &Action) {
        match action {
            Action::AddIncludes(set) => self.included.extend(set.iter().copied()),
            Action::RemoveIncludes(set) => self.included.retain(|r| !set.contains(r)),
        }
    }

    fn apply_inverse(&mut self, action: &Action) {
        match action {
            Action::AddIncludes(set) => self.included.retain(|r| !set.contains(r)),
            Action::RemoveIncludes(set) => self.included.extend(set.iter().copied()),
        }
    }

    fn push_action(&mut self, action: Action) {
        let pre_opened = self.opened.clone();
        let pre_cursor = self.cursor;

        self.apply_forward(&action);
        tracing::trace!(target: "state.undo", ?action, "select");
        self.undo_stack.push((action, pre_opened, pre_cursor));
        self.redo_stack.clear();

        self.cursor = self.cursor.next(&self.changes, &self.opened);
    }

    /// Undoes the most recent selection, restoring `opened`/`cursor` to
    /// what they were immediately before it and pushing the state the
    /// selection left behind onto the redo stack.
    pub fn undo(&mut self) {
        let Some((action, opened_before, cursor_before)) = self.undo_stack.pop() else {
            return;
        };

        self.apply_inverse(&action);
        let opened_after = std::mem::replace(&mut self.opened, opened_before);
        let cursor_after = std::mem::replace(&mut self.cursor, cursor_before);
        tracing::trace!(target: "state.undo", ?action, "undo");
        self.redo_stack.push((action, opened_after, cursor_after));
    }

    /// Replays a previously-undone selection, restoring `opened`/`cursor`
    /// to what they were right after it was first applied.
    pub fn redo(&mut self) {
        let Some((action, opened_after, cursor_after)) = self.redo_stack.pop() else {
            return;
        };

        self.apply_forward(&action);
        let opened_before = std::mem::replace(&mut self.opened, opened_after);
        let cursor_before = std::mem::replace(&mut self.cursor, cursor_after);
        tracing::trace!(target: "state.undo", ?action, "redo");
        self.undo_stack.push((action, opened_before, cursor_before));
    }

    pub fn confirm(&mut self) {
        self.result = Some(EditorResult::Confirmed(self.included.clone()));
    }

    pub fn cancel(&mut self) {
        self.result = Some(EditorResult::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jjdiff_change::Line;
    use std::path::PathBuf;

    fn sample_changes() -> Vec<Change> {
        vec![
            Change::DeleteFile {
                path: PathBuf::from("old.txt"),
                lines: vec![Line { old: Some("x".into()), new: None }],
                is_exec: false,
            },
            Change::AddFile {
                path: PathBuf::from("old.txt"),
                lines: vec![Line { old: None, new: Some("y".into()) }],
                is_exec: false,
            },
        ]
    }

    #[test]
    fn select_cursor_on_add_after_delete_pulls_in_the_dependency() {
        let mut editor = Editor::new(sample_changes());
        editor.cursor = Cursor::Change(1);
        editor.select_cursor();

        assert!(editor.included().contains(&Ref::Change(1)));
        assert!(editor.included().contains(&Ref::Change(0)));
    }

    #[test]
    fn undo_then_redo_restores_exact_included_set() {
        let mut editor = Editor::new(sample_changes());
        editor.cursor = Cursor::Change(1);
        editor.select_cursor();
        let after_select = editor.included().clone();

        editor.undo();
        assert!(editor.included().is_empty());

        editor.redo();
        assert_eq!(editor.included().clone(), after_select);
    }

    #[test]
    fn selecting_twice_toggles_back_off() {
        let mut editor = Editor::new(sample_changes());
        editor.cursor = Cursor::Change(0);
        editor.select_cursor();
        assert!(editor.included().contains(&Ref::Change(0)));

        editor.cursor = Cursor::Change(0);
        editor.select_cursor();
        assert!(editor.included().is_empty());
    }

    #[test]
    fn select_cursor_on_modify_file_only_acts_on_its_lines() {
        let changes = vec![Change::ModifyFile {
            path: PathBuf::from("a.txt"),
            lines: vec![
                Line { old: Some("a".into()), new: Some("b".into()) },
                Line { old: Some("c".into()), new: Some("d".into()) },
            ],
        }];
        let mut editor = Editor::new(changes);
        editor.cursor = Cursor::Change(0);
        editor.select_cursor();

        assert_eq!(editor.included().len(), 2);
        assert!(editor.included().contains(&Ref::Line(0, 0)));
        assert!(editor.included().contains(&Ref::Line(0, 1)));
        assert!(!editor.included().contains(&Ref::Change(0)));
    }

    #[test]
    fn confirm_reports_the_included_set_cancel_reports_none() {
        let mut editor = Editor::new(sample_changes());
        editor.confirm();
        assert!(matches!(editor.result(), Some(EditorResult::Confirmed(_))));

        let mut editor = Editor::new(sample_changes());
        editor.cancel();
        assert_eq!(editor.result(), Some(&EditorResult::Cancelled));
    }
}
