//! Dependency edges between `Ref`s (C6): an edge `(a, b)` means `a` requires
//! `b` to also be included.

use crate::{Change, Ref};

/// A dependency edge: the first `Ref` requires the second.
pub type Dep = (Ref, Ref);

pub fn get_change_refs(change_index: usize, change: &Change) -> Vec<Ref> {
    let mut refs = Vec::new();

    // A ModifyFile contributes nothing on its own; only its lines matter.
    if !matches!(change, Change::ModifyFile { .. }) {
        refs.push(Ref::Change(change_index));
    }

    if let Some(lines) = change.lines() {
        for line_index in 0..lines.len() {
            refs.push(Ref::Line(change_index, line_index));
        }
    }

    refs
}

pub fn get_all_refs(changes: &[Change]) -> Vec<Ref> {
    changes
        .iter()
        .enumerate()
        .flat_map(|(index, change)| get_change_refs(index, change))
        .collect()
}

pub fn get_dependencies(changes: &[Change]) -> Vec<Dep> {
    let mut deps = get_path_dependencies(changes);
    deps.extend(get_line_dependencies(changes));
    deps
}

/// An `Add*` depends on a prior `Delete*` of the same path, since both
/// cannot coexist on disk: the add needs the delete to have made room.
pub fn get_path_dependencies(changes: &[Change]) -> Vec<Dep> {
    use std::collections::HashMap;
    use std::path::Path;

    let mut deletes: HashMap<&Path, Ref> = HashMap::new();
    let mut deps = Vec::new();

    for (index, change) in changes.iter().enumerate() {
        let change_ref = Ref::Change(index);
        match change {
            Change::DeleteFile { path, .. } | Change::DeleteBinary { path, .. } | Change::DeleteSymlink { path, .. } => {
                deletes.insert(path.as_path(), change_ref);
            }
            Change::AddFile { path, .. } | Change::AddBinary { path, .. } | Change::AddSymlink { path, .. } => {
                if let Some(&dependency) = deletes.get(path.as_path()) {
                    deps.push((change_ref, dependency));
                }
            }
            _ => {}
        }
    }

    deps
}

/// Lines within an `AddFile` depend on the file itself; the file within a
/// `DeleteFile` depends on every one of its lines being deleted first.
pub fn get_line_dependencies(changes: &[Change]) -> Vec<Dep> {
    let mut deps = Vec::new();

    for (index, change) in changes.iter().enumerate() {
        let change_ref = Ref::Change(index);
        match change {
            Change::AddFile { lines, .. } => {
                for line_index in 0..lines.len() {
                    deps.push((Ref::Line(index, line_index), change_ref));
                }
            }
            Change::DeleteFile { lines, .. } => {
                for line_index in 0..lines.len() {
                    deps.push((change_ref, Ref::Line(index, line_index)));
                }
            }
            _ => {}
        }
    }

    deps
}
