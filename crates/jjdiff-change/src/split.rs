//! Splitting a change set by a selection of `Ref`s into an OLD→SEL half
//! (what gets applied to produce the intermediate tree) and a SEL→NEW half
//! (what remains to be applied afterwards).

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::{Change, Line, LineStatus, Ref};

/// Splits `changes` by `refs`. Renames are resolved in a single left-to-right
/// pass: by the time a later change's path is rewritten, every `Rename` that
/// precedes it in canonical order has already been recorded, since renames
/// sort first within their path group.
pub fn split_changes(changes: &[Change], refs: &HashSet<Ref>) -> (Vec<Change>, Vec<Change>) {
    let mut old_to_sel = Vec::new();
    let mut sel_to_new = Vec::new();
    let mut renames: HashMap<PathBuf, PathBuf> = HashMap::new();

    for (change_index, change) in changes.iter().enumerate() {
        let change_ref = Ref::Change(change_index);

        if !change.is_file_change() {
            if refs.contains(&change_ref) {
                if let Change::Rename { old_path, new_path } = change {
                    renames.insert(old_path.clone(), new_path.clone());
                }
                old_to_sel.push(change.clone());
            } else {
                let rewritten = match change {
                    Change::Rename { old_path, .. } => {
                        let old_path = renames.get(old_path).cloned().unwrap_or_else(|| old_path.clone());
                        change.with_old_path(old_path)
                    }
                    _ => {
                        let path = renames.get(change.path()).cloned().unwrap_or_else(|| change.path().to_path_buf());
                        change.with_path(path)
                    }
                };
                sel_to_new.push(rewritten);
            }
            continue;
        }

        let lines = change.lines().unwrap_or(&[]);
        let mut old_to_sel_lines = Vec::new();
        let mut old_to_sel_lines_changed = false;
        let mut sel_to_new_lines = Vec::new();
        let mut sel_to_new_lines_changed = false;

        for (line_index, line) in lines.iter().enumerate() {
            if line.status() == LineStatus::Unchanged {
                old_to_sel_lines.push(line.clone());
                sel_to_new_lines.push(line.clone());
            } else if refs.contains(&Ref::Line(change_index, line_index)) {
                old_to_sel_lines.push(line.clone());
                if let Some(new) = &line.new {
                    sel_to_new_lines.push(Line { old: Some(new.clone()), new: Some(new.clone()) });
                }
                old_to_sel_lines_changed = true;
            } else {
                if let Some(old) = &line.old {
                    old_to_sel_lines.push(Line { old: Some(old.clone()), new: Some(old.clone()) });
                }
                sel_to_new_lines.push(line.clone());
                sel_to_new_lines_changed = true;
            }
        }

        match change {
            Change::AddFile { path, is_exec, .. } => {
                if refs.contains(&change_ref) {
                    old_to_sel.push(Change::AddFile { path: path.clone(), lines: old_to_sel_lines, is_exec: *is_exec });
                    if sel_to_new_lines_changed {
                        let sel_path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                        sel_to_new.push(Change::ModifyFile { path: sel_path, lines: sel_to_new_lines });
                    }
                } else {
                    debug_assert!(old_to_sel_lines.is_empty());
                    let sel_path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                    sel_to_new.push(Change::AddFile { path: sel_path, lines: sel_to_new_lines, is_exec: *is_exec });
                }
            }
            Change::ModifyFile { path, .. } => {
                if old_to_sel_lines_changed {
                    old_to_sel.push(Change::ModifyFile { path: path.clone(), lines: old_to_sel_lines });
                }
                if sel_to_new_lines_changed {
                    let sel_path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                    sel_to_new.push(Change::ModifyFile { path: sel_path, lines: sel_to_new_lines });
                }
            }
            Change::DeleteFile { path, is_exec, .. } => {
                if refs.contains(&change_ref) {
                    old_to_sel.push(Change::DeleteFile { path: path.clone(), lines: old_to_sel_lines, is_exec: *is_exec });
                    debug_assert!(sel_to_new_lines.is_empty());
                } else {
                    if old_to_sel_lines_changed {
                        old_to_sel.push(Change::ModifyFile { path: path.clone(), lines: old_to_sel_lines });
                    }
                    let sel_path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                    sel_to_new.push(Change::DeleteFile { path: sel_path, lines: sel_to_new_lines, is_exec: *is_exec });
                }
            }
            _ => unreachable!("is_file_change guarantees one of the three file variants"),
        }
    }

    (old_to_sel, sel_to_new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_all_refs, Line};

    #[test]
    fn splitting_with_all_refs_keeps_everything_in_old_to_sel() {
        let changes = vec![Change::AddFile {
            path: PathBuf::from("foo.txt"),
            lines: vec![Line { old: None, new: Some("foo".into()) }],
            is_exec: false,
        }];
        let all_refs: HashSet<Ref> = get_all_refs(&changes).into_iter().collect();
        let (old_to_sel, sel_to_new) = split_changes(&changes, &all_refs);
        assert_eq!(old_to_sel, changes);
        assert!(sel_to_new.is_empty());
    }

    #[test]
    fn splitting_with_no_refs_keeps_everything_in_sel_to_new() {
        let changes = vec![Change::AddFile {
            path: PathBuf::from("foo.txt"),
            lines: vec![Line { old: None, new: Some("foo".into()) }],
            is_exec: false,
        }];
        let (old_to_sel, sel_to_new) = split_changes(&changes, &HashSet::new());
        assert!(old_to_sel.is_empty());
        assert_eq!(sel_to_new, changes);
    }

    #[test]
    fn partial_line_selection_splits_modify_file() {
        // foo.txt: "foo\nbar" -> "fooo\nbaz", selecting only the first line.
        let changes = vec![Change::ModifyFile {
            path: PathBuf::from("foo.txt"),
            lines: vec![
                Line { old: Some("foo".into()), new: Some("fooo".into()) },
                Line { old: Some("bar".into()), new: Some("baz".into()) },
            ],
        }];
        let refs: HashSet<Ref> = [Ref::Line(0, 0)].into_iter().collect();
        let (old_to_sel, sel_to_new) = split_changes(&changes, &refs);

        assert_eq!(
            old_to_sel,
            vec![Change::ModifyFile {
                path: PathBuf::from("foo.txt"),
                lines: vec![
                    Line { old: Some("foo".into()), new: Some("fooo".into()) },
                    Line { old: Some("bar".into()), new: Some("bar".into()) },
                ],
            }]
        );
        assert_eq!(
            sel_to_new,
            vec![Change::ModifyFile {
                path: PathBuf::from("foo.txt"),
                lines: vec![
                    Line { old: Some("fooo".into()), new: Some("fooo".into()) },
                    Line { old: Some("bar".into()), new: Some("baz".into()) },
                ],
            }]
        );
    }

    #[test]
    fn rename_before_later_change_rewrites_its_sel_to_new_path() {
        let changes = vec![
            Change::Rename { old_path: PathBuf::from("old.txt"), new_path: PathBuf::from("new.txt") },
            Change::ChangeMode { path: PathBuf::from("old.txt"), old_is_exec: false, new_is_exec: true },
        ];
        // Select only the rename; the mode change must follow it to `new.txt`.
        let refs: HashSet<Ref> = [Ref::Change(0)].into_iter().collect();
        let (_, sel_to_new) = split_changes(&changes, &refs);
        assert_eq!(
            sel_to_new,
            vec![Change::ChangeMode { path: PathBuf::from("new.txt"), old_is_exec: false, new_is_exec: true }]
        );
    }
}
