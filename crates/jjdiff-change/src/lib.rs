//! The change-set data model: `Line`/`Change`/`Ref`, canonical ordering,
//! reversal, splitting by selection, dependency edges, and applying a
//! change set to a working tree.

mod apply;
mod deps;
mod split;

pub use apply::{apply_change, apply_changes, set_is_exec, write_lines, ApplyError};
pub use deps::{get_all_refs, get_change_refs, get_dependencies, get_line_dependencies, get_path_dependencies, Dep};
pub use split::split_changes;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use core_config::Deprioritize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Added,
    Deleted,
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub old: Option<String>,
    pub new: Option<String>,
}

impl Line {
    pub fn status(&self) -> LineStatus {
        match (&self.old, &self.new) {
            (None, _) => LineStatus::Added,
            (_, None) => LineStatus::Deleted,
            (Some(old), Some(new)) if old != new => LineStatus::Changed,
            _ => LineStatus::Unchanged,
        }
    }

    pub fn reverse(&self) -> Line {
        Line {
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }
}

pub fn reverse_lines(lines: &[Line]) -> Vec<Line> {
    lines.iter().map(Line::reverse).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Rename {
        old_path: PathBuf,
        new_path: PathBuf,
    },
    ChangeMode {
        path: PathBuf,
        old_is_exec: bool,
        new_is_exec: bool,
    },
    AddFile {
        path: PathBuf,
        lines: Vec<Line>,
        is_exec: bool,
    },
    ModifyFile {
        path: PathBuf,
        lines: Vec<Line>,
    },
    DeleteFile {
        path: PathBuf,
        lines: Vec<Line>,
        is_exec: bool,
    },
    AddBinary {
        path: PathBuf,
        content_path: PathBuf,
        is_exec: bool,
    },
    ModifyBinary {
        path: PathBuf,
        old_content_path: PathBuf,
        new_content_path: PathBuf,
    },
    DeleteBinary {
        path: PathBuf,
        content_path: PathBuf,
        is_exec: bool,
    },
    AddSymlink {
        path: PathBuf,
        to: PathBuf,
    },
    ModifySymlink {
        path: PathBuf,
        old_to: PathBuf,
        new_to: PathBuf,
    },
    DeleteSymlink {
        path: PathBuf,
        to: PathBuf,
    },
}

impl Change {
    /// The path a change is keyed and sorted by. For `Rename` this is the
    /// destination path, so that the rename sorts adjacent to a later
    /// change at that same destination path.
    pub fn path(&self) -> &Path {
        match self {
            Change::Rename { new_path, .. } => new_path,
            Change::ChangeMode { path, .. }
            | Change::AddFile { path, .. }
            | Change::ModifyFile { path, .. }
            | Change::DeleteFile { path, .. }
            | Change::AddBinary { path, .. }
            | Change::ModifyBinary { path, .. }
            | Change::DeleteBinary { path, .. }
            | Change::AddSymlink { path, .. }
            | Change::ModifySymlink { path, .. }
            | Change::DeleteSymlink { path, .. } => path,
        }
    }

    fn priority(&self) -> u8 {
        match self {
            Change::Rename { .. } => 0,
            Change::ChangeMode { .. } => 1,
            Change::DeleteFile { .. } | Change::DeleteBinary { .. } | Change::DeleteSymlink { .. } => 2,
            Change::ModifyFile { .. } | Change::ModifyBinary { .. } | Change::ModifySymlink { .. } => 3,
            Change::AddFile { .. } | Change::AddBinary { .. } | Change::AddSymlink { .. } => 4,
        }
    }

    pub fn is_file_change(&self) -> bool {
        matches!(
            self,
            Change::AddFile { .. } | Change::ModifyFile { .. } | Change::DeleteFile { .. }
        )
    }

    pub fn lines(&self) -> Option<&[Line]> {
        match self {
            Change::AddFile { lines, .. } | Change::ModifyFile { lines, .. } | Change::DeleteFile { lines, .. } => {
                Some(lines)
            }
            _ => None,
        }
    }

    fn is_deprioritized(&self, deprioritize: &Deprioritize) -> bool {
        deprioritize.is_deprioritized(self.path())
    }

    fn with_path(&self, path: PathBuf) -> Change {
        match self.clone() {
            Change::ChangeMode { old_is_exec, new_is_exec, .. } => Change::ChangeMode { path, old_is_exec, new_is_exec },
            Change::AddFile { lines, is_exec, .. } => Change::AddFile { path, lines, is_exec },
            Change::ModifyFile { lines, .. } => Change::ModifyFile { path, lines },
            Change::DeleteFile { lines, is_exec, .. } => Change::DeleteFile { path, lines, is_exec },
            Change::AddBinary { content_path, is_exec, .. } => Change::AddBinary { path, content_path, is_exec },
            Change::ModifyBinary { old_content_path, new_content_path, .. } => {
                Change::ModifyBinary { path, old_content_path, new_content_path }
            }
            Change::DeleteBinary { content_path, is_exec, .. } => Change::DeleteBinary { path, content_path, is_exec },
            Change::AddSymlink { to, .. } => Change::AddSymlink { path, to },
            Change::ModifySymlink { old_to, new_to, .. } => Change::ModifySymlink { path, old_to, new_to },
            Change::DeleteSymlink { to, .. } => Change::DeleteSymlink { path, to },
            rename @ Change::Rename { .. } => rename,
        }
    }

    fn with_old_path(&self, old_path: PathBuf) -> Change {
        match self.clone() {
            Change::Rename { new_path, .. } => Change::Rename { old_path, new_path },
            other => other,
        }
    }
}

/// `(deprioritized, path, priority)` — the canonical change-set ordering.
pub type ChangeKey = (bool, PathBuf, u8);

pub fn change_key(change: &Change, deprioritize: &Deprioritize) -> ChangeKey {
    (change.is_deprioritized(deprioritize), change.path().to_path_buf(), change.priority())
}

pub fn sort_changes(changes: &mut [Change], deprioritize: &Deprioritize) {
    changes.sort_by(|a, b| change_key(a, deprioritize).cmp(&change_key(b, deprioritize)));
}

pub fn reverse_changes(changes: &[Change], deprioritize: &Deprioritize) -> Vec<Change> {
    let mut reversed = Vec::with_capacity(changes.len());
    let mut renames: HashMap<PathBuf, PathBuf> = HashMap::new();

    for change in changes {
        match change {
            Change::Rename { old_path, new_path } => {
                reversed.push(Change::Rename {
                    old_path: new_path.clone(),
                    new_path: old_path.clone(),
                });
                renames.insert(old_path.clone(), new_path.clone());
            }
            Change::ChangeMode { path, old_is_exec, new_is_exec } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::ChangeMode { path, old_is_exec: *new_is_exec, new_is_exec: *old_is_exec });
            }
            Change::AddFile { path, lines, is_exec } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::DeleteFile { path, lines: reverse_lines(lines), is_exec: *is_exec });
            }
            Change::ModifyFile { path, lines } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::ModifyFile { path, lines: reverse_lines(lines) });
            }
            Change::DeleteFile { path, lines, is_exec } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::AddFile { path, lines: reverse_lines(lines), is_exec: *is_exec });
            }
            Change::AddBinary { path, content_path, is_exec } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::DeleteBinary { path, content_path: content_path.clone(), is_exec: *is_exec });
            }
            Change::ModifyBinary { path, old_content_path, new_content_path } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::ModifyBinary {
                    path,
                    old_content_path: new_content_path.clone(),
                    new_content_path: old_content_path.clone(),
                });
            }
            Change::DeleteBinary { path, content_path, is_exec } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::AddBinary { path, content_path: content_path.clone(), is_exec: *is_exec });
            }
            Change::AddSymlink { path, to } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::DeleteSymlink { path, to: to.clone() });
            }
            Change::ModifySymlink { path, old_to, new_to } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::ModifySymlink { path, old_to: new_to.clone(), new_to: old_to.clone() });
            }
            Change::DeleteSymlink { path, to } => {
                let path = renames.get(path).cloned().unwrap_or_else(|| path.clone());
                reversed.push(Change::AddSymlink { path, to: to.clone() });
            }
        }
    }

    sort_changes(&mut reversed, deprioritize);
    reversed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ref {
    Change(usize),
    Line(usize, usize),
}

impl Ref {
    pub fn change_index(&self) -> usize {
        match self {
            Ref::Change(index) => *index,
            Ref::Line(index, _) => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Deprioritize;

    fn no_deprioritize() -> Deprioritize {
        Deprioritize::new(&[])
    }

    #[test]
    fn line_status_classification() {
        assert_eq!(Line { old: None, new: Some("a".into()) }.status(), LineStatus::Added);
        assert_eq!(Line { old: Some("a".into()), new: None }.status(), LineStatus::Deleted);
        assert_eq!(Line { old: Some("a".into()), new: Some("b".into()) }.status(), LineStatus::Changed);
        assert_eq!(Line { old: Some("a".into()), new: Some("a".into()) }.status(), LineStatus::Unchanged);
    }

    #[test]
    fn reverse_of_add_file_is_delete_file_with_reversed_lines() {
        let deprioritize = no_deprioritize();
        let changes = vec![Change::AddFile {
            path: PathBuf::from("foo.txt"),
            lines: vec![Line { old: None, new: Some("foo".into()) }],
            is_exec: false,
        }];
        let reversed = reverse_changes(&changes, &deprioritize);
        assert_eq!(
            reversed,
            vec![Change::DeleteFile {
                path: PathBuf::from("foo.txt"),
                lines: vec![Line { old: Some("foo".into()), new: None }],
                is_exec: false,
            }]
        );
    }

    #[test]
    fn reverse_is_involutive_up_to_ordering() {
        let deprioritize = no_deprioritize();
        let changes = vec![
            Change::AddFile {
                path: PathBuf::from("a.txt"),
                lines: vec![Line { old: None, new: Some("x".into()) }],
                is_exec: false,
            },
            Change::ModifyFile {
                path: PathBuf::from("b.txt"),
                lines: vec![Line { old: Some("y".into()), new: Some("z".into()) }],
            },
        ];
        let mut expected = changes.clone();
        sort_changes(&mut expected, &deprioritize);

        let round_tripped = reverse_changes(&reverse_changes(&changes, &deprioritize), &deprioritize);
        assert_eq!(round_tripped, expected);
    }

    #[test]
    fn rename_rewrites_subsequent_path_on_reverse() {
        let deprioritize = no_deprioritize();
        let changes = vec![
            Change::Rename { old_path: PathBuf::from("old.txt"), new_path: PathBuf::from("new.txt") },
            Change::ChangeMode { path: PathBuf::from("new.txt"), old_is_exec: false, new_is_exec: true },
        ];
        let reversed = reverse_changes(&changes, &deprioritize);
        assert!(reversed.contains(&Change::ChangeMode {
            path: PathBuf::from("old.txt"),
            old_is_exec: true,
            new_is_exec: false,
        }));
    }

    #[test]
    fn sort_puts_deprioritized_entries_last() {
        let deprioritize = Deprioritize::new(&["*.lock".to_string()]);
        let mut changes = vec![
            Change::AddFile { path: PathBuf::from("Cargo.lock"), lines: vec![], is_exec: false },
            Change::AddFile { path: PathBuf::from("src/main.rs"), lines: vec![], is_exec: false },
        ];
        sort_changes(&mut changes, &deprioritize);
        assert_eq!(changes[0].path(), Path::new("src/main.rs"));
        assert_eq!(changes[1].path(), Path::new("Cargo.lock"));
    }
}
