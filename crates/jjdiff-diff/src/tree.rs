//! Tree diff (C4): pairing old/new content maps into a change list, with
//! greedy rename detection between deleted and added paths.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jjdiff_change::{sort_changes, Change, Line};
use core_config::Deprioritize;

use crate::contents::{Content, Contents};
use crate::similarity::{content_is_equal, get_content_similarity, split_lines, SIMILARITY_THRESHOLD};

pub fn diff(old_root: &Path, new_root: &Path, deprioritize: &Deprioritize) -> std::io::Result<Vec<Change>> {
    let old = Contents::scan(old_root)?;
    let new = Contents::scan(new_root)?;
    Ok(diff_contents(&old, &new, deprioritize))
}

struct RenameCandidate {
    similarity: f64,
    old_path: PathBuf,
    new_path: PathBuf,
}

impl PartialEq for RenameCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.similarity == other.similarity
    }
}
impl Eq for RenameCandidate {}
impl Ord for RenameCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.similarity.partial_cmp(&other.similarity).unwrap_or(Ordering::Equal)
    }
}
impl PartialOrd for RenameCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn diff_contents(old: &Contents, new: &Contents, deprioritize: &Deprioritize) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut added: HashMap<PathBuf, Content> = HashMap::new();

    for (path, new_content) in new.iter() {
        match old.get(path) {
            Some(old_content) => changes.extend(diff_content(path, old_content, new_content)),
            None => {
                added.insert(path.to_path_buf(), new_content.clone());
            }
        }
    }

    let mut deleted: HashMap<PathBuf, Content> = HashMap::new();
    for (path, old_content) in old.iter() {
        if !new.contains(path) {
            deleted.insert(path.to_path_buf(), old_content.clone());
        }
    }

    let mut candidates = BinaryHeap::new();
    for (old_path, old_content) in &deleted {
        for (new_path, new_content) in &added {
            let similarity = get_content_similarity(old_content, new_content);
            if similarity >= SIMILARITY_THRESHOLD {
                candidates.push(RenameCandidate {
                    similarity,
                    old_path: old_path.clone(),
                    new_path: new_path.clone(),
                });
            }
        }
    }

    while let Some(candidate) = candidates.pop() {
        if !deleted.contains_key(&candidate.old_path) || !added.contains_key(&candidate.new_path) {
            continue;
        }
        let old_content = deleted.remove(&candidate.old_path).unwrap();
        let new_content = added.remove(&candidate.new_path).unwrap();

        changes.push(Change::Rename { old_path: candidate.old_path.clone(), new_path: candidate.new_path.clone() });
        changes.extend(diff_content(&candidate.old_path, &old_content, &new_content));
    }

    for (path, content) in deleted {
        changes.push(delete_content(&path, &content));
    }
    for (path, content) in added {
        changes.push(add_content(&path, &content));
    }

    sort_changes(&mut changes, deprioritize);
    changes
}

fn diff_content(path: &Path, old: &Content, new: &Content) -> Vec<Change> {
    match (old, new) {
        (Content::File { content_path: old_path, is_exec: old_is_exec }, Content::File { content_path: new_path, is_exec: new_is_exec }) => {
            if content_is_equal(old_path, new_path).unwrap_or(false) {
                if old_is_exec != new_is_exec {
                    return vec![Change::ChangeMode { path: path.to_path_buf(), old_is_exec: *old_is_exec, new_is_exec: *new_is_exec }];
                }
                return Vec::new();
            }

            let mut changes = Vec::new();
            match (split_lines(old_path), split_lines(new_path)) {
                (Some(old_lines), Some(new_lines)) => {
                    if old_is_exec != new_is_exec {
                        changes.push(Change::ChangeMode { path: path.to_path_buf(), old_is_exec: *old_is_exec, new_is_exec: *new_is_exec });
                    }
                    let lines = crate::lines::diff_lines(&old_lines, &new_lines);
                    if lines.iter().any(|l| l.status() != jjdiff_change::LineStatus::Unchanged) {
                        changes.push(Change::ModifyFile { path: path.to_path_buf(), lines });
                    }
                }
                (None, None) => {
                    if old_is_exec != new_is_exec {
                        changes.push(Change::ChangeMode { path: path.to_path_buf(), old_is_exec: *old_is_exec, new_is_exec: *new_is_exec });
                    }
                    changes.push(Change::ModifyBinary {
                        path: path.to_path_buf(),
                        old_content_path: old_path.clone(),
                        new_content_path: new_path.clone(),
                    });
                }
                (Some(old_lines), None) => {
                    let lines = old_lines.into_iter().map(|line| Line { old: Some(line), new: None }).collect();
                    changes.push(Change::DeleteFile { path: path.to_path_buf(), lines, is_exec: *old_is_exec });
                    changes.push(Change::AddBinary { path: path.to_path_buf(), content_path: new_path.clone(), is_exec: *new_is_exec });
                }
                (None, Some(new_lines)) => {
                    changes.push(Change::DeleteBinary { path: path.to_path_buf(), content_path: old_path.clone(), is_exec: *old_is_exec });
                    let lines = new_lines.into_iter().map(|line| Line { old: None, new: Some(line) }).collect();
                    changes.push(Change::AddFile { path: path.to_path_buf(), lines, is_exec: *new_is_exec });
                }
            }
            changes
        }
        (Content::Symlink { to: old_to }, Content::Symlink { to: new_to }) => {
            if old_to != new_to {
                vec![Change::ModifySymlink { path: path.to_path_buf(), old_to: old_to.clone(), new_to: new_to.clone() }]
            } else {
                Vec::new()
            }
        }
        _ => vec![delete_content(path, old), add_content(path, new)],
    }
}

fn delete_content(path: &Path, content: &Content) -> Change {
    match content {
        // `split_lines` always returns at least one element (`[""]` for an
        // empty file), so a `None` here means genuinely non-UTF-8 content.
        Content::File { content_path, is_exec } => match split_lines(content_path) {
            Some(old_lines) => {
                let lines = old_lines.into_iter().map(|line| Line { old: Some(line), new: None }).collect();
                Change::DeleteFile { path: path.to_path_buf(), lines, is_exec: *is_exec }
            }
            None => Change::DeleteBinary { path: path.to_path_buf(), content_path: content_path.clone(), is_exec: *is_exec },
        },
        Content::Symlink { to } => Change::DeleteSymlink { path: path.to_path_buf(), to: to.clone() },
    }
}

fn add_content(path: &Path, content: &Content) -> Change {
    match content {
        Content::File { content_path, is_exec } => match split_lines(content_path) {
            Some(new_lines) => {
                let lines = new_lines.into_iter().map(|line| Line { old: None, new: Some(line) }).collect();
                Change::AddFile { path: path.to_path_buf(), lines, is_exec: *is_exec }
            }
            None => Change::AddBinary { path: path.to_path_buf(), content_path: content_path.clone(), is_exec: *is_exec },
        },
        Content::Symlink { to } => Change::AddSymlink { path: path.to_path_buf(), to: to.clone() },
    }
}
