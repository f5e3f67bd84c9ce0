//! Applying a change set to a working tree (C5, apply half).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Change, Line};

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("io error applying change to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("symlinks are not supported on this platform: {path}")]
    UnsupportedSymlink { path: PathBuf },
}

fn io_err(path: &Path, source: io::Error) -> ApplyError {
    ApplyError::Io { path: path.to_path_buf(), source }
}

/// Applies `changes` to `root` in order, resolving each change's path
/// through every `Rename` seen so far. This is a walk-level concern, not a
/// per-change one: a `Rename(a,b)` followed later by an accompanying change
/// addressed at the pre-rename path `a` must land on `b`, since the rename
/// already moved the file on disk by the time that later change runs.
/// Mirrors the single left-to-right rename pass in `split_changes` and
/// `reverse_changes`.
pub fn apply_changes(root: &Path, changes: &[Change]) -> Result<(), ApplyError> {
    let mut renames: HashMap<PathBuf, PathBuf> = HashMap::new();
    for change in changes {
        apply_change_with_renames(root, change, &mut renames)?;
    }
    Ok(())
}

/// Applies a single change with no rename history. Suitable for a change
/// set known to contain no `Rename` entries ahead of it; `apply_changes`
/// is the correct entry point for a full change set.
pub fn apply_change(root: &Path, change: &Change) -> Result<(), ApplyError> {
    apply_change_with_renames(root, change, &mut HashMap::new())
}

fn apply_change_with_renames(
    root: &Path,
    change: &Change,
    renames: &mut HashMap<PathBuf, PathBuf>,
) -> Result<(), ApplyError> {
    let resolve = |path: &Path| renames.get(path).cloned().unwrap_or_else(|| path.to_path_buf());

    match change {
        Change::Rename { old_path, new_path } => {
            let old_path = resolve(old_path);
            let full_old = root.join(&old_path);
            let full_new = root.join(new_path);
            if let Some(parent) = full_new.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            fs::rename(&full_old, &full_new).map_err(|e| io_err(&full_old, e))?;
            renames.insert(old_path, new_path.clone());
        }

        Change::ChangeMode { path, new_is_exec, .. } => {
            let full_path = root.join(resolve(path));
            set_is_exec(&full_path, *new_is_exec).map_err(|e| io_err(&full_path, e))?;
        }

        Change::AddFile { path, lines, is_exec } => {
            let full_path = root.join(resolve(path));
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            write_lines(&full_path, lines).map_err(|e| io_err(&full_path, e))?;
            if *is_exec {
                set_is_exec(&full_path, true).map_err(|e| io_err(&full_path, e))?;
            }
        }

        Change::ModifyFile { path, lines } => {
            let full_path = root.join(resolve(path));
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            write_lines(&full_path, lines).map_err(|e| io_err(&full_path, e))?;
        }

        Change::AddBinary { path, content_path, is_exec } => {
            let full_path = root.join(resolve(path));
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            fs::copy(content_path, &full_path).map_err(|e| io_err(&full_path, e))?;
            if *is_exec {
                set_is_exec(&full_path, true).map_err(|e| io_err(&full_path, e))?;
            }
        }

        Change::ModifyBinary { path, new_content_path, .. } => {
            let full_path = root.join(resolve(path));
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            fs::copy(new_content_path, &full_path).map_err(|e| io_err(&full_path, e))?;
        }

        Change::AddSymlink { path, to } | Change::ModifySymlink { path, new_to: to, .. } => {
            let full_path = root.join(resolve(path));
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            create_symlink(to, &full_path)?;
        }

        Change::DeleteFile { path, .. } | Change::DeleteBinary { path, .. } | Change::DeleteSymlink { path, .. } => {
            let full_path = root.join(resolve(path));
            fs::remove_file(&full_path).map_err(|e| io_err(&full_path, e))?;
            remove_empty_ancestors(root, &full_path);
        }
    }

    Ok(())
}

fn remove_empty_ancestors(root: &Path, deleted: &Path) {
    let mut dir = match deleted.parent() {
        Some(parent) => parent,
        None => return,
    };
    while dir != root && dir.starts_with(root) {
        match fs::read_dir(dir) {
            Ok(mut entries) if entries.next().is_none() => {
                if fs::remove_dir(dir).is_err() {
                    break;
                }
            }
            _ => break,
        }
        dir = match dir.parent() {
            Some(parent) => parent,
            None => break,
        };
    }
}

pub fn write_lines(path: &Path, lines: &[Line]) -> io::Result<()> {
    let mut new_lines = lines.iter().filter_map(|line| line.new.as_deref());
    let Some(mut prev) = new_lines.next() else {
        fs::write(path, "")?;
        return Ok(());
    };

    let mut content = String::new();
    for line in new_lines {
        content.push_str(prev);
        content.push('\n');
        prev = line;
    }
    content.push_str(prev);

    fs::write(path, content)
}

#[cfg(unix)]
pub fn set_is_exec(path: &Path, is_exec: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)?;
    let mut mode = metadata.permissions().mode();
    if is_exec {
        mode |= 0o100;
    } else {
        mode &= !0o100;
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_is_exec(_path: &Path, _is_exec: bool) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(to: &Path, at: &Path) -> Result<(), ApplyError> {
    std::os::unix::fs::symlink(to, at).map_err(|e| io_err(at, e))
}

#[cfg(not(unix))]
fn create_symlink(_to: &Path, at: &Path) -> Result<(), ApplyError> {
    Err(ApplyError::UnsupportedSymlink { path: at.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_lines_joins_with_newlines_and_no_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let lines = vec![
            Line { old: None, new: Some("a".into()) },
            Line { old: None, new: Some("b".into()) },
        ];
        write_lines(&path, &lines).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb");
    }

    #[test]
    fn write_lines_skips_deleted_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let lines = vec![
            Line { old: Some("a".into()), new: Some("a".into()) },
            Line { old: Some("gone".into()), new: None },
            Line { old: Some("b".into()), new: Some("b".into()) },
        ];
        write_lines(&path, &lines).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb");
    }

    #[test]
    fn apply_add_file_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let change = Change::AddFile {
            path: PathBuf::from("nested/dir/foo.txt"),
            lines: vec![Line { old: None, new: Some("hi".into()) }],
            is_exec: false,
        };
        apply_change(dir.path(), &change).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("nested/dir/foo.txt")).unwrap(), "hi");
    }

    #[test]
    fn apply_delete_file_removes_empty_ancestors() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/file.txt"), "x").unwrap();
        let change = Change::DeleteFile {
            path: PathBuf::from("a/b/file.txt"),
            lines: vec![Line { old: Some("x".into()), new: None }],
            is_exec: false,
        };
        apply_change(dir.path(), &change).unwrap();
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn apply_rename_moves_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.txt"), "x").unwrap();
        let change = Change::Rename { old_path: PathBuf::from("old.txt"), new_path: PathBuf::from("new.txt") };
        apply_change(dir.path(), &change).unwrap();
        assert!(!dir.path().join("old.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("new.txt")).unwrap(), "x");
    }

    #[test]
    fn apply_changes_resolves_accompanying_change_through_a_preceding_rename() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.txt"), "foo").unwrap();
        let changes = vec![
            Change::Rename { old_path: PathBuf::from("old.txt"), new_path: PathBuf::from("new.txt") },
            Change::ModifyFile {
                path: PathBuf::from("old.txt"),
                lines: vec![Line { old: Some("foo".into()), new: Some("bar".into()) }],
            },
        ];
        apply_changes(dir.path(), &changes).unwrap();
        assert!(!dir.path().join("old.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("new.txt")).unwrap(), "bar");
    }
}
