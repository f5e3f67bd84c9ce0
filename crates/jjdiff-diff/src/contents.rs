//! Content scan (C1): walking a root directory into a `path -> Content` map,
//! treating symlinks and regular files only.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum Content {
    File { content_path: PathBuf, is_exec: bool },
    Symlink { to: PathBuf },
}

/// A scanned tree, resolved relative to a canonicalized root. Lookups for a
/// path whose resolution escapes the root are treated the same as a path
/// that doesn't exist at all (`PathEscape`, per the error-kind table).
pub struct Contents {
    root: PathBuf,
    entries: BTreeMap<PathBuf, Content>,
}

impl Contents {
    pub fn scan(root: &Path) -> std::io::Result<Contents> {
        let root = root.canonicalize()?;
        let mut entries = BTreeMap::new();
        walk(&root, &root, &mut entries)?;
        Ok(Contents { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &Path) -> Option<&Content> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Content)> {
        self.entries.iter().map(|(path, content)| (path.as_path(), content))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn walk(root: &Path, dir: &Path, entries: &mut BTreeMap<PathBuf, Content>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let full_path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            if let Some((rel, content)) = read_symlink(root, &full_path)? {
                entries.insert(rel, content);
            }
        } else if file_type.is_file() {
            if let Some((rel, content)) = read_file(root, &full_path)? {
                entries.insert(rel, content);
            }
        } else if file_type.is_dir() {
            walk(root, &full_path, entries)?;
        }
    }
    Ok(())
}

fn is_within_root(root: &Path, resolved: &Path) -> bool {
    resolved.starts_with(root)
}

fn read_symlink(root: &Path, path: &Path) -> std::io::Result<Option<(PathBuf, Content)>> {
    let target = fs::read_link(path)?;
    // Resolve what the symlink points at (may not exist) to apply the
    // same root-escape check a non-symlink lookup gets.
    let resolved = path.parent().unwrap_or(root).join(&target);
    let resolved = dunce_canonicalize_best_effort(&resolved);
    if !is_within_root(root, &resolved) {
        return Ok(None);
    }
    let Ok(rel) = path.strip_prefix(root) else {
        return Ok(None);
    };
    Ok(Some((rel.to_path_buf(), Content::Symlink { to: target })))
}

fn read_file(root: &Path, path: &Path) -> std::io::Result<Option<(PathBuf, Content)>> {
    let resolved = path.canonicalize()?;
    if !is_within_root(root, &resolved) {
        return Ok(None);
    }
    let Ok(rel) = path.strip_prefix(root) else {
        return Ok(None);
    };
    let is_exec = is_executable(path)?;
    Ok(Some((rel.to_path_buf(), Content::File { content_path: path.to_path_buf(), is_exec })))
}

fn dunce_canonicalize_best_effort(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o100 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> std::io::Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scans_nested_regular_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/file.txt"), "hi").unwrap();
        let contents = Contents::scan(dir.path()).unwrap();
        assert!(contents.contains(Path::new("a/b/file.txt")));
    }

    #[test]
    fn ignores_directory_entries_themselves() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty_dir")).unwrap();
        let contents = Contents::scan(dir.path()).unwrap();
        assert_eq!(contents.len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("target.txt"), "x").unwrap();
        std::os::unix::fs::symlink("target.txt", dir.path().join("link.txt")).unwrap();
        let contents = Contents::scan(dir.path()).unwrap();
        match contents.get(Path::new("link.txt")) {
            Some(Content::Symlink { to }) => assert_eq!(to, Path::new("target.txt")),
            other => panic!("expected symlink content, got {other:?}"),
        }
    }
}
