//! Computing a structured change set between two working-copy trees: content
//! scanning (C1), similarity scoring (C2), line alignment (C3), and tree
//! diffing with rename detection (C4).

mod contents;
mod lines;
mod similarity;
mod tree;

pub use contents::{Content, Contents};
pub use lines::diff_lines;
pub use similarity::{content_is_equal, get_binary_similarity, get_content_similarity, get_line_similarity, get_text_similarity, split_lines, SIMILARITY_THRESHOLD};
pub use tree::{diff, diff_contents};

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Deprioritize;
    use jjdiff_change::Change;
    use std::fs;
    use tempfile::tempdir;

    fn no_deprioritize() -> Deprioritize {
        Deprioritize::new(&[])
    }

    #[test]
    fn diff_of_added_file_is_add_file() {
        let old_dir = tempdir().unwrap();
        let new_dir = tempdir().unwrap();
        fs::write(new_dir.path().join("foo.txt"), "foo").unwrap();

        let changes = diff(old_dir.path(), new_dir.path(), &no_deprioritize()).unwrap();
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            Change::AddFile { path, lines, is_exec } => {
                assert_eq!(path, std::path::Path::new("foo.txt"));
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].new.as_deref(), Some("foo"));
                assert!(!is_exec);
            }
            other => panic!("expected AddFile, got {other:?}"),
        }
    }

    #[test]
    fn diff_of_deleted_file_is_delete_file() {
        let old_dir = tempdir().unwrap();
        let new_dir = tempdir().unwrap();
        fs::write(old_dir.path().join("foo.txt"), "foo").unwrap();

        let changes = diff(old_dir.path(), new_dir.path(), &no_deprioritize()).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], Change::DeleteFile { .. }));
    }

    #[test]
    fn rename_detected_for_similar_renamed_file() {
        let old_dir = tempdir().unwrap();
        let new_dir = tempdir().unwrap();
        fs::write(old_dir.path().join("foo.txt"), "line one\nline two\nline three\n").unwrap();
        fs::write(new_dir.path().join("bar.txt"), "line one\nline two\nline three\n").unwrap();

        let changes = diff(old_dir.path(), new_dir.path(), &no_deprioritize()).unwrap();
        assert!(changes.iter().any(|c| matches!(
            c,
            Change::Rename { old_path, new_path }
                if old_path == std::path::Path::new("foo.txt") && new_path == std::path::Path::new("bar.txt")
        )));
    }

    #[test]
    fn no_changes_for_identical_trees() {
        let old_dir = tempdir().unwrap();
        let new_dir = tempdir().unwrap();
        fs::write(old_dir.path().join("foo.txt"), "same").unwrap();
        fs::write(new_dir.path().join("foo.txt"), "same").unwrap();

        let changes = diff(old_dir.path(), new_dir.path(), &no_deprioritize()).unwrap();
        assert!(changes.is_empty());
    }
}
