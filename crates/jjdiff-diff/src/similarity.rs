//! Similarity scoring (C2): byte-equality, line-multiset text similarity,
//! and content-defined-chunk binary similarity.

use std::collections::HashMap;
use std::fs::File as StdFile;
use std::path::Path;

use blake2::digest::{consts::U8, Digest};
use blake2::Blake2b;
use memmap2::Mmap;

use crate::contents::Content;

pub const SIMILARITY_THRESHOLD: f64 = 0.6;

pub fn content_is_equal(old_path: &Path, new_path: &Path) -> std::io::Result<bool> {
    let old_meta = std::fs::metadata(old_path)?;
    let new_meta = std::fs::metadata(new_path)?;
    if old_meta.len() != new_meta.len() {
        return Ok(false);
    }
    if old_meta.len() == 0 {
        return Ok(true);
    }

    let old_file = StdFile::open(old_path)?;
    let new_file = StdFile::open(new_path)?;
    let old_map = unsafe { Mmap::map(&old_file)? };
    let new_map = unsafe { Mmap::map(&new_file)? };
    Ok(old_map[..] == new_map[..])
}

pub fn get_content_similarity(old: &Content, new: &Content) -> f64 {
    match (old, new) {
        (Content::File { content_path: old_path, .. }, Content::File { content_path: new_path, .. }) => {
            if content_is_equal(old_path, new_path).unwrap_or(false) {
                return 1.0;
            }
            match (split_lines(old_path), split_lines(new_path)) {
                (Some(old_lines), Some(new_lines)) => get_text_similarity(&old_lines, &new_lines),
                (None, None) => get_binary_similarity(old_path, new_path).unwrap_or(0.0),
                _ => 0.0,
            }
        }
        (Content::Symlink { to: old_to }, Content::Symlink { to: new_to }) => {
            get_line_similarity(&old_to.to_string_lossy(), &new_to.to_string_lossy())
        }
        _ => 0.0,
    }
}

/// Reads `path` as UTF-8 text, splitting on `\n` and preserving whether the
/// file ends with a trailing newline as an empty final "line" (matching the
/// original's `splitlines`-with-sentinel convention). Returns `None` if the
/// file isn't valid UTF-8 — callers then treat the content as binary.
pub fn split_lines(path: &Path) -> Option<Vec<String>> {
    let bytes = std::fs::read(path).ok()?;
    let text = String::from_utf8(bytes).ok()?;

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    // A trailing `\n` produces one empty element from split; that models the
    // sentinel appended by the original's reader. No trailing newline means
    // the last element is real content and should stay as-is.
    if text.ends_with('\n') {
        lines.pop();
        lines.push(String::new());
    }
    Some(lines)
}

pub fn get_text_similarity(old_lines: &[String], new_lines: &[String]) -> f64 {
    let old_counts = get_line_counts(old_lines);
    let new_counts = get_line_counts(new_lines);

    let old_total: usize = old_counts.values().sum();
    let new_total: usize = new_counts.values().sum();
    let total = old_total + new_total;
    if total == 0 {
        return 1.0;
    }

    let mut common = 0usize;
    for (line, &old_count) in &old_counts {
        if let Some(&new_count) = new_counts.get(line) {
            common += old_count.min(new_count);
        }
    }

    (common * 2) as f64 / total as f64
}

fn get_line_counts(lines: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for line in lines {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            *counts.entry(trimmed).or_insert(0) += 1;
        }
    }
    counts
}

pub fn get_line_similarity(old: &str, new: &str) -> f64 {
    if old == new {
        1.0
    } else {
        similar::TextDiff::from_chars(old, new).ratio() as f64
    }
}

const WINDOW_SIZE: usize = 48;
const WINDOW_MASK: u64 = (1 << 12) - 1;
const HASH_BASE: u64 = 263;
const HASH_MODULUS: u64 = (1 << 31) - 1;

fn hash_base_power() -> u64 {
    let mut result = 1u64;
    for _ in 0..WINDOW_SIZE {
        result = (result * HASH_BASE) % HASH_MODULUS;
    }
    result
}

pub fn get_binary_similarity(old_path: &Path, new_path: &Path) -> std::io::Result<f64> {
    let old_chunks: std::collections::HashSet<[u8; 8]> = get_binary_chunks(old_path)?.iter().map(|c| stable_hash(c)).collect();
    let new_chunks: std::collections::HashSet<[u8; 8]> = get_binary_chunks(new_path)?.iter().map(|c| stable_hash(c)).collect();

    let total = old_chunks.len() + new_chunks.len();
    if total == 0 {
        return Ok(1.0);
    }

    let common = old_chunks.intersection(&new_chunks).count();
    Ok((common * 2) as f64 / total as f64)
}

/// Content-defined chunking via a rolling polynomial hash: a chunk boundary
/// falls wherever the trailing-window hash's low 12 bits are zero.
fn get_binary_chunks(path: &Path) -> std::io::Result<Vec<Vec<u8>>> {
    let file = StdFile::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(vec![Vec::new()]);
    }
    let map = unsafe { Mmap::map(&file)? };
    let data = &map[..];

    if data.len() <= WINDOW_SIZE {
        return Ok(vec![data.to_vec()]);
    }

    let base_power = hash_base_power();
    let mut curr_hash: u64 = 0;
    for &byte in &data[..WINDOW_SIZE] {
        curr_hash = (curr_hash * HASH_BASE + byte as u64) % HASH_MODULUS;
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    for i in WINDOW_SIZE..data.len() {
        if curr_hash & WINDOW_MASK == 0 {
            chunks.push(data[start..i].to_vec());
            start = i;
        }

        let old_byte = data[i - WINDOW_SIZE] as u64;
        let new_byte = data[i] as u64;

        let removed = (old_byte * base_power) % HASH_MODULUS;
        curr_hash = (curr_hash + HASH_MODULUS - removed) % HASH_MODULUS;
        curr_hash = (curr_hash * HASH_BASE + new_byte) % HASH_MODULUS;
    }

    if start < data.len() {
        chunks.push(data[start..].to_vec());
    }

    Ok(chunks)
}

fn stable_hash(data: &[u8]) -> [u8; 8] {
    let mut hasher = Blake2b::<U8>::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn identical_content_is_equal() {
        let a = NamedTempFile::new().unwrap();
        let b = NamedTempFile::new().unwrap();
        std::fs::write(a.path(), "same bytes").unwrap();
        std::fs::write(b.path(), "same bytes").unwrap();
        assert!(content_is_equal(a.path(), b.path()).unwrap());
    }

    #[test]
    fn different_sized_content_is_not_equal() {
        let a = NamedTempFile::new().unwrap();
        let b = NamedTempFile::new().unwrap();
        std::fs::write(a.path(), "short").unwrap();
        std::fs::write(b.path(), "much longer content").unwrap();
        assert!(!content_is_equal(a.path(), b.path()).unwrap());
    }

    #[test]
    fn split_lines_tracks_trailing_newline() {
        let f = NamedTempFile::new().unwrap();
        std::fs::write(f.path(), "a\nb\n").unwrap();
        assert_eq!(split_lines(f.path()).unwrap(), vec!["a", "b", ""]);

        let g = NamedTempFile::new().unwrap();
        std::fs::write(g.path(), "a\nb").unwrap();
        assert_eq!(split_lines(g.path()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn split_lines_rejects_invalid_utf8() {
        let f = NamedTempFile::new().unwrap();
        std::fs::write(f.path(), [0xff, 0xfe, 0x00, 0x01]).unwrap();
        assert!(split_lines(f.path()).is_none());
    }

    #[test]
    fn text_similarity_of_identical_lines_is_one() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(get_text_similarity(&lines, &lines), 1.0);
    }

    #[test]
    fn text_similarity_of_disjoint_lines_is_zero() {
        let old = vec!["a".to_string()];
        let new = vec!["b".to_string()];
        assert_eq!(get_text_similarity(&old, &new), 0.0);
    }

    #[test]
    fn binary_similarity_of_identical_files_is_one() {
        let a = NamedTempFile::new().unwrap();
        let data = vec![7u8; 10_000];
        std::fs::write(a.path(), &data).unwrap();
        let b = NamedTempFile::new().unwrap();
        std::fs::write(b.path(), &data).unwrap();
        assert_eq!(get_binary_similarity(a.path(), b.path()).unwrap(), 1.0);
    }

    #[test]
    fn binary_similarity_of_disjoint_bytes_is_near_zero() {
        let a = NamedTempFile::new().unwrap();
        std::fs::write(a.path(), vec![1u8; 10_000]).unwrap();
        let b = NamedTempFile::new().unwrap();
        std::fs::write(b.path(), vec![2u8; 10_000]).unwrap();
        assert_eq!(get_binary_similarity(a.path(), b.path()).unwrap(), 0.0);
    }
}
