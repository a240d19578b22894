use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("NoFilesFound: {pattern}")]
    NoFilesFound { pattern: String },
    #[error("ReadFailed: {path}: {message}")]
    Read { path: String, message: String },
}

/// Enumerate memo files matching any of the glob patterns (e.g. "./memos/**/*.txt").
/// Returns a sorted, deduplicated list of regular files.
pub fn enumerate_inputs(patterns: &[String]) -> Result<Vec<PathBuf>, InputError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        if !is_glob(pattern) {
            let path = PathBuf::from(pattern);
            if path.is_file() {
                paths.push(path);
            }
            continue;
        }
        let (base, rest) = split_pattern(pattern);
        // leading "/" anchors the pattern at `base`, so "*.txt" does not match in subdirectories
        let anchored = format!("/{}", rest);
        let walker = GlobWalkerBuilder::from_patterns(&base, &[anchored.as_str()])
            .case_insensitive(false)
            .follow_links(false)
            .build()
            .map_err(|_| InputError::NoFilesFound { pattern: pattern.clone() })?;
        paths.extend(walker.filter_map(|e| e.ok()).map(|e| e.path().to_path_buf()));
    }

    paths.retain(|p| p.is_file());
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        return Err(InputError::NoFilesFound { pattern: patterns.join(", ") });
    }
    Ok(paths)
}

/// Read one memo as UTF-8, replacing invalid sequences.
pub fn read_input(path: &Path) -> Result<String, InputError> {
    let bytes = std::fs::read(path).map_err(|e| InputError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(|c: char| "*?[{".contains(c))
}

// Walk from the literal directory prefix instead of "/" or ".", so "/tmp/x/**/*.txt" only walks /tmp/x.
fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let mut base = if pattern.starts_with('/') { PathBuf::from("/") } else { PathBuf::from(".") };
    let mut rest: Vec<&str> = Vec::new();
    for part in pattern.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if rest.is_empty() && !is_glob(part) {
            base.push(part);
        } else {
            rest.push(part);
        }
    }
    (base, rest.join("/"))
}
