//! Synchronous static-file retrieval.
//!
//! Reads are whole-file and blocking; files are assumed local and small.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::http::mime;

#[derive(Debug)]
pub struct FileContents {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Maps a request target onto a path under `root`.
///
/// The query string and fragment are dropped, and any `..` component makes
/// the target unresolvable. Directory targets resolve to `index`.
pub fn resolve(root: &Path, target: &str, index: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or("");
    if !path.starts_with('/') {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if path.ends_with('/') || resolved.is_dir() {
        resolved.push(index);
    }

    Some(resolved)
}

/// Reads the file a request target points at.
///
/// `Ok(None)` means there is nothing to serve: the target does not resolve or
/// the file does not exist. Any other read failure is returned as is.
pub fn read(root: &Path, target: &str, index: &str) -> io::Result<Option<FileContents>> {
    let Some(path) = resolve(root, target, index) else {
        return Ok(None);
    };

    match std::fs::read(&path) {
        Ok(bytes) => Ok(Some(FileContents {
            content_type: mime::content_type(&path),
            bytes,
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read static file");
            Err(e)
        }
    }
}
