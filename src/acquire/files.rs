//! Filesystem helpers for acquisition.
//!
//! Filename allocation only checks existence; the caller performs the
//! rename. The sequential acquisition model guarantees a single writer on
//! the download directory, so no locking is done here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reduce a name to a safe directory/file key.
///
/// ASCII alphanumerics, `-`, `_` and `.` pass through; everything else
/// (spaces included) becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Return a path that does not exist yet, appending `_1`, `_2`, ... before
/// the extension starting from the first collision.
///
/// Pure function of filesystem state at call time: calling it twice without
/// creating the file in between returns the same path.
pub fn allocate_unique(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = desired.extension().map(|e| e.to_string_lossy().into_owned());
    let parent = desired.parent().unwrap_or_else(|| Path::new(""));

    for counter in 1u64.. {
        let file_name = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = parent.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("counter space exhausted");
}

/// First file in `dir` with the given extension, in lexicographic order.
///
/// The deterministic order makes the claim reproducible when leftovers are
/// present. Returns `Ok(None)` while no matching file has arrived, and also
/// when the directory itself does not exist yet.
pub fn find_by_extension(dir: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|e| e.eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
        })
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Move an arrived file to a collision-free variant of the desired path.
///
/// The rename is atomic within one filesystem; the allocated destination is
/// returned.
pub fn claim(arrived: &Path, desired: &Path) -> io::Result<PathBuf> {
    let destination = allocate_unique(desired);
    fs::rename(arrived, &destination)?;
    Ok(destination)
}
