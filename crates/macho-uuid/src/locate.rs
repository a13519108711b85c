//! Symbol file discovery.
//!
//! Turns a user-supplied path into the list of files that may hold Mach-O
//! images. Bundles (`.app`, `.dSYM`, `.framework`, ...) are directories, so
//! they are walked and filtered down to extensionless files that really are
//! Mach-O or fat binaries. Plists, nibs and other resources are dropped.

use std::path::{Path, PathBuf};

use macho_uuid_formats::{detect_format, BinaryType, FileReader};
use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::Error;

/// Extensions accepted on the path handed to [`locate_symbol_files`],
/// compared case-insensitively. A path without an extension is also
/// accepted, for raw executables.
pub const SYMBOL_FILE_EXTENSIONS: &[&str] =
    &["app", "dsym", "bundle", "framework", "xcarchive", "dylib"];

/// Validates `path` and expands it into candidate symbol files.
///
/// A regular file is its own sole candidate. A directory is walked
/// recursively and every extensionless Mach-O or fat file beneath it is
/// returned, in file name order.
pub fn locate_symbol_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let path = path.as_ref();

    if path.as_os_str().is_empty() {
        return Err(Error::MissingPath);
    }

    match path.try_exists() {
        Ok(true) => {}
        Ok(false) => return Err(Error::NotFound(path.to_path_buf())),
        Err(err) => return Err(Error::io(path, err)),
    }

    if !has_symbol_file_extension(path) {
        return Err(Error::InvalidExtension(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let files = list_all_files(path).collect::<Result<Vec<_>, _>>()?;
    let total = files.len();
    let candidates: Vec<PathBuf> = files
        .into_par_iter()
        .filter(|file| is_symbol_file_candidate(file))
        .collect();

    debug!(
        root = %path.display(),
        files = total,
        candidates = candidates.len(),
        "located symbol files"
    );
    Ok(candidates)
}

/// Returns true if `path` has no extension or one of
/// [`SYMBOL_FILE_EXTENSIONS`].
pub fn has_symbol_file_extension(path: &Path) -> bool {
    match path.extension() {
        None => true,
        Some(ext) => ext.to_str().is_some_and(|ext| {
            SYMBOL_FILE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        }),
    }
}

/// Recursively lists the regular files beneath `root`, sorted by file name
/// within each directory. Symlinks below the root are not followed.
pub fn list_all_files(root: &Path) -> impl Iterator<Item = Result<PathBuf, Error>> {
    let walk_root = root.to_path_buf();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(source) => Some(Err(Error::Walk {
                root: walk_root.clone(),
                source,
            })),
        })
}

/// Returns true if `path` is extensionless and holds a Mach-O or fat binary.
pub fn is_symbol_file_candidate(path: &Path) -> bool {
    if path.extension().is_some() {
        return false;
    }
    match detect_format(&FileReader::new(path)) {
        BinaryType::MachO | BinaryType::Fat => true,
        BinaryType::Unknown => {
            debug!(path = %path.display(), "skipping non-binary file");
            false
        }
    }
}
