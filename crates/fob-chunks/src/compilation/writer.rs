//! Writing emitted assets to disk.
//!
//! Hosts such as Rolldown write their own outputs; this is for embedders of
//! [`MemoryCompilation`](super::MemoryCompilation) that want the fragments and
//! the manifest on disk.
//!
//! Every filename is joined onto the output directory and normalized; anything
//! that resolves outside of it is rejected before a single byte is written.
//! Content goes to a `.tmp` sibling first and is renamed into place once all
//! files were written. On failure the temporary files and every target this
//! call created are removed; targets that already existed and were renamed
//! over before the failure keep their new content.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use super::RawSource;
use crate::{Error, Result};

/// Write `(filename, source)` pairs below `dir`.
///
/// Fails with [`Error::InvalidOutputPath`] for names escaping `dir`, and with
/// [`Error::OutputExists`] when a target exists and `overwrite` is false.
pub fn write_assets_to<'a, I>(assets: I, dir: &Path, overwrite: bool) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a RawSource)>,
{
    let dir = normalize_dir(dir)?;

    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut operations = Vec::new();
    for (filename, source) in assets {
        let target_path = validate_output_path(&dir, filename)?;

        if !overwrite && target_path.exists() {
            return Err(Error::OutputExists(format!(
                "File already exists: '{}'. Use overwrite=true to replace.",
                target_path.display()
            )));
        }

        operations.push((target_path, source.as_bytes()));
    }

    write_files_atomic(&operations)
}

fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();

    if cleaned.is_absolute() {
        return Ok(cleaned);
    }

    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
    })?;
    Ok(cwd.join(&cleaned).clean())
}

/// Resolve `filename` below `base_dir`, rejecting traversal and absolute paths.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    // Fragment patterns may start with '/', which still means "below the output root".
    let relative = filename.trim_start_matches('/');
    let full_path = base_dir.join(Path::new(relative).clean()).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::new();

    for (target_path, content) in operations {
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = temp_path_for(target_path);
        fs::write(&temp_path, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        temp_files.push((temp_path, target_path.clone()));
    }

    let created: Vec<bool> = temp_files
        .iter()
        .map(|(_, target_path)| !target_path.exists())
        .collect();

    for (index, (temp_path, target_path)) in temp_files.iter().enumerate() {
        fs::rename(temp_path, target_path).map_err(|e| {
            cleanup_temp_files(&temp_files);
            remove_created_targets(&temp_files[..index], &created[..index]);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                target_path.display(),
                e
            ))
        })?;
    }

    Ok(())
}

/// `home-styles.html` -> `home-styles.html.tmp`, so two targets differing
/// only by extension never share a temp file.
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to clean up temporary file"
                );
            }
        }
    }
}

fn remove_created_targets(renamed: &[(PathBuf, PathBuf)], created: &[bool]) {
    for ((_, target_path), _) in renamed.iter().zip(created).filter(|(_, created)| **created) {
        if let Err(e) = fs::remove_file(target_path) {
            tracing::warn!(
                path = %target_path.display(),
                error = %e,
                "failed to roll back written file"
            );
        }
    }
}
