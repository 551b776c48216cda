//! File I/O for the CLI frontend.
//!
//! Handles reading inputs, naming outputs and writing them without
//! clobbering existing files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SdfError};

/// Read an input file as text.
pub fn read_input(path: &Path) -> Result<String> {
    info!("Reading {}", path.display());
    fs::read_to_string(path).map_err(|e| SdfError::FileRead {
        path: path.display().to_string(),
        source: e,
    })
}

/// Ensure `dir` is an existing directory.
pub fn check_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(SdfError::NotADirectory {
            path: dir.display().to_string(),
        })
    }
}

/// File name with every extension removed: `a.sdf.gz` gives `a`.
pub fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

/// Output location for `input` inside `dir`.
///
/// Without an extension the input's file name is kept as is; otherwise the
/// stem gets the new extension.
pub fn output_path(dir: &Path, input: &Path, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) => dir.join(format!("{}.{}", file_stem(input), ext)),
        None => dir.join(input.file_name().unwrap_or(input.as_os_str())),
    }
}

/// Write `text` to `path`, refusing to replace an existing file unless
/// `force` is set.
pub fn write_output(path: &Path, text: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(SdfError::OutputExists {
            path: path.display().to_string(),
        });
    }
    info!("Writing {}", path.display());
    fs::write(path, text).map_err(|e| SdfError::FileWrite {
        path: path.display().to_string(),
        source: e,
    })
}
