//! File system helpers for the CLI.
//!
//! ```rust,no_run
//! use pacfile_cli::utils::fs::{atomic_write, find_documents};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! for document in find_documents(Path::new("repos/org/app"), "pacfile")? {
//!     println!("{document}");
//! }
//! atomic_write(Path::new("out/pacfile"), b"{}")?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Create `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write `content` to a sibling temp file, then rename it over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;
        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;
    Ok(())
}

/// Every file named `file_name` below `base`, as sorted `/`-separated paths
/// relative to `base`. `.git` directories are skipped and symlinks are not
/// followed.
pub fn find_documents(base: &Path, file_name: &str) -> Result<Vec<String>> {
    debug!("Searching for '{}' documents in {}", file_name, base.display());
    if !base.is_dir() {
        anyhow::bail!("Not a directory: {}", base.display());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(base)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() || entry.file_name() != file_name {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(base) {
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            trace!("Found document: {}", relative);
            documents.push(relative);
        }
    }

    documents.sort();
    debug!("Found {} documents", documents.len());
    Ok(documents)
}
