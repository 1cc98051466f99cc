use crate::config::SeatboxHome;
use std::path::Path;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Result of an allowlist insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyAllowed,
}

/// Reads the allowlist in insertion order, dropping empty lines.
pub fn load_folders(home: &SeatboxHome) -> std::io::Result<Vec<PathBuf>> {
    home.ensure()?;
    let contents = std::fs::read_to_string(home.folders_file())?;
    Ok(contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Records an extra writable folder. The path must already be
/// normalized; dedupe is by exact string match, so differently spelled
/// equivalents (trailing slash, symlinks) are treated as distinct.
///
/// The store is rewritten in full through a temp file in the config
/// directory and renamed over the old one, so a crash mid-write never
/// leaves a truncated allowlist behind.
pub fn add_folder(home: &SeatboxHome, path: &Path) -> std::io::Result<AddOutcome> {
    let mut folders = load_folders(home)?;
    if folders.iter().any(|existing| existing.as_path() == path) {
        return Ok(AddOutcome::AlreadyAllowed);
    }
    folders.push(path.to_path_buf());

    let mut serialized = String::new();
    for folder in &folders {
        serialized.push_str(&folder.to_string_lossy());
        serialized.push('\n');
    }

    let tmp = NamedTempFile::new_in(home.config_dir())?;
    std::fs::write(tmp.path(), serialized.as_bytes())?;
    tmp.persist(home.folders_file()).map_err(|err| err.error)?;
    tracing::debug!("allowlisted folder {}", path.display());
    Ok(AddOutcome::Added)
}
