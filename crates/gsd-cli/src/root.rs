use anyhow::bail;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--cwd` flag / `GSD_CWD` env var (passed in as `explicit`) — must be
///    an existing directory, otherwise a hard error
/// 2. Walk upward from the current directory looking for `.planning/`
/// 3. Walk upward looking for `.git/`
/// 4. Fall back to the current directory
pub fn resolve_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        if !p.is_dir() {
            bail!("Invalid --cwd: {} is not a directory", p.display());
        }
        return Ok(p.to_path_buf());
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut dir = cwd.clone();
    loop {
        if dir.join(".planning").is_dir() {
            return Ok(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    let mut dir = cwd.clone();
    loop {
        if dir.join(".git").is_dir() {
            return Ok(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    Ok(cwd)
}
