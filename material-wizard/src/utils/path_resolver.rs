use anyhow::Result;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "material-wizard";

/// Resolve log folder (absolute path), creating it if needed.
///
/// Order: explicit override -> `<data_local_dir>/material-wizard/logs` -> `./logs`.
pub fn resolve_log_folder(override_dir: Option<&Path>) -> Result<PathBuf> {
    let log_dir = match override_dir {
        Some(dir) => absolutize(dir),
        None => match dirs::data_local_dir() {
            Some(base) => base.join(APP_DIR_NAME).join("logs"),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("logs"),
        },
    };

    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder {:?}: {}", log_dir, e))?;
    Ok(log_dir)
}

fn absolutize(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(dir)
}
