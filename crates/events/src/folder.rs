//! Opening a directory in the desktop file manager.

use std::path::Path;

use tokio::process::Command;

/// Program used to open a folder on this platform.
pub fn opener_program() -> &'static str {
    if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Launch the file manager on `dir` without waiting for it.
///
/// Explorer reports a non-zero exit code even on success, so the child is
/// never awaited.
pub fn open_folder(dir: &Path) -> std::io::Result<()> {
    let child = Command::new(opener_program())
        .arg(dir)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    tracing::debug!(dir = %dir.display(), pid = child.id(), "Opened folder");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
