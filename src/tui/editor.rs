use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};

/// Open `initial` in `editor` and return the edited text.
///
/// The caller must have released the terminal first; the editor runs in the
/// foreground with inherited stdio. The temporary file is removed when this
/// returns, on every path.
pub fn edit_text(editor: &str, initial: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("lazybeads-")
        .suffix(".md")
        .tempfile()
        .context("failed to create temp file")?;
    file.write_all(initial.as_bytes())
        .context("failed to write temp file")?;
    file.flush().context("failed to write temp file")?;

    let mut parts =
        shell_words::split(editor).map_err(|e| anyhow!("cannot parse editor {editor:?}: {e}"))?;
    if parts.is_empty() {
        bail!("no editor configured");
    }
    let program = parts.remove(0);

    tracing::debug!(%program, path = %file.path().display(), "launching editor");
    let status = Command::new(&program)
        .args(&parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor {program}"))?;
    if !status.success() {
        bail!("editor exited with {status}");
    }

    fs::read_to_string(file.path()).context("failed to read edited file")
}
