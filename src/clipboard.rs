use anyhow::{Context, Result};

/// Destination for "copy" actions.
pub trait Clipboard: Send + Sync {
    fn write_all(&self, text: &str) -> Result<()>;
}

/// The system clipboard. A fresh `arboard` handle is opened per write so no
/// platform handle outlives the worker thread that uses it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_all(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard
            .set_text(text.to_owned())
            .context("failed to write to clipboard")
    }
}
