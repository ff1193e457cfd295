use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::tui::theme::ThemeConfig;

/// Default editor when neither the config nor `$EDITOR` names one.
pub const DEFAULT_EDITOR: &str = "nano";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// User-defined key bindings that run shell commands.
    #[serde(default)]
    pub custom_commands: Vec<CustomCommand>,

    /// Editor used for long-form fields. Falls back to `$EDITOR`.
    #[serde(default)]
    pub editor: Option<String>,

    /// Tracker CLI program. Default: "bd"
    #[serde(default = "default_bd_program")]
    pub bd_program: String,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            custom_commands: vec![],
            editor: None,
            bd_program: default_bd_program(),
            theme: ThemeConfig::default(),
        }
    }
}

fn default_bd_program() -> String {
    "bd".to_string()
}

/// Where in the UI a custom command's key is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandContext {
    #[default]
    List,
    Detail,
    Global,
}

impl CommandContext {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandContext::List => "list",
            CommandContext::Detail => "detail",
            CommandContext::Global => "global",
        }
    }

    /// A command bound to `self` fires when the UI is in `current`.
    pub fn applies_to(self, current: CommandContext) -> bool {
        self == current || self == CommandContext::Global
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomCommand {
    /// Key string as produced by `keymap::key_string` (e.g. `"D"`, `"ctrl+o"`).
    pub key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: CommandContext,
    /// Template rendered against the selected task, e.g.
    /// `tmux new-window -n {{.ID}} "claude {{sh .Title}}"`.
    pub command: String,
}

impl Config {
    /// Editor selection: config, then the environment, then [`DEFAULT_EDITOR`].
    pub fn resolve_editor(&self) -> String {
        resolve_editor(self.editor.as_deref(), std::env::var("EDITOR").ok().as_deref())
    }
}

pub fn resolve_editor(configured: Option<&str>, env: Option<&str>) -> String {
    [configured, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_EDITOR)
        .to_string()
}

/// Returns the lazybeads config directory, e.g. `~/.config/lazybeads/`.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine config directory")?;
    Ok(base.join("lazybeads"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from the default location (or return defaults if it doesn't exist).
pub fn load() -> Result<Config> {
    load_from(&config_path()?)
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_custom_commands() {
        let (_dir, path) = write_config(
            r#"
[[custom_commands]]
key = "D"
description = "Test command"
context = "list"
command = "echo hello"

[[custom_commands]]
key = "C"
description = "Another command"
context = "detail"
command = "echo {{.ID}}"
"#,
        );
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.custom_commands.len(), 2);
        assert_eq!(cfg.custom_commands[0].key, "D");
        assert_eq!(cfg.custom_commands[0].context, CommandContext::List);
        assert_eq!(cfg.custom_commands[1].context, CommandContext::Detail);
        assert_eq!(cfg.custom_commands[1].command, "echo {{.ID}}");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("nope.toml")).unwrap();
        assert!(cfg.custom_commands.is_empty());
        assert_eq!(cfg.bd_program, "bd");
        assert!(cfg.editor.is_none());
    }

    #[test]
    fn context_defaults_to_list() {
        let (_dir, path) = write_config(
            r#"
[[custom_commands]]
key = "X"
description = "No context"
command = "echo test"
"#,
        );
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.custom_commands.len(), 1);
        assert_eq!(cfg.custom_commands[0].context, CommandContext::List);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let (_dir, path) = write_config("custom_commands = 3");
        let err = load_from(&path).unwrap_err();
        assert!(format!("{err}").contains("config.toml"));
    }

    #[test]
    fn unknown_context_is_rejected() {
        let (_dir, path) = write_config(
            r#"
[[custom_commands]]
key = "X"
context = "sidebar"
command = "echo"
"#,
        );
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn editor_resolution_order() {
        assert_eq!(resolve_editor(Some("hx"), Some("vim")), "hx");
        assert_eq!(resolve_editor(None, Some("vim")), "vim");
        assert_eq!(resolve_editor(Some("  "), None), DEFAULT_EDITOR);
        assert_eq!(resolve_editor(None, None), DEFAULT_EDITOR);
    }

    #[test]
    fn global_context_applies_everywhere() {
        assert!(CommandContext::Global.applies_to(CommandContext::List));
        assert!(CommandContext::Global.applies_to(CommandContext::Detail));
        assert!(CommandContext::Detail.applies_to(CommandContext::Detail));
        assert!(!CommandContext::List.applies_to(CommandContext::Detail));
    }

    #[test]
    fn theme_section_is_optional_and_parsed() {
        let (_dir, path) = write_config(
            r#"
bd_program = "/opt/bd"

[theme]
border_focused = "red"
"#,
        );
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.bd_program, "/opt/bd");
        assert_eq!(cfg.theme.border_focused.as_deref(), Some("red"));
    }
}
