//! User-defined key bindings that render a command template against the
//! selected task and launch it through `sh -c`.
//!
//! Templates use `{{...}}` actions:
//!
//! - `{{.ID}}` inserts a field verbatim.
//! - `{{sh .Title}}` or `{{.Title | sh}}` inserts it shell-escaped.

use std::process::{Command, Stdio};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

use crate::config::{CommandContext, CustomCommand};
use crate::tracker::Task;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {0}")]
    Unclosed(usize),
    #[error("empty action at byte {0}")]
    Empty(usize),
    #[error("malformed action {0:?}")]
    Malformed(String),
    #[error("can't evaluate field {0}")]
    UnknownField(String),
    #[error("function {0:?} not defined")]
    UnknownFunction(String),
}

/// `[func] .Field [| func]`
static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z_]\w*)\s+)?\.([A-Za-z_]\w*)(?:\s*\|\s*([A-Za-z_]\w*))?$")
        .expect("action regex is valid")
});

/// First command bound to `key` that is live in `context`, in config order.
pub fn find_match<'a>(
    commands: &'a [CustomCommand],
    key: &str,
    context: CommandContext,
) -> Option<&'a CustomCommand> {
    commands
        .iter()
        .find(|c| c.key == key && c.context.applies_to(context))
}

/// Escape `s` for interpolation into a shell command line.
///
/// Replacement order matters: backslashes go first so later escapes are not
/// themselves doubled.
pub fn shell_escape(s: &str) -> String {
    s.replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('\'', r"'\''")
        .replace('`', r"\`")
        .replace('$', r"\$")
}

fn field_value(task: &Task, name: &str) -> Result<String, TemplateError> {
    let value = match name {
        "ID" => task.id.clone(),
        "Title" => task.title.clone(),
        "Description" => task.description.clone(),
        "Notes" => task.notes.clone(),
        "Design" => task.design.clone(),
        "AcceptanceCriteria" => task.acceptance_criteria.clone(),
        "Status" => task.status.as_str().to_string(),
        "Priority" => task.priority.to_string(),
        "Type" => task.issue_type.clone(),
        "Assignee" => task.assignee.clone(),
        "Labels" => task.labels.join(","),
        "Parent" => task.parent_id().unwrap_or_default(),
        other => return Err(TemplateError::UnknownField(other.to_string())),
    };
    Ok(value)
}

fn apply_function(name: &str, value: &str) -> Result<String, TemplateError> {
    match name {
        "sh" => Ok(shell_escape(value)),
        other => Err(TemplateError::UnknownFunction(other.to_string())),
    }
}

fn eval_action(action: &str, offset: usize, task: &Task) -> Result<String, TemplateError> {
    let action = action.trim();
    if action.is_empty() {
        return Err(TemplateError::Empty(offset));
    }
    let caps = ACTION_RE
        .captures(action)
        .ok_or_else(|| TemplateError::Malformed(action.to_string()))?;
    let mut value = field_value(task, &caps[2])?;
    for func in [caps.get(1), caps.get(3)].into_iter().flatten() {
        value = apply_function(func.as_str(), &value)?;
    }
    Ok(value)
}

/// Render `template` against `task`. Nothing is executed here.
pub fn render(template: &str, task: &Task) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let end = body
            .find("}}")
            .ok_or(TemplateError::Unclosed(consumed + start))?;
        out.push_str(&eval_action(&body[..end], consumed + start, task)?);
        let advance = start + 2 + end + 2;
        consumed += advance;
        rest = &rest[advance..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Start `sh -c <command>` detached from the terminal. Only a failure to
/// start is reported; the exit status is never observed.
pub fn launch(command: &str) -> Result<()> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to execute command")?;
    tracing::debug!(pid = child.id(), %command, "custom command started");
    // Reap in the background so finished commands don't linger as zombies.
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}
