use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use super::models::{NewTask, Task, TaskPatch};

/// The external issue tracker. Implementations must be shareable across the
/// worker threads that execute deferred commands.
pub trait Tracker: Send + Sync {
    fn list(&self) -> Result<Vec<Task>>;
    fn create(&self, task: &NewTask) -> Result<String>;
    fn update(&self, id: &str, patch: &TaskPatch) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
}

/// Tracker backed by the `bd` command-line tool.
#[derive(Debug, Clone)]
pub struct BdClient {
    program: String,
    workdir: Option<PathBuf>,
}

impl BdClient {
    pub fn new(program: impl Into<String>) -> Self {
        BdClient {
            program: program.into(),
            workdir: None,
        }
    }

    #[must_use]
    pub fn with_workdir(mut self, dir: PathBuf) -> Self {
        self.workdir = Some(dir);
        self
    }

    fn run(&self, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(ref dir) = self.workdir {
            cmd.current_dir(dir);
        }
        tracing::debug!(program = %self.program, ?args, "running tracker command");
        let output = cmd
            .output()
            .with_context(|| format!("failed to run {}", self.program))?;
        if !output.status.success() {
            bail!(
                "{} {} failed: {}",
                self.program,
                args.first().map_or("", String::as_str),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Translate the set fields of a patch into `bd update` flags.
pub fn update_args(id: &str, patch: &TaskPatch) -> Vec<String> {
    let mut args = vec!["update".to_string(), id.to_string()];
    if let Some(ref title) = patch.title {
        args.extend(["--title".into(), title.clone()]);
    }
    if let Some(status) = patch.status {
        args.extend(["--status".into(), status.as_str().into()]);
    }
    if let Some(priority) = patch.priority {
        args.extend(["--priority".into(), priority.to_string()]);
    }
    if let Some(ref issue_type) = patch.issue_type {
        args.extend(["--type".into(), issue_type.clone()]);
    }
    if let Some(ref description) = patch.description {
        args.extend(["--description".into(), description.clone()]);
    }
    if let Some(ref notes) = patch.notes {
        args.extend(["--notes".into(), notes.clone()]);
    }
    args
}

pub fn create_args(task: &NewTask) -> Vec<String> {
    let mut args = vec!["create".to_string(), task.title.clone()];
    if !task.description.is_empty() {
        args.extend(["--description".into(), task.description.clone()]);
    }
    args.extend([
        "--priority".into(),
        task.priority.to_string(),
        "--type".into(),
        task.issue_type.clone(),
        "--json".into(),
    ]);
    args
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

impl Tracker for BdClient {
    fn list(&self) -> Result<Vec<Task>> {
        let out = self.run(&["list".into(), "--json".into(), "--all".into()])?;
        if out.trim().is_empty() {
            return Ok(vec![]);
        }
        serde_json::from_str(&out).context("failed to parse bd list output")
    }

    fn create(&self, task: &NewTask) -> Result<String> {
        let out = self.run(&create_args(task))?;
        let created: Created =
            serde_json::from_str(&out).context("failed to parse bd create output")?;
        Ok(created.id)
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.run(&update_args(id, patch))?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.run(&["delete".into(), id.to_string(), "--force".into()])?;
        Ok(())
    }
}
