pub mod app;
pub mod command;
pub mod custom_command;
pub mod editor;
pub mod event;
pub mod form;
pub mod keymap;
pub mod markdown;
pub mod modal;
pub mod panel;
pub mod theme;
mod ui;

use std::io::stdout;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

use crate::clipboard::SystemClipboard;
use crate::config::Config;
use crate::tracker::Tracker;

pub fn run(config: &Config, tracker: Arc<dyn Tracker>) -> Result<()> {
    let (executor, completions) = command::Executor::new(
        tracker,
        Arc::new(SystemClipboard),
        config.resolve_editor(),
    );

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let mut app = app::App::new(config);
    let result = app.run(&mut terminal, &executor, &completions);
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}
