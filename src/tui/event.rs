use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};

use super::command::CommandResult;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// A deferred command finished.
    Completed(CommandResult),
    Tick,
}

/// Next event: finished commands first, then terminal input, else a tick.
pub fn poll(tick_rate: Duration, completions: &mpsc::Receiver<CommandResult>) -> Result<AppEvent> {
    if let Ok(result) = completions.try_recv() {
        return Ok(AppEvent::Completed(result));
    }
    if event::poll(tick_rate)? {
        return Ok(match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Event::Mouse(mouse) => AppEvent::Mouse(mouse),
            Event::Resize(w, h) => AppEvent::Resize(w, h),
            _ => AppEvent::Tick,
        });
    }
    Ok(AppEvent::Tick)
}
