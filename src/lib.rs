pub mod clipboard;
pub mod config;
pub mod logging;
pub mod tracker;
pub mod tui;
