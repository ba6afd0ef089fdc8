//! Full-screen ratatui chat interface.

pub mod app;
pub mod chat;
pub mod event;
pub mod ideas;
pub mod input;
pub mod list;
pub mod selector;
pub mod settings;
pub mod theme;

pub use app::TuiApp;
pub use chat::{ChatScreen, ClientFactory};
pub use event::run_tui;
