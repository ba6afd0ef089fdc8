//! Async event loop for the TUI: terminal input and chat stream events, plus a spinner tick.

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use proto::ChatEvent;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::debug;

use super::app::TuiApp;

/// RAII guard that restores the terminal on drop (even on panic).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Next event from the chat listener; pending forever while there is none.
async fn recv_chat(rx: &mut Option<mpsc::UnboundedReceiver<ChatEvent>>) -> Option<ChatEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Run the full-screen TUI until the user quits.
pub async fn run_tui(mut app: TuiApp) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard; // Drop restores terminal

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    debug!(route = ?app.route(), "TUI started");

    // Crossterm event stream (async)
    let mut crossterm_stream = EventStream::new();
    // Fragment listener; appears once the credential gate first passes.
    let mut chat_rx: Option<mpsc::UnboundedReceiver<ChatEvent>> = app.take_subscription();

    // Spinner tick interval (100ms)
    let mut spinner_interval = tokio::time::interval(std::time::Duration::from_millis(100));
    spinner_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        // Render (also runs the credential gate)
        terminal.draw(|frame| app.render(frame))?;
        if chat_rx.is_none() {
            chat_rx = app.take_subscription();
        }

        tokio::select! {
            // Branch 1: crossterm terminal events
            maybe_event = crossterm_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.handle_key(key);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Terminal event error: {e}");
                    }
                    None => break,
                }
            }

            // Branch 2: streamed chat events, applied in delivery order
            maybe_chat = recv_chat(&mut chat_rx) => {
                match maybe_chat {
                    Some(event) => app.on_chat_event(event),
                    None => {
                        debug!("Chat listener closed");
                        chat_rx = None;
                    }
                }
            }

            _ = spinner_interval.tick(), if app.is_streaming() => {
                app.tick();
            }
        }

        if app.should_quit() {
            break;
        }
    }

    debug!("TUI exiting");
    // TerminalGuard::drop handles cleanup
    Ok(())
}
