use std::io;
use std::time::Duration;

use crossterm::{
    event::{Event as CrosstermEvent, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::error::Result;

use super::app::{is_interrupt, Services};
use super::selector::SelectAction;
use super::ShellEvent;

struct TermGuard;

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

/// Show the profile menu on its own and return what the user picked.
pub async fn run_profile_popup(services: Services) -> Result<Option<SelectAction>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let _guard = TermGuard;
    terminal.clear()?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut selector = services.mount_selector(tx.clone());
    let mut chosen = None;

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        terminal.draw(|f| super::render::draw_popup(f, &selector))?;

        tokio::select! {
            _ = ticker.tick() => {
                selector.poll_loaded();
            }
            event = events.next() => match event {
                Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                    if is_interrupt(&key.code, key.modifiers) {
                        break;
                    }
                    selector.handle_key(key.code, key.modifiers).await;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }

        let mut close = false;
        let mut reload = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                ShellEvent::Close => close = true,
                ShellEvent::Reload => reload = true,
                ShellEvent::Selected(action) => chosen = Some(action),
            }
        }
        if reload {
            selector = services.mount_selector(tx.clone());
        } else if close {
            break;
        }
    }

    Ok(chosen)
}
