pub mod events;
pub mod state;
pub mod ui;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::debug;
use ratatui::DefaultTerminal;

use crate::portal::Portal;
use crate::terminal::state::{Action, AppState};

/// Interactive client. The portal should already have tried `restore()`.
pub fn run_tui(portal: &mut Portal) -> Result<()> {
    let mut state = AppState::new(portal.imap_defaults());
    state.dashboard.sync(portal.emails());

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut state, portal);
    ratatui::restore();

    result
}

fn run(terminal: &mut DefaultTerminal, state: &mut AppState, portal: &mut Portal) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, state, portal))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let Some(action) = events::handle_key(key, state, portal) else {
            continue;
        };
        debug!("action {action:?}");
        if action == Action::Quit {
            return Ok(());
        }

        // requests block the loop; show the loading labels before sending
        if let Some(task) = action.task() {
            portal.mark_loading(task);
            terminal.draw(|f| ui::render(f, state, portal))?;
        }
        events::apply(action, state, portal);
    }
}
