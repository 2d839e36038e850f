pub mod app;
pub mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use taskger_core::{HttpTaskRepository, ViewEvent, ViewModel};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::tui::app::App;

const TICK: Duration = Duration::from_millis(250);

pub async fn run(base_url: String) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let (tx, rx) = mpsc::unbounded_channel();
    let repo = HttpTaskRepository::new(base_url);
    let mut app = App::new(ViewModel::new(repo, tx));

    let res = run_app(&mut terminal, &mut app, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut completions: UnboundedReceiver<ViewEvent>,
) -> Result<()>
where
    <B as Backend>::Error: Send + Sync + 'static,
{
    app.vm.refresh();
    let mut input = EventStream::new();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            maybe_event = input.next() => {
                if let Some(event) = maybe_event {
                    if let Event::Key(key) = event? {
                        if key.kind == KeyEventKind::Press {
                            app.on_key(key);
                        }
                    }
                }
            }
            Some(completion) = completions.recv() => {
                app.vm.handle(completion);
            }
            _ = tokio::time::sleep(TICK) => {}
        }

        app.vm.tick(Instant::now());
        app.reconcile();

        if app.should_quit {
            return Ok(());
        }
    }
}
