pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, ThemeColors};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};

/// Run the judging screen until the user quits. Returns the app so the caller
/// can tell whether the battle was finished and where the report went.
pub async fn run_tui(mut app: App) -> anyhow::Result<App> {
    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();
    let mut events = EventHandler::new(250);

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &app)) {
            break Err(anyhow::Error::from(e));
        }

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => app.update_flash(),
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result.map(|()| app)
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Quit works everywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,

            // Cell navigation
            KeyCode::Char('j') | KeyCode::Down => app.next_slot(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_slot(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => app.switch_contestant(true),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => app.switch_contestant(false),

            // Scoring
            KeyCode::Char(c @ '0'..='8') => {
                if let Some(digit) = c.to_digit(10) {
                    app.enter_digit(digit);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => app.step_focused(true),
            KeyCode::Char('-') => app.step_focused(false),
            KeyCode::Char('r') => app.toggle_response(),

            // Rounds
            KeyCode::Char('n') => app.next_round(),
            KeyCode::Char('p') => app.previous_round(),

            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::Results => match key.code {
            KeyCode::Char('q') | KeyCode::Enter => app.should_quit = true,
            KeyCode::Char('p') | KeyCode::Esc => app.previous_round(),
            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}
