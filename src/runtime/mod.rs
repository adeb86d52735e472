use std::env;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::catalog::FolderLoader;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let location = env::args().nth(1);
    let settings = settings::settings_for(location.as_deref());

    let log_file = logging::init(&settings.log);
    info!(version = env!("CARGO_PKG_VERSION"), log_file = ?log_file, "starting");

    // Without a catalog there is nothing to show; fail before touching the terminal.
    let boot = startup::load_catalog(&settings).map_err(|e| {
        error!(error = %e, "cannot load catalog");
        e
    })?;

    let mut audio_player = AudioPlayer::new(boot.fetcher.clone(), &settings.audio);
    let loader = FolderLoader::spawn(boot.source.clone());
    let mut app = App::new(boot.albums, &settings);

    startup::apply_playback_defaults(&mut app, &mut audio_player, &loader, &settings);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();

        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut audio_player,
            &loader,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    info!("bye");
    run_result
}
