use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, Command, Pane};
use crate::audio::{AudioHandle, AudioPlayer};
use crate::catalog::FolderLoader;
use crate::config;
use crate::ui::{self, DrawnAreas};

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Regions of the last drawn frame, for mouse hits.
    pub areas: DrawnAreas,
}

/// What a key or mouse event asks the loop to do.
enum Action {
    None,
    Apply(Command),
    Quit,
}

/// Main terminal event loop: handles input, UI drawing and folder loads.
/// Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &mut AudioPlayer,
    loader: &FolderLoader,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Finished folder loads; stale ones are dropped by the app.
        while let Some(loaded) = loader.try_recv() {
            dispatch(app, audio_player, loader, loaded.into());
        }

        dispatch(app, audio_player, loader, Command::TimeUpdate);

        terminal.draw(|f| {
            state.areas = ui::draw(f, app, &settings.ui, &settings.controls, &settings.audio);
        })?;

        if event::poll(Duration::from_millis(50))? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(key, settings, app, &*audio_player, state)
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, settings, app, state),
                _ => Action::None,
            };
            match action {
                Action::None => {}
                Action::Apply(cmd) => dispatch(app, audio_player, loader, cmd),
                Action::Quit => {
                    audio_player
                        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply `cmd` and start any folder load it asks for.
fn dispatch(app: &mut App, audio: &mut impl AudioHandle, loader: &FolderLoader, cmd: Command) {
    if let Some(request) = app.apply(cmd, audio) {
        loader.request(request);
    }
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio: &impl AudioHandle,
    state: &mut EventLoopState,
) -> Action {
    if key.code != KeyCode::Char('g') {
        // g pending should clear on any other key
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.cursor_top();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.cursor_bottom(),
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Enter => {
            if let Some(cmd) = app.activate(settings.playback.autoplay_on_album_select) {
                return Action::Apply(cmd);
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => return Action::Apply(Command::TogglePlayPause),
        KeyCode::Char('l') => return Action::Apply(Command::Next),
        KeyCode::Char('h') => return Action::Apply(Command::Previous),
        KeyCode::Char('L') => {
            let secs = settings.controls.scrub_seconds.min(i64::MAX as u64) as i64;
            if let Some(cmd) = app.scrub(audio, secs) {
                return Action::Apply(cmd);
            }
        }
        KeyCode::Char('H') => {
            let secs = settings.controls.scrub_seconds.min(i64::MAX as u64) as i64;
            if let Some(cmd) = app.scrub(audio, -secs) {
                return Action::Apply(cmd);
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            return Action::Apply(Command::SetVolume(
                audio.volume() + settings.audio.volume_step,
            ));
        }
        KeyCode::Char('-') => {
            return Action::Apply(Command::SetVolume(
                audio.volume() - settings.audio.volume_step,
            ));
        }
        KeyCode::Char('m') => return Action::Apply(Command::ToggleMute),
        KeyCode::Char('r') => return Action::Apply(Command::ToggleLoop),
        KeyCode::Char('K') => app.toggle_album_window(),
        _ => {}
    }

    Action::None
}

fn handle_mouse_event(
    mouse: MouseEvent,
    settings: &config::Settings,
    app: &mut App,
    state: &EventLoopState,
) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {}
        MouseEventKind::ScrollDown => {
            app.move_cursor(1);
            return Action::None;
        }
        MouseEventKind::ScrollUp => {
            app.move_cursor(-1);
            return Action::None;
        }
        _ => return Action::None,
    }

    let (column, row) = (mouse.column, mouse.row);
    let areas = &state.areas;

    if row >= areas.seek_bar.y && row < areas.seek_bar.y + areas.seek_bar.height {
        if let Some(fraction) = ui::seek_fraction(areas.seek_bar, column) {
            debug!(fraction, "seek bar click");
            return Action::Apply(Command::Seek(fraction));
        }
    }

    if let Some(idx) = areas.albums.hit(column, row, app.albums.len()) {
        app.focus = Pane::Albums;
        app.album_cursor = idx;
        if let Some(cmd) = app.activate(settings.playback.autoplay_on_album_select) {
            return Action::Apply(cmd);
        }
    }

    if let Some(idx) = areas.tracks.hit(column, row, app.tracks.len()) {
        app.focus = Pane::Tracks;
        app.track_cursor = idx;
        return Action::Apply(Command::SelectTrack {
            index: idx,
            autoplay: true,
        });
    }

    Action::None
}
