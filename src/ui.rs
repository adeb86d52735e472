//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`, plus the
//! geometry helpers the event loop uses to map mouse clicks back onto it.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, Pane, PlayerState};
use crate::config::{AudioSettings, ControlsSettings, UiSettings};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("tab".to_string(), "albums/tracks".to_string());
    map.insert("enter".to_string(), "open album / play track".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L and +/- are filled dynamically from config.
    map.insert("m".to_string(), "mute".to_string());
    map.insert("r".to_string(), "loop".to_string());
    map.insert("K".to_string(), "album details".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds and volume step.
fn controls_text(scrub_seconds: u64, volume_step: f32) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "tab", "enter", "space/p", "h/l", "H/L", "+/-", "m", "r", "gg/G", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] scrub -/+{}s", scrub_seconds)),
            "+/-" => Some(format!(
                "[+/-] volume ±{}%",
                (volume_step * 100.0).round() as i32
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Where a scrollable list was drawn, and which entry sits on its first row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListArea {
    pub area: Rect,
    pub start: usize,
}

impl ListArea {
    /// The list index under terminal cell (`column`, `row`), if any.
    pub fn hit(&self, column: u16, row: u16, total: usize) -> Option<usize> {
        if !contains(self.area, column, row) {
            return None;
        }
        let idx = self.start + (row - self.area.y) as usize;
        (idx < total).then_some(idx)
    }
}

/// Screen regions the event loop needs for mouse handling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawnAreas {
    pub albums: ListArea,
    pub tracks: ListArea,
    pub seek_bar: Rect,
}

fn contains(r: Rect, column: u16, row: u16) -> bool {
    column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
}

/// Map a click at `column` on the seek bar to a fraction of its width.
pub fn seek_fraction(bar: Rect, column: u16) -> Option<f64> {
    if bar.width == 0 || column < bar.x || column >= bar.x + bar.width {
        return None;
    }
    Some((column - bar.x) as f64 / bar.width as f64)
}

/// Visible window `(start, end, selected_in_window)` that keeps `selected`
/// centered when possible.
pub fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    let selected = selected.min(total.saturating_sub(1));
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn pane_block(title: &'static str, focused: bool) -> Block<'static> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().add_modifier(Modifier::BOLD))
    } else {
        block.border_style(Style::default().add_modifier(Modifier::DIM))
    }
}

/// Render a list of one-line items into `area`, centered on `selected`.
fn draw_list(
    frame: &mut Frame,
    area: Rect,
    block: Block<'static>,
    rows: &[String],
    selected: usize,
    marked: Option<usize>,
) -> ListArea {
    let inner = block.inner(area);
    let (start, end, selected_pos) = visible_window(rows.len(), inner.height as usize, selected);

    // Only build ListItems for the visible window.
    let items: Vec<ListItem> = rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let item = ListItem::new(row.as_str());
            if marked == Some(start + offset) {
                item.style(Style::default().fg(Color::Cyan))
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(selected_pos));
    }
    frame.render_stateful_widget(list, area, &mut state);

    ListArea { area: inner, start }
}

fn state_glyph(state: PlayerState) -> &'static str {
    match state {
        PlayerState::Idle => "■",
        PlayerState::Paused => "⏸",
        PlayerState::Playing => "▶",
    }
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
    audio_settings: &AudioSettings,
) -> DrawnAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(6),
            Constraint::Length(4),
        ])
        .split(frame.area());
    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" lenify ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    // Album cards
    let album_rows: Vec<String> = app
        .albums
        .iter()
        .map(|a| {
            if a.info.description.trim().is_empty() {
                a.info.title.clone()
            } else {
                format!("{} · {}", a.info.title, a.info.description)
            }
        })
        .collect();
    let open_album = app
        .current_folder
        .as_deref()
        .and_then(|f| app.albums.iter().position(|a| a.folder == f));
    let albums = draw_list(
        frame,
        panes[0],
        pane_block(" albums ", app.focus == Pane::Albums),
        &album_rows,
        app.album_cursor,
        open_album,
    );

    // Track list
    let track_title = if app.loading() {
        " tracks (loading…) "
    } else {
        " tracks "
    };
    let track_rows: Vec<String> = app.tracks.iter().map(|t| t.title.clone()).collect();
    let tracks = draw_list(
        frame,
        panes[1],
        pane_block(track_title, app.focus == Pane::Tracks),
        &track_rows,
        app.track_cursor,
        app.current_track,
    );

    // Now playing
    let now_block = Block::bordered()
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
        .title(" now playing ");
    let now_inner = now_block.inner(chunks[2]);
    frame.render_widget(now_block, chunks[2]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(now_inner);

    let title = app.current_title().unwrap_or("-");
    let folder = app.current_folder.as_deref().unwrap_or("-");
    frame.render_widget(
        Paragraph::new(format!("{} {}  [{}]", state_glyph(app.state), title, folder)).bold(),
        rows[0],
    );

    let seek_bar = rows[1];
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(app.progress.clamp(0.0, 1.0))
        .label(app.time_text.as_str());
    frame.render_widget(gauge, seek_bar);

    let volume = format!(
        "{} {:>3}%   loop: {}",
        app.volume_icon().glyph(),
        (app.volume * 100.0).round() as i32,
        if app.looping { "on" } else { "off" }
    );
    frame.render_widget(Paragraph::new(volume), rows[2]);

    if let Some(err) = &app.error {
        frame.render_widget(Paragraph::new(err.as_str()).fg(Color::Red), rows[3]);
    }

    // Overlay album popup (keeps the lists visible under it)
    if app.album_window {
        let popup_area = centered_rect_sized(72, 8, chunks[1]);
        frame.render_widget(Clear, popup_area);

        let details = match app.selected_album() {
            Some(album) => format!(
                "Folder: {}\nTitle: {}\nDescription: {}\nCover: {}",
                album.folder,
                album.info.title,
                if album.info.description.is_empty() {
                    "-"
                } else {
                    album.info.description.as_str()
                },
                album.cover_url.as_deref().unwrap_or("-"),
            ),
            None => "No album selected".to_string(),
        };
        let details_paragraph = Paragraph::new(details)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" album (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(details_paragraph, popup_area);
    }

    if let Some(n) = &app.notification {
        let width = n.text.chars().count() as u16 + 4;
        let popup_area = centered_rect_sized(width, 3, chunks[1]);
        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(n.text.as_str())
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            popup_area,
        );
    }

    let footer_text = controls_text(controls_settings.scrub_seconds, audio_settings.volume_step);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);

    DrawnAreas {
        albums,
        tracks,
        seek_bar,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use ratatui::{Terminal, backend::TestBackend, layout::Rect};

    use super::*;
    use crate::catalog::{Album, FolderInfo};
    use crate::config::Settings;

    fn rendered(app: &App) -> (String, DrawnAreas) {
        let settings = Settings::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut areas = DrawnAreas::default();
        terminal
            .draw(|f| {
                areas = draw(f, app, &settings.ui, &settings.controls, &settings.audio);
            })
            .unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (text, areas)
    }

    #[test]
    fn seek_fraction_is_relative_to_bar() {
        let bar = Rect::new(10, 5, 40, 1);
        assert_eq!(seek_fraction(bar, 10), Some(0.0));
        assert_eq!(seek_fraction(bar, 20), Some(0.25));
        assert_eq!(seek_fraction(bar, 49), Some(39.0 / 40.0));
        assert_eq!(seek_fraction(bar, 9), None);
        assert_eq!(seek_fraction(bar, 50), None);
        assert_eq!(seek_fraction(Rect::new(0, 0, 0, 1), 0), None);
    }

    #[test]
    fn window_centers_selection() {
        assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
        assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
        assert_eq!(visible_window(100, 10, 99), (90, 100, 9));
        assert_eq!(visible_window(0, 10, 0), (0, 0, 0));
    }

    #[test]
    fn list_hit_maps_rows_to_indices() {
        let list = ListArea {
            area: Rect::new(1, 4, 20, 5),
            start: 10,
        };
        assert_eq!(list.hit(3, 4, 30), Some(10));
        assert_eq!(list.hit(3, 8, 30), Some(14));
        assert_eq!(list.hit(3, 8, 12), None);
        assert_eq!(list.hit(0, 5, 30), None);
    }

    #[test]
    fn draws_albums_time_and_notification() {
        let albums = vec![Album {
            folder: "ncs".into(),
            info: FolderInfo {
                title: "No Copyright Sounds".into(),
                description: "free beats".into(),
            },
            cover_url: None,
        }];
        let mut app = App::new(albums, &Settings::default());
        app.notify("Loop on", Instant::now());

        let (text, areas) = rendered(&app);
        assert!(text.contains("No Copyright Sounds · free beats"));
        assert!(text.contains("00:00 / 00:00"));
        assert!(text.contains("Loop on"));
        assert!(areas.seek_bar.width > 0);
        assert_eq!(areas.albums.hit(areas.albums.area.x, areas.albums.area.y, 1), Some(0));
    }
}
