//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

mod spectrum;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::player::PlayerStatus;
use crate::sources::{Track, display_from_fields, format_duration};

pub use spectrum::Spectrum;

const SPECTRUM_HEIGHT: u16 = 10;

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("/".to_string(), "search".to_string());
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "play selected song".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L and -/+ are filled dynamically from config.
    map.insert("v".to_string(), "visualizer".to_string());
    map.insert("K".to_string(), "metadata".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating seek and volume steps.
fn controls_text(controls: &ControlsSettings) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "/", "j/k", "h/l", "H/L", "-/+", "enter", "space/p", "gg/G", "v", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] seek -/+{}s", controls.seek_seconds)),
            "-/+" => Some(format!(
                "[-/+] volume -/+{}%",
                (controls.volume_step * 100.0).round()
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
/// A zero `total` means the length is not known yet.
fn now_playing_time_text(elapsed: Duration, total: Duration, ui: &UiSettings) -> Option<String> {
    let total = (!total.is_zero()).then_some(total);
    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_duration(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_duration(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_duration(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// The line under the header: the search box while typing, otherwise status.
fn status_line(app: &App) -> Line<'static> {
    if app.search_mode {
        return Line::from(vec![
            Span::raw("search: ").bold(),
            Span::raw(app.query.clone()),
            Span::raw("_").slow_blink(),
        ]);
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    if app.searching {
        spans.push(Span::raw("Searching...").yellow());
    } else if let Some(err) = &app.error {
        spans.push(Span::raw(err.clone()).red());
    } else if let Some(q) = &app.last_query {
        spans.push(Span::raw(format!("{} results for \"{}\"", app.tracks().len(), q)));
    } else {
        spans.push(Span::raw("Press / to search"));
    }
    spans.push(Span::raw(format!(
        " • source: {} • output: {}",
        app.source_name(),
        app.player.backend_name()
    )));
    Line::from(spans)
}

fn metadata_text(track: &Track) -> String {
    format!(
        "Title: {}\nArtist: {}\nDuration: {}\nId: {}\nStream: {}\nImage: {}",
        track.title,
        if track.artist_name.is_empty() { "-" } else { track.artist_name.as_str() },
        track.duration.map_or_else(|| "-".to_string(), format_duration),
        track.id,
        track.stream_url.as_deref().unwrap_or("-"),
        track.image_url.as_deref().unwrap_or("-"),
    )
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, controls_settings: &ControlsSettings) {
    let spectrum_height = if app.visualizer_enabled { SPECTRUM_HEIGHT } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(spectrum_height),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" audiowave ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Search / status box
    let status_par = Paragraph::new(status_line(app)).block(
        Block::bordered()
            .padding(Padding {
                left: 1,
                right: 0,
                top: 0,
                bottom: 0,
            })
            .title(if app.search_mode { " search (enter/esc) " } else { " status " }),
    );
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        let tracks = app.tracks();
        let playing = app.player.current_track().map(|_| app.player.state().current_track_index);

        // Center the selected item when possible by creating a visible window.
        // Only build ListItems for the visible window.
        let total = tracks.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let text = display_from_fields(track, &ui_settings.track_fields, &ui_settings.track_separator);
                if playing == Some(start + offset) {
                    ListItem::new(format!("♪ {text}")).style(Style::default().fg(Color::Cyan))
                } else {
                    ListItem::new(format!("  {text}"))
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Visualizer pane
    if app.visualizer_enabled {
        let block = Block::default().borders(Borders::ALL).title(" spectrum ");
        match &app.visualizer_note {
            Some(note) => {
                let note = Paragraph::new(note.as_str())
                    .alignment(Alignment::Center)
                    .dark_gray()
                    .block(block);
                frame.render_widget(note, chunks[3]);
            }
            None => frame.render_widget(Spectrum::new(app.visualizer.frame()).block(block), chunks[3]),
        }
    }

    // Now playing
    {
        let state = app.player.state();
        let label = match app.player.status() {
            PlayerStatus::Idle => "Stopped",
            PlayerStatus::Loaded => "Ready",
            PlayerStatus::Playing => "Playing",
            PlayerStatus::Paused => "Paused",
        };
        let song = app
            .player
            .current_track()
            .map(|t| display_from_fields(t, &ui_settings.track_fields, &ui_settings.track_separator))
            .unwrap_or_else(|| "-".to_string());
        let time = now_playing_time_text(state.current_time, state.duration, ui_settings).unwrap_or_default();
        let ratio = if state.duration.is_zero() {
            0.0
        } else {
            (state.current_time.as_secs_f64() / state.duration.as_secs_f64()).clamp(0.0, 1.0)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" now playing • vol {:.0}% ", state.volume * 100.0));
        let inner = block.inner(chunks[4]);
        frame.render_widget(block, chunks[4]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);
        let title = Paragraph::new(Line::from(vec![
            Span::raw(format!(" {label}: ")).bold(),
            Span::raw(song),
        ]));
        frame.render_widget(title, rows[0]);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(ratio)
            .label(time);
        frame.render_widget(gauge, rows[1]);
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        // Keep the popup inside the list area so it doesn't cover header/status/footer.
        let list_area = chunks[2];
        let popup_area = centered_rect_sized(72, 9, list_area);
        frame.render_widget(Clear, popup_area);

        let meta = app
            .selected_track()
            .map_or_else(|| "No track selected".to_string(), metadata_text);
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer_text = controls_text(controls_settings);
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

    frame.render_widget(footer, chunks[5]);
}
