use std::time::Instant;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What the loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Main terminal event loop: media events, search results, animation frames,
/// drawing and input. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();
        app.tick(now);
        app.run_frames(now);

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, state, Instant::now()) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

pub fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
    now: Instant,
) -> Flow {
    if app.search_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.exit_search_mode(),
            KeyCode::Backspace => app.pop_query_char(),
            KeyCode::Enter => {
                app.submit_query();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit;
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_query_char(c);
                }
            }
            _ => {}
        }
        return Flow::Continue;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let seek = settings.controls.seek_seconds.min(i64::MAX as u64) as i64;
    let step = settings.controls.volume_step;

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Char('/') => app.enter_search_mode(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback = false;
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback = false;
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback = false;
            app.prev();
        }
        KeyCode::Enter => {
            if app.has_tracks() {
                app.play_selected();
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('l') => app.next_track(),
        KeyCode::Char('h') => app.previous_track(),
        KeyCode::Char('L') => app.player.seek_by(seek),
        KeyCode::Char('H') => app.player.seek_by(-seek),
        KeyCode::Char('-') => app.change_volume(-step),
        KeyCode::Char('+') | KeyCode::Char('=') => app.change_volume(step),
        KeyCode::Char('v') => app.toggle_visualizer(now),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::audio::fake::FakeBackend;
    use crate::config::{Settings, VisualizerSettings};
    use crate::player::Player;
    use crate::sources::{CatalogSource, SearchWorker, builtin};
    use crate::visualizer::{FrameScheduler, Visualizer};
    use std::time::Duration;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_app() -> (App, std::sync::Arc<std::sync::Mutex<crate::audio::fake::FakeState>>) {
        let (backend, state) = FakeBackend::new();
        let player = Player::new(Box::new(backend), 0.7);
        let visualizer = Visualizer::new(&VisualizerSettings::default()).unwrap();
        let search = SearchWorker::spawn(Box::new(CatalogSource::new(builtin())));
        let mut app = App::new(player, visualizer, FrameScheduler::new(60), search);
        app.begin_search("a");
        app.wait_for_search(Duration::from_secs(5));
        (app, state)
    }

    #[test]
    fn gg_needs_two_presses_and_g_g_jumps_to_top() {
        let settings = Settings::default();
        let (mut app, _) = loaded_app();
        let mut st = EventLoopState::new();
        let now = Instant::now();

        handle_key_event(press(KeyCode::Char('G')), &settings, &mut app, &mut st, now);
        let last = app.tracks().len() - 1;
        assert_eq!(app.selected, last);

        handle_key_event(press(KeyCode::Char('g')), &settings, &mut app, &mut st, now);
        assert_eq!(app.selected, last);
        assert!(st.pending_gg);

        handle_key_event(press(KeyCode::Char('j')), &settings, &mut app, &mut st, now);
        assert!(!st.pending_gg);

        handle_key_event(press(KeyCode::Char('g')), &settings, &mut app, &mut st, now);
        handle_key_event(press(KeyCode::Char('g')), &settings, &mut app, &mut st, now);
        assert_eq!(app.selected, 0);
        assert!(!app.follow_playback);
    }

    #[test]
    fn search_mode_captures_keys_until_enter() {
        let settings = Settings::default();
        let (mut app, _) = loaded_app();
        let mut st = EventLoopState::new();
        let now = Instant::now();

        handle_key_event(press(KeyCode::Char('/')), &settings, &mut app, &mut st, now);
        assert!(app.search_mode);
        for c in "ocean".chars() {
            handle_key_event(press(KeyCode::Char(c)), &settings, &mut app, &mut st, now);
        }
        // `q` is text while searching.
        assert_eq!(
            handle_key_event(press(KeyCode::Char('q')), &settings, &mut app, &mut st, now),
            Flow::Continue
        );
        handle_key_event(press(KeyCode::Backspace), &settings, &mut app, &mut st, now);
        assert_eq!(app.query, "ocean");

        handle_key_event(press(KeyCode::Enter), &settings, &mut app, &mut st, now);
        app.wait_for_search(Duration::from_secs(5));
        assert!(!app.search_mode);
        assert_eq!(app.tracks().len(), 1);
        assert_eq!(app.tracks()[0].title, "Ocean Waves");
    }

    #[test]
    fn playback_keys_drive_the_player() {
        let settings = Settings::default();
        let (mut app, fake) = loaded_app();
        let mut st = EventLoopState::new();
        let now = Instant::now();

        handle_key_event(press(KeyCode::Char(' ')), &settings, &mut app, &mut st, now);
        assert!(app.player.state().is_playing);
        handle_key_event(press(KeyCode::Char('l')), &settings, &mut app, &mut st, now);
        assert_eq!(app.player.state().current_track_index, 1);
        handle_key_event(press(KeyCode::Char('h')), &settings, &mut app, &mut st, now);
        handle_key_event(press(KeyCode::Char('h')), &settings, &mut app, &mut st, now);
        assert_eq!(
            app.player.state().current_track_index,
            app.tracks().len() - 1
        );
        handle_key_event(press(KeyCode::Char('p')), &settings, &mut app, &mut st, now);
        assert!(!app.player.state().is_playing);

        handle_key_event(press(KeyCode::Char('-')), &settings, &mut app, &mut st, now);
        assert!((app.player.state().volume - 0.65).abs() < 1e-6);
        handle_key_event(press(KeyCode::Char('=')), &settings, &mut app, &mut st, now);
        assert!((app.player.state().volume - 0.7).abs() < 1e-6);

        let calls = fake.lock().unwrap().calls.clone();
        assert!(calls.contains(&"play".to_string()));
        assert!(calls.contains(&"pause".to_string()));
    }

    #[test]
    fn q_quits_and_toggles_flip_flags() {
        let settings = Settings::default();
        let (mut app, _) = loaded_app();
        let mut st = EventLoopState::new();
        let now = Instant::now();

        handle_key_event(press(KeyCode::Char('K')), &settings, &mut app, &mut st, now);
        assert!(app.metadata_window);
        handle_key_event(press(KeyCode::Char('v')), &settings, &mut app, &mut st, now);
        assert!(!app.visualizer_enabled);
        assert_eq!(
            handle_key_event(press(KeyCode::Char('q')), &settings, &mut app, &mut st, now),
            Flow::Quit
        );
    }
}
