use super::*;
use crate::audio::fake::{FakeBackend, FakeState};
use crate::audio::{MediaEvent, SignalTap};
use crate::config::VisualizerSettings;
use crate::player::{Player, PlayerStatus};
use crate::sources::{SearchOutcome, SearchWorker, SourceError, Track, TrackSource};
use crate::visualizer::{FrameScheduler, Visualizer};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Answer = Box<dyn Fn(&str) -> Result<Vec<Track>, SourceError> + Send + Sync>;

struct Stub(Answer);

impl TrackSource for Stub {
    fn name(&self) -> &'static str {
        "Stub"
    }
    fn cap(&self) -> usize {
        20
    }
    fn search(&self, query: &str) -> Result<Vec<Track>, SourceError> {
        (self.0)(query)
    }
}

fn t(i: usize) -> Track {
    Track {
        id: format!("t{i}"),
        title: format!("Song {i}"),
        artist_name: "Band".into(),
        image_url: None,
        stream_url: Some(format!("https://cdn.example/{i}.mp3")),
        duration: Some(Duration::from_secs(180)),
    }
}

fn twenty(_q: &str) -> Result<Vec<Track>, SourceError> {
    Ok((0..20).map(t).collect())
}

fn app_with(answer: Answer, tap: Option<SignalTap>) -> (App, Arc<Mutex<FakeState>>) {
    let (backend, state) = match tap {
        Some(tap) => FakeBackend::with_tap(tap),
        None => FakeBackend::new(),
    };
    let player = Player::new(Box::new(backend), 0.7);
    let visualizer = Visualizer::new(&VisualizerSettings::default()).unwrap();
    let worker = SearchWorker::spawn(Box::new(Stub(answer)));
    (App::new(player, visualizer, FrameScheduler::new(60), worker), state)
}

fn searched(answer: Answer, tap: Option<SignalTap>) -> (App, Arc<Mutex<FakeState>>) {
    let (mut app, state) = app_with(answer, tap);
    assert!(app.begin_search("popular music 2024"));
    app.wait_for_search(Duration::from_secs(5));
    (app, state)
}

#[test]
fn search_loads_first_result_without_playing() {
    let (mut app, state) = app_with(Box::new(twenty), None);
    assert!(app.begin_search("popular music 2024"));
    assert!(app.searching);
    assert!(!app.begin_search("another"), "in-flight search gates resubmission");

    app.wait_for_search(Duration::from_secs(5));
    assert!(!app.searching);
    assert_eq!(app.tracks().len(), 20);
    assert_eq!(app.player.state().current_track_index, 0);
    assert_eq!(app.player.status(), PlayerStatus::Loaded);
    assert!(!app.player.state().is_playing);
    assert_eq!(state.lock().unwrap().calls, vec!["load:t0"]);
    assert_eq!(app.last_query.as_deref(), Some("popular music 2024"));
}

#[test]
fn upstream_error_empties_list_and_shows_message() {
    let (app, _state) = searched(
        Box::new(|_| {
            Err(SourceError::Upstream {
                service: "YouTube",
                message: "quota exceeded".into(),
            })
        }),
        None,
    );
    assert!(app.tracks().is_empty());
    assert!(!app.searching);
    assert_eq!(app.error.as_deref(), Some("YouTube API error: quota exceeded"));
    assert_eq!(app.player.status(), PlayerStatus::Idle);
}

#[test]
fn blank_queries_are_ignored() {
    let (mut app, _state) = app_with(Box::new(twenty), None);
    assert!(!app.begin_search("   "));
    assert!(!app.searching);

    app.query = "  ".into();
    app.enter_search_mode();
    assert!(!app.submit_query());
    assert!(!app.search_mode);
}

#[test]
fn query_is_passed_to_the_source_trimmed() {
    let (mut app, _state) = app_with(
        Box::new(|q| {
            let mut track = t(0);
            track.title = q.to_string();
            Ok(vec![track])
        }),
        None,
    );
    app.query = "  lofi  ".into();
    assert!(app.submit_query());
    app.wait_for_search(Duration::from_secs(5));
    assert_eq!(app.tracks()[0].title, "lofi");
}

#[test]
fn stale_outcomes_are_dropped() {
    let (mut app, _state) = app_with(Box::new(twenty), None);
    app.apply_search_outcome(SearchOutcome {
        ticket: 99,
        query: "old".into(),
        result: Ok(vec![t(1)]),
    });
    assert!(app.tracks().is_empty());
    assert!(app.last_query.is_none());
}

#[test]
fn cursor_wraps_both_ways() {
    let (mut app, _state) = searched(Box::new(twenty), None);
    app.prev();
    assert_eq!(app.selected, 19);
    app.next();
    assert_eq!(app.selected, 0);
    app.select_last();
    assert_eq!(app.selected, 19);
    app.select_first();
    assert_eq!(app.selected, 0);
}

#[test]
fn cursor_follows_playback_after_track_change() {
    let (mut app, state) = searched(Box::new(twenty), None);
    let now = Instant::now();
    app.selected = 4;
    app.play_selected();
    app.tick(now);
    assert_eq!(app.player.state().current_track_index, 4);

    state.lock().unwrap().emit(MediaEvent::Ended);
    app.tick(now);
    assert_eq!(app.player.state().current_track_index, 5);
    assert_eq!(app.selected, 5);
}

#[test]
fn visualizer_runs_only_while_playing() {
    let tap = SignalTap::new();
    let (mut app, _state) = searched(Box::new(twenty), Some(tap.clone()));
    let now = Instant::now();

    app.tick(now);
    assert!(tap.is_attached());
    assert_eq!(app.scheduler.live(), 0);

    app.toggle_playback();
    app.tick(now);
    assert!(app.visualizer.is_active());
    assert_eq!(app.scheduler.live(), 1);
    assert!(app.run_frames(now));
    assert_eq!(app.scheduler.live(), 1);

    app.toggle_playback();
    app.tick(now);
    assert!(!app.visualizer.is_active());
    assert_eq!(app.scheduler.live(), 0);
    assert_eq!(app.poll_timeout(now), Duration::from_millis(200));
}

#[test]
fn switching_tracks_keeps_a_single_frame_callback() {
    let tap = SignalTap::new();
    let (mut app, _state) = searched(Box::new(twenty), Some(tap.clone()));
    let now = Instant::now();

    app.play_selected();
    app.tick(now);
    for _ in 0..3 {
        app.next_track();
        app.tick(now);
        assert_eq!(app.scheduler.live(), 1);
        assert!(tap.is_attached());
    }
}

#[test]
fn toggling_visualizer_off_stops_frames() {
    let tap = SignalTap::new();
    let (mut app, _state) = searched(Box::new(twenty), Some(tap));
    let now = Instant::now();
    app.play_selected();
    app.tick(now);
    assert_eq!(app.scheduler.live(), 1);

    app.toggle_visualizer(now);
    assert_eq!(app.scheduler.live(), 0);
    app.toggle_visualizer(now);
    assert_eq!(app.scheduler.live(), 1);
}

#[test]
fn unavailable_signal_degrades_to_no_visualization() {
    let tap = SignalTap::new();
    tap.close();
    let (mut app, _state) = searched(Box::new(twenty), Some(tap));
    let now = Instant::now();
    app.play_selected();
    app.tick(now);

    assert!(app.player.state().is_playing);
    assert!(app.visualizer_note.is_some());
    assert_eq!(app.scheduler.live(), 0);
}

#[test]
fn playback_errors_surface_in_the_status() {
    let (mut app, state) = searched(Box::new(twenty), None);
    state.lock().unwrap().fail_play = true;
    app.toggle_playback();
    app.tick(Instant::now());
    assert_eq!(app.player.status(), PlayerStatus::Paused);
    assert_eq!(app.error.as_deref(), Some("no audio output device"));
}

#[test]
fn volume_steps_are_clamped() {
    let (mut app, _state) = app_with(Box::new(twenty), None);
    for _ in 0..10 {
        app.change_volume(0.05);
    }
    assert_eq!(app.player.state().volume, 1.0);
    app.change_volume(-0.25);
    assert!((app.player.state().volume - 0.75).abs() < 1e-6);
}
