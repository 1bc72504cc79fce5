use super::*;
use crate::audio::fake::{FakeBackend, FakeState};
use crate::audio::{MediaEvent, SignalTap};
use crate::sources::Track;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            id: format!("t{i}"),
            title: format!("Track {i}"),
            artist_name: "Artist".into(),
            image_url: None,
            stream_url: Some(format!("https://cdn.example/{i}.mp3")),
            duration: Some(Duration::from_secs(100)),
        })
        .collect()
}

fn player() -> (Player, Arc<Mutex<FakeState>>) {
    let (backend, state) = FakeBackend::new();
    (Player::new(Box::new(backend), 0.7), state)
}

fn calls(state: &Arc<Mutex<FakeState>>) -> Vec<String> {
    state.lock().unwrap().calls.clone()
}

fn emit(state: &Arc<Mutex<FakeState>>, event: MediaEvent) -> bool {
    state.lock().unwrap().emit(event)
}

#[test]
fn replace_tracks_loads_first_without_playing() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(20));

    assert_eq!(p.tracks().len(), 20);
    assert_eq!(p.state().current_track_index, 0);
    assert_eq!(p.status(), PlayerStatus::Loaded);
    assert!(!p.state().is_playing);
    assert_eq!(p.state().duration, Duration::from_secs(100));
    assert_eq!(calls(&state), vec!["load:t0"]);
}

#[test]
fn empty_list_is_idle() {
    let (mut p, _state) = player();
    p.replace_tracks(tracks(3));
    p.replace_tracks(Vec::new());

    assert_eq!(p.status(), PlayerStatus::Idle);
    assert!(p.current_track().is_none());
    assert!(p.signal().is_none());

    p.play();
    p.next();
    p.previous();
    assert_eq!(p.status(), PlayerStatus::Idle);
}

#[test]
fn next_wraps_to_first_and_autoplays() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(3));
    p.select(2);
    p.next();

    assert_eq!(p.state().current_track_index, 0);
    assert_eq!(p.status(), PlayerStatus::Playing);
    assert_eq!(calls(&state).last().map(String::as_str), Some("play"));
}

#[test]
fn previous_wraps_to_last() {
    let (mut p, _state) = player();
    p.replace_tracks(tracks(3));
    p.previous();
    assert_eq!(p.state().current_track_index, 2);
    assert!(p.state().is_playing);
}

#[test]
fn next_then_previous_returns_to_start_for_any_length() {
    for n in 1..6 {
        for start in 0..n {
            let (mut p, _state) = player();
            p.replace_tracks(tracks(n));
            p.select(start);
            p.next();
            p.previous();
            assert_eq!(p.state().current_track_index, start, "n={n} start={start}");
        }
    }
}

#[test]
fn toggle_flips_between_playing_and_paused() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(2));
    p.toggle();
    assert_eq!(p.status(), PlayerStatus::Playing);
    p.toggle();
    assert_eq!(p.status(), PlayerStatus::Paused);
    assert!(!p.state().is_playing);
    assert_eq!(calls(&state), vec!["load:t0", "play", "pause"]);
}

#[test]
fn volume_round_trips_and_clamps() {
    let (mut p, state) = player();
    p.set_volume(0.01);
    assert_eq!(p.state().volume, 0.01);
    assert_eq!(state.lock().unwrap().volume, 0.01);

    p.set_volume(1.5);
    assert_eq!(p.state().volume, 1.0);
    p.set_volume(-0.2);
    assert_eq!(p.state().volume, 0.0);

    p.set_volume(f32::NAN);
    assert_eq!(p.state().volume, 0.0);
}

#[test]
fn refused_play_leaves_paused_with_error() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(2));
    state.lock().unwrap().fail_play = true;

    p.play();
    assert_eq!(p.status(), PlayerStatus::Paused);
    assert!(!p.state().is_playing);
    assert_eq!(p.take_error().as_deref(), Some("no audio output device"));
    assert!(p.take_error().is_none());
}

#[test]
fn track_without_stream_cannot_be_played() {
    let (mut p, _state) = player();
    let mut list = tracks(2);
    list[1].stream_url = None;
    p.replace_tracks(list);

    p.select(1);
    assert_eq!(p.status(), PlayerStatus::Paused);
    assert!(p.take_error().unwrap().contains("Track 1"));

    p.play();
    assert_eq!(p.status(), PlayerStatus::Paused);
    assert!(p.take_error().is_some());
}

#[test]
fn media_events_update_state() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(2));
    p.play();

    assert!(emit(&state, MediaEvent::MetadataLoaded(Duration::from_secs(240))));
    assert!(emit(&state, MediaEvent::TimeUpdate(Duration::from_secs(12))));
    p.tick();
    assert_eq!(p.state().duration, Duration::from_secs(240));
    assert_eq!(p.state().current_time, Duration::from_secs(12));
}

#[test]
fn ended_advances_to_next_track() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(2));
    p.select(1);
    let before = p.generation();

    emit(&state, MediaEvent::Ended);
    p.tick();
    assert_eq!(p.state().current_track_index, 0);
    assert_eq!(p.status(), PlayerStatus::Playing);
    assert_eq!(p.generation(), before + 1);
}

#[test]
fn failed_event_pauses_and_reports() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(1));
    p.play();
    emit(&state, MediaEvent::Failed("failed to decode stream".into()));
    p.tick();

    assert_eq!(p.status(), PlayerStatus::Paused);
    assert_eq!(p.take_error().as_deref(), Some("failed to decode stream"));
}

#[test]
fn play_after_failed_load_stays_paused() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(2));
    emit(&state, MediaEvent::Failed("HTTP status 404".into()));
    p.tick();
    assert_eq!(p.take_error().as_deref(), Some("HTTP status 404"));

    p.play();
    assert_eq!(p.status(), PlayerStatus::Paused);
    assert!(!p.state().is_playing);
    assert!(p.take_error().is_some());
    assert!(!calls(&state).contains(&"play".to_string()));
    assert!(p.signal().is_none());

    // Loading another track recovers.
    p.next();
    assert_eq!(p.status(), PlayerStatus::Playing);
    assert_eq!(p.state().current_track_index, 1);
}

#[test]
fn switching_tracks_disposes_previous_listener() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(3));
    let old = state.lock().unwrap().events.clone().unwrap();

    p.next();
    assert!(old.send(MediaEvent::Ended).is_err());
    assert!(emit(&state, MediaEvent::TimeUpdate(Duration::from_secs(1))));
}

#[test]
fn seek_is_clamped_to_duration() {
    let (mut p, state) = player();
    p.replace_tracks(tracks(1));
    p.seek(Duration::from_secs(500));
    assert_eq!(p.state().current_time, Duration::from_secs(100));

    p.seek_by(-30);
    assert_eq!(p.state().current_time, Duration::from_secs(70));
    p.seek_by(-300);
    assert_eq!(p.state().current_time, Duration::ZERO);
    assert_eq!(calls(&state)[1..].to_vec(), vec!["seek:100", "seek:70", "seek:0"]);
}

#[test]
fn signal_follows_backend_once_loaded() {
    let tap = SignalTap::new();
    let (backend, _state) = FakeBackend::with_tap(tap);
    let mut p = Player::new(Box::new(backend), 0.5);
    assert!(p.signal().is_none());
    p.replace_tracks(tracks(1));
    assert!(p.signal().is_some());
}
