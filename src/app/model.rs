//! Application model: the search box, cursor and status flags around the
//! playback controller and the visualizer.

use std::time::{Duration, Instant};

use crate::player::{Player, PlayerStatus};
use crate::sources::{SearchOutcome, SearchWorker, Track};
use crate::visualizer::{FrameScheduler, Visualizer};

/// Longest the event loop sleeps when no frame is pending.
const IDLE_POLL: Duration = Duration::from_millis(200);

/// The main application model.
pub struct App {
    pub player: Player,
    pub visualizer: Visualizer,
    pub scheduler: FrameScheduler,
    search: SearchWorker,

    pub selected: usize,
    /// Cursor tracks the playing track until the user moves it.
    pub follow_playback: bool,

    pub search_mode: bool,
    pub query: String,
    pub searching: bool,
    pending_ticket: Option<u64>,
    /// Query of the list currently shown.
    pub last_query: Option<String>,

    pub error: Option<String>,
    /// Why the spectrum pane is empty, when it is.
    pub visualizer_note: Option<String>,
    pub visualizer_enabled: bool,
    pub metadata_window: bool,

    attached_generation: u64,
}

impl App {
    pub fn new(player: Player, visualizer: Visualizer, scheduler: FrameScheduler, search: SearchWorker) -> Self {
        Self {
            player,
            visualizer,
            scheduler,
            search,
            selected: 0,
            follow_playback: true,
            search_mode: false,
            query: String::new(),
            searching: false,
            pending_ticket: None,
            last_query: None,
            error: None,
            visualizer_note: None,
            visualizer_enabled: true,
            metadata_window: false,
            attached_generation: 0,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        self.player.tracks()
    }

    pub fn has_tracks(&self) -> bool {
        !self.player.tracks().is_empty()
    }

    pub fn source_name(&self) -> &'static str {
        self.search.source_name()
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn enter_search_mode(&mut self) {
        self.search_mode = true;
    }

    pub fn exit_search_mode(&mut self) {
        self.search_mode = false;
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
    }

    /// Submit `query` to the search worker. Blank queries and submissions
    /// while a search is in flight are ignored.
    pub fn begin_search(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || self.searching {
            return false;
        }
        match self.search.submit(query) {
            Some(ticket) => {
                self.pending_ticket = Some(ticket);
                self.searching = true;
                self.error = None;
                true
            }
            None => {
                self.error = Some("search worker is not running".to_string());
                false
            }
        }
    }

    /// Submit the contents of the search box and leave search mode.
    pub fn submit_query(&mut self) -> bool {
        self.search_mode = false;
        let query = self.query.clone();
        self.begin_search(&query)
    }

    /// Replace the list with a finished search's results, or show its error
    /// over an empty list.
    pub fn apply_search_outcome(&mut self, outcome: SearchOutcome) {
        if self.pending_ticket != Some(outcome.ticket) {
            log::debug!("dropping stale search result #{}", outcome.ticket);
            return;
        }
        self.pending_ticket = None;
        self.searching = false;
        self.selected = 0;
        self.follow_playback = true;
        self.last_query = Some(outcome.query);

        match outcome.result {
            Ok(tracks) => {
                self.error = None;
                self.player.replace_tracks(tracks);
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.player.replace_tracks(Vec::new());
            }
        }
    }

    pub fn poll_search(&mut self) {
        while let Some(outcome) = self.search.try_recv() {
            self.apply_search_outcome(outcome);
        }
    }

    #[cfg(test)]
    pub(crate) fn wait_for_search(&mut self, timeout: Duration) {
        if let Some(outcome) = self.search.recv_timeout(timeout) {
            self.apply_search_outcome(outcome);
        }
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        let len = self.tracks().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        let len = self.tracks().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.tracks().len().saturating_sub(1);
    }

    pub fn play_selected(&mut self) {
        self.follow_playback = true;
        self.player.select(self.selected);
    }

    pub fn toggle_playback(&mut self) {
        self.follow_playback = true;
        self.player.toggle();
    }

    pub fn next_track(&mut self) {
        self.follow_playback = true;
        self.player.next();
    }

    pub fn previous_track(&mut self) {
        self.follow_playback = true;
        self.player.previous();
    }

    pub fn change_volume(&mut self, delta: f32) {
        let v = self.player.state().volume + delta;
        // Round to whole percents so repeated steps don't drift.
        self.player.set_volume((v * 100.0).round() / 100.0);
    }

    pub fn toggle_visualizer(&mut self, now: Instant) {
        self.visualizer_enabled = !self.visualizer_enabled;
        self.sync_visualizer(now);
    }

    /// Per-iteration housekeeping: media events, search results, visualizer state.
    pub fn tick(&mut self, now: Instant) {
        self.player.tick();
        if let Some(e) = self.player.take_error() {
            self.error = Some(e);
        }
        self.poll_search();
        self.sync_visualizer(now);
    }

    /// Re-attach the visualizer once per loaded track and start or stop its
    /// render loop with playback.
    pub fn sync_visualizer(&mut self, now: Instant) {
        let generation = self.player.generation();
        if generation != self.attached_generation {
            self.attached_generation = generation;
            if self.follow_playback && self.player.status() != PlayerStatus::Idle {
                self.selected = self.player.state().current_track_index;
            }

            // Stop drawing before the old graph goes away.
            self.visualizer.set_active(false, &mut self.scheduler, now);
            match self.visualizer.attach(self.player.signal()) {
                Ok(()) => self.visualizer_note = None,
                Err(e) => {
                    log::info!("{e}");
                    self.visualizer_note = Some(e.to_string());
                }
            }
        }

        let want = self.visualizer_enabled
            && self.player.state().is_playing
            && self.visualizer.is_attached();
        if want != self.visualizer.is_active() {
            self.visualizer.set_active(want, &mut self.scheduler, now);
        }
    }

    /// Run due frame callbacks. Returns true when a new spectrum was pulled.
    pub fn run_frames(&mut self, now: Instant) -> bool {
        let mut pulled = false;
        for handle in self.scheduler.fire(now) {
            pulled |= self.visualizer.on_frame(handle, &mut self.scheduler, now);
        }
        pulled
    }

    /// How long the event loop may wait for input before the next frame is due.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.scheduler
            .due_in(now)
            .map_or(IDLE_POLL, |d| d.min(IDLE_POLL))
    }

    /// The selected track, for the metadata popup.
    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks().get(self.selected)
    }
}
