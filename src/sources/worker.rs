//! Background search thread.
//!
//! The blocking adapters run here so the event loop keeps drawing while a
//! request is in flight. Requests are served one at a time, in order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::{TrackSource, finalize};
use super::error::SourceError;
use super::model::Track;

#[derive(Debug)]
enum SearchCmd {
    Search { ticket: u64, query: String },
    Quit,
}

/// Result of one submitted query.
#[derive(Debug)]
pub struct SearchOutcome {
    pub ticket: u64,
    pub query: String,
    pub result: Result<Vec<Track>, SourceError>,
}

pub struct SearchWorker {
    tx: Sender<SearchCmd>,
    results: Receiver<SearchOutcome>,
    next_ticket: u64,
    source_name: &'static str,
}

impl SearchWorker {
    pub fn spawn(source: Box<dyn TrackSource>) -> Self {
        let (tx, rx) = mpsc::channel::<SearchCmd>();
        let (result_tx, results) = mpsc::channel::<SearchOutcome>();
        let source_name = source.name();

        // Not joined on drop: a request stuck in the network must not hold up quitting.
        thread::spawn(move || {
            for cmd in rx {
                match cmd {
                    SearchCmd::Search { ticket, query } => {
                        log::info!("searching {} for {query:?}", source.name());
                        // Backends truncate too; the worker guarantees the cap.
                        let result = source.search(&query).map(|t| finalize(t, source.cap()));
                        match &result {
                            Ok(tracks) => log::info!("{} results for {query:?}", tracks.len()),
                            Err(e) => log::warn!("search for {query:?} failed: {e}"),
                        }
                        if result_tx.send(SearchOutcome { ticket, query, result }).is_err() {
                            break;
                        }
                    }
                    SearchCmd::Quit => break,
                }
            }
        });

        Self {
            tx,
            results,
            next_ticket: 1,
            source_name,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    /// Queue `query`; returns its ticket, or `None` if the worker is gone.
    pub fn submit(&mut self, query: &str) -> Option<u64> {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.tx
            .send(SearchCmd::Search {
                ticket,
                query: query.to_string(),
            })
            .ok()
            .map(|_| ticket)
    }

    /// Non-blocking poll for a finished search.
    pub fn try_recv(&self) -> Option<SearchOutcome> {
        self.results.try_recv().ok()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<SearchOutcome> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(SearchCmd::Quit);
    }
}
