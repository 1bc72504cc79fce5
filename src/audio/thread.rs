use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::error::PlaybackError;
use super::sink::{create_sink_at, fetch_stream, stream_client};
use super::tap::SignalTap;
use super::types::{AudioCmd, MediaEvent};

const TICK: Duration = Duration::from_millis(200);

/// The loaded track as the audio thread sees it.
struct Current {
    bytes: Arc<[u8]>,
    sink: Sink,
    events: Sender<MediaEvent>,
    duration: Option<Duration>,
    // Elapsed time is `accumulated` plus the time since `started_at` while playing.
    started_at: Option<Instant>,
    accumulated: Duration,
    ended: bool,
}

impl Current {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn playing(&self) -> bool {
        self.started_at.is_some()
    }

    // The listener may already be gone; its events are simply dropped.
    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }
}

fn open_output() -> Option<OutputStream> {
    match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            log::error!("no audio output device: {e}");
            None
        }
    }
}

fn load(
    stream: Option<&OutputStream>,
    client: &reqwest::blocking::Client,
    location: &str,
    tap: &SignalTap,
    volume: f32,
) -> Result<(Arc<[u8]>, Sink, Option<Duration>), PlaybackError> {
    let stream = stream.ok_or(PlaybackError::NoOutput)?;
    let bytes = fetch_stream(client, location)?;
    let (sink, total) = create_sink_at(stream, bytes.clone(), Duration::ZERO, tap)?;
    sink.set_volume(volume);
    Ok((bytes, sink, total))
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let start = sink.volume();
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(start * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

/// Drop queued commands that a later command makes pointless: everything but
/// the first `Quit` once one is queued, and every `Load`, `Play`, `Pause` or
/// `Seek` that precedes the newest `Load`. Volume changes are kept.
pub(super) fn coalesce(cmds: VecDeque<AudioCmd>) -> VecDeque<AudioCmd> {
    if let Some(quit) = cmds.iter().position(|c| matches!(c, AudioCmd::Quit { .. })) {
        return cmds.into_iter().skip(quit).take(1).collect();
    }
    let Some(last_load) = cmds.iter().rposition(|c| matches!(c, AudioCmd::Load { .. })) else {
        return cmds;
    };
    let before = cmds.len();
    let kept: VecDeque<AudioCmd> = cmds
        .into_iter()
        .enumerate()
        .filter(|(i, c)| *i >= last_load || matches!(c, AudioCmd::SetVolume(_)))
        .map(|(_, c)| c)
        .collect();
    if kept.len() < before {
        log::debug!("skipping {} superseded audio commands", before - kept.len());
    }
    kept
}

/// Advance the clock of the playing track, or report that it ended.
fn on_tick(current: &mut Option<Current>) {
    let Some(c) = current.as_mut() else {
        return;
    };
    if !c.playing() {
        return;
    }
    if c.sink.empty() {
        c.accumulated = c.duration.unwrap_or_else(|| c.elapsed());
        c.started_at = None;
        c.ended = true;
        c.emit(MediaEvent::Ended);
    } else {
        c.emit(MediaEvent::TimeUpdate(c.elapsed()));
    }
}

/// Spawn the thread that owns the output stream. `done` is dropped when the
/// thread exits, which lets the owner wait for it with a deadline.
pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    tap: SignalTap,
    volume: f32,
    done: Sender<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let _done = done;
        let stream = open_output();
        if stream.is_none() {
            tap.close();
        }
        let client = stream_client();

        let mut volume = volume;
        let mut current: Option<Current> = None;
        let mut pending: VecDeque<AudioCmd> = VecDeque::new();

        loop {
            // A fetch can take seconds; look at what queued up meanwhile
            // before starting the next command.
            pending.extend(rx.try_iter());
            pending = coalesce(pending);

            let Some(cmd) = pending.pop_front() else {
                match rx.recv_timeout(TICK) {
                    Ok(cmd) => pending.push_back(cmd),
                    Err(RecvTimeoutError::Timeout) => on_tick(&mut current),
                    Err(RecvTimeoutError::Disconnected) => {
                        tap.close();
                        break;
                    }
                }
                continue;
            };

            match cmd {
                AudioCmd::Load {
                    location,
                    duration_hint,
                    events,
                } => {
                    if let Some(old) = current.take() {
                        old.sink.stop();
                    }
                    tap.clear();

                    match load(stream.as_ref(), &client, &location, &tap, volume) {
                        Ok((bytes, sink, total)) => {
                            let duration = total.or(duration_hint);
                            if let Some(d) = duration {
                                let _ = events.send(MediaEvent::MetadataLoaded(d));
                            }
                            current = Some(Current {
                                bytes,
                                sink,
                                events,
                                duration,
                                started_at: None,
                                accumulated: Duration::ZERO,
                                ended: false,
                            });
                        }
                        Err(e) => {
                            log::warn!("failed to load {location}: {e}");
                            let _ = events.send(MediaEvent::Failed(e.to_string()));
                        }
                    }
                }

                AudioCmd::Play => {
                    if let Some(c) = current.as_mut() {
                        if !c.playing() && !c.ended {
                            c.sink.play();
                            c.started_at = Some(Instant::now());
                        }
                    }
                }

                AudioCmd::Pause => {
                    if let Some(c) = current.as_mut() {
                        if let Some(st) = c.started_at.take() {
                            c.sink.pause();
                            c.accumulated += st.elapsed();
                        }
                    }
                }

                AudioCmd::Seek(to) => {
                    // Scrubbing: rebuild the current sink and skip into the stream.
                    let (Some(c), Some(stream)) = (current.as_mut(), stream.as_ref()) else {
                        continue;
                    };
                    let to = c.duration.map_or(to, |d| to.min(d));
                    match create_sink_at(stream, c.bytes.clone(), to, &tap) {
                        Ok((sink, _)) => {
                            c.sink.stop();
                            sink.set_volume(volume);
                            let resume = c.playing();
                            if resume {
                                sink.play();
                            }
                            c.sink = sink;
                            c.accumulated = to;
                            c.started_at = resume.then(Instant::now);
                            c.ended = false;
                            c.emit(MediaEvent::TimeUpdate(to));
                        }
                        Err(e) => log::warn!("seek failed: {e}"),
                    }
                }

                AudioCmd::SetVolume(v) => {
                    volume = v;
                    if let Some(c) = current.as_ref() {
                        c.sink.set_volume(v);
                    }
                }

                AudioCmd::Quit { fade_out_ms } => {
                    if let Some(c) = current.take() {
                        if c.playing() {
                            // Fade out gently before stopping.
                            fade_out_sink(&c.sink, fade_out_ms);
                        }
                        c.sink.stop();
                    }
                    tap.close();
                    break;
                }
            }
        }
    })
}
