//! Playback through an external `mpv` process, driven over its JSON IPC socket.
//!
//! mpv resolves page URLs (YouTube watch links) that rodio cannot decode. The
//! decoded signal stays inside mpv, so this backend has no [`SignalTap`].

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use crate::sources::Track;

use super::backend::{MediaBackend, MediaListener, stream_location};
use super::error::PlaybackError;
use super::tap::SignalTap;
use super::types::MediaEvent;

const OBSERVE_TIME: u64 = 1;
const OBSERVE_DURATION: u64 = 2;
const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_DELAY: Duration = Duration::from_millis(100);

type EventSlot = Arc<Mutex<Option<Sender<MediaEvent>>>>;

pub struct MpvBackend {
    child: Child,
    socket: UnixStream,
    socket_path: PathBuf,
    events: EventSlot,
    volume: f32,
    loaded: bool,
}

pub(crate) fn load_command(location: &str) -> Value {
    json!({ "command": ["loadfile", location, "replace"] })
}

pub(crate) fn pause_command(paused: bool) -> Value {
    json!({ "command": ["set_property", "pause", paused] })
}

pub(crate) fn seek_command(to: Duration) -> Value {
    json!({ "command": ["seek", to.as_secs_f64(), "absolute"] })
}

/// mpv volumes are percentages.
pub(crate) fn volume_command(volume: f32) -> Value {
    json!({ "command": ["set_property", "volume", f64::from(volume) * 100.0] })
}

pub(crate) fn observe_command(id: u64, property: &str) -> Value {
    json!({ "command": ["observe_property", id, property] })
}

fn seconds(data: Option<&Value>) -> Option<Duration> {
    data.and_then(Value::as_f64)
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
}

/// Translate one line of mpv IPC output into a media event, if it is one.
pub(crate) fn parse_event(line: &str) -> Option<MediaEvent> {
    let msg: Value = serde_json::from_str(line).ok()?;
    match msg.get("event")?.as_str()? {
        "property-change" => {
            let data = msg.get("data");
            match msg.get("name")?.as_str()? {
                "time-pos" => seconds(data).map(MediaEvent::TimeUpdate),
                "duration" => seconds(data)
                    .filter(|d| !d.is_zero())
                    .map(MediaEvent::MetadataLoaded),
                _ => None,
            }
        }
        "end-file" => match msg.get("reason").and_then(Value::as_str) {
            Some("eof") => Some(MediaEvent::Ended),
            Some("error") => Some(MediaEvent::Failed(
                msg.get("file_error")
                    .and_then(Value::as_str)
                    .unwrap_or("playback error")
                    .to_string(),
            )),
            // "stop" and "redirect" come from replacing the file ourselves.
            _ => None,
        },
        _ => None,
    }
}

fn ipc_err(e: std::io::Error) -> PlaybackError {
    PlaybackError::Ipc(e.to_string())
}

fn connect(child: &mut Child, path: &Path) -> Result<UnixStream, PlaybackError> {
    for _ in 0..CONNECT_ATTEMPTS {
        if let Ok(stream) = UnixStream::connect(path) {
            return Ok(stream);
        }
        if let Ok(Some(status)) = child.try_wait() {
            return Err(PlaybackError::Ipc(format!("mpv exited early ({status})")));
        }
        thread::sleep(CONNECT_DELAY);
    }
    Err(PlaybackError::Ipc("mpv did not open its IPC socket".to_string()))
}

fn spawn_reader(socket: UnixStream, events: EventSlot) {
    thread::spawn(move || {
        for line in BufReader::new(socket).lines() {
            let Ok(line) = line else { break };
            let Some(event) = parse_event(&line) else {
                continue;
            };
            if let Ok(slot) = events.lock() {
                if let Some(tx) = slot.as_ref() {
                    let _ = tx.send(event);
                }
            }
        }
        log::debug!("mpv IPC reader finished");
    });
}

impl MpvBackend {
    /// Start `program` in idle mode and connect to its IPC socket.
    pub fn spawn(program: &str, volume: f32) -> Result<Self, PlaybackError> {
        let volume = volume.clamp(0.0, 1.0);
        let socket_path =
            std::env::temp_dir().join(format!("audiowave-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut child = Command::new(program)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg(format!("--volume={}", (volume * 100.0).round()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        let socket = match connect(&mut child, &socket_path) {
            Ok(s) => s,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let events: EventSlot = Arc::new(Mutex::new(None));
        spawn_reader(socket.try_clone().map_err(ipc_err)?, events.clone());

        let mut backend = Self {
            child,
            socket,
            socket_path,
            events,
            volume,
            loaded: false,
        };
        backend.send(&observe_command(OBSERVE_TIME, "time-pos"))?;
        backend.send(&observe_command(OBSERVE_DURATION, "duration"))?;
        log::info!("mpv started (pid {})", backend.child.id());
        Ok(backend)
    }

    fn send(&mut self, command: &Value) -> Result<(), PlaybackError> {
        writeln!(self.socket, "{command}").map_err(ipc_err)
    }

    fn send_loaded(&mut self, command: &Value) -> Result<(), PlaybackError> {
        if !self.loaded {
            return Err(PlaybackError::NotLoaded);
        }
        self.send(command)
    }
}

impl MediaBackend for MpvBackend {
    fn name(&self) -> &'static str {
        "mpv"
    }

    fn load(&mut self, track: &Track) -> Result<MediaListener, PlaybackError> {
        let location = stream_location(track)?;
        let (tx, listener) = MediaListener::channel();
        if let Ok(mut slot) = self.events.lock() {
            *slot = Some(tx.clone());
        }

        // Load paused; the controller decides when to start.
        self.send(&pause_command(true))?;
        self.send(&load_command(&location))?;
        if let Some(d) = track.duration {
            let _ = tx.send(MediaEvent::MetadataLoaded(d));
        }
        self.loaded = true;
        Ok(listener)
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.send_loaded(&pause_command(false))
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.send_loaded(&pause_command(true))
    }

    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError> {
        self.send_loaded(&seek_command(to))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), PlaybackError> {
        self.send(&volume_command(volume))?;
        self.volume = volume;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn signal(&self) -> Option<SignalTap> {
        None
    }
}

impl Drop for MpvBackend {
    fn drop(&mut self) {
        let _ = self.send(&json!({ "command": ["quit"] }));
        for _ in 0..20 {
            if let Ok(Some(_)) = self.child.try_wait() {
                break;
            }
            thread::sleep(Duration::from_millis(25));
        }
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
