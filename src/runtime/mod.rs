use std::env;
use std::time::Instant;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio;
use crate::player::Player;
use crate::sources::SearchWorker;
use crate::visualizer::FrameScheduler;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    logging::init(&settings.log);
    log::info!("audiowave {} starting", env!("CARGO_PKG_VERSION"));

    let query = startup::initial_query(env::args().skip(1), &settings.source.initial_query);

    let source = startup::build_source(&settings);
    let backend = audio::build_backend(&settings);
    let player = Player::new(backend, settings.playback.volume);
    let visualizer = startup::build_visualizer(&settings.visualizer)?;
    let scheduler = FrameScheduler::new(settings.visualizer.fps);
    let search = SearchWorker::spawn(source);

    let mut app = App::new(player, visualizer, scheduler, search);
    startup::apply_defaults(&mut app, &settings, query.as_deref(), Instant::now());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new();
        event_loop::run(&mut terminal, &settings, &mut app, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Dropping the app fades out and stops the audio backend.
    drop(app);
    log::info!("audiowave exiting");

    run_result
}
