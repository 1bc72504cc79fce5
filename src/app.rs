//! Application module: the model the TUI draws and the runtime drives.
//!
//! `App` lives in `app::model` and ties the search worker, the playback
//! controller and the visualizer together.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
