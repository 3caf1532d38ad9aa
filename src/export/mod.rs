//! Export jobs: the state machine, its two frame drivers and the output/audio preparation they share.

mod audio;
pub mod job;
mod layered;
mod output;
pub mod progress;
mod raster;
pub mod state;
