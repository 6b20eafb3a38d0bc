//! Domain model and pure derivation rules for training progress tracking.
#![forbid(unsafe_code)]

pub mod board;
pub mod catalog;
pub mod derive;
pub mod model;
pub mod time;

pub use time::Clock;
