pub mod actor;
pub mod config;
pub mod constants;
pub mod error;
pub mod input;
pub mod interpolation;
pub mod logging;
pub mod movement;
pub mod net;
pub mod physics;
pub mod protocol;
pub mod scheduler;
pub mod sequence;
pub mod snapshot;
pub mod time;
pub mod wander;
pub mod world;
