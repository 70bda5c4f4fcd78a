//! Broadcaster implementation, split by concern

mod core;
mod publishing;
mod subscription;

pub use core::ProgressBroadcaster;
