//! # Liveness reporting (runs in the heartbeat process).
//!
//! This module provides:
//! - [`HeartbeatLoop`] - drift-corrected heartbeat loop
//! - [`TrackingStore`] - the store heartbeats are written to, plus built-in stores
//! - [`DriverProbe`] - resolves the driver's process group to detect its exit
//! - [`shutdown`] - interrupt handling for the heartbeat process
//!
//! See `supervisor` for the driver side that spawns and stops this process.

mod probe;
mod sender;
pub mod shutdown;
mod store;
#[cfg(feature = "web")]
mod web;

pub use probe::{DriverProbe, OsProbe, ProcessGroup};
pub use sender::{Beat, HeartbeatLoop, LoopExit};
pub use store::{
    CompositeTrackingStore, ConsoleTrackingStore, TrackingFn, TrackingStore, TrackingStoreRef,
    build_tracking_store,
};
#[cfg(feature = "web")]
pub use web::WebTrackingStore;
