//! Per-robot coordination between `mowlink-api` and UI consumers.
//!
//! - **[`Coordinator`]**: owns one robot's status and configuration
//!   snapshots. Each [`tick`](Coordinator::tick) polls status and refreshes
//!   configuration concurrently; [`start()`](Coordinator::start) runs ticks
//!   on the poll interval. Fetch failures are masked until the
//!   [`StalenessPolicy`] declares the robot unavailable; authentication
//!   failures never are.
//!
//! - **Known mode**: the status feed does not carry the operating mode,
//!   so the coordinator reads it separately on a slower interval and
//!   records every mode a command got confirmed.
//!
//! - **Optimistic commands**: [`issue_command`](Coordinator::issue_command)
//!   exposes the requested mode as a pending overlay until the backend
//!   confirms it (or the attempt fails or times out) and schedules a burst
//!   of extra ticks so the snapshot catches up quickly.
//!
//! - **[`Registry`]**: host-owned map from [`DeviceId`] to coordinator.
//!
//! - **Projections** ([`MowerView`], [`LawnMowerActivity`],
//!   [`LawnMowerAction`]): read-only adapters re-captured on every
//!   [`CoordinatorEvent`].
//!
//! The backend is reached through the [`DeviceClient`] trait;
//! [`RobotClient`] implements it on top of `mowlink_api::EchoClient`.

pub mod client;
pub mod command;
pub mod config;
pub mod config_refresh;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod model;
mod mode_tracker;
pub mod poller;
pub mod projection;
pub mod registry;
pub mod staleness;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{DeviceClient, RobotClient};
pub use command::CommandOutcome;
pub use config::CoordinatorConfig;
pub use config_refresh::RefreshOutcome;
pub use coordinator::{Coordinator, TickReport};
pub use error::CoreError;
pub use event::CoordinatorEvent;
pub use poller::PollOutcome;
pub use projection::{LawnMowerAction, LawnMowerActivity, MowerView, force_refresh};
pub use registry::Registry;
pub use staleness::StalenessPolicy;

pub use model::{ConfigSnapshot, DeviceId, Mode, OperationalState, Position, StatusSnapshot};
