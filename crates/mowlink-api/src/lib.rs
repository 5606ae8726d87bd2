// mowlink-api: Async Rust client for the Echorobotics mower cloud API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{CONFIRM_ATTEMPTS, CONFIRM_INTERVAL, DEFAULT_BASE_URL, EchoClient};
pub use error::Error;
pub use models::{CurrentState, GetConfig, LastStatuses, Mode, Position, StatusInfo};
pub use transport::{Credentials, TransportConfig};
