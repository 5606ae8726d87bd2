// ── Domain model ──

mod device_id;
mod robot_config;
mod status;

pub use device_id::DeviceId;
pub use robot_config::ConfigSnapshot;
pub use status::{OperationalState, StatusSnapshot};

// Vendor vocabulary, re-exported so consumers need not depend on the API crate.
pub use mowlink_api::{Mode, Position};
