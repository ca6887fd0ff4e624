//! Pickup Scheduler
//!
//! Assigns available drivers to confirmed donations and tracks scheduled
//! pickups. Not a routing system: scheduling means one pickup record per
//! confirmed donation, assigned to a currently-available driver.
//!
//! # Architecture
//!
//! All driver and pickup state lives inside a single-writer actor task;
//! messages through the mailbox are the only access path. Two concurrent
//! `schedule_pickup` calls are therefore serialized and can never book
//! the same driver before it returns to `Available`.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod error;
pub mod types;

// Re-exports
pub use actor::{spawn_dispatch_actor, DispatchHandle};
pub use error::{Error, Result};
pub use types::{Driver, DriverId, DriverStatus, FleetStats, PickupStatus, ScheduledPickup, VehicleType};
