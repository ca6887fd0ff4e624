//! Core types for pickup scheduling
//!
//! Driver and pickup statuses are closed enumerations with explicit
//! transitions, so an out-of-vocabulary state is unrepresentable.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Source identifier, shared with the inventory ledger
pub type SourceId = inventory_core::types::SourceId;

/// Driver identifier (assigned by the upstream registry)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DriverId(pub u64);

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Driver availability
///
/// `Available -> Busy` on scheduling; back to `Available` on completion
/// or cancellation; `OffDuty` only through the explicit status mutation
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverStatus {
    /// Free to take a pickup
    Available,
    /// Assigned to a scheduled pickup
    Busy,
    /// Not working; never selected
    OffDuty,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverStatus::Available => "Available",
            DriverStatus::Busy => "Busy",
            DriverStatus::OffDuty => "Off-Duty",
        };
        write!(f, "{}", s)
    }
}

/// Vehicle class for a pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    /// Small loads
    Car,
    /// Medium loads
    Van,
    /// Bulk loads
    Truck,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleType::Car => "Car",
            VehicleType::Van => "Van",
            VehicleType::Truck => "Truck",
        };
        write!(f, "{}", s)
    }
}

/// Driver state tracked by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    /// Driver id
    pub driver_id: DriverId,

    /// Display name
    pub name: String,

    /// Availability
    pub status: DriverStatus,

    /// Date of the most recently assigned pickup; drives the
    /// least-recently-used selection
    pub last_pickup_date: Option<NaiveDate>,

    /// Completed pickups, incremented only on external completion
    pub completed_pickups: u32,
}

impl Driver {
    /// A fresh driver in `Available` status
    pub fn new(driver_id: DriverId, name: impl Into<String>) -> Self {
        Self {
            driver_id,
            name: name.into(),
            status: DriverStatus::Available,
            last_pickup_date: None,
            completed_pickups: 0,
        }
    }
}

/// Pickup lifecycle. `Completed` and `Cancelled` are terminal and only
/// reached through the external operational mutation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupStatus {
    /// Created by the scheduler, driver assigned
    Scheduled,
    /// Done; driver released and counter incremented
    Completed,
    /// Called off; driver released
    Cancelled,
}

impl PickupStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PickupStatus::Completed | PickupStatus::Cancelled)
    }
}

/// One scheduled pickup for a confirmed donation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPickup {
    /// Pickup id
    pub pickup_id: Uuid,

    /// Source the food is collected from
    pub source_id: SourceId,

    /// Drop-off destination
    pub destination: String,

    /// Vehicle class
    pub vehicle_type: VehicleType,

    /// Pickup date
    pub date: NaiveDate,

    /// Pickup time
    pub time: NaiveTime,

    /// Assigned driver
    pub driver_id: DriverId,

    /// Lifecycle status
    pub status: PickupStatus,
}

/// Fleet snapshot for the operations dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetStats {
    /// Registered drivers
    pub total_drivers: usize,
    /// Drivers in `Available` status
    pub available: usize,
    /// Drivers in `Busy` status
    pub busy: usize,
    /// Drivers in `Off-Duty` status
    pub off_duty: usize,
    /// Pickups currently in `Scheduled` status
    pub scheduled_pickups: usize,
    /// Completed pickups across all drivers
    pub completed_pickups_total: u64,
    /// Average completed pickups per driver, 0 when no drivers
    pub avg_completed_per_driver: f64,
}
