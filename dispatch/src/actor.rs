//! Actor-based concurrency for the pickup scheduler
//!
//! Single-writer pattern over Tokio actors: one task owns the driver
//! registry and the pickup table, so driver selection and the
//! `Available -> Busy` transition are one serialized step. Double-booking
//! is impossible by construction.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Donation / operations flows                  │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ DispatchHandle (Clone)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │            DispatchActor (Single Task)                │
//! │   drivers: HashMap<DriverId, Driver>                  │
//! │   pickups: HashMap<Uuid, ScheduledPickup>             │
//! │   select driver → create pickup → mark Busy           │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::error::{Error, Result};
use crate::types::{
    Driver, DriverId, DriverStatus, FleetStats, PickupStatus, ScheduledPickup, SourceId,
    VehicleType,
};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Message sent to the dispatch actor
pub enum DispatchMessage {
    /// Register or replace a driver
    RegisterDriver {
        /// Driver state to install
        driver: Driver,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Explicit driver status mutation (e.g. going off-duty)
    SetDriverStatus {
        /// Driver to mutate
        driver_id: DriverId,
        /// New status
        status: DriverStatus,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Schedule a pickup for a confirmed donation
    SchedulePickup {
        /// Source to collect from
        source_id: SourceId,
        /// Drop-off destination
        destination: String,
        /// Vehicle class
        vehicle_type: VehicleType,
        /// Pickup date
        date: NaiveDate,
        /// Pickup time
        time: NaiveTime,
        /// Reply channel
        response: oneshot::Sender<Result<Uuid>>,
    },

    /// External completion event: release the driver, bump the counter
    CompletePickup {
        /// Pickup that finished
        pickup_id: Uuid,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// External cancellation event: release the driver
    CancelPickup {
        /// Pickup to call off
        pickup_id: Uuid,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Read a driver
    GetDriver {
        /// Driver to read
        driver_id: DriverId,
        /// Reply channel
        response: oneshot::Sender<Result<Driver>>,
    },

    /// Read a pickup
    GetPickup {
        /// Pickup to read
        pickup_id: Uuid,
        /// Reply channel
        response: oneshot::Sender<Result<ScheduledPickup>>,
    },

    /// Fleet snapshot for dashboards
    FleetStats {
        /// Reply channel
        response: oneshot::Sender<FleetStats>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns all dispatch state
pub struct DispatchActor {
    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<DispatchMessage>,

    /// Driver registry
    drivers: HashMap<DriverId, Driver>,

    /// Pickup table
    pickups: HashMap<Uuid, ScheduledPickup>,
}

impl DispatchActor {
    /// Create new actor
    pub fn new(mailbox: mpsc::Receiver<DispatchMessage>) -> Self {
        Self {
            mailbox,
            drivers: HashMap::new(),
            pickups: HashMap::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                DispatchMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }
        tracing::info!("Dispatch actor stopped");
    }

    fn handle_message(&mut self, msg: DispatchMessage) {
        match msg {
            DispatchMessage::RegisterDriver { driver, response } => {
                tracing::info!(driver_id = %driver.driver_id, name = %driver.name, "Driver registered");
                self.drivers.insert(driver.driver_id, driver);
                let _ = response.send(Ok(()));
            }

            DispatchMessage::SetDriverStatus {
                driver_id,
                status,
                response,
            } => {
                let result = match self.drivers.get_mut(&driver_id) {
                    Some(driver) => {
                        tracing::info!(%driver_id, from = %driver.status, to = %status, "Driver status changed");
                        driver.status = status;
                        Ok(())
                    }
                    None => Err(Error::DriverNotFound(driver_id.to_string())),
                };
                let _ = response.send(result);
            }

            DispatchMessage::SchedulePickup {
                source_id,
                destination,
                vehicle_type,
                date,
                time,
                response,
            } => {
                let result = self.schedule_pickup(source_id, destination, vehicle_type, date, time);
                let _ = response.send(result);
            }

            DispatchMessage::CompletePickup { pickup_id, response } => {
                let _ = response.send(self.finish_pickup(pickup_id, PickupStatus::Completed));
            }

            DispatchMessage::CancelPickup { pickup_id, response } => {
                let _ = response.send(self.finish_pickup(pickup_id, PickupStatus::Cancelled));
            }

            DispatchMessage::GetDriver { driver_id, response } => {
                let result = self
                    .drivers
                    .get(&driver_id)
                    .cloned()
                    .ok_or_else(|| Error::DriverNotFound(driver_id.to_string()));
                let _ = response.send(result);
            }

            DispatchMessage::GetPickup { pickup_id, response } => {
                let result = self
                    .pickups
                    .get(&pickup_id)
                    .cloned()
                    .ok_or_else(|| Error::PickupNotFound(pickup_id.to_string()));
                let _ = response.send(result);
            }

            DispatchMessage::FleetStats { response } => {
                let _ = response.send(self.fleet_stats());
            }

            DispatchMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Least-recently-used selection: earliest `last_pickup_date` wins,
    /// never-used drivers first, ties broken by ascending driver id.
    fn select_driver(&self) -> Option<DriverId> {
        self.drivers
            .values()
            .filter(|d| d.status == DriverStatus::Available)
            .min_by_key(|d| (d.last_pickup_date, d.driver_id))
            .map(|d| d.driver_id)
    }

    fn schedule_pickup(
        &mut self,
        source_id: SourceId,
        destination: String,
        vehicle_type: VehicleType,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Uuid> {
        let driver_id = self.select_driver().ok_or_else(|| {
            Error::NoDriverAvailable("no driver in Available status".to_string())
        })?;

        let pickup = ScheduledPickup {
            pickup_id: Uuid::now_v7(),
            source_id,
            destination,
            vehicle_type,
            date,
            time,
            driver_id,
            status: PickupStatus::Scheduled,
        };

        // Selection and the Available -> Busy transition are one step
        // inside the actor, so no other request can see this driver free.
        if let Some(driver) = self.drivers.get_mut(&driver_id) {
            driver.status = DriverStatus::Busy;
            driver.last_pickup_date = Some(date);
        }

        let pickup_id = pickup.pickup_id;
        tracing::info!(
            %pickup_id,
            %source_id,
            %driver_id,
            %vehicle_type,
            %date,
            "Pickup scheduled"
        );
        self.pickups.insert(pickup_id, pickup);

        Ok(pickup_id)
    }

    fn finish_pickup(&mut self, pickup_id: Uuid, terminal: PickupStatus) -> Result<()> {
        let pickup = self
            .pickups
            .get_mut(&pickup_id)
            .ok_or_else(|| Error::PickupNotFound(pickup_id.to_string()))?;

        if pickup.status.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "pickup {} already {:?}",
                pickup_id, pickup.status
            )));
        }

        pickup.status = terminal;
        let driver_id = pickup.driver_id;

        if let Some(driver) = self.drivers.get_mut(&driver_id) {
            driver.status = DriverStatus::Available;
            if terminal == PickupStatus::Completed {
                driver.completed_pickups += 1;
            }
        }

        tracing::info!(%pickup_id, %driver_id, status = ?terminal, "Pickup closed");
        Ok(())
    }

    fn fleet_stats(&self) -> FleetStats {
        let count = |status: DriverStatus| {
            self.drivers.values().filter(|d| d.status == status).count()
        };
        let completed: u64 = self
            .drivers
            .values()
            .map(|d| d.completed_pickups as u64)
            .sum();
        let total_drivers = self.drivers.len();

        FleetStats {
            total_drivers,
            available: count(DriverStatus::Available),
            busy: count(DriverStatus::Busy),
            off_duty: count(DriverStatus::OffDuty),
            scheduled_pickups: self
                .pickups
                .values()
                .filter(|p| p.status == PickupStatus::Scheduled)
                .count(),
            completed_pickups_total: completed,
            avg_completed_per_driver: if total_drivers == 0 {
                0.0
            } else {
                completed as f64 / total_drivers as f64
            },
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    sender: mpsc::Sender<DispatchMessage>,
}

impl DispatchHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<DispatchMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> DispatchMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Register or replace a driver
    pub async fn register_driver(&self, driver: Driver) -> Result<()> {
        self.request(|response| DispatchMessage::RegisterDriver { driver, response })
            .await?
    }

    /// Explicit driver status mutation
    pub async fn set_driver_status(&self, driver_id: DriverId, status: DriverStatus) -> Result<()> {
        self.request(|response| DispatchMessage::SetDriverStatus {
            driver_id,
            status,
            response,
        })
        .await?
    }

    /// Schedule a pickup. Identical re-entrant requests are independent;
    /// dedup is the caller's responsibility.
    pub async fn schedule_pickup(
        &self,
        source_id: SourceId,
        destination: impl Into<String>,
        vehicle_type: VehicleType,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Uuid> {
        let destination = destination.into();
        self.request(|response| DispatchMessage::SchedulePickup {
            source_id,
            destination,
            vehicle_type,
            date,
            time,
            response,
        })
        .await?
    }

    /// External completion event
    pub async fn complete_pickup(&self, pickup_id: Uuid) -> Result<()> {
        self.request(|response| DispatchMessage::CompletePickup { pickup_id, response })
            .await?
    }

    /// External cancellation event
    pub async fn cancel_pickup(&self, pickup_id: Uuid) -> Result<()> {
        self.request(|response| DispatchMessage::CancelPickup { pickup_id, response })
            .await?
    }

    /// Read a driver
    pub async fn driver(&self, driver_id: DriverId) -> Result<Driver> {
        self.request(|response| DispatchMessage::GetDriver { driver_id, response })
            .await?
    }

    /// Read a pickup
    pub async fn pickup(&self, pickup_id: Uuid) -> Result<ScheduledPickup> {
        self.request(|response| DispatchMessage::GetPickup { pickup_id, response })
            .await?
    }

    /// Fleet snapshot for dashboards
    pub async fn fleet_stats(&self) -> Result<FleetStats> {
        self.request(|response| DispatchMessage::FleetStats { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(DispatchMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the dispatch actor
pub fn spawn_dispatch_actor() -> DispatchHandle {
    let (tx, rx) = mpsc::channel(256); // Bounded channel for backpressure
    let actor = DispatchActor::new(rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    DispatchHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Utc};

    fn tomorrow() -> NaiveDate {
        Utc::now().date_naive().checked_add_days(Days::new(1)).unwrap()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    async fn handle_with_drivers(names: &[&str]) -> DispatchHandle {
        let handle = spawn_dispatch_actor();
        for (i, name) in names.iter().enumerate() {
            handle
                .register_driver(Driver::new(DriverId(i as u64 + 1), *name))
                .await
                .unwrap();
        }
        handle
    }

    #[tokio::test]
    async fn test_schedule_assigns_and_marks_busy() {
        let handle = handle_with_drivers(&["Asha"]).await;

        let pickup_id = handle
            .schedule_pickup(SourceId(1), "Harbor Shelter", VehicleType::Van, tomorrow(), noon())
            .await
            .unwrap();

        let pickup = handle.pickup(pickup_id).await.unwrap();
        assert_eq!(pickup.driver_id, DriverId(1));
        assert_eq!(pickup.status, PickupStatus::Scheduled);

        let driver = handle.driver(DriverId(1)).await.unwrap();
        assert_eq!(driver.status, DriverStatus::Busy);
        assert_eq!(driver.last_pickup_date, Some(tomorrow()));
        // Counter waits for external completion
        assert_eq!(driver.completed_pickups, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_driver_available() {
        let handle = handle_with_drivers(&["Asha"]).await;
        handle
            .set_driver_status(DriverId(1), DriverStatus::OffDuty)
            .await
            .unwrap();

        let result = handle
            .schedule_pickup(SourceId(1), "Shelter", VehicleType::Car, tomorrow(), noon())
            .await;
        assert!(matches!(result, Err(Error::NoDriverAvailable(_))));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_least_recently_used_selection() {
        let handle = handle_with_drivers(&["Asha", "Bert", "Chen"]).await;

        // Bert drove most recently, Chen longer ago, Asha never
        let mut bert = Driver::new(DriverId(2), "Bert");
        bert.last_pickup_date = Some(tomorrow());
        handle.register_driver(bert).await.unwrap();
        let mut chen = Driver::new(DriverId(3), "Chen");
        chen.last_pickup_date = tomorrow().checked_sub_days(Days::new(7));
        handle.register_driver(chen).await.unwrap();

        let first = handle
            .schedule_pickup(SourceId(1), "A", VehicleType::Car, tomorrow(), noon())
            .await
            .unwrap();
        let second = handle
            .schedule_pickup(SourceId(1), "B", VehicleType::Car, tomorrow(), noon())
            .await
            .unwrap();

        // Never-used Asha first, then least-recent Chen
        assert_eq!(handle.pickup(first).await.unwrap().driver_id, DriverId(1));
        assert_eq!(handle.pickup(second).await.unwrap().driver_id, DriverId(3));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_completion_releases_driver_and_counts() {
        let handle = handle_with_drivers(&["Asha"]).await;

        let pickup_id = handle
            .schedule_pickup(SourceId(1), "Shelter", VehicleType::Truck, tomorrow(), noon())
            .await
            .unwrap();
        handle.complete_pickup(pickup_id).await.unwrap();

        let driver = handle.driver(DriverId(1)).await.unwrap();
        assert_eq!(driver.status, DriverStatus::Available);
        assert_eq!(driver.completed_pickups, 1);
        assert_eq!(
            handle.pickup(pickup_id).await.unwrap().status,
            PickupStatus::Completed
        );

        // Terminal pickups reject further transitions
        let again = handle.cancel_pickup(pickup_id).await;
        assert!(matches!(again, Err(Error::InvalidTransition(_))));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_releases_without_counting() {
        let handle = handle_with_drivers(&["Asha"]).await;

        let pickup_id = handle
            .schedule_pickup(SourceId(1), "Shelter", VehicleType::Van, tomorrow(), noon())
            .await
            .unwrap();
        handle.cancel_pickup(pickup_id).await.unwrap();

        let driver = handle.driver(DriverId(1)).await.unwrap();
        assert_eq!(driver.status, DriverStatus::Available);
        assert_eq!(driver.completed_pickups, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_identical_requests_are_independent() {
        let handle = handle_with_drivers(&["Asha", "Bert"]).await;

        let first = handle
            .schedule_pickup(SourceId(1), "Shelter", VehicleType::Van, tomorrow(), noon())
            .await
            .unwrap();
        let second = handle
            .schedule_pickup(SourceId(1), "Shelter", VehicleType::Van, tomorrow(), noon())
            .await
            .unwrap();

        // No dedup: two pickups, two different drivers
        assert_ne!(first, second);
        let a = handle.pickup(first).await.unwrap().driver_id;
        let b = handle.pickup(second).await.unwrap().driver_id;
        assert_ne!(a, b);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scheduling_never_double_books() {
        let handle = handle_with_drivers(&["Asha", "Bert", "Chen"]).await;

        let mut joins = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                handle
                    .schedule_pickup(
                        SourceId(i),
                        format!("Destination {}", i),
                        VehicleType::Car,
                        tomorrow(),
                        noon(),
                    )
                    .await
            }));
        }

        let mut assigned = Vec::new();
        for join in joins {
            match join.await.unwrap() {
                Ok(pickup_id) => {
                    assigned.push(handle.pickup(pickup_id).await.unwrap().driver_id);
                }
                Err(Error::NoDriverAvailable(_)) => {}
                Err(other) => panic!("unexpected outcome: {other}"),
            }
        }

        // Three drivers, three wins, all distinct
        assert_eq!(assigned.len(), 3);
        assigned.sort();
        assigned.dedup();
        assert_eq!(assigned.len(), 3);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_fleet_stats() {
        let handle = handle_with_drivers(&["Asha", "Bert"]).await;
        let pickup_id = handle
            .schedule_pickup(SourceId(1), "Shelter", VehicleType::Van, tomorrow(), noon())
            .await
            .unwrap();

        let stats = handle.fleet_stats().await.unwrap();
        assert_eq!(stats.total_drivers, 2);
        assert_eq!(stats.busy, 1);
        assert_eq!(stats.available, 1);
        assert_eq!(stats.scheduled_pickups, 1);

        handle.complete_pickup(pickup_id).await.unwrap();
        let stats = handle.fleet_stats().await.unwrap();
        assert_eq!(stats.completed_pickups_total, 1);
        assert!((stats.avg_completed_per_driver - 0.5).abs() < f64::EPSILON);

        handle.shutdown().await.unwrap();
    }
}
