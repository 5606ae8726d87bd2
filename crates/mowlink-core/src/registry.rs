// ── Device registry ──
//
// Explicit device-id -> coordinator map owned by the host. Map entries
// are cloned out before any await so no shard lock is held across one.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::join_all;
use tracing::info;

use crate::client::DeviceClient;
use crate::command::CommandOutcome;
use crate::config::CoordinatorConfig;
use crate::coordinator::{Coordinator, TickReport};
use crate::error::CoreError;
use crate::model::{DeviceId, Mode, StatusSnapshot};

/// All coordinators known to the host, keyed by device.
pub struct Registry<C> {
    coordinators: DashMap<DeviceId, Coordinator<C>>,
}

impl<C: DeviceClient> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DeviceClient> Registry<C> {
    pub fn new() -> Self {
        Self {
            coordinators: DashMap::new(),
        }
    }

    /// Create and store a coordinator for `device_id`. Fails if one exists.
    pub fn register(
        &self,
        device_id: DeviceId,
        client: impl Into<Arc<C>>,
        config: CoordinatorConfig,
    ) -> Result<Coordinator<C>, CoreError> {
        match self.coordinators.entry(device_id.clone()) {
            Entry::Occupied(_) => Err(CoreError::DeviceExists {
                identifier: device_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                let coordinator = Coordinator::new(device_id.clone(), client, config);
                slot.insert(coordinator.clone());
                info!(device_id = %device_id, "device registered");
                Ok(coordinator)
            }
        }
    }

    /// Remove a device and stop its coordinator.
    pub async fn remove(&self, device_id: &DeviceId) -> Result<(), CoreError> {
        let (_, coordinator) = self
            .coordinators
            .remove(device_id)
            .ok_or_else(|| not_found(device_id))?;
        coordinator.shutdown().await;
        info!(device_id = %device_id, "device removed");
        Ok(())
    }

    pub fn get(&self, device_id: &DeviceId) -> Option<Coordinator<C>> {
        self.coordinators.get(device_id).map(|e| e.value().clone())
    }

    fn require(&self, device_id: &DeviceId) -> Result<Coordinator<C>, CoreError> {
        self.get(device_id).ok_or_else(|| not_found(device_id))
    }

    /// Registered device ids, sorted.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<_> = self.coordinators.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    fn snapshot(&self) -> Vec<Coordinator<C>> {
        self.coordinators.iter().map(|e| e.value().clone()).collect()
    }

    /// Start the periodic tick task of every registered coordinator.
    pub async fn start_all(&self) {
        for coordinator in self.snapshot() {
            coordinator.start().await;
        }
    }

    /// Tick every coordinator concurrently.
    pub async fn on_tick(&self) -> Vec<(DeviceId, Result<TickReport, CoreError>)> {
        let coordinators = self.snapshot();
        join_all(coordinators.iter().map(|c| async move {
            (c.device_id().clone(), c.tick().await)
        }))
        .await
    }

    pub fn get_status(&self, device_id: &DeviceId) -> Option<Arc<StatusSnapshot>> {
        self.get(device_id)?.status()
    }

    pub fn get_pending_mode(&self, device_id: &DeviceId) -> Option<Mode> {
        self.get(device_id)?.pending_mode()
    }

    pub async fn issue_command(
        &self,
        device_id: &DeviceId,
        mode: Mode,
    ) -> Result<CommandOutcome, CoreError> {
        self.require(device_id)?.issue_command(mode).await
    }

    pub async fn request_refresh(&self, device_id: &DeviceId) -> Result<TickReport, CoreError> {
        self.require(device_id)?.request_refresh().await
    }

    /// Remove and stop every coordinator.
    pub async fn shutdown(&self) {
        for device_id in self.device_ids() {
            if let Some((_, coordinator)) = self.coordinators.remove(&device_id) {
                coordinator.shutdown().await;
            }
        }
    }
}

fn not_found(device_id: &DeviceId) -> CoreError {
    CoreError::DeviceNotFound {
        identifier: device_id.to_string(),
    }
}
