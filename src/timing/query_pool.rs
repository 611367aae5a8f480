//! # Timer Query Pool
//!
//! Fixed-capacity rental of GPU timestamp slots, one driver query pool
//! per logical device. Slots are rented for a single timestamp write and
//! returned either after their value was read back (hardware reset) or
//! when the write never happened (rollback).

use std::collections::HashMap;
use std::sync::Arc;

use ash::vk;
use parking_lot::RwLock;

use crate::dispatch::Dispatch;

use super::TimingError;

/// Slot rental surface consumed by the submission tracker
pub trait QuerySlots: Send + Sync {
    /// Driver query pool handle for a device
    fn query_pool(&self, device: vk::Device) -> vk::QueryPool;

    /// Rent a free slot; `None` when the pool is exhausted
    fn next_ready_slot(&self, device: vk::Device) -> Option<u32>;

    /// Return slots whose values were consumed, resetting their contents
    /// so they can be written again
    fn reset_query_slots(&self, device: vk::Device, slots: &[u32]);

    /// Return slots that never received a GPU write; bookkeeping only, no
    /// driver reset
    fn rollback_pending_slots(&self, device: vk::Device, slots: &[u32]);
}

/// Lifecycle state of one timestamp slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Owned by the free list, safe to hand out
    ReadyForQueryIssue,
    /// Rented out, a GPU-written tick count is expected
    QueryPendingOnGpu,
}

/// Bookkeeping for one device's query pool
struct DeviceSlots {
    query_pool: vk::QueryPool,
    slot_states: Vec<SlotState>,
    free_slots: Vec<u32>,
}

/// Per-device timestamp slot allocator
pub struct TimerQueryPool<D> {
    dispatch: Arc<D>,
    num_slots: u32,
    devices: RwLock<HashMap<vk::Device, DeviceSlots>>,
}

impl<D: Dispatch> TimerQueryPool<D> {
    pub fn new(dispatch: Arc<D>, num_slots: u32) -> Self {
        Self {
            dispatch,
            num_slots,
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// Create and host-reset the driver query pool for `device`
    pub fn initialize(&self, device: vk::Device) -> Result<(), TimingError> {
        let create_info = vk::QueryPoolCreateInfo::default()
            .query_type(vk::QueryType::TIMESTAMP)
            .query_count(self.num_slots);

        let query_pool = self
            .dispatch
            .create_query_pool(device, &create_info)
            .map_err(|e| {
                TimingError::QueryPoolCreationFailed(format!(
                    "{:?}, {} slots: {:?}",
                    device, self.num_slots, e
                ))
            })?;

        self.dispatch
            .reset_query_pool(device, query_pool, 0, self.num_slots);

        let mut devices = self.devices.write();
        assert!(
            !devices.contains_key(&device),
            "Query pool already initialized for {:?}",
            device
        );
        devices.insert(
            device,
            DeviceSlots {
                query_pool,
                slot_states: vec![SlotState::ReadyForQueryIssue; self.num_slots as usize],
                free_slots: (0..self.num_slots).collect(),
            },
        );

        log::debug!(
            "Timer query pool initialized for {:?} ({} slots)",
            device,
            self.num_slots
        );
        Ok(())
    }

    /// Destroy the driver pool and drop all bookkeeping
    pub fn destroy(&self, device: vk::Device) {
        let mut devices = self.devices.write();
        let slots = devices
            .remove(&device)
            .unwrap_or_else(|| panic!("No query pool initialized for {:?}", device));
        self.dispatch.destroy_query_pool(device, slots.query_pool);
        log::debug!("Timer query pool destroyed for {:?}", device);
    }

    /// Total slots per device
    pub fn capacity(&self) -> u32 {
        self.num_slots
    }

    /// Slots currently on the free list
    pub fn free_slot_count(&self, device: vk::Device) -> usize {
        let devices = self.devices.read();
        devices
            .get(&device)
            .unwrap_or_else(|| panic!("No query pool initialized for {:?}", device))
            .free_slots
            .len()
    }

    fn release_slots(&self, device: vk::Device, slots: &[u32], rollback_only: bool) {
        if slots.is_empty() {
            return;
        }
        let mut devices = self.devices.write();
        let device_slots = devices
            .get_mut(&device)
            .unwrap_or_else(|| panic!("No query pool initialized for {:?}", device));
        for &slot in slots {
            assert!(slot < self.num_slots, "Slot {} out of range", slot);
            let state = &mut device_slots.slot_states[slot as usize];
            assert_eq!(
                *state,
                SlotState::QueryPendingOnGpu,
                "Slot {} released but was never rented",
                slot
            );
            *state = SlotState::ReadyForQueryIssue;
            device_slots.free_slots.push(slot);
            if rollback_only {
                continue;
            }
            self.dispatch
                .reset_query_pool(device, device_slots.query_pool, slot, 1);
        }
    }
}

impl<D: Dispatch> QuerySlots for TimerQueryPool<D> {
    fn query_pool(&self, device: vk::Device) -> vk::QueryPool {
        let devices = self.devices.read();
        devices
            .get(&device)
            .unwrap_or_else(|| panic!("No query pool initialized for {:?}", device))
            .query_pool
    }

    fn next_ready_slot(&self, device: vk::Device) -> Option<u32> {
        let mut devices = self.devices.write();
        let device_slots = devices
            .get_mut(&device)
            .unwrap_or_else(|| panic!("No query pool initialized for {:?}", device));
        let slot = device_slots.free_slots.pop()?;
        let state = &mut device_slots.slot_states[slot as usize];
        assert_eq!(*state, SlotState::ReadyForQueryIssue);
        *state = SlotState::QueryPendingOnGpu;
        Some(slot)
    }

    fn reset_query_slots(&self, device: vk::Device, slots: &[u32]) {
        self.release_slots(device, slots, false);
    }

    fn rollback_pending_slots(&self, device: vk::Device, slots: &[u32]) {
        self.release_slots(device, slots, true);
    }
}
