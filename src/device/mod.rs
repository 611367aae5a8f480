//! # Device Registry
//!
//! Logical → physical device mapping and cached device properties. The
//! timing core only ever reads `limits.timestamp_period` from here, the
//! nanoseconds-per-tick multiplier of each GPU.

use std::collections::HashMap;

use ash::vk;
use parking_lot::RwLock;

/// Device property lookup consumed by the submission tracker
///
/// Asking about an untracked device is a programmer error and panics.
pub trait DeviceLookup: Send + Sync {
    /// Physical device backing a logical device
    fn physical_device_of(&self, device: vk::Device) -> vk::PhysicalDevice;

    /// Cached properties of a physical device
    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties;
}

#[derive(Default)]
struct DeviceState {
    logical_to_physical: HashMap<vk::Device, vk::PhysicalDevice>,
    physical_properties: HashMap<vk::PhysicalDevice, vk::PhysicalDeviceProperties>,
}

/// Registry of the logical devices the layer has seen created
#[derive(Default)]
pub struct DeviceManager {
    state: RwLock<DeviceState>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical device with its physical device properties
    pub fn track_logical_device(
        &self,
        device: vk::Device,
        physical_device: vk::PhysicalDevice,
        properties: vk::PhysicalDeviceProperties,
    ) {
        let mut state = self.state.write();
        assert!(
            !state.logical_to_physical.contains_key(&device),
            "Device {:?} tracked twice",
            device
        );
        state.logical_to_physical.insert(device, physical_device);
        state.physical_properties.insert(physical_device, properties);
        log::debug!(
            "Tracking {:?} on {:?} (timestamp period {} ns/tick)",
            device,
            physical_device,
            properties.limits.timestamp_period
        );
    }

    /// Drop a logical device; properties are kept while another logical
    /// device still shares the physical one
    pub fn untrack_logical_device(&self, device: vk::Device) {
        let mut state = self.state.write();
        let physical_device = state
            .logical_to_physical
            .remove(&device)
            .unwrap_or_else(|| panic!("Device {:?} was never tracked", device));
        let physical_still_used = state
            .logical_to_physical
            .values()
            .any(|&p| p == physical_device);
        if !physical_still_used {
            state.physical_properties.remove(&physical_device);
        }
    }
}

impl DeviceLookup for DeviceManager {
    fn physical_device_of(&self, device: vk::Device) -> vk::PhysicalDevice {
        self.state
            .read()
            .logical_to_physical
            .get(&device)
            .copied()
            .unwrap_or_else(|| panic!("Device {:?} is not tracked", device))
    }

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        *self
            .state
            .read()
            .physical_properties
            .get(&physical_device)
            .unwrap_or_else(|| panic!("No properties for {:?}", physical_device))
    }
}
