//! # Vulkan Dispatch
//!
//! Driver function resolution for the handles the layer tracks. Every
//! call the timing core makes into the driver goes through here, keyed by
//! the opaque device, command buffer or queue handle it concerns.

use std::collections::HashMap;

use ash::vk;
use parking_lot::RwLock;

/// Timing-relevant extension support of a device
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceTimingCapabilities {
    /// VK_EXT_debug_marker is enabled on the device
    pub debug_marker: bool,
    /// VK_EXT_debug_utils is enabled on the instance
    pub debug_utils: bool,
}

/// Driver call surface the timing core depends on
///
/// [`DispatchTable`] is the production implementation; tests substitute
/// recording stubs. Resolution is infallible for registered handles and
/// panics for unknown ones.
pub trait Dispatch: Send + Sync {
    /// Record a timestamp write into `command_buffer` at `stage`
    fn write_timestamp(
        &self,
        command_buffer: vk::CommandBuffer,
        stage: vk::PipelineStageFlags,
        query_pool: vk::QueryPool,
        slot: u32,
    );

    /// Create a query pool on `device`
    fn create_query_pool(
        &self,
        device: vk::Device,
        create_info: &vk::QueryPoolCreateInfo<'_>,
    ) -> Result<vk::QueryPool, vk::Result>;

    /// Destroy a query pool on `device`
    fn destroy_query_pool(&self, device: vk::Device, query_pool: vk::QueryPool);

    /// Host-reset a slot range of a query pool
    fn reset_query_pool(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        first_slot: u32,
        slot_count: u32,
    );

    /// Read back 64-bit query results; `NOT_READY` is an expected outcome
    fn get_query_pool_results(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        first_slot: u32,
        slot_count: u32,
        results: &mut [u64],
        stride: vk::DeviceSize,
        flags: vk::QueryResultFlags,
    ) -> vk::Result;

    /// Whether the command buffer's device has VK_EXT_debug_marker
    fn is_debug_marker_extension_supported(&self, command_buffer: vk::CommandBuffer) -> bool;

    /// Whether the command buffer's device has VK_EXT_debug_utils
    fn is_debug_utils_extension_supported(&self, command_buffer: vk::CommandBuffer) -> bool;
}

#[derive(Default)]
struct DispatchState {
    device_functions: HashMap<vk::Device, ash::Device>,
    device_capabilities: HashMap<vk::Device, DeviceTimingCapabilities>,
    command_buffer_to_device: HashMap<vk::CommandBuffer, vk::Device>,
    queue_to_device: HashMap<vk::Queue, vk::Device>,
}

impl DispatchState {
    fn device_of_command_buffer(&self, command_buffer: vk::CommandBuffer) -> vk::Device {
        self.command_buffer_to_device
            .get(&command_buffer)
            .copied()
            .unwrap_or_else(|| panic!("Command buffer {:?} is not registered", command_buffer))
    }

    fn functions(&self, device: vk::Device) -> &ash::Device {
        self.device_functions
            .get(&device)
            .unwrap_or_else(|| panic!("Device {:?} is not registered", device))
    }
}

/// Per-handle driver function table registry
///
/// Requires host query reset (Vulkan 1.2) from the driver; slot recycling
/// resets query contents from hook threads without a command buffer.
#[derive(Default)]
pub struct DispatchTable {
    state: RwLock<DispatchState>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical device's function table and capabilities
    pub fn register_device(
        &self,
        device: vk::Device,
        functions: ash::Device,
        capabilities: DeviceTimingCapabilities,
    ) {
        let mut state = self.state.write();
        assert!(
            !state.device_functions.contains_key(&device),
            "Device {:?} registered twice",
            device
        );
        state.device_functions.insert(device, functions);
        state.device_capabilities.insert(device, capabilities);
        log::debug!(
            "Registered dispatch for {:?} (debug_marker: {}, debug_utils: {})",
            device,
            capabilities.debug_marker,
            capabilities.debug_utils
        );
    }

    /// Drop a device and every handle registered under it
    pub fn unregister_device(&self, device: vk::Device) {
        let mut state = self.state.write();
        assert!(
            state.device_functions.remove(&device).is_some(),
            "Device {:?} was never registered",
            device
        );
        state.device_capabilities.remove(&device);
        state.command_buffer_to_device.retain(|_, d| *d != device);
        state.queue_to_device.retain(|_, d| *d != device);
    }

    /// Associate freshly allocated command buffers with their device
    pub fn register_command_buffers(&self, device: vk::Device, command_buffers: &[vk::CommandBuffer]) {
        let mut state = self.state.write();
        for &command_buffer in command_buffers {
            state.command_buffer_to_device.insert(command_buffer, device);
        }
    }

    /// Drop freed command buffers
    pub fn unregister_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        let mut state = self.state.write();
        for command_buffer in command_buffers {
            state.command_buffer_to_device.remove(command_buffer);
        }
    }

    /// Associate a queue with its device; repeat registration is fine, the
    /// driver hands out the same handle every time
    pub fn register_queue(&self, device: vk::Device, queue: vk::Queue) {
        self.state.write().queue_to_device.insert(queue, device);
    }

    /// Device that owns `queue`
    pub fn queue_device(&self, queue: vk::Queue) -> vk::Device {
        self.state
            .read()
            .queue_to_device
            .get(&queue)
            .copied()
            .unwrap_or_else(|| panic!("Queue {:?} is not registered", queue))
    }
}

impl Dispatch for DispatchTable {
    fn write_timestamp(
        &self,
        command_buffer: vk::CommandBuffer,
        stage: vk::PipelineStageFlags,
        query_pool: vk::QueryPool,
        slot: u32,
    ) {
        let state = self.state.read();
        let device = state.device_of_command_buffer(command_buffer);
        unsafe {
            state
                .functions(device)
                .cmd_write_timestamp(command_buffer, stage, query_pool, slot);
        }
    }

    fn create_query_pool(
        &self,
        device: vk::Device,
        create_info: &vk::QueryPoolCreateInfo<'_>,
    ) -> Result<vk::QueryPool, vk::Result> {
        let state = self.state.read();
        unsafe { state.functions(device).create_query_pool(create_info, None) }
    }

    fn destroy_query_pool(&self, device: vk::Device, query_pool: vk::QueryPool) {
        let state = self.state.read();
        unsafe { state.functions(device).destroy_query_pool(query_pool, None) }
    }

    fn reset_query_pool(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        first_slot: u32,
        slot_count: u32,
    ) {
        let state = self.state.read();
        unsafe {
            state
                .functions(device)
                .reset_query_pool(query_pool, first_slot, slot_count);
        }
    }

    fn get_query_pool_results(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        first_slot: u32,
        slot_count: u32,
        results: &mut [u64],
        stride: vk::DeviceSize,
        flags: vk::QueryResultFlags,
    ) -> vk::Result {
        let state = self.state.read();
        let functions = state.functions(device);
        unsafe {
            (functions.fp_v1_0().get_query_pool_results)(
                device,
                query_pool,
                first_slot,
                slot_count,
                std::mem::size_of_val(results),
                results.as_mut_ptr().cast(),
                stride,
                flags,
            )
        }
    }

    fn is_debug_marker_extension_supported(&self, command_buffer: vk::CommandBuffer) -> bool {
        let state = self.state.read();
        let device = state.device_of_command_buffer(command_buffer);
        state
            .device_capabilities
            .get(&device)
            .map_or(false, |caps| caps.debug_marker)
    }

    fn is_debug_utils_extension_supported(&self, command_buffer: vk::CommandBuffer) -> bool {
        let state = self.state.read();
        let device = state.device_of_command_buffer(command_buffer);
        state
            .device_capabilities
            .get(&device)
            .map_or(false, |caps| caps.debug_utils)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn test_queue_registration_round_trip() {
        let table = DispatchTable::new();
        let device = vk::Device::from_raw(1);
        let queue = vk::Queue::from_raw(0x60);

        table.register_queue(device, queue);
        table.register_queue(device, queue); // the driver hands out the same handle again

        assert_eq!(table.queue_device(queue), device);
    }

    #[test]
    #[should_panic]
    fn test_unknown_queue_panics() {
        let table = DispatchTable::new();
        table.queue_device(vk::Queue::from_raw(0x60));
    }

    #[test]
    #[should_panic]
    fn test_unregistering_an_unknown_device_panics() {
        let table = DispatchTable::new();
        table.unregister_device(vk::Device::from_raw(1));
    }

    #[test]
    #[should_panic]
    fn test_capability_query_for_unknown_command_buffer_panics() {
        let table = DispatchTable::new();
        table.is_debug_marker_extension_supported(vk::CommandBuffer::from_raw(2));
    }
}
