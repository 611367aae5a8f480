//! # Capture Layer
//!
//! Hook orchestration for the intercepted Vulkan entry points. The entry
//! point shims call the `pre_call_*`/`post_call_*` methods around the
//! forwarded driver calls; everything here delegates into the dispatch
//! table, device registry, query pool and submission tracker, which are
//! owned together by explicit construction.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ash::vk;

use crate::config::LayerConfig;
use crate::device::DeviceManager;
use crate::dispatch::{DeviceTimingCapabilities, DispatchTable};
use crate::producer::{CaptureSink, Color, SinkSlot};
use crate::timing::{SubmissionTracker, TimerQueryPool};

type Tracker = SubmissionTracker<DispatchTable, DeviceManager, TimerQueryPool<DispatchTable>>;

/// The layer's capture core, one instance per loaded layer
pub struct CaptureLayer {
    dispatch: Arc<DispatchTable>,
    devices: Arc<DeviceManager>,
    query_slots: Arc<TimerQueryPool<DispatchTable>>,
    tracker: Tracker,
    sink: SinkSlot,
    /// Sink teardown waits until the last tracked device is gone
    live_devices: AtomicUsize,
}

impl CaptureLayer {
    pub fn new(config: LayerConfig) -> Self {
        log::info!(
            "Capture layer starting (query slots: {}, max marker depth: {})",
            config.num_timer_query_slots,
            config.max_local_marker_depth_per_command_buffer
        );

        let dispatch = Arc::new(DispatchTable::new());
        let devices = Arc::new(DeviceManager::new());
        let query_slots = Arc::new(TimerQueryPool::new(
            dispatch.clone(),
            config.num_timer_query_slots,
        ));
        let sink = SinkSlot::new();
        let tracker = SubmissionTracker::new(
            &config,
            dispatch.clone(),
            devices.clone(),
            query_slots.clone(),
            sink.clone(),
        );

        Self {
            dispatch,
            devices,
            query_slots,
            tracker,
            sink,
            live_devices: AtomicUsize::new(0),
        }
    }

    /// Install the event sink; replaces any previous one
    pub fn bring_up_sink(&self, sink: Box<dyn CaptureSink>) {
        log::info!("Capture sink brought up");
        self.sink.install(sink);
    }

    /// Remove the event sink; in-flight submissions drain without events
    pub fn take_down_sink(&self) {
        if self.sink.take().is_some() {
            log::info!("Capture sink taken down");
        }
    }

    /// A logical device finished creation
    pub fn on_device_created(
        &self,
        device: vk::Device,
        physical_device: vk::PhysicalDevice,
        properties: vk::PhysicalDeviceProperties,
        functions: ash::Device,
        capabilities: DeviceTimingCapabilities,
    ) {
        self.dispatch.register_device(device, functions, capabilities);
        self.devices
            .track_logical_device(device, physical_device, properties);
        if let Err(err) = self.query_slots.initialize(device) {
            log::error!("Cannot time GPU work on {:?}: {}", device, err);
            panic!("{}", err);
        }
        self.live_devices.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "Tracking {:?} (timestamp period {} ns/tick)",
            device,
            properties.limits.timestamp_period
        );
    }

    /// A logical device is about to be destroyed
    pub fn on_device_destroyed(&self, device: vk::Device) {
        self.query_slots.destroy(device);
        self.devices.untrack_logical_device(device);
        self.dispatch.unregister_device(device);
        if self.live_devices.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.take_down_sink();
        }
        log::info!("Stopped tracking {:?}", device);
    }

    pub fn post_call_get_device_queue(&self, device: vk::Device, queue: vk::Queue) {
        self.dispatch.register_queue(device, queue);
    }

    pub fn post_call_allocate_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    ) {
        self.dispatch.register_command_buffers(device, command_buffers);
        self.tracker
            .track_command_buffers(device, pool, command_buffers);
    }

    pub fn post_call_free_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    ) {
        self.tracker
            .untrack_command_buffers(device, pool, command_buffers);
        self.dispatch.unregister_command_buffers(command_buffers);
    }

    pub fn post_call_begin_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        self.tracker.mark_command_buffer_begin(command_buffer);
    }

    pub fn pre_call_end_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        self.tracker.mark_command_buffer_end(command_buffer);
    }

    pub fn pre_call_reset_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        self.tracker.reset_command_buffer(command_buffer);
    }

    pub fn post_call_reset_command_pool(&self, pool: vk::CommandPool) {
        self.tracker.reset_command_pool(pool);
    }

    /// Returns the value to hand back to [`post_call_queue_submit`]
    ///
    /// [`post_call_queue_submit`]: Self::post_call_queue_submit
    pub fn pre_call_queue_submit(&self) -> Option<u64> {
        self.tracker.pre_submission()
    }

    pub fn post_call_queue_submit(
        &self,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo<'_>],
        pre_submit_timestamp: Option<u64>,
    ) {
        self.tracker
            .post_submit_queue(queue, submits, pre_submit_timestamp);
    }

    /// Present is the layer's heartbeat; completed submissions drain here
    pub fn post_call_queue_present(&self, queue: vk::Queue) {
        let device = self.dispatch.queue_device(queue);
        self.tracker.complete_submits(device);
    }

    pub fn post_call_cmd_begin_debug_utils_label(
        &self,
        command_buffer: vk::CommandBuffer,
        label_name: &str,
        color: [f32; 4],
    ) {
        self.tracker
            .mark_debug_marker_begin(command_buffer, label_name, color_from_channels(color));
    }

    pub fn pre_call_cmd_end_debug_utils_label(&self, command_buffer: vk::CommandBuffer) {
        self.tracker.mark_debug_marker_end(command_buffer);
    }

    pub fn post_call_cmd_debug_marker_begin(
        &self,
        command_buffer: vk::CommandBuffer,
        marker_name: &str,
        color: [f32; 4],
    ) {
        self.tracker
            .mark_debug_marker_begin(command_buffer, marker_name, color_from_channels(color));
    }

    pub fn pre_call_cmd_debug_marker_end(&self, command_buffer: vk::CommandBuffer) {
        self.tracker.mark_debug_marker_end(command_buffer);
    }
}

fn color_from_channels(color: [f32; 4]) -> Color {
    Color {
        red: color[0],
        green: color[1],
        blue: color[2],
        alpha: color[3],
    }
}
