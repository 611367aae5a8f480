//! # Submission Tracker
//!
//! The state machine that turns command buffer lifecycles, debug markers
//! and queue submissions into capture events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ash::vk;
use parking_lot::RwLock;

use crate::config::{LayerConfig, SlotExhaustionPolicy};
use crate::device::DeviceLookup;
use crate::dispatch::Dispatch;
use crate::producer::{
    CaptureEvent, CaptureSink, Color, GpuCommandBuffer, GpuDebugMarker, GpuDebugMarkerBegin,
    GpuQueueSubmission, GpuSubmitInfo, SinkSlot, SubmissionMetaInfo,
};
use crate::util;

use super::query_pool::QuerySlots;

/// Marker entry kind recorded while a command buffer is recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Begin,
    End,
}

/// One begin/end marker observation inside a command buffer
struct MarkerEntry {
    kind: MarkerKind,
    slot: Option<u32>,
    text: Option<String>,
    color: Option<Color>,
}

/// Recording state of one live command buffer
#[derive(Default)]
struct CommandBufferState {
    begin_slot: Option<u32>,
    end_slot: Option<u32>,
    markers: Vec<MarkerEntry>,
    /// Begins minus ends since recording started, floored at zero
    local_marker_stack_size: u32,
}

/// One timestamped side of a submitted marker
#[derive(Clone, Copy)]
struct SubmittedMarker {
    meta: SubmissionMetaInfo,
    slot: u32,
}

/// A marker whose begin has been submitted; lives on the queue stack
/// until the matching end arrives
struct MarkerState {
    begin_info: Option<SubmittedMarker>,
    end_info: Option<SubmittedMarker>,
    text: String,
    color: Color,
    depth: usize,
}

/// Open markers of one queue, innermost on top
#[derive(Default)]
struct QueueMarkerState {
    marker_stack: Vec<MarkerState>,
}

/// One submitted command buffer; presence of the end slot is what makes
/// the submission probeable for completion
struct SubmittedCommandBuffer {
    begin_slot: Option<u32>,
    end_slot: u32,
}

struct SubmitInfoRecord {
    command_buffers: Vec<SubmittedCommandBuffer>,
}

/// Everything captured for one queue submission, kept in flight until its
/// timestamps become readable
struct QueueSubmission {
    meta: SubmissionMetaInfo,
    submit_infos: Vec<SubmitInfoRecord>,
    completed_markers: Vec<MarkerState>,
    /// Slots that received a GPU write but lost their timing context
    /// (unmatched marker ends, buffers dropped for missing end slots);
    /// reclaimed at drain, never emitted
    orphaned_slots: Vec<u32>,
    num_begin_markers: u32,
}

#[derive(Default)]
struct TrackerState {
    pool_to_command_buffers: HashMap<vk::CommandPool, HashSet<vk::CommandBuffer>>,
    command_buffer_to_device: HashMap<vk::CommandBuffer, vk::Device>,
    command_buffer_to_state: HashMap<vk::CommandBuffer, CommandBufferState>,
    queue_to_submissions: HashMap<vk::Queue, Vec<QueueSubmission>>,
    queue_to_markers: HashMap<vk::Queue, QueueMarkerState>,
}

/// Tracks command buffer and debug marker timings across queue
/// submissions.
///
/// Observes command buffer allocation, recording, reset and submission
/// through the layer hooks. While a capture is running it inserts
/// timestamp writes at recording begin/end and around debug markers,
/// gathers everything belonging to a submission at queue-submit time, and
/// at present time polls the driver for finished submissions, emitting one
/// capture event per submission to the installed sink.
///
/// Internally synchronized with a single reader/writer lock; hooks may be
/// called concurrently from application threads.
pub struct SubmissionTracker<D, R, P> {
    max_local_marker_depth: u32,
    exhaustion_policy: SlotExhaustionPolicy,
    dispatch: Arc<D>,
    devices: Arc<R>,
    query_slots: Arc<P>,
    sink: SinkSlot,
    state: RwLock<TrackerState>,
}

impl<D: Dispatch, R: DeviceLookup, P: QuerySlots> SubmissionTracker<D, R, P> {
    pub fn new(
        config: &LayerConfig,
        dispatch: Arc<D>,
        devices: Arc<R>,
        query_slots: Arc<P>,
        sink: SinkSlot,
    ) -> Self {
        Self {
            max_local_marker_depth: config.max_local_marker_depth_per_command_buffer,
            exhaustion_policy: config.slot_exhaustion,
            dispatch,
            devices,
            query_slots,
            sink,
            state: RwLock::new(TrackerState::default()),
        }
    }

    /// Register freshly allocated command buffers under their pool
    pub fn track_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    ) {
        let mut state = self.state.write();
        let associated = state.pool_to_command_buffers.entry(pool).or_default();
        for &command_buffer in command_buffers {
            associated.insert(command_buffer);
        }
        for &command_buffer in command_buffers {
            let previous = state.command_buffer_to_device.insert(command_buffer, device);
            assert!(
                previous.is_none(),
                "Command buffer {:?} tracked twice",
                command_buffer
            );
        }
    }

    /// Drop freed command buffers; panics when a buffer was not tracked
    /// under this pool and device
    pub fn untrack_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    ) {
        let mut state = self.state.write();
        let associated = state
            .pool_to_command_buffers
            .get_mut(&pool)
            .unwrap_or_else(|| panic!("Pool {:?} is not tracked", pool));
        for command_buffer in command_buffers {
            assert!(
                associated.remove(command_buffer),
                "Command buffer {:?} is not tracked under {:?}",
                command_buffer,
                pool
            );
        }
        let pool_empty = associated.is_empty();
        for command_buffer in command_buffers {
            let tracked_device = state
                .command_buffer_to_device
                .remove(command_buffer)
                .unwrap_or_else(|| panic!("Command buffer {:?} is not tracked", command_buffer));
            assert_eq!(
                tracked_device, device,
                "Command buffer {:?} tracked under a different device",
                command_buffer
            );
        }
        if pool_empty {
            state.pool_to_command_buffers.remove(&pool);
        }
    }

    /// A command buffer entered the recording state
    ///
    /// State is created even outside a capture so that marker nesting can
    /// be balanced; the begin timestamp is only written while capturing.
    pub fn mark_command_buffer_begin(&self, command_buffer: vk::CommandBuffer) {
        {
            let mut state = self.state.write();
            assert!(
                !state.command_buffer_to_state.contains_key(&command_buffer),
                "Command buffer {:?} is already recording",
                command_buffer
            );
            state
                .command_buffer_to_state
                .insert(command_buffer, CommandBufferState::default());
        }
        if !self.is_capturing() {
            return;
        }

        if let Some(slot) = self.record_timestamp(command_buffer, vk::PipelineStageFlags::TOP_OF_PIPE)
        {
            let mut state = self.state.write();
            self.recording_state(&mut state, command_buffer).begin_slot = Some(slot);
        }
    }

    /// A command buffer is about to leave the recording state
    pub fn mark_command_buffer_end(&self, command_buffer: vk::CommandBuffer) {
        if !self.is_capturing() {
            return;
        }

        if let Some(slot) =
            self.record_timestamp(command_buffer, vk::PipelineStageFlags::BOTTOM_OF_PIPE)
        {
            let mut state = self.state.write();
            self.recording_state(&mut state, command_buffer).end_slot = Some(slot);
        }
    }

    /// A debug marker opened inside a recording command buffer
    pub fn mark_debug_marker_begin(&self, command_buffer: vk::CommandBuffer, text: &str, color: Color) {
        let too_many_markers;
        {
            let mut state = self.state.write();
            let record = self.recording_state(&mut state, command_buffer);
            record.markers.push(MarkerEntry {
                kind: MarkerKind::Begin,
                slot: None,
                text: Some(text.to_owned()),
                color: Some(color),
            });
            record.local_marker_stack_size += 1;
            too_many_markers = self.max_local_marker_depth > 0
                && record.local_marker_stack_size > self.max_local_marker_depth;
        }

        if !self.is_capturing()
            || too_many_markers
            || !self.marker_timestamps_supported(command_buffer)
        {
            return;
        }

        if let Some(slot) = self.record_timestamp(command_buffer, vk::PipelineStageFlags::TOP_OF_PIPE)
        {
            let mut state = self.state.write();
            self.last_marker_entry(&mut state, command_buffer).slot = Some(slot);
        }
    }

    /// A debug marker closed inside a recording command buffer
    pub fn mark_debug_marker_end(&self, command_buffer: vk::CommandBuffer) {
        let too_many_markers;
        {
            let mut state = self.state.write();
            let record = self.recording_state(&mut state, command_buffer);
            record.markers.push(MarkerEntry {
                kind: MarkerKind::End,
                slot: None,
                text: None,
                color: None,
            });
            too_many_markers = self.max_local_marker_depth > 0
                && record.local_marker_stack_size > self.max_local_marker_depth;
            // More ends than begins is legal, the matching begin may live
            // on an earlier command buffer of the same queue.
            if record.local_marker_stack_size != 0 {
                record.local_marker_stack_size -= 1;
            }
        }

        if !self.is_capturing()
            || too_many_markers
            || !self.marker_timestamps_supported(command_buffer)
        {
            return;
        }

        if let Some(slot) =
            self.record_timestamp(command_buffer, vk::PipelineStageFlags::BOTTOM_OF_PIPE)
        {
            let mut state = self.state.write();
            self.last_marker_entry(&mut state, command_buffer).slot = Some(slot);
        }
    }

    /// A command buffer was reset; none of its pending timestamp writes
    /// will ever execute, so its slots roll back without a driver reset
    pub fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        let mut state = self.state.write();
        let Some(record) = state.command_buffer_to_state.remove(&command_buffer) else {
            return;
        };
        let device = *state
            .command_buffer_to_device
            .get(&command_buffer)
            .unwrap_or_else(|| panic!("Command buffer {:?} is not tracked", command_buffer));

        let mut rollback_slots = Vec::new();
        rollback_slots.extend(record.begin_slot);
        rollback_slots.extend(record.end_slot);
        for marker in &record.markers {
            rollback_slots.extend(marker.slot);
        }
        drop(state);

        self.query_slots.rollback_pending_slots(device, &rollback_slots);
    }

    /// A command pool was reset, implicitly resetting all its buffers
    pub fn reset_command_pool(&self, pool: vk::CommandPool) {
        let command_buffers: Vec<vk::CommandBuffer> = {
            let state = self.state.read();
            match state.pool_to_command_buffers.get(&pool) {
                Some(associated) => associated.iter().copied().collect(),
                None => return,
            }
        };
        for command_buffer in command_buffers {
            self.reset_command_buffer(command_buffer);
        }
    }

    /// CPU timestamp taken right before the driver submit, `None` outside
    /// a capture. The caller must pass the value to [`post_submit_queue`]
    /// unchanged.
    ///
    /// [`post_submit_queue`]: Self::post_submit_queue
    pub fn pre_submission(&self) -> Option<u64> {
        if !self.is_capturing() {
            // The post-submit hook still runs and reclaims slots.
            return None;
        }
        Some(util::monotonic_timestamp_ns())
    }

    /// A queue submission returned from the driver
    ///
    /// The `p_command_buffers` arrays inside `submits` must still be valid,
    /// which holds inside the submit hook where the layer calls this.
    ///
    /// Outside a capture window (or when `pre_submit_timestamp` is absent
    /// because the capture started mid-submission) the referenced records
    /// are discarded and their slots recycled. Otherwise the submission is
    /// recorded and queued for completion polling.
    pub fn post_submit_queue(
        &self,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo<'_>],
        pre_submit_timestamp: Option<u64>,
    ) {
        let Some(pre_timestamp) = pre_submit_timestamp.filter(|_| self.is_capturing()) else {
            self.release_submitted_slots(submits);
            return;
        };

        let meta = SubmissionMetaInfo {
            thread_id: util::current_thread_id(),
            pre_submission_cpu_timestamp_ns: pre_timestamp,
            post_submission_cpu_timestamp_ns: util::monotonic_timestamp_ns(),
        };

        let mut guard = self.state.write();
        let state = &mut *guard;
        let markers = state.queue_to_markers.entry(queue).or_default();

        let mut submission = QueueSubmission {
            meta,
            submit_infos: Vec::with_capacity(submits.len()),
            completed_markers: Vec::new(),
            orphaned_slots: Vec::new(),
            num_begin_markers: 0,
        };

        for submit_info in submits {
            let mut submitted_info = SubmitInfoRecord {
                command_buffers: Vec::new(),
            };
            for &command_buffer in command_buffers_of(submit_info) {
                let record = state
                    .command_buffer_to_state
                    .remove(&command_buffer)
                    .unwrap_or_else(|| {
                        panic!("Submitted command buffer {:?} has no recording state", command_buffer)
                    });

                for marker in record.markers {
                    let submitted_marker = marker.slot.map(|slot| SubmittedMarker { meta, slot });
                    match marker.kind {
                        MarkerKind::Begin => {
                            if submitted_marker.is_some() {
                                submission.num_begin_markers += 1;
                            }
                            let text = marker
                                .text
                                .unwrap_or_else(|| panic!("Begin marker without text"));
                            let color = marker
                                .color
                                .unwrap_or_else(|| panic!("Begin marker without color"));
                            markers.marker_stack.push(MarkerState {
                                begin_info: submitted_marker,
                                end_info: None,
                                text,
                                color,
                                depth: markers.marker_stack.len(),
                            });
                        }
                        MarkerKind::End => match markers.marker_stack.pop() {
                            Some(mut open_marker) => {
                                // Keep the marker when either side carries a
                                // timestamp; both slots must come home at
                                // drain time.
                                if submitted_marker.is_some() || open_marker.begin_info.is_some() {
                                    open_marker.end_info = submitted_marker;
                                    submission.completed_markers.push(open_marker);
                                }
                            }
                            None => {
                                // The matching begin predates every tracked
                                // submission on this queue.
                                if let Some(submitted_marker) = submitted_marker {
                                    submission.orphaned_slots.push(submitted_marker.slot);
                                }
                            }
                        },
                    }
                }

                match record.end_slot {
                    Some(end_slot) => {
                        submitted_info.command_buffers.push(SubmittedCommandBuffer {
                            begin_slot: record.begin_slot,
                            end_slot,
                        });
                    }
                    None => {
                        // Capture started after recording began; without an
                        // end slot the buffer cannot be probed for
                        // completion, so it contributes no timings.
                        submission.orphaned_slots.extend(record.begin_slot);
                    }
                }
            }
            submission.submit_infos.push(submitted_info);
        }

        state
            .queue_to_submissions
            .entry(queue)
            .or_default()
            .push(submission);
    }

    /// Poll in-flight submissions and emit capture events for those whose
    /// timestamps are readable; typically called at present time
    pub fn complete_submits(&self, device: vk::Device) {
        let query_pool = self.query_slots.query_pool(device);
        let mut reset_slots = Vec::new();
        let completed = self.pull_completed_submissions(device, query_pool, &mut reset_slots);

        if !completed.is_empty() {
            let physical_device = self.devices.physical_device_of(device);
            let timestamp_period = self
                .devices
                .properties(physical_device)
                .limits
                .timestamp_period;

            for submission in &completed {
                collect_submission_slots(submission, &mut reset_slots);
            }

            // No sink means the capture went away mid-flight; the events
            // are dropped whole, the slots still come home.
            self.sink.with(|sink| {
                for submission in &completed {
                    let event =
                        self.build_submission_event(device, query_pool, timestamp_period, submission, sink);
                    sink.enqueue(CaptureEvent::QueueSubmission(event));
                }
            });
        }

        if !reset_slots.is_empty() {
            self.query_slots.reset_query_slots(device, &reset_slots);
        }
    }

    fn is_capturing(&self) -> bool {
        self.sink.is_capturing()
    }

    /// Timestamp writes around markers only make sense when the driver
    /// exposes one of the marker extensions for this buffer's device
    fn marker_timestamps_supported(&self, command_buffer: vk::CommandBuffer) -> bool {
        self.dispatch
            .is_debug_marker_extension_supported(command_buffer)
            || self
                .dispatch
                .is_debug_utils_extension_supported(command_buffer)
    }

    fn recording_state<'a>(
        &self,
        state: &'a mut TrackerState,
        command_buffer: vk::CommandBuffer,
    ) -> &'a mut CommandBufferState {
        state
            .command_buffer_to_state
            .get_mut(&command_buffer)
            .unwrap_or_else(|| panic!("Command buffer {:?} is not recording", command_buffer))
    }

    fn last_marker_entry<'a>(
        &self,
        state: &'a mut TrackerState,
        command_buffer: vk::CommandBuffer,
    ) -> &'a mut MarkerEntry {
        self.recording_state(state, command_buffer)
            .markers
            .last_mut()
            .unwrap_or_else(|| panic!("Command buffer {:?} has no marker entries", command_buffer))
    }

    /// Rent a slot and emit a timestamp write into the command buffer.
    /// `None` only under the `Skip` exhaustion policy.
    fn record_timestamp(
        &self,
        command_buffer: vk::CommandBuffer,
        stage: vk::PipelineStageFlags,
    ) -> Option<u32> {
        let device = {
            let state = self.state.read();
            state
                .command_buffer_to_device
                .get(&command_buffer)
                .copied()
                .unwrap_or_else(|| panic!("Command buffer {:?} is not tracked", command_buffer))
        };

        let query_pool = self.query_slots.query_pool(device);
        let Some(slot) = self.query_slots.next_ready_slot(device) else {
            match self.exhaustion_policy {
                SlotExhaustionPolicy::Fatal => {
                    panic!("Timestamp slot pool exhausted for {:?}", device)
                }
                SlotExhaustionPolicy::Skip => {
                    log::warn!(
                        "Timestamp slot pool exhausted for {:?}, dropping a timestamp",
                        device
                    );
                    return None;
                }
            }
        };
        self.dispatch
            .write_timestamp(command_buffer, stage, query_pool, slot);
        Some(slot)
    }

    /// Regime for submissions that cannot become capture events: the
    /// referenced records still own slots from an earlier capture window,
    /// and those did receive GPU writes, so they take the hardware reset
    /// path. Queue marker stacks are left untouched.
    fn release_submitted_slots(&self, submits: &[vk::SubmitInfo<'_>]) {
        {
            let state = self.state.read();
            if state.command_buffer_to_state.is_empty() {
                return;
            }
        }

        let mut reset_slots = Vec::new();
        let mut device = None;
        {
            let mut state = self.state.write();
            for submit_info in submits {
                for command_buffer in command_buffers_of(submit_info) {
                    let Some(record) = state.command_buffer_to_state.remove(command_buffer) else {
                        continue;
                    };
                    if device.is_none() {
                        device = state.command_buffer_to_device.get(command_buffer).copied();
                    }
                    reset_slots.extend(record.begin_slot);
                    reset_slots.extend(record.end_slot);
                    for marker in &record.markers {
                        reset_slots.extend(marker.slot);
                    }
                }
            }
        }

        if let (Some(device), false) = (device, reset_slots.is_empty()) {
            self.query_slots.reset_query_slots(device, &reset_slots);
        }
    }

    /// Remove every submission whose trailing command buffer has a
    /// readable end timestamp, in FIFO order per queue. Submissions left
    /// without any command buffer are dropped on the spot; slots they
    /// still reference are appended to `dropped_slots`.
    fn pull_completed_submissions(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        dropped_slots: &mut Vec<u32>,
    ) -> Vec<QueueSubmission> {
        let mut completed = Vec::new();

        let mut state = self.state.write();
        for submissions in state.queue_to_submissions.values_mut() {
            let mut index = 0;
            while index < submissions.len() {
                let Some(probe_slot) = last_end_slot(&submissions[index]) else {
                    let submission = submissions.remove(index);
                    collect_marker_slots(&submission, dropped_slots);
                    continue;
                };

                let mut probe_result = [0u64; 1];
                let status = self.dispatch.get_query_pool_results(
                    device,
                    query_pool,
                    probe_slot,
                    1,
                    &mut probe_result,
                    std::mem::size_of::<u64>() as vk::DeviceSize,
                    vk::QueryResultFlags::TYPE_64,
                );

                if status == vk::Result::SUCCESS {
                    completed.push(submissions.remove(index));
                } else {
                    // Not ready. Submissions behind this one finish later
                    // by queue ordering, so stop scanning this queue.
                    break;
                }
            }
        }

        completed
    }

    fn build_submission_event(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        timestamp_period: f32,
        submission: &QueueSubmission,
        sink: &dyn CaptureSink,
    ) -> GpuQueueSubmission {
        let mut submit_infos = Vec::with_capacity(submission.submit_infos.len());
        for submitted_info in &submission.submit_infos {
            let mut command_buffers = Vec::with_capacity(submitted_info.command_buffers.len());
            for submitted_command_buffer in &submitted_info.command_buffers {
                let begin_gpu_timestamp_ns = submitted_command_buffer.begin_slot.map(|slot| {
                    self.query_gpu_timestamp_ns(device, query_pool, slot, timestamp_period)
                });
                let end_gpu_timestamp_ns = self.query_gpu_timestamp_ns(
                    device,
                    query_pool,
                    submitted_command_buffer.end_slot,
                    timestamp_period,
                );
                command_buffers.push(GpuCommandBuffer {
                    begin_gpu_timestamp_ns,
                    end_gpu_timestamp_ns,
                });
            }
            submit_infos.push(GpuSubmitInfo { command_buffers });
        }

        let mut completed_markers = Vec::new();
        for marker in &submission.completed_markers {
            // Markers that only carry a begin timestamp have nothing to
            // anchor an interval to; their slot is reclaimed regardless.
            let Some(end_info) = marker.end_info else {
                continue;
            };
            let begin = marker.begin_info.map(|begin_info| GpuDebugMarkerBegin {
                meta: begin_info.meta,
                gpu_timestamp_ns: self.query_gpu_timestamp_ns(
                    device,
                    query_pool,
                    begin_info.slot,
                    timestamp_period,
                ),
            });
            completed_markers.push(GpuDebugMarker {
                text_key: sink.intern_string(&marker.text),
                color: (!marker.color.is_zero()).then_some(marker.color),
                depth: marker.depth as u32,
                begin,
                end_gpu_timestamp_ns: self.query_gpu_timestamp_ns(
                    device,
                    query_pool,
                    end_info.slot,
                    timestamp_period,
                ),
            });
        }

        GpuQueueSubmission {
            meta: submission.meta,
            submit_infos,
            completed_markers,
            num_begin_markers: submission.num_begin_markers,
        }
    }

    /// Read one 64-bit tick count and convert it to nanoseconds. The
    /// submission was probed ready, so anything but success is fatal.
    fn query_gpu_timestamp_ns(
        &self,
        device: vk::Device,
        query_pool: vk::QueryPool,
        slot: u32,
        timestamp_period: f32,
    ) -> u64 {
        let mut timestamp = [0u64; 1];
        let status = self.dispatch.get_query_pool_results(
            device,
            query_pool,
            slot,
            1,
            &mut timestamp,
            std::mem::size_of::<u64>() as vk::DeviceSize,
            vk::QueryResultFlags::TYPE_64,
        );
        assert_eq!(
            status,
            vk::Result::SUCCESS,
            "Slot {} of a completed submission is unreadable",
            slot
        );
        (timestamp[0] as f64 * timestamp_period as f64) as u64
    }
}

/// View of a submit info's command buffer array
fn command_buffers_of<'a>(submit_info: &'a vk::SubmitInfo<'_>) -> &'a [vk::CommandBuffer] {
    if submit_info.p_command_buffers.is_null() || submit_info.command_buffer_count == 0 {
        return &[];
    }
    unsafe {
        std::slice::from_raw_parts(
            submit_info.p_command_buffers,
            submit_info.command_buffer_count as usize,
        )
    }
}

/// End slot of the last command buffer in the trailing non-empty submit
/// info, the single probe point for the whole submission
fn last_end_slot(submission: &QueueSubmission) -> Option<u32> {
    submission
        .submit_infos
        .iter()
        .rev()
        .find_map(|submitted_info| submitted_info.command_buffers.last())
        .map(|submitted_command_buffer| submitted_command_buffer.end_slot)
}

fn collect_marker_slots(submission: &QueueSubmission, slots: &mut Vec<u32>) {
    for marker in &submission.completed_markers {
        slots.extend(marker.begin_info.map(|begin_info| begin_info.slot));
        slots.extend(marker.end_info.map(|end_info| end_info.slot));
    }
    slots.extend_from_slice(&submission.orphaned_slots);
}

fn collect_submission_slots(submission: &QueueSubmission, slots: &mut Vec<u32>) {
    for submitted_info in &submission.submit_infos {
        for submitted_command_buffer in &submitted_info.command_buffers {
            slots.extend(submitted_command_buffer.begin_slot);
            slots.push(submitted_command_buffer.end_slot);
        }
    }
    collect_marker_slots(submission, slots);
}
