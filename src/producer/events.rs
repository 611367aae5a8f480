//! # Capture Event Model
//!
//! The data handed to a capture sink for every completed queue
//! submission, with all GPU timestamps already converted to nanoseconds.

use serde::Serialize;

/// RGBA marker color, all channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    /// True when every channel is zero, which is treated as "no color"
    pub fn is_zero(&self) -> bool {
        self.red == 0.0 && self.green == 0.0 && self.blue == 0.0 && self.alpha == 0.0
    }
}

/// CPU-side context of one queue submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionMetaInfo {
    /// Kernel thread id of the submitting thread
    pub thread_id: i32,
    /// CPU nanoseconds taken immediately before the driver submit
    pub pre_submission_cpu_timestamp_ns: u64,
    /// CPU nanoseconds taken immediately after the driver submit
    pub post_submission_cpu_timestamp_ns: u64,
}

/// GPU-side interval of one submitted command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GpuCommandBuffer {
    /// Absent when recording began outside a capture window
    pub begin_gpu_timestamp_ns: Option<u64>,
    pub end_gpu_timestamp_ns: u64,
}

/// Command buffers of one submit info, in submission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuSubmitInfo {
    pub command_buffers: Vec<GpuCommandBuffer>,
}

/// Begin side of a completed debug marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpuDebugMarkerBegin {
    /// Submission the begin was recorded under (may predate the end's)
    pub meta: SubmissionMetaInfo,
    pub gpu_timestamp_ns: u64,
}

/// A debug marker whose end executed in this submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpuDebugMarker {
    /// Interned label key, see `CaptureSink::intern_string`
    pub text_key: u64,
    /// Omitted when the recorded color was fully zero
    pub color: Option<Color>,
    /// Queue marker stack size right before the begin was pushed
    pub depth: u32,
    /// Absent when the begin fell outside a capture window
    pub begin: Option<GpuDebugMarkerBegin>,
    pub end_gpu_timestamp_ns: u64,
}

/// One queue submission with all timings resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuQueueSubmission {
    pub meta: SubmissionMetaInfo,
    pub submit_infos: Vec<GpuSubmitInfo>,
    pub completed_markers: Vec<GpuDebugMarker>,
    /// Begin markers with timestamps across the whole submission
    pub num_begin_markers: u32,
}

/// Event stream unit delivered to a capture sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CaptureEvent {
    QueueSubmission(GpuQueueSubmission),
}
