//! # Chronos Layer - Vulkan GPU Timing Capture
//!
//! Capture core for a Vulkan layer that reconstructs GPU-side time
//! intervals for command buffers and nested debug markers, and hands them
//! to a capture sink as per-submission events.
//!
//! ## Modules
//!
//! - **Dispatch**: driver function resolution per tracked handle
//! - **Device**: logical → physical device registry
//! - **Timing**: timestamp slot pool and submission tracker
//! - **Producer**: capture events and sink plumbing
//! - **Layer**: Pre/Post hook orchestration around the driver calls

pub mod config;
pub mod device;
pub mod dispatch;
pub mod layer;
pub mod producer;
pub mod timing;
pub mod util;

pub use config::{LayerConfig, SlotExhaustionPolicy};
pub use device::{DeviceLookup, DeviceManager};
pub use dispatch::{DeviceTimingCapabilities, Dispatch, DispatchTable};
pub use layer::CaptureLayer;
pub use producer::{
    BufferedCaptureSink, CaptureEvent, CaptureSink, Color, SinkSlot, StringInterner,
};
pub use timing::{QuerySlots, SubmissionTracker, TimerQueryPool, TimingError};

/// Library version
pub const VERSION: &str = "1.0.0";

/// Library name
pub const NAME: &str = "chronos_layer";

/// Initialize logging
///
/// Safe to call more than once; only the first call installs the
/// subscriber.
pub fn init_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .try_init();
}
