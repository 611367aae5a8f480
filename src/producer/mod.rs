//! # Capture Producer
//!
//! The boundary between the timing core and whatever collects its events.
//! The core never owns the collector; it reaches it through a [`SinkSlot`]
//! whose occupant may appear and disappear at any time.

pub mod events;

pub use events::{
    CaptureEvent, Color, GpuCommandBuffer, GpuDebugMarker, GpuDebugMarkerBegin, GpuQueueSubmission,
    GpuSubmitInfo, SubmissionMetaInfo,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Consumer of capture events
///
/// Implementations are internally synchronized; every method may be
/// called from any thread.
pub trait CaptureSink: Send + Sync {
    /// Whether a capture is currently running
    fn is_capturing(&self) -> bool;

    /// Map a marker label to its stable u64 key
    fn intern_string(&self, s: &str) -> u64;

    /// Hand over a finished event
    fn enqueue(&self, event: CaptureEvent);
}

impl<S: CaptureSink> CaptureSink for Arc<S> {
    fn is_capturing(&self) -> bool {
        (**self).is_capturing()
    }

    fn intern_string(&self, s: &str) -> u64 {
        (**self).intern_string(s)
    }

    fn enqueue(&self, event: CaptureEvent) {
        (**self).enqueue(event)
    }
}

/// Shared slot holding the currently installed sink, if any
///
/// Clones refer to the same slot. `is_capturing` is false while the slot
/// is empty, so hooks degrade to pass-through between `take` and the next
/// `install`.
#[derive(Clone, Default)]
pub struct SinkSlot {
    inner: Arc<RwLock<Option<Box<dyn CaptureSink>>>>,
}

impl SinkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a sink, returning the previous occupant
    pub fn install(&self, sink: Box<dyn CaptureSink>) -> Option<Box<dyn CaptureSink>> {
        self.inner.write().replace(sink)
    }

    /// Remove the current sink
    pub fn take(&self) -> Option<Box<dyn CaptureSink>> {
        self.inner.write().take()
    }

    /// True while a sink is installed
    pub fn is_installed(&self) -> bool {
        self.inner.read().is_some()
    }

    /// True while a sink is installed and capturing
    pub fn is_capturing(&self) -> bool {
        self.inner.read().as_ref().map_or(false, |sink| sink.is_capturing())
    }

    /// Run `f` against the installed sink, if any
    pub fn with<T>(&self, f: impl FnOnce(&dyn CaptureSink) -> T) -> Option<T> {
        self.inner.read().as_deref().map(f)
    }
}

/// First-wins label → key table
#[derive(Debug, Default)]
pub struct StringInterner {
    keys: HashMap<String, u64>,
    next_key: u64,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `s`, plus whether this call interned it
    pub fn intern(&mut self, s: &str) -> (u64, bool) {
        if let Some(&key) = self.keys.get(s) {
            return (key, false);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.keys.insert(s.to_owned(), key);
        (key, true)
    }

    /// All interned strings with their keys
    pub fn entries(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<_> = self.keys.iter().map(|(s, &k)| (s.clone(), k)).collect();
        entries.sort_by_key(|&(_, k)| k);
        entries
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// In-process sink that buffers events in memory
///
/// Stands in for the out-of-process collector in tests and when dumping a
/// capture straight to disk.
pub struct BufferedCaptureSink {
    capturing: AtomicBool,
    capacity: usize,
    state: Mutex<BufferedState>,
}

#[derive(Default)]
struct BufferedState {
    interner: StringInterner,
    events: Vec<CaptureEvent>,
    dropped: u64,
}

impl BufferedCaptureSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capturing: AtomicBool::new(false),
            capacity,
            state: Mutex::new(BufferedState::default()),
        }
    }

    /// Flip the capture flag
    pub fn set_capturing(&self, capturing: bool) {
        self.capturing.store(capturing, Ordering::SeqCst);
    }

    /// Take all buffered events
    pub fn drain(&self) -> Vec<CaptureEvent> {
        std::mem::take(&mut self.state.lock().events)
    }

    /// Serialize and take all buffered events
    pub fn drain_to_json(&self) -> String {
        serde_json::to_string_pretty(&self.drain()).unwrap_or_default()
    }

    /// Events rejected because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Interned label table, ordered by key
    pub fn interned_strings(&self) -> Vec<(String, u64)> {
        self.state.lock().interner.entries()
    }
}

impl CaptureSink for BufferedCaptureSink {
    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn intern_string(&self, s: &str) -> u64 {
        let (key, newly_interned) = self.state.lock().interner.intern(s);
        if newly_interned {
            log::debug!("Interned marker label {:?} as {}", s, key);
        }
        key
    }

    fn enqueue(&self, event: CaptureEvent) {
        let mut state = self.state.lock();
        if state.events.len() >= self.capacity {
            state.dropped += 1;
            return;
        }
        state.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_event() -> CaptureEvent {
        CaptureEvent::QueueSubmission(GpuQueueSubmission {
            meta: SubmissionMetaInfo {
                thread_id: 1,
                pre_submission_cpu_timestamp_ns: 10,
                post_submission_cpu_timestamp_ns: 20,
            },
            submit_infos: Vec::new(),
            completed_markers: Vec::new(),
            num_begin_markers: 0,
        })
    }

    #[test]
    fn test_interner_is_first_wins() {
        let mut interner = StringInterner::new();

        let (first, fresh) = interner.intern("draw");
        assert!(fresh);
        let (again, fresh) = interner.intern("draw");
        assert!(!fresh);
        assert_eq!(first, again);

        let (second, _) = interner.intern("shadow pass");
        assert_ne!(first, second);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_empty_slot_is_not_capturing() {
        let slot = SinkSlot::new();
        assert!(!slot.is_capturing());
        assert!(slot.with(|_| ()).is_none());
    }

    #[test]
    fn test_slot_reflects_installed_sink() {
        let slot = SinkSlot::new();
        let sink = Arc::new(BufferedCaptureSink::new(16));
        slot.install(Box::new(sink.clone()));

        assert!(!slot.is_capturing());
        sink.set_capturing(true);
        assert!(slot.is_capturing());

        slot.take();
        assert!(!slot.is_capturing());
    }

    #[test]
    fn test_buffered_sink_respects_capacity() {
        let sink = BufferedCaptureSink::new(2);

        sink.enqueue(dummy_event());
        sink.enqueue(dummy_event());
        sink.enqueue(dummy_event());

        assert_eq!(sink.drain().len(), 2);
        assert_eq!(sink.dropped(), 1);
    }
}
