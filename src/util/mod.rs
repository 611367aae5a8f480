//! # OS Utilities
//!
//! Monotonic clock and thread identity helpers used for submission
//! metadata.

/// Process-local epoch for platforms without a raw monotonic clock
#[cfg(not(target_os = "linux"))]
static PROCESS_EPOCH: once_cell::sync::Lazy<std::time::Instant> =
    once_cell::sync::Lazy::new(std::time::Instant::now);

/// Current CLOCK_MONOTONIC time in nanoseconds
#[cfg(target_os = "linux")]
pub fn monotonic_timestamp_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let result = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    assert_eq!(result, 0, "clock_gettime(CLOCK_MONOTONIC) failed");
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}

/// Monotonic nanoseconds since the first call in this process
#[cfg(not(target_os = "linux"))]
pub fn monotonic_timestamp_ns() -> u64 {
    PROCESS_EPOCH.elapsed().as_nanos() as u64
}

/// Kernel thread id of the calling thread
#[cfg(target_os = "linux")]
pub fn current_thread_id() -> i32 {
    unsafe { libc::gettid() }
}

/// Fallback thread id (process id) for non-Linux targets
#[cfg(not(target_os = "linux"))]
pub fn current_thread_id() -> i32 {
    std::process::id() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_timestamp_is_nondecreasing() {
        let first = monotonic_timestamp_ns();
        let second = monotonic_timestamp_ns();
        assert!(first <= second);
    }

    #[test]
    fn test_thread_id_is_stable_within_a_thread() {
        assert_eq!(current_thread_id(), current_thread_id());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_thread_ids_differ_across_threads() {
        let own = current_thread_id();
        let other = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(own, other);
    }
}
