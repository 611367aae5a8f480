//! # Timer Query Pool Unit Tests
//!
//! Slot rental bookkeeping exercised against a recording driver stub.

use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;

use chronos_layer::dispatch::Dispatch;
use chronos_layer::timing::{QuerySlots, TimerQueryPool};

const QUERY_POOL_HANDLE: u64 = 0x51;

/// Driver stub that records every query pool call it receives
#[derive(Default)]
struct RecordingDispatch {
    created_pools: Mutex<Vec<u32>>,
    destroyed_pools: Mutex<Vec<vk::QueryPool>>,
    reset_ranges: Mutex<Vec<(u32, u32)>>,
}

impl Dispatch for RecordingDispatch {
    fn write_timestamp(
        &self,
        _command_buffer: vk::CommandBuffer,
        _stage: vk::PipelineStageFlags,
        _query_pool: vk::QueryPool,
        _slot: u32,
    ) {
        unimplemented!("the pool never writes timestamps");
    }

    fn create_query_pool(
        &self,
        _device: vk::Device,
        create_info: &vk::QueryPoolCreateInfo<'_>,
    ) -> Result<vk::QueryPool, vk::Result> {
        assert_eq!(create_info.query_type, vk::QueryType::TIMESTAMP);
        self.created_pools.lock().push(create_info.query_count);
        Ok(vk::QueryPool::from_raw(QUERY_POOL_HANDLE))
    }

    fn destroy_query_pool(&self, _device: vk::Device, query_pool: vk::QueryPool) {
        self.destroyed_pools.lock().push(query_pool);
    }

    fn reset_query_pool(
        &self,
        _device: vk::Device,
        _query_pool: vk::QueryPool,
        first_slot: u32,
        slot_count: u32,
    ) {
        self.reset_ranges.lock().push((first_slot, slot_count));
    }

    fn get_query_pool_results(
        &self,
        _device: vk::Device,
        _query_pool: vk::QueryPool,
        _first_slot: u32,
        _slot_count: u32,
        _results: &mut [u64],
        _stride: vk::DeviceSize,
        _flags: vk::QueryResultFlags,
    ) -> vk::Result {
        unimplemented!("the pool never reads results");
    }

    fn is_debug_marker_extension_supported(&self, _command_buffer: vk::CommandBuffer) -> bool {
        true
    }

    fn is_debug_utils_extension_supported(&self, _command_buffer: vk::CommandBuffer) -> bool {
        true
    }
}

fn device() -> vk::Device {
    vk::Device::from_raw(1)
}

fn pool_with_slots(num_slots: u32) -> (Arc<RecordingDispatch>, TimerQueryPool<RecordingDispatch>) {
    let dispatch = Arc::new(RecordingDispatch::default());
    let pool = TimerQueryPool::new(dispatch.clone(), num_slots);
    pool.initialize(device()).unwrap();
    (dispatch, pool)
}

#[cfg(test)]
mod initialization_tests {
    use super::*;

    #[test]
    fn test_initialize_creates_and_resets_the_driver_pool() {
        let (dispatch, pool) = pool_with_slots(8);

        assert_eq!(*dispatch.created_pools.lock(), vec![8]);
        assert_eq!(*dispatch.reset_ranges.lock(), vec![(0, 8)]);
        assert_eq!(pool.query_pool(device()), vk::QueryPool::from_raw(QUERY_POOL_HANDLE));
    }

    #[test]
    #[should_panic]
    fn test_initialize_twice_panics() {
        let (_dispatch, pool) = pool_with_slots(8);
        pool.initialize(device()).unwrap();
    }

    #[test]
    fn test_destroy_releases_the_driver_pool() {
        let (dispatch, pool) = pool_with_slots(8);

        pool.destroy(device());

        assert_eq!(
            *dispatch.destroyed_pools.lock(),
            vec![vk::QueryPool::from_raw(QUERY_POOL_HANDLE)]
        );
    }

    #[test]
    #[should_panic]
    fn test_rental_after_destroy_panics() {
        let (_dispatch, pool) = pool_with_slots(8);
        pool.destroy(device());
        pool.next_ready_slot(device());
    }

    #[test]
    #[should_panic]
    fn test_rental_on_unknown_device_panics() {
        let dispatch = Arc::new(RecordingDispatch::default());
        let pool = TimerQueryPool::new(dispatch, 8);
        pool.next_ready_slot(device());
    }
}

#[cfg(test)]
mod rental_tests {
    use super::*;

    #[test]
    fn test_slots_come_out_in_lifo_order() {
        let (_dispatch, pool) = pool_with_slots(4);

        assert_eq!(pool.next_ready_slot(device()), Some(3));
        assert_eq!(pool.next_ready_slot(device()), Some(2));
        assert_eq!(pool.next_ready_slot(device()), Some(1));
        assert_eq!(pool.next_ready_slot(device()), Some(0));
    }

    #[test]
    fn test_exhausted_pool_returns_none() {
        let (_dispatch, pool) = pool_with_slots(2);

        assert!(pool.next_ready_slot(device()).is_some());
        assert!(pool.next_ready_slot(device()).is_some());
        assert_eq!(pool.next_ready_slot(device()), None);
    }

    #[test]
    fn test_free_and_rented_slots_always_add_up_to_capacity() {
        let (_dispatch, pool) = pool_with_slots(4);
        assert_eq!(pool.free_slot_count(device()), 4);

        let first = pool.next_ready_slot(device()).unwrap();
        let second = pool.next_ready_slot(device()).unwrap();
        assert_eq!(pool.free_slot_count(device()), 2);

        pool.reset_query_slots(device(), &[first]);
        assert_eq!(pool.free_slot_count(device()), 3);

        pool.rollback_pending_slots(device(), &[second]);
        assert_eq!(pool.free_slot_count(device()), 4);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn test_released_slot_is_rented_again_first() {
        let (_dispatch, pool) = pool_with_slots(4);

        let slot = pool.next_ready_slot(device()).unwrap();
        assert_eq!(slot, 3);
        pool.next_ready_slot(device()).unwrap();

        pool.reset_query_slots(device(), &[slot]);

        assert_eq!(pool.next_ready_slot(device()), Some(3));
    }
}

#[cfg(test)]
mod release_tests {
    use super::*;

    #[test]
    fn test_reset_issues_one_driver_reset_per_slot() {
        let (dispatch, pool) = pool_with_slots(4);
        let first = pool.next_ready_slot(device()).unwrap();
        let second = pool.next_ready_slot(device()).unwrap();
        dispatch.reset_ranges.lock().clear();

        pool.reset_query_slots(device(), &[first, second]);

        assert_eq!(*dispatch.reset_ranges.lock(), vec![(first, 1), (second, 1)]);
    }

    #[test]
    fn test_rollback_skips_the_driver_reset() {
        let (dispatch, pool) = pool_with_slots(4);
        let slot = pool.next_ready_slot(device()).unwrap();
        dispatch.reset_ranges.lock().clear();

        pool.rollback_pending_slots(device(), &[slot]);

        assert!(dispatch.reset_ranges.lock().is_empty());
    }

    #[test]
    fn test_releasing_nothing_is_a_no_op() {
        let (dispatch, pool) = pool_with_slots(4);
        dispatch.reset_ranges.lock().clear();

        pool.reset_query_slots(device(), &[]);
        pool.rollback_pending_slots(device(), &[]);

        assert!(dispatch.reset_ranges.lock().is_empty());
    }

    #[test]
    #[should_panic]
    fn test_releasing_a_slot_twice_panics() {
        let (_dispatch, pool) = pool_with_slots(4);
        let slot = pool.next_ready_slot(device()).unwrap();

        pool.reset_query_slots(device(), &[slot]);
        pool.reset_query_slots(device(), &[slot]);
    }

    #[test]
    #[should_panic]
    fn test_releasing_a_never_rented_slot_panics() {
        let (_dispatch, pool) = pool_with_slots(4);
        pool.reset_query_slots(device(), &[0]);
    }

    #[test]
    #[should_panic]
    fn test_releasing_an_out_of_range_slot_panics() {
        let (_dispatch, pool) = pool_with_slots(4);
        pool.rollback_pending_slots(device(), &[17]);
    }
}
