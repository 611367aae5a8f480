//! # Slot Pool Benchmarks
//!
//! Throughput of timestamp slot rental and recycling.

use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chronos_layer::dispatch::Dispatch;
use chronos_layer::timing::{QuerySlots, TimerQueryPool};

/// Driver stub that swallows every call
struct NullDispatch;

impl Dispatch for NullDispatch {
    fn write_timestamp(
        &self,
        _command_buffer: vk::CommandBuffer,
        _stage: vk::PipelineStageFlags,
        _query_pool: vk::QueryPool,
        _slot: u32,
    ) {
    }

    fn create_query_pool(
        &self,
        _device: vk::Device,
        _create_info: &vk::QueryPoolCreateInfo<'_>,
    ) -> Result<vk::QueryPool, vk::Result> {
        Ok(vk::QueryPool::from_raw(0x51))
    }

    fn destroy_query_pool(&self, _device: vk::Device, _query_pool: vk::QueryPool) {}

    fn reset_query_pool(
        &self,
        _device: vk::Device,
        _query_pool: vk::QueryPool,
        _first_slot: u32,
        _slot_count: u32,
    ) {
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
        vk::Result::SUCCESS
    }

    fn is_debug_marker_extension_supported(&self, _command_buffer: vk::CommandBuffer) -> bool {
        true
    }

    fn is_debug_utils_extension_supported(&self, _command_buffer: vk::CommandBuffer) -> bool {
        true
    }
}

fn bench_acquire_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_pool");
    let device = vk::Device::from_raw(1);

    for batch in [16u32, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*batch as u64));
        group.bench_with_input(BenchmarkId::new("acquire_reset", batch), batch, |b, &batch| {
            let pool = TimerQueryPool::new(Arc::new(NullDispatch), 65536);
            pool.initialize(device).unwrap();
            let mut slots = Vec::with_capacity(batch as usize);

            b.iter(|| {
                for _ in 0..batch {
                    slots.push(pool.next_ready_slot(device).unwrap());
                }
                pool.reset_query_slots(device, black_box(&slots));
                slots.clear();
            });
        });

        group.bench_with_input(BenchmarkId::new("acquire_rollback", batch), batch, |b, &batch| {
            let pool = TimerQueryPool::new(Arc::new(NullDispatch), 65536);
            pool.initialize(device).unwrap();
            let mut slots = Vec::with_capacity(batch as usize);

            b.iter(|| {
                for _ in 0..batch {
                    slots.push(pool.next_ready_slot(device).unwrap());
                }
                pool.rollback_pending_slots(device, black_box(&slots));
                slots.clear();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_acquire_release);
criterion_main!(benches);
