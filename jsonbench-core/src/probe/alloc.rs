// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Counting global allocator.
//!
//! Process-wide totals come from a `stats_alloc` instrumented system
//! allocator. On top of that, threads that claim a slot get their own
//! allocated-bytes counter, which is how per-worker allocation is read from
//! another thread.
//!
//! Install it in a binary, test or bench target with:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOCATOR: jsonbench_core::probe::CountingAllocator =
//!     jsonbench_core::probe::CountingAllocator;
//! ```
//!
//! Without it every counter here reads zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use stats_alloc::{StatsAlloc, INSTRUMENTED_SYSTEM};

use crate::error::ProbeError;

/// Maximum number of threads with their own allocation counter.
pub const MAX_TRACKED_THREADS: usize = 128;

const NO_SLOT: usize = usize::MAX;

static INNER: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

static SLOT_BYTES: [AtomicU64; MAX_TRACKED_THREADS] =
    [const { AtomicU64::new(0) }; MAX_TRACKED_THREADS];
static SLOT_CLAIMED: [AtomicBool; MAX_TRACKED_THREADS] =
    [const { AtomicBool::new(false) }; MAX_TRACKED_THREADS];

thread_local! {
    // Const-initialized and drop-free, so it is safe to touch from inside the allocator
    static CURRENT_SLOT: Cell<usize> = const { Cell::new(NO_SLOT) };
}

/// Instrumented system allocator with per-thread slots.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

#[inline]
fn charge_slot(size: usize) {
    if size == 0 {
        return;
    }
    let slot = CURRENT_SLOT.try_with(Cell::get).unwrap_or(NO_SLOT);
    if slot != NO_SLOT {
        SLOT_BYTES[slot].fetch_add(size as u64, Ordering::Relaxed);
    }
}

/// Bytes a reallocation adds to the calling thread's slot: the growth when
/// the block stayed in place, the whole new block when it moved.
#[inline]
fn realloc_charge(old_ptr: *mut u8, new_ptr: *mut u8, old_size: usize, new_size: usize) -> usize {
    if new_ptr == old_ptr {
        new_size.saturating_sub(old_size)
    } else {
        new_size
    }
}

// SAFETY: every call is forwarded unchanged to the instrumented system
// allocator; the slot bookkeeping only touches atomics and a const
// thread-local, neither of which allocates.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = INNER.alloc(layout);
        if !ptr.is_null() {
            charge_slot(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = INNER.alloc_zeroed(layout);
        if !ptr.is_null() {
            charge_slot(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        INNER.dealloc(ptr, layout);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = INNER.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            charge_slot(realloc_charge(ptr, new_ptr, layout.size(), new_size));
        }
        new_ptr
    }
}

/// Total bytes allocated by the process since start.
///
/// Fresh allocations plus net reallocation growth.
pub fn allocated_bytes() -> u64 {
    let stats = INNER.stats();
    let grown = stats.bytes_reallocated.max(0) as u64;
    (stats.bytes_allocated as u64).saturating_add(grown)
}

/// Total blocks returned to the allocator since start.
pub fn deallocations() -> u64 {
    INNER.stats().deallocations as u64
}

/// Whether the counting allocator is installed as the global allocator.
///
/// Any running Rust program has allocated something by the time this is
/// called, so a zero total means the counters are not wired in.
pub fn counting_active() -> bool {
    allocated_bytes() > 0
}

/// Bytes allocated through `slot` since it was claimed.
pub fn slot_allocated_bytes(slot: usize) -> u64 {
    SLOT_BYTES
        .get(slot)
        .map(|bytes| bytes.load(Ordering::Relaxed))
        .unwrap_or(0)
}

/// Claim an allocation slot for the calling thread.
///
/// The slot counter starts at zero and counts every allocation the thread
/// makes until the lease is dropped.
///
/// # Errors
/// `SlotHeld` if the thread already holds a slot, `SlotsExhausted` if all
/// [`MAX_TRACKED_THREADS`] slots are in use.
pub fn claim_slot() -> Result<SlotLease, ProbeError> {
    let held = CURRENT_SLOT.with(Cell::get);
    if held != NO_SLOT {
        return Err(ProbeError::SlotHeld { slot: held });
    }

    for (slot, claimed) in SLOT_CLAIMED.iter().enumerate() {
        if claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            SLOT_BYTES[slot].store(0, Ordering::Relaxed);
            CURRENT_SLOT.with(|current| current.set(slot));
            return Ok(SlotLease {
                slot,
                _not_send: PhantomData,
            });
        }
    }

    Err(ProbeError::SlotsExhausted {
        max: MAX_TRACKED_THREADS,
    })
}

/// A claimed allocation slot, bound to the thread that claimed it.
#[derive(Debug)]
pub struct SlotLease {
    slot: usize,
    // Releasing clears the claiming thread's thread-local, so the lease must stay on it
    _not_send: PhantomData<*const ()>,
}

impl SlotLease {
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Bytes this thread allocated since claiming the slot.
    pub fn allocated_bytes(&self) -> u64 {
        slot_allocated_bytes(self.slot)
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        // Thread-local may already be gone during thread teardown
        let _ = CURRENT_SLOT.try_with(|current| current.set(NO_SLOT));
        SLOT_CLAIMED[self.slot].store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_move_with_allocations() {
        let allocated = allocated_bytes();
        let released = deallocations();

        let block = std::hint::black_box(vec![0u8; 64 * 1024]);
        drop(block);

        assert!(allocated_bytes() >= allocated + 64 * 1024);
        assert!(deallocations() > released);
    }

    #[test]
    fn test_slot_counts_only_own_thread() {
        let lease = claim_slot().unwrap();
        assert_eq!(lease.allocated_bytes(), 0);

        let block = std::hint::black_box(vec![1u8; 10_000]);
        assert!(lease.allocated_bytes() >= 10_000);

        let before_other = lease.allocated_bytes();
        std::thread::spawn(|| std::hint::black_box(vec![2u8; 50_000]))
            .join()
            .unwrap();
        // The spawned thread's buffer is not charged to this slot
        assert!(lease.allocated_bytes() < before_other + 50_000);

        drop(block);
    }

    #[test]
    fn test_second_claim_on_same_thread_rejected() {
        let lease = claim_slot().unwrap();
        assert!(matches!(claim_slot(), Err(ProbeError::SlotHeld { slot }) if slot == lease.slot()));

        drop(lease);
        assert!(claim_slot().is_ok());
    }

    #[test]
    fn test_realloc_charge_in_place_counts_growth_only() {
        let mut block = [0u8; 2];
        let here = block.as_mut_ptr();
        let there = here.wrapping_add(1);

        assert_eq!(realloc_charge(here, here, 4096, 8192), 4096);
        assert_eq!(realloc_charge(here, here, 8192, 4096), 0);
        assert_eq!(realloc_charge(here, there, 4096, 8192), 8192);
    }

    #[test]
    fn test_realloc_through_allocator_charges_slot() {
        let lease = claim_slot().unwrap();
        let layout = Layout::from_size_align(4096, 8).unwrap();

        unsafe {
            let ptr = CountingAllocator.alloc(layout);
            assert!(!ptr.is_null());
            let before = lease.allocated_bytes();

            let grown = CountingAllocator.realloc(ptr, layout, 8192);
            assert!(!grown.is_null());
            let charged = lease.allocated_bytes() - before;
            let expected = if grown == ptr { 4096 } else { 8192 };
            assert_eq!(charged, expected);

            CountingAllocator.dealloc(grown, Layout::from_size_align(8192, 8).unwrap());
        }
    }

    #[test]
    fn test_out_of_range_slot_reads_zero() {
        assert_eq!(slot_allocated_bytes(MAX_TRACKED_THREADS + 5), 0);
    }
}
