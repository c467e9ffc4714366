// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Registry of benchmark worker threads.
//!
//! A worker enrolls from its own thread. Enrollment records the thread's CPU
//! clock and claims an allocation slot, so the coordinator can read both
//! counters for every live worker without touching the workers themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::alloc::{self, SlotLease};
use super::cpu::{self, ClockId};
use crate::error::ProbeError;

/// Enrolled worker.
#[derive(Debug, Clone)]
struct WorkerEntry {
    benchmark: String,
    clock: ClockId,
    slot: usize,
}

/// Thread-safe registry of enrolled workers.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: DashMap<u64, WorkerEntry>,
    next_id: AtomicU64,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry wrapped in an Arc for sharing across threads.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Enroll the calling thread as a worker of `benchmark`.
    ///
    /// The worker stays enrolled until the returned guard is dropped, which
    /// must happen on the same thread.
    pub fn enroll(self: &Arc<Self>, benchmark: &str) -> Result<WorkerGuard, ProbeError> {
        let clock = cpu::current_thread_clock()?;
        let lease = alloc::claim_slot()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.workers.insert(
            id,
            WorkerEntry {
                benchmark: benchmark.to_string(),
                clock,
                slot: lease.slot(),
            },
        );

        tracing::debug!(worker = id, benchmark = %benchmark, slot = lease.slot(), "Worker enrolled");

        Ok(WorkerGuard {
            registry: Arc::clone(self),
            id,
            lease,
        })
    }

    /// Number of enrolled workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Distinct benchmark names with at least one enrolled worker.
    pub fn benchmarks(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .workers
            .iter()
            .map(|entry| entry.benchmark.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Summed CPU time of all enrolled workers, or `None` if nobody is enrolled.
    pub fn thread_cpu_time(&self) -> Result<Option<u64>, ProbeError> {
        if self.workers.is_empty() {
            return Ok(None);
        }

        let mut total = 0u64;
        for entry in self.workers.iter() {
            total = total.saturating_add(cpu::clock_time(entry.clock)?);
        }
        Ok(Some(total))
    }

    /// Summed bytes allocated by enrolled workers since they enrolled, or
    /// `None` if nobody is enrolled.
    pub fn allocated_bytes(&self) -> Option<u64> {
        if self.workers.is_empty() {
            return None;
        }

        Some(
            self.workers
                .iter()
                .map(|entry| alloc::slot_allocated_bytes(entry.slot))
                .fold(0u64, u64::saturating_add),
        )
    }

    fn unenroll(&self, id: u64) {
        if let Some((_, entry)) = self.workers.remove(&id) {
            tracing::debug!(worker = id, benchmark = %entry.benchmark, "Worker unenrolled");
        }
    }
}

/// Keeps a worker enrolled. Dropping it unenrolls the worker and frees its
/// allocation slot.
#[derive(Debug)]
pub struct WorkerGuard {
    registry: Arc<WorkerRegistry>,
    id: u64,
    lease: SlotLease,
}

impl WorkerGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bytes this worker allocated since enrolling.
    pub fn allocated_bytes(&self) -> u64 {
        self.lease.allocated_bytes()
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        // Leave the registry before the slot is released so no reader sums a recycled slot
        self.registry.unenroll(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_enroll_and_drop() {
        let registry = WorkerRegistry::new_shared();
        assert!(registry.thread_cpu_time().unwrap().is_none());
        assert!(registry.allocated_bytes().is_none());

        let guard = registry.enroll("HeapStringRead1Kb").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.benchmarks(), vec!["HeapStringRead1Kb".to_string()]);
        assert!(registry.thread_cpu_time().unwrap().is_some());

        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_workers_visible_from_coordinator() {
        let registry = WorkerRegistry::new_shared();
        let enrolled = Barrier::new(4);
        let measured = Barrier::new(4);

        std::thread::scope(|scope| {
            for _ in 0..3 {
                scope.spawn(|| {
                    let guard = registry.enroll("DirectBufferWrite56Kb").unwrap();
                    let block = std::hint::black_box(vec![7u8; 32 * 1024]);
                    assert!(guard.allocated_bytes() >= 32 * 1024);
                    enrolled.wait();
                    measured.wait();
                    drop(block);
                });
            }

            enrolled.wait();
            assert_eq!(registry.len(), 3);
            assert!(registry.allocated_bytes().unwrap() >= 3 * 32 * 1024);
            assert!(registry.thread_cpu_time().unwrap().unwrap() > 0);
            measured.wait();
        });

        assert!(registry.is_empty());
    }
}
