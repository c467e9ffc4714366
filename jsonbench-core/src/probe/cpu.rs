// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CPU clocks read through libc. All values are nanoseconds.

use std::mem::MaybeUninit;

use crate::error::ProbeError;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Clock identifier accepted by [`clock_time`].
pub type ClockId = libc::clockid_t;

fn syscall_error(syscall: &'static str, error: std::io::Error) -> ProbeError {
    ProbeError::Syscall {
        syscall,
        message: error.to_string(),
    }
}

/// Read a clock in nanoseconds.
pub fn clock_time(clock: ClockId) -> Result<u64, ProbeError> {
    let mut ts = MaybeUninit::<libc::timespec>::zeroed();

    // SAFETY: ts points to writable storage for one timespec
    let rc = unsafe { libc::clock_gettime(clock, ts.as_mut_ptr()) };
    if rc != 0 {
        return Err(syscall_error(
            "clock_gettime",
            std::io::Error::last_os_error(),
        ));
    }

    // SAFETY: clock_gettime succeeded and filled ts
    let ts = unsafe { ts.assume_init() };
    Ok(ts.tv_sec as u64 * NANOS_PER_SEC + ts.tv_nsec as u64)
}

/// CPU time consumed by all threads of the process.
pub fn process_cpu_time() -> Result<u64, ProbeError> {
    clock_time(libc::CLOCK_PROCESS_CPUTIME_ID)
}

/// CPU time consumed by the calling thread.
pub fn current_thread_cpu_time() -> Result<u64, ProbeError> {
    clock_time(libc::CLOCK_THREAD_CPUTIME_ID)
}

/// CPU clock of the calling thread, readable from any other thread for as
/// long as the calling thread is alive.
pub fn current_thread_clock() -> Result<ClockId, ProbeError> {
    let mut clock: ClockId = 0;

    // SAFETY: pthread_self() is always valid for the calling thread and
    // clock points to writable storage
    let rc = unsafe { libc::pthread_getcpuclockid(libc::pthread_self(), &mut clock) };
    if rc != 0 {
        // pthread functions return the error number instead of setting errno
        return Err(syscall_error(
            "pthread_getcpuclockid",
            std::io::Error::from_raw_os_error(rc),
        ));
    }
    Ok(clock)
}

/// Time the process spent executing in the kernel.
pub fn kernel_time() -> Result<u64, ProbeError> {
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();

    // SAFETY: usage points to writable storage for one rusage
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return Err(syscall_error("getrusage", std::io::Error::last_os_error()));
    }

    // SAFETY: getrusage succeeded and filled usage
    let usage = unsafe { usage.assume_init() };
    let stime = usage.ru_stime;
    Ok(stime.tv_sec as u64 * NANOS_PER_SEC + stime.tv_usec as u64 * 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin(iterations: u64) -> u64 {
        (0..iterations).fold(0u64, |acc, i| std::hint::black_box(acc.wrapping_add(i * i)))
    }

    #[test]
    fn test_process_cpu_is_monotonic() {
        let first = process_cpu_time().unwrap();
        spin(2_000_000);
        let second = process_cpu_time().unwrap();
        assert!(second >= first);
    }

    #[test]
    fn test_thread_clock_matches_thread_cpu_time() {
        let clock = current_thread_clock().unwrap();
        spin(1_000_000);

        let via_clock = clock_time(clock).unwrap();
        let direct = current_thread_cpu_time().unwrap();
        assert!(via_clock > 0);
        assert!(direct >= via_clock);
    }

    #[test]
    fn test_thread_clock_readable_from_other_thread() {
        let (tx, rx) = std::sync::mpsc::channel();
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();

        let worker = std::thread::spawn(move || {
            spin(1_000_000);
            tx.send(current_thread_clock().unwrap()).unwrap();
            // Stay alive until the reader is finished
            done_rx.recv().unwrap();
        });

        let clock = rx.recv().unwrap();
        assert!(clock_time(clock).unwrap() > 0);
        done_tx.send(()).unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_kernel_time_readable() {
        let first = kernel_time().unwrap();
        let second = kernel_time().unwrap();
        assert!(second >= first);
    }
}
