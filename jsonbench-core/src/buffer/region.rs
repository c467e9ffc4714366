//! DirectRegion - anonymous mmap-backed byte storage.
//!
//! Backs the "direct" buffer representation: the bytes live in a private
//! anonymous mapping instead of the Rust heap. All unsafe operations are
//! encapsulated here with bounds checking.

use std::ptr::NonNull;

use crate::error::BufferError;

/// A private anonymous memory mapping with a fill length.
///
/// Owns the mapping and unmaps it on drop. `len` bytes from the start are
/// initialized; the rest of the mapping is zeroed by the kernel.
pub struct DirectRegion {
    /// Pointer to the mapped memory.
    ptr: NonNull<u8>,
    /// Size of the mapping in bytes.
    capacity: usize,
    /// Number of bytes written.
    len: usize,
}

// SAFETY: DirectRegion exclusively owns its mapping; moving it between
// threads moves that ownership.
unsafe impl Send for DirectRegion {}

// SAFETY: Shared access only hands out `&[u8]`; mutation requires `&mut self`.
unsafe impl Sync for DirectRegion {}

impl DirectRegion {
    /// Smallest mapping handed out (one page).
    pub const MIN_SIZE: usize = 4096;

    /// Largest mapping handed out (1 GB).
    pub const MAX_SIZE: usize = 1024 * 1024 * 1024;

    /// Map a new region able to hold at least `capacity` bytes.
    ///
    /// # Errors
    /// Returns BufferError if the capacity is out of bounds or mmap fails.
    pub fn allocate(capacity: usize) -> Result<Self, BufferError> {
        if capacity > Self::MAX_SIZE {
            return Err(BufferError::CapacityExceeded {
                requested: capacity,
                max: Self::MAX_SIZE,
            });
        }

        let size = capacity.max(Self::MIN_SIZE).next_multiple_of(Self::MIN_SIZE);

        // SAFETY: anonymous private mapping, no fd, size is validated and non-zero
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(BufferError::MapFailed {
                size,
                reason: format!("mmap failed: {}", std::io::Error::last_os_error()),
            });
        }

        let ptr = NonNull::new(ptr as *mut u8).ok_or_else(|| BufferError::MapFailed {
            size,
            reason: "mmap returned null".to_string(),
        })?;

        tracing::trace!(size = size, "Mapped direct region");

        Ok(Self {
            ptr,
            capacity: size,
            len: 0,
        })
    }

    /// Map a region sized for `data` and copy it in.
    pub fn from_slice(data: &[u8]) -> Result<Self, BufferError> {
        let mut region = Self::allocate(data.len())?;
        region.extend_from_slice(data)?;
        Ok(region)
    }

    /// Number of initialized bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes have been written yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the underlying mapping.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The initialized bytes.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `capacity` bytes and the first `len` are initialized
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Append bytes, remapping to a doubled mapping when full.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<(), BufferError> {
        let required = self
            .len
            .checked_add(data.len())
            .ok_or(BufferError::CapacityExceeded {
                requested: usize::MAX,
                max: Self::MAX_SIZE,
            })?;

        if required > self.capacity {
            self.grow(required)?;
        }

        // SAFETY: capacity >= len + data.len(); source and destination never overlap
        // because `data` cannot borrow from `self` while `self` is borrowed mutably
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                self.ptr.as_ptr().add(self.len),
                data.len(),
            );
        }
        self.len = required;
        Ok(())
    }

    fn grow(&mut self, required: usize) -> Result<(), BufferError> {
        let target = required.max(self.capacity.saturating_mul(2));
        let mut next = Self::allocate(target.min(Self::MAX_SIZE.max(required)))?;
        next.extend_from_slice(self.as_slice())?;
        // The old mapping is unmapped when `next` is swapped out and dropped
        std::mem::swap(self, &mut next);
        Ok(())
    }
}

impl AsRef<[u8]> for DirectRegion {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for DirectRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectRegion")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Drop for DirectRegion {
    fn drop(&mut self) {
        // SAFETY: ptr and capacity describe the mapping created in allocate()
        let result =
            unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.capacity) };
        if result < 0 {
            tracing::error!(
                capacity = self.capacity,
                error = %std::io::Error::last_os_error(),
                "Failed to unmap direct region"
            );
        }
    }
}
