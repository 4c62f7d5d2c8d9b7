//! Direct memory-device access for hardware register manipulation.
//!
//! Maps a fixed window of `/dev/mem` (or a compatible memory device) at a
//! physical offset and exposes volatile 32-bit word access to it. All raw
//! pointer arithmetic into the hardware window lives here.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;

#[derive(Debug, thiserror::Error)]
pub enum DevMemError {
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot map {size:#x} bytes at {base:#x}: {source}")]
    Map {
        base: u64,
        size: usize,
        source: io::Error,
    },
}

/// Memory-mapped window over a physical address range.
///
/// The mapping is released when the value is dropped, on every exit path.
pub struct DevMem {
    ptr: *mut u8,
    size: usize,
    base: u64,
}

impl DevMem {
    /// Open `path` read+write and map `size` bytes at physical offset
    /// `base` with shared semantics.
    pub fn open(path: &Path, base: u64, size: usize) -> Result<Self, DevMemError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DevMemError::Open {
                path: path.to_owned(),
                source,
            })?;

        // SAFETY: requesting a fresh shared read/write mapping of an fd we
        // just opened; the kernel validates the offset and length, and the
        // pointer is only used after the MAP_FAILED check.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                base as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(DevMemError::Map {
                base,
                size,
                source: io::Error::last_os_error(),
            });
        }
        debug!("mapped {:#x} bytes of {} at {:#x}", size, path.display(), base);

        // The fd can be dropped here; the mapping stays valid until munmap.
        Ok(Self {
            ptr: ptr.cast(),
            size,
            base,
        })
    }

    /// Read a 32-bit word at a byte offset into the window.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the window size.
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size, "register offset out of bounds");
        // SAFETY: ptr comes from a successful mmap of `size` bytes, the
        // assert keeps the access inside the window, and hardware registers
        // are word aligned.
        unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u32>()) }
    }

    /// Write a 32-bit word at a byte offset into the window.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the window size.
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.size, "register offset out of bounds");
        // SAFETY: same bounds and alignment argument as `read32`; the write
        // must be volatile so the store reaches the hardware.
        unsafe {
            std::ptr::write_volatile(self.ptr.add(offset).cast::<u32>(), value);
        }
    }

    /// Size of the mapped window in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl Drop for DevMem {
    fn drop(&mut self) {
        // SAFETY: ptr/size are exactly what mmap returned and Drop runs at
        // most once. An munmap error cannot be propagated from here.
        unsafe {
            libc::munmap(self.ptr.cast(), self.size);
        }
        debug!("unmapped {:#x} bytes at {:#x}", self.size, self.base);
    }
}
