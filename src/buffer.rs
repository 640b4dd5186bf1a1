use std::ops::{Deref, DerefMut};
use std::{ptr, slice};

use crate::Error;

/// An owned byte buffer whose starting address is a multiple of `align`.
///
/// The underlying allocation is over-sized by `align - 1` bytes so that an
/// aligned address always exists inside it, whatever alignment the allocator
/// itself guarantees. The true allocation pointer never leaves this struct;
/// `Drop` releases it exactly once, so the double-free and stale-pointer
/// hazards of hand-rolled aligned allocation cannot be reached from outside.
pub struct AlignedBuffer {
    raw: *mut libc::c_void,
    ptr: *mut u8,
    len: usize,
}

impl AlignedBuffer {
    /// Allocates `size` usable bytes starting at a multiple of `align`.
    ///
    /// `align` is the page size in practice and must be a power of two.
    /// Returns [`Error::Alloc`] if the allocator cannot satisfy the
    /// over-sized request.
    pub fn new(size: usize, align: usize) -> Result<AlignedBuffer, Error> {
        assert!(size > 0, "zero-sized buffer");
        assert!(align.is_power_of_two(), "alignment must be a power of two");

        let raw = unsafe { libc::malloc(size + align - 1) };
        if raw.is_null() {
            return Err(Error::Alloc { size });
        }

        // Round up to the first multiple of `align` inside the allocation.
        let addr = (raw as usize + align - 1) & !(align - 1);
        let ptr = addr as *mut u8;

        // malloc memory is uninitialized; zero the usable window before any
        // slice of it can be formed.
        unsafe { ptr::write_bytes(ptr, 0, size) };

        Ok(AlignedBuffer {
            raw,
            ptr,
            len: size,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe { libc::free(self.raw) }
    }
}

impl Deref for AlignedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl AsRef<[u8]> for AlignedBuffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl AsMut<[u8]> for AlignedBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::page_size;

    #[test]
    fn start_address_is_aligned() {
        for align in [1usize, 8, 512, 4096, 16384, 65536] {
            for size in [1usize, 13, 4095, 4096, 4097, 1 << 20] {
                let buffer = AlignedBuffer::new(size, align).unwrap();
                assert_eq!(buffer.as_ref().as_ptr() as usize % align, 0);
                assert_eq!(buffer.len(), size);
                assert!(!buffer.is_empty());
            }
        }
    }

    #[test]
    fn starts_zeroed() {
        let buffer = AlignedBuffer::new(page_size() + 3, page_size()).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn whole_region_is_usable() {
        let size = page_size() * 2 + 1;
        let mut buffer = AlignedBuffer::new(size, page_size()).unwrap();

        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = i as u8;
        }
        for (i, byte) in buffer.iter().enumerate() {
            assert_eq!(*byte, i as u8);
        }
    }

    // Exercises the alloc/free pairing enough times that a lost or corrupted
    // allocation pointer would trip the allocator.
    #[test]
    fn repeated_alloc_free_cycles() {
        for cycle in 1..200 {
            let size = cycle * 31 + 1;
            let mut buffer = AlignedBuffer::new(size, 4096).unwrap();
            buffer[0] = 0xAB;
            buffer[size - 1] = 0xCD;
            assert_eq!(buffer[0], 0xAB);
            assert_eq!(buffer[size - 1], 0xCD);
        }
    }
}
