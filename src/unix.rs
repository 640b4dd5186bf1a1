use std::fs::File;
use std::io;
use std::mem::ManuallyDrop;
use std::os::unix::fs::MetadataExt;
use std::os::unix::io::{FromRawFd, IntoRawFd};

use tracing::warn;

use crate::FALLBACK_PAGE_SIZE;

/// Opens `path` for reading. The sequential read-ahead hint is issued
/// separately via [`advise_sequential`] on unix.
pub fn open_input(path: &std::path::Path) -> io::Result<File> {
    File::open(path)
}

/// The system memory page size.
///
/// Falls back to [`FALLBACK_PAGE_SIZE`] with a warning if the query fails;
/// the probe never aborts the process.
pub fn page_size() -> usize {
    page_size_from(unsafe { libc::sysconf(libc::_SC_PAGESIZE) })
}

fn page_size_from(raw: libc::c_long) -> usize {
    if raw <= 0 {
        warn!(
            "could not query the system page size, assuming {} bytes",
            FALLBACK_PAGE_SIZE
        );
        FALLBACK_PAGE_SIZE
    } else {
        raw as usize
    }
}

/// The filesystem's preferred I/O block size for `file` (`st_blksize`).
pub fn fs_block_size(file: &File) -> io::Result<u64> {
    Ok(file.metadata()?.blksize())
}

/// Advises the kernel that `file` will be read sequentially, start to end,
/// so it can prefetch aggressively. Purely a performance hint.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub fn advise_sequential(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let ret = unsafe {
        libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_SEQUENTIAL)
    };
    if ret == 0 {
        Ok(())
    } else {
        // posix_fadvise returns the error instead of setting errno.
        Err(io::Error::from_raw_os_error(ret))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
pub fn advise_sequential(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Closes `file`, surfacing the close error that `File`'s drop would swallow.
pub fn close_input(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// An unbuffered handle to standard output.
///
/// Bypasses the line buffering of `io::stdout` so every buffer lands in a
/// single write call and short writes stay observable. `ManuallyDrop` keeps
/// the descriptor open when the handle goes out of scope.
pub fn raw_stdout() -> ManuallyDrop<File> {
    ManuallyDrop::new(unsafe { File::from_raw_fd(libc::STDOUT_FILENO) })
}
