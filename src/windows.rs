use std::fs::{File, OpenOptions};
use std::io;
use std::mem::{self, ManuallyDrop};
use std::os::windows::fs::OpenOptionsExt;
use std::os::windows::io::{AsRawHandle, FromRawHandle, IntoRawHandle};
use std::path::Path;

use tracing::warn;

use winapi::um::handleapi::CloseHandle;
use winapi::um::sysinfoapi::{GetNativeSystemInfo, SYSTEM_INFO};
use winapi::um::winbase::FILE_FLAG_SEQUENTIAL_SCAN;

use crate::FALLBACK_PAGE_SIZE;

/// Opens `path` for reading with sequential scan requested up front;
/// Windows takes the read-ahead hint as an open flag rather than a
/// post-open advisory call.
pub fn open_input(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(FILE_FLAG_SEQUENTIAL_SCAN)
        .open(path)
}

/// The system memory page size.
///
/// Falls back to [`FALLBACK_PAGE_SIZE`] with a warning if the query reports
/// nothing usable; the probe never aborts the process.
pub fn page_size() -> usize {
    let info = unsafe {
        let mut info: SYSTEM_INFO = mem::zeroed();
        GetNativeSystemInfo(&mut info);
        info
    };

    if info.dwPageSize == 0 {
        warn!(
            "could not query the system page size, assuming {} bytes",
            FALLBACK_PAGE_SIZE
        );
        FALLBACK_PAGE_SIZE
    } else {
        info.dwPageSize as usize
    }
}

/// Windows exposes no per-file preferred I/O size, so the caller always sees
/// the page-size fallback on this platform.
pub fn fs_block_size(_file: &File) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "no filesystem block size hint on this platform",
    ))
}

/// Read-ahead was already requested by [`open_input`], so this is a no-op.
pub fn advise_sequential(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Closes `file`, surfacing the close error that `File`'s drop would swallow.
pub fn close_input(file: File) -> io::Result<()> {
    let handle = file.into_raw_handle();
    if unsafe { CloseHandle(handle as *mut _) } != 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// An unbuffered handle to standard output.
///
/// Bypasses the buffering of `io::stdout` so every buffer lands in a single
/// write call and short writes stay observable. `ManuallyDrop` keeps the
/// handle open when it goes out of scope.
pub fn raw_stdout() -> ManuallyDrop<File> {
    let handle = io::stdout().as_raw_handle();
    ManuallyDrop::new(unsafe { File::from_raw_handle(handle) })
}
