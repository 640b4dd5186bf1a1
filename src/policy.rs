use std::fs::File;

use tracing::warn;

use crate::{page_size, sys, FIXED_BLOCK_SIZE};

/// Buffer sizing strategies, ordered from pessimal to production.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BlockSizePolicy {
    /// One byte per system call.
    Naive,
    /// The system memory page size.
    Page,
    /// The filesystem's preferred I/O size for the input, at least a page.
    Filesystem,
    /// A fixed 2 MiB, the measured sweet spot for system-call amortization.
    Fixed,
}

impl BlockSizePolicy {
    /// Returns the buffer size in bytes under this policy.
    ///
    /// Only `Filesystem` consults the input handle. Probe failures are
    /// warnings; the result degrades to the page size and the copy proceeds.
    pub fn block_size(self, input: Option<&File>) -> usize {
        match self {
            BlockSizePolicy::Naive => 1,
            BlockSizePolicy::Page => page_size(),
            BlockSizePolicy::Filesystem => {
                let page = page_size();
                let preferred = match input {
                    Some(file) => match sys::fs_block_size(file) {
                        Ok(n) if n > 0 => n as usize,
                        Ok(_) => {
                            warn!("filesystem reported a zero block size, using the page size");
                            page
                        }
                        Err(err) => {
                            warn!(%err, "could not query the filesystem block size, using the page size");
                            page
                        }
                    },
                    None => {
                        warn!("no input handle to query, using the page size");
                        page
                    }
                };
                // Alignment only pays off at page granularity, so never
                // shrink below it. No upper cap on what the filesystem
                // reports (see DESIGN.md).
                preferred.max(page)
            }
            BlockSizePolicy::Fixed => FIXED_BLOCK_SIZE,
        }
    }
}
