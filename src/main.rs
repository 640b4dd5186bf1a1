use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use pagecat::{
    advise_sequential, close_input, copy, open_input, page_size, raw_stdout, AlignedBuffer,
    BlockSizePolicy, Error,
};

/// Copy a file to standard output through a page-aligned buffer.
#[derive(Parser)]
#[command(name = "pagecat", version)]
struct Cli {
    /// Path of the file to copy.
    file: PathBuf,

    /// Buffer sizing strategy.
    #[arg(long, value_enum, default_value_t = BlockSizePolicy::Fixed)]
    policy: BlockSizePolicy,
}

fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries nothing but the input bytes.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pagecat: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let mut input = open_input(&cli.file).map_err(|source| Error::Open {
        path: cli.file.clone(),
        source,
    })?;

    if let Err(err) = advise_sequential(&input) {
        warn!(%err, "sequential read-ahead hint failed");
    }

    let page = page_size();
    let size = cli.policy.block_size(Some(&input));
    info!(policy = ?cli.policy, size, page, "buffer strategy");

    // Allocation failure must still release the input; dropping `input` on
    // the early return does that.
    let mut buffer = AlignedBuffer::new(size, page)?;

    let mut stdout = raw_stdout();
    let result = copy(&mut input, &mut *stdout, &mut buffer);

    // The input is closed exactly once on every path; only the success path
    // can still report a close failure as the process result.
    match result {
        Ok(total) => {
            close_input(input).map_err(Error::Close)?;
            info!(total, "copy complete");
            Ok(())
        }
        Err(err) => {
            if let Err(close_err) = close_input(input) {
                warn!(%close_err, "failed to close input after copy error");
            }
            Err(err)
        }
    }
}
