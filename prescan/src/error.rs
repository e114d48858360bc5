use std::io;
use thiserror::Error;

/// Why a scan produced no output.
///
/// Contract violations are reported before any worker starts. The worker
/// variants come from the threaded backend.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("input length {0} is not a power of two of at least 2")]
    InvalidLength(usize),

    #[error("output holds {output} elements but the input has {input}")]
    LengthMismatch { input: usize, output: usize },

    #[error("scanning {len} elements needs {workers} workers, the limit is {max}")]
    TooManyWorkers {
        len: usize,
        workers: usize,
        max: usize,
    },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("failed to start worker {t_idx}")]
    Spawn {
        t_idx: usize,
        #[source]
        source: io::Error,
    },

    #[cfg(feature = "cuda")]
    #[error(transparent)]
    Cuda(#[from] cust::error::CudaError),
}

/// Checks the shape of one invocation.
pub fn check_shape(input: usize, output: usize) -> Result<(), ScanError> {
    if input < 2 || !input.is_power_of_two() {
        return Err(ScanError::InvalidLength(input));
    }
    if input != output {
        return Err(ScanError::LengthMismatch { input, output });
    }
    Ok(())
}

/// Checks that `len` elements fit a group of at most `max` workers.
pub fn check_workers(len: usize, max: usize) -> Result<(), ScanError> {
    let workers = len / 2;
    if workers > max {
        return Err(ScanError::TooManyWorkers { len, workers, max });
    }
    Ok(())
}
