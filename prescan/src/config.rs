use prescan_kernels::bank::{BankLayout, DEFAULT_LAYOUT};

/// The largest worker group the threaded backend will start by default. This
/// matches the largest CUDA thread block.
pub const MAX_WORKERS: usize = 1024;

/// How the worker group of one invocation is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// One OS thread per worker, synchronized by a shared barrier.
    Threaded,
    /// A single thread that runs every worker of a step before moving on to
    /// the next step.
    Stepped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub layout: BankLayout,
    pub backend: Backend,
    /// Only enforced by the threaded backend.
    pub max_workers: usize,
}

impl ScanConfig {
    pub fn with_layout(mut self, layout: BankLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT,
            backend: Backend::Threaded,
            max_workers: MAX_WORKERS,
        }
    }
}
