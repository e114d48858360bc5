//! Work-efficient exclusive prefix sum with conflict-free staging.
//!
//! The scan follows the up-sweep/down-sweep algorithm: `n/2` workers build
//! a reduction tree in a shared staging buffer, the root is cleared, and the
//! partial sums are pushed back down the tree. Staging indices are padded by
//! a [`BankLayout`] so the tree's power-of-two strides do not pile up in one
//! memory bank.

mod config;
#[cfg(feature = "cuda")]
pub mod device;
mod engine;
mod error;
pub mod program;
pub mod sequential;
mod staging;
pub mod stepper;
mod threaded;

pub use config::{Backend, ScanConfig, MAX_WORKERS};
pub use engine::Prescan;
pub use error::ScanError;
pub use prescan_kernels::bank::{
    BankLayout, Correction, DEFAULT_LAYOUT, LOG_NUM_BANKS, NUM_BANKS,
};
