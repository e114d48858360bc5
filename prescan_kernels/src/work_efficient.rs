use crate::bank::DEFAULT_LAYOUT;
#[cfg(target_os = "cuda")]
use crate::step::{doubling, halving};
#[cfg(target_os = "cuda")]
use crate::tree::sweep_pair;
#[cfg(target_os = "cuda")]
use cuda_std::{kernel, shared_array, thread};

/// The largest input a single block can scan.
///
/// Each thread owns two elements, so this is double the max block size.
pub const SECTION_SIZE: usize = 2048;

/// The kernel launch should use half the input length as the block size, and
/// never more than this.
pub const BLOCK_SIZE: usize = SECTION_SIZE / 2;

/// Shared memory needed for a full section including bank padding.
pub const STAGING_SIZE: usize = DEFAULT_LAYOUT.staging_len(SECTION_SIZE);

/// Performs an exclusive prefix sum scan of `xs` into `ys` using the
/// work-efficient up-sweep/down-sweep algorithm.
///
/// `xs.len()` must be a power of two no larger than `SECTION_SIZE`, `ys` must
/// hold as many elements, and the launch must be a single block of
/// `xs.len() / 2` threads. Every shared memory access goes through
/// `DEFAULT_LAYOUT`, which spreads the load, store and narrow tree rounds
/// across the banks. Rounds whose stride reaches `NUM_BANKS²` keep some
/// conflicts; only a second order layout removes them all.
#[cfg(target_os = "cuda")]
#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn exclusive_prescan(xs: &[f32], ys: *mut f32) {
    let n = xs.len();
    let half = n / 2;
    let t_idx = thread::thread_idx_x() as usize;

    let temp = shared_array![f32; STAGING_SIZE];

    // Each thread loads one element from each half of the input.
    let a_idx = DEFAULT_LAYOUT.physical(t_idx);
    let b_idx = DEFAULT_LAYOUT.physical(t_idx + half);
    *(&mut *temp.add(a_idx)) = *xs.as_ptr().add(t_idx);
    *(&mut *temp.add(b_idx)) = *xs.as_ptr().add(t_idx + half);

    // Build the sum in place up the tree.
    let mut offset = 1;
    for active in halving(half) {
        thread::sync_threads();
        if t_idx < active {
            let (ai, bi) = sweep_pair(offset, t_idx);
            let ai = DEFAULT_LAYOUT.physical(ai);
            let bi = DEFAULT_LAYOUT.physical(bi);
            *(&mut *temp.add(bi)) += *temp.add(ai);
        }
        offset *= 2;
    }

    // Thread 0 ran the last up-sweep round alone, so no barrier is needed
    // before it clears the root.
    if t_idx == 0 {
        *(&mut *temp.add(DEFAULT_LAYOUT.physical(n - 1))) = 0.0;
    }

    // Traverse down the tree and build the scan.
    for active in doubling(1, n) {
        offset /= 2;
        thread::sync_threads();
        if t_idx < active {
            let (ai, bi) = sweep_pair(offset, t_idx);
            let ai = DEFAULT_LAYOUT.physical(ai);
            let bi = DEFAULT_LAYOUT.physical(bi);
            let t = *temp.add(ai);
            *(&mut *temp.add(ai)) = *temp.add(bi);
            *(&mut *temp.add(bi)) += t;
        }
    }

    thread::sync_threads();
    *(&mut *ys.add(t_idx)) = *temp.add(a_idx);
    *(&mut *ys.add(t_idx + half)) = *temp.add(b_idx);
}

#[cfg(test)]
mod tests {
    use super::{BLOCK_SIZE, SECTION_SIZE, STAGING_SIZE};
    use crate::bank::NUM_BANKS;

    #[test]
    fn staging_size_test() {
        assert_eq!(BLOCK_SIZE, 1024);
        // The last padding slot is never reached.
        assert_eq!(STAGING_SIZE, SECTION_SIZE + SECTION_SIZE / NUM_BANKS - 1);
    }
}
