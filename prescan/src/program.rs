//! The work-efficient scan written out as a flat program of phases.
//!
//! Every worker runs the same program. `Phase::Barrier` entries mark the
//! points where the whole group synchronizes; the phases between two
//! barriers form one step. Backends decide how a barrier is honoured and
//! use [`execute`] for everything else, so the threaded and the stepped
//! runs share one definition of the algorithm.

use prescan_kernels::bank::BankLayout;
use prescan_kernels::step::{doubling, halving};
use prescan_kernels::tree::{round_offset, sweep_pair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Copy input positions `t` and `t + n/2` into staging.
    Load,
    /// One reduction round. Workers below `active` add their left node into
    /// their right node.
    UpSweep { active: usize, offset: usize },
    /// Worker 0 zeroes the root so the down-sweep yields an exclusive scan.
    Clear,
    /// One distribution round. Workers below `active` swap their nodes and
    /// accumulate the left value into the right one.
    DownSweep { active: usize, offset: usize },
    /// Copy staging back to output positions `t` and `t + n/2`.
    Store,
    /// Wait for every worker of the group.
    Barrier,
}

/// Shared scratch storage addressed by physical offset.
pub trait Staging {
    fn read(&mut self, index: usize) -> f32;
    fn write(&mut self, index: usize, value: f32);
}

/// What every worker of one scan invocation sees.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub layout: BankLayout,
    pub input: &'a [f32],
}

impl<'a> Invocation<'a> {
    pub fn new(layout: BankLayout, input: &'a [f32]) -> Self {
        Self { layout, input }
    }

    /// The number of elements being scanned.
    pub fn n(&self) -> usize {
        self.input.len()
    }

    pub fn workers(&self) -> usize {
        self.input.len() / 2
    }

    pub fn staging_len(&self) -> usize {
        self.layout.staging_len(self.input.len())
    }
}

/// Builds the program for an input of `n` elements.
pub fn schedule(n: usize) -> Vec<Phase> {
    let mut phases = vec![Phase::Load];

    for active in halving(n / 2) {
        phases.push(Phase::Barrier);
        phases.push(Phase::UpSweep {
            active,
            offset: round_offset(n, active),
        });
    }

    // Only worker 0 is active in the last up-sweep round and it is also the
    // one that clears, so program order is enough here.
    phases.push(Phase::Clear);

    for active in doubling(1, n) {
        phases.push(Phase::Barrier);
        phases.push(Phase::DownSweep {
            active,
            offset: round_offset(n, active),
        });
    }

    phases.push(Phase::Barrier);
    phases.push(Phase::Store);
    phases
}

/// Splits a program into its barrier-delimited steps.
pub fn steps(program: &[Phase]) -> impl Iterator<Item = &[Phase]> {
    program.split(|phase| *phase == Phase::Barrier)
}

/// Runs one phase of the program as worker `t_idx`.
///
/// Output writes go through `store` as `(position, value)` pairs. A barrier
/// is a no-op here; the caller has to synchronize around it.
pub fn execute<S>(
    phase: Phase,
    t_idx: usize,
    invocation: &Invocation,
    staging: &mut S,
    mut store: impl FnMut(usize, f32),
) where
    S: Staging + ?Sized,
{
    let layout = &invocation.layout;
    let n = invocation.n();
    let half = n / 2;
    debug_assert!(n.is_power_of_two() && n >= 2);
    debug_assert!(t_idx < half);

    match phase {
        Phase::Load => {
            staging.write(layout.physical(t_idx), invocation.input[t_idx]);
            staging.write(layout.physical(t_idx + half), invocation.input[t_idx + half]);
        }
        Phase::UpSweep { active, offset } => {
            if t_idx < active {
                let (ai, bi) = sweep_pair(offset, t_idx);
                let ai = layout.physical(ai);
                let bi = layout.physical(bi);
                let sum = staging.read(ai) + staging.read(bi);
                staging.write(bi, sum);
            }
        }
        Phase::Clear => {
            if t_idx == 0 {
                staging.write(layout.physical(n - 1), 0.0);
            }
        }
        Phase::DownSweep { active, offset } => {
            if t_idx < active {
                let (ai, bi) = sweep_pair(offset, t_idx);
                let ai = layout.physical(ai);
                let bi = layout.physical(bi);
                let t = staging.read(ai);
                let b = staging.read(bi);
                staging.write(ai, b);
                staging.write(bi, b + t);
            }
        }
        Phase::Store => {
            store(t_idx, staging.read(layout.physical(t_idx)));
            store(t_idx + half, staging.read(layout.physical(t_idx + half)));
        }
        Phase::Barrier => {}
    }
}

impl Staging for Vec<f32> {
    fn read(&mut self, index: usize) -> f32 {
        self[index]
    }

    fn write(&mut self, index: usize, value: f32) {
        self[index] = value;
    }
}
