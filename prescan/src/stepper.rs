//! Deterministic execution of the scan on the calling thread.
//!
//! The stepper runs every worker of a barrier-delimited step, in ordinal
//! order, before it starts the next step. Because the workers of a step
//! touch disjoint staging slots this produces exactly what a truly parallel
//! group produces, and it lets the run record every staging access for
//! inspection.

use crate::error::{check_shape, ScanError};
use crate::program::{self, execute, Invocation, Staging};
use itertools::Itertools;
use prescan_kernels::bank::BankLayout;
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

/// One staging access made by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub step: usize,
    pub t_idx: usize,
    /// Position of the access within the worker's step. Workers of a step run
    /// the same instruction sequence, so equal slots are simultaneous.
    pub slot: usize,
    pub kind: AccessKind,
    pub physical: usize,
}

/// Two workers touching the same staging slot in one step, at least one of
/// them writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Race {
    pub step: usize,
    pub physical: usize,
    pub writer: usize,
    pub other: usize,
}

/// Every staging access of one stepped invocation.
#[derive(Debug, Clone)]
pub struct AccessTrace {
    layout: BankLayout,
    steps: usize,
    accesses: Vec<Access>,
}

impl AccessTrace {
    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    pub fn step(&self, step: usize) -> impl Iterator<Item = &Access> {
        self.accesses.iter().filter(move |a| a.step == step)
    }

    /// Physical slots written by more than one worker within a single step.
    pub fn write_collisions(&self) -> Vec<(usize, usize)> {
        self.accesses
            .iter()
            .filter(|a| a.kind == AccessKind::Write)
            .map(|a| ((a.step, a.physical), a.t_idx))
            .into_group_map()
            .into_iter()
            .filter(|(_, writers)| writers.iter().unique().count() > 1)
            .map(|(key, _)| key)
            .sorted()
            .collect_vec()
    }

    /// Every pair of workers that shares a staging slot within a step while
    /// at least one of them writes it.
    pub fn races(&self) -> Vec<Race> {
        let by_slot = self
            .accesses
            .iter()
            .map(|a| ((a.step, a.physical), a))
            .into_group_map();

        let mut races = Vec::new();
        for ((step, physical), accesses) in by_slot {
            for writer in accesses.iter().filter(|a| a.kind == AccessKind::Write) {
                for other in accesses.iter().filter(|a| a.t_idx != writer.t_idx) {
                    races.push(Race {
                        step,
                        physical,
                        writer: writer.t_idx,
                        other: other.t_idx,
                    });
                }
            }
        }
        races.sort_by_key(|r| (r.step, r.physical, r.writer, r.other));
        races.dedup();
        races
    }

    /// The worst bank conflict of one step.
    ///
    /// Workers are grouped `num_banks` at a time the way a half-warp issues
    /// shared memory requests. Within a group and slot, the degree is the
    /// largest number of distinct addresses that fall into one bank; reads of
    /// the same address are a broadcast and do not count twice. A step with
    /// no accesses has degree 0 and a conflict free one has degree 1.
    pub fn conflict_degree(&self, step: usize) -> usize {
        let group_size = self.layout.num_banks();
        let mut addresses: HashMap<(usize, usize, usize), Vec<usize>> = HashMap::new();
        for a in self.step(step) {
            let bank = self.layout.bank_of(a.physical);
            addresses
                .entry((a.t_idx / group_size, a.slot, bank))
                .or_default()
                .push(a.physical);
        }
        addresses
            .into_values()
            .map(|physical| physical.into_iter().unique().count())
            .max()
            .unwrap_or(0)
    }

    /// The worst bank conflict over all steps.
    pub fn max_conflict_degree(&self) -> usize {
        (0..self.steps)
            .map(|step| self.conflict_degree(step))
            .max()
            .unwrap_or(0)
    }
}

/// Staging that can log its accesses.
struct Recorder {
    cells: Vec<f32>,
    accesses: Option<Vec<Access>>,
    step: usize,
    t_idx: usize,
    slot: usize,
}

impl Recorder {
    fn new(len: usize, record: bool) -> Self {
        Self {
            cells: vec![0.0; len],
            accesses: record.then(Vec::new),
            step: 0,
            t_idx: 0,
            slot: 0,
        }
    }

    fn begin(&mut self, step: usize, t_idx: usize) {
        self.step = step;
        self.t_idx = t_idx;
        self.slot = 0;
    }

    fn log(&mut self, kind: AccessKind, physical: usize) {
        if let Some(accesses) = &mut self.accesses {
            accesses.push(Access {
                step: self.step,
                t_idx: self.t_idx,
                slot: self.slot,
                kind,
                physical,
            });
        }
        self.slot += 1;
    }
}

impl Staging for Recorder {
    fn read(&mut self, index: usize) -> f32 {
        self.log(AccessKind::Read, index);
        self.cells[index]
    }

    fn write(&mut self, index: usize, value: f32) {
        self.log(AccessKind::Write, index);
        self.cells[index] = value;
    }
}

/// Runs the scan one step at a time on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stepper {
    layout: BankLayout,
}

impl Stepper {
    pub fn new(layout: BankLayout) -> Self {
        Self { layout }
    }

    pub fn run(&self, input: &[f32], output: &mut [f32]) -> Result<(), ScanError> {
        self.drive(input, output, false)?;
        Ok(())
    }

    /// Like [`Stepper::run`], additionally returning every staging access.
    pub fn run_traced(&self, input: &[f32], output: &mut [f32]) -> Result<AccessTrace, ScanError> {
        let (steps, accesses) = self.drive(input, output, true)?;
        Ok(AccessTrace {
            layout: self.layout,
            steps,
            accesses: accesses.unwrap_or_default(),
        })
    }

    fn drive(
        &self,
        input: &[f32],
        output: &mut [f32],
        record: bool,
    ) -> Result<(usize, Option<Vec<Access>>), ScanError> {
        check_shape(input.len(), output.len())?;

        let invocation = Invocation::new(self.layout, input);
        let workers = invocation.workers();
        let program = program::schedule(invocation.n());
        let mut staging = Recorder::new(invocation.staging_len(), record);
        debug!(
            n = invocation.n(),
            workers,
            staging = invocation.staging_len(),
            "stepping exclusive scan"
        );

        let mut steps = 0;
        for (step, phases) in program::steps(&program).enumerate() {
            trace!(step, ?phases, "step");
            for t_idx in 0..workers {
                staging.begin(step, t_idx);
                for &phase in phases {
                    execute(phase, t_idx, &invocation, &mut staging, |i, v| {
                        output[i] = v
                    });
                }
            }
            steps += 1;
        }
        Ok((steps, staging.accesses))
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessKind, Stepper};
    use prescan_kernels::bank::{BankLayout, Correction, DEFAULT_LAYOUT, LOG_NUM_BANKS};

    #[test]
    fn run_test() {
        let input = [1.0, 1.0, 1.0, 1.0];
        let mut output = [0.0; 4];
        Stepper::new(DEFAULT_LAYOUT).run(&input, &mut output).unwrap();
        assert_eq!(output, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn trace_step_count_test() {
        let input = [0.0; 16];
        let mut output = [0.0; 16];
        let trace = Stepper::new(DEFAULT_LAYOUT)
            .run_traced(&input, &mut output)
            .unwrap();
        // One step more than there are barriers.
        assert_eq!(trace.step_count(), 2 * 4 + 2);
    }

    #[test]
    fn load_writes_every_logical_slot_once() {
        let input = [0.0; 32];
        let mut output = [0.0; 32];
        let trace = Stepper::new(DEFAULT_LAYOUT)
            .run_traced(&input, &mut output)
            .unwrap();

        let mut written: Vec<usize> = trace
            .step(0)
            .filter(|a| a.kind == AccessKind::Write)
            .map(|a| a.physical)
            .collect();
        written.sort_unstable();
        let expected: Vec<usize> = (0..32).map(|i| DEFAULT_LAYOUT.physical(i)).collect();
        assert_eq!(written, expected);
    }

    #[test]
    fn no_races_test() {
        for correction in [
            Correction::None,
            Correction::FirstOrder,
            Correction::SecondOrder,
        ] {
            let layout = BankLayout::new(LOG_NUM_BANKS, correction);
            for log_n in 1..10 {
                let n = 1 << log_n;
                let input = vec![1.0; n];
                let mut output = vec![0.0; n];
                let trace = Stepper::new(layout).run_traced(&input, &mut output).unwrap();
                assert!(trace.write_collisions().is_empty());
                assert!(trace.races().is_empty());
            }
        }
    }

    #[test]
    fn first_up_sweep_is_conflict_free() {
        let input = vec![1.0; 512];
        let mut output = vec![0.0; 512];

        let padded = Stepper::new(DEFAULT_LAYOUT)
            .run_traced(&input, &mut output)
            .unwrap();
        assert_eq!(padded.conflict_degree(0), 1);
        assert_eq!(padded.conflict_degree(1), 1);

        let unpadded = Stepper::new(BankLayout::new(LOG_NUM_BANKS, Correction::None))
            .run_traced(&input, &mut output)
            .unwrap();
        assert_eq!(unpadded.conflict_degree(1), 2);
        assert!(unpadded.max_conflict_degree() > padded.max_conflict_degree());
    }

    fn conflict_profile(correction: Correction, n: usize) -> Vec<usize> {
        let input = vec![1.0; n];
        let mut output = vec![0.0; n];
        let trace = Stepper::new(BankLayout::new(LOG_NUM_BANKS, correction))
            .run_traced(&input, &mut output)
            .unwrap();
        (0..trace.step_count())
            .map(|step| trace.conflict_degree(step))
            .collect()
    }

    #[test]
    fn conflict_profile_per_layout() {
        // Steps: load, 11 up-sweep rounds (the last with the clear), 11
        // down-sweep rounds, store.
        let unpadded = conflict_profile(Correction::None, 2048);
        assert_eq!(
            unpadded,
            vec![
                1, 2, 4, 8, 16, 16, 16, 16, 8, 4, 2, 1, 1, 2, 4, 8, 16, 16, 16, 16, 8, 4, 2, 1
            ]
        );

        // First order padding only covers strides below NUM_BANKS², so the
        // middle rounds of both sweeps still serialize.
        let first = conflict_profile(Correction::FirstOrder, 2048);
        assert_eq!(
            first,
            vec![1, 1, 1, 1, 1, 2, 4, 8, 8, 4, 2, 1, 1, 2, 4, 8, 8, 4, 2, 1, 1, 1, 1, 1]
        );

        let second = conflict_profile(Correction::SecondOrder, 2048);
        assert_eq!(second, vec![1; 24]);
    }
}
