use crate::error::ScanError;
use crate::program::{self, execute, Invocation, Phase};
use crate::staging::AtomicStaging;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Barrier, Condvar, Mutex, PoisonError};
use std::thread;
use tracing::warn;

/// Holds the workers back until the whole group has been spawned, so a
/// failed spawn never leaves the others waiting on a barrier that cannot
/// fill up.
struct StartGate {
    state: Mutex<Option<bool>>,
    signal: Condvar,
}

impl StartGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(None),
            signal: Condvar::new(),
        }
    }

    fn release(&self, go: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = Some(go);
        self.signal.notify_all();
    }

    /// Blocks until released. Returns whether the workers should run.
    fn wait(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = self
            .signal
            .wait_while(state, |state| state.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        *state == Some(true)
    }
}

/// Runs the scan with one OS thread per worker.
///
/// The shape of the invocation must already have been checked. `output` is
/// only written once every worker has finished cleanly.
pub fn run(invocation: &Invocation, output: &mut [f32]) -> Result<(), ScanError> {
    run_with(invocation, output, |phase, t_idx, invocation, staging, store| {
        execute(phase, t_idx, invocation, staging, store)
    })
}

/// Runs the group with `step` standing in for the phase interpreter.
///
/// A worker whose step panics stops executing phases but keeps arriving at
/// every barrier, so the rest of the group still runs to completion.
fn run_with<F>(invocation: &Invocation, output: &mut [f32], step: F) -> Result<(), ScanError>
where
    F: Fn(Phase, usize, &Invocation<'_>, &mut &AtomicStaging, &mut dyn FnMut(usize, f32))
        + Sync,
{
    let workers = invocation.workers();
    let program = program::schedule(invocation.n());
    let staging = AtomicStaging::zeroed(invocation.staging_len());
    let barrier = Barrier::new(workers);
    let gate = StartGate::new();

    let results = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        let mut spawn_error = None;

        for t_idx in 0..workers {
            let (program, barrier, gate, step) = (&program, &barrier, &gate, &step);
            let mut staging = &staging;
            let spawned = thread::Builder::new()
                .name(format!("prescan-{}", t_idx))
                .spawn_scoped(scope, move || {
                    if !gate.wait() {
                        return None;
                    }

                    // Each worker stores exactly two output positions.
                    let mut stored = Vec::with_capacity(2);
                    let mut failed = false;
                    for &phase in program {
                        if phase == Phase::Barrier {
                            barrier.wait();
                        } else if !failed {
                            let mut store = |i: usize, v: f32| stored.push((i, v));
                            failed = panic::catch_unwind(AssertUnwindSafe(|| {
                                step(phase, t_idx, invocation, &mut staging, &mut store)
                            }))
                            .is_err();
                        }
                    }
                    (!failed).then_some(stored)
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    spawn_error = Some(ScanError::Spawn { t_idx, source });
                    break;
                }
            }
        }

        gate.release(spawn_error.is_none());

        let joined = handles
            .into_iter()
            .map(|handle| handle.join().ok().flatten())
            .collect::<Vec<_>>();
        match spawn_error {
            Some(err) => Err(err),
            None => Ok(joined),
        }
    })?;

    if let Some(t_idx) = results.iter().position(Option::is_none) {
        warn!(t_idx, workers, "scan worker panicked");
        return Err(ScanError::WorkerPanicked(t_idx));
    }

    for (i, v) in results.into_iter().flatten().flatten() {
        output[i] = v;
    }
    Ok(())
}
