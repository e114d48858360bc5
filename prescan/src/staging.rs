use crate::program::Staging;
use std::sync::atomic::{AtomicU32, Ordering};

/// Staging buffer shared by the threads of one invocation.
///
/// Cells hold `f32` bit patterns. Within a step every cell has at most one
/// writer and no concurrent reader, and the group barrier orders the steps,
/// so relaxed accesses are enough.
pub struct AtomicStaging {
    cells: Vec<AtomicU32>,
}

impl AtomicStaging {
    pub fn zeroed(len: usize) -> Self {
        let cells = (0..len).map(|_| AtomicU32::new(0.0f32.to_bits())).collect();
        Self { cells }
    }

    pub fn into_values(self) -> Vec<f32> {
        self.cells
            .into_iter()
            .map(|cell| f32::from_bits(cell.into_inner()))
            .collect()
    }
}

impl Staging for &AtomicStaging {
    fn read(&mut self, index: usize) -> f32 {
        f32::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    fn write(&mut self, index: usize, value: f32) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
    }
}
