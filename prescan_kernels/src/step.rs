/// Yields `init, init / 2, init / 4, ..., 1`.
pub struct Halving {
    next: usize,
}

impl Iterator for Halving {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 {
            return None;
        }
        let next = self.next;
        self.next /= 2;
        Some(next)
    }
}

// Returns an iterator over the active worker counts of the up-sweep rounds.
pub fn halving(init: usize) -> Halving {
    Halving { next: init }
}

/// Yields `init, init * 2, init * 4, ...` while the value stays below `limit`.
pub struct Doubling {
    next: usize,
    limit: usize,
}

impl Iterator for Doubling {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 || self.next >= self.limit {
            return None;
        }
        let next = self.next;
        self.next = self.next.saturating_mul(2);
        Some(next)
    }
}

// Returns an iterator over the active worker counts of the down-sweep rounds.
pub fn doubling(init: usize, limit: usize) -> Doubling {
    Doubling { next: init, limit }
}
