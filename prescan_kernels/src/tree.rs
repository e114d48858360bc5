//! Geometry of the balanced binary tree the work-efficient scan walks.
//!
//! A round with `d` active workers over `n` elements combines pairs that are
//! `offset = n / (2 * d)` apart. Worker `t` owns the pair whose right node
//! closes the `t`-th block of `2 * offset` elements.

/// The distance between the two nodes combined in a round with `active`
/// workers.
#[inline(always)]
pub const fn round_offset(n: usize, active: usize) -> usize {
    n / (2 * active)
}

/// The logical `(ai, bi)` node pair worker `t_idx` combines at `offset`.
#[inline(always)]
pub const fn sweep_pair(offset: usize, t_idx: usize) -> (usize, usize) {
    let ai = offset * (2 * t_idx + 1) - 1;
    let bi = offset * (2 * t_idx + 2) - 1;
    (ai, bi)
}

#[cfg(test)]
mod tests {
    use super::{round_offset, sweep_pair};

    #[test]
    fn round_offset_test() {
        assert_eq!(round_offset(8, 4), 1);
        assert_eq!(round_offset(8, 2), 2);
        assert_eq!(round_offset(8, 1), 4);
        assert_eq!(round_offset(2, 1), 1);
    }

    #[test]
    fn sweep_pair_test() {
        assert_eq!(sweep_pair(1, 0), (0, 1));
        assert_eq!(sweep_pair(1, 3), (6, 7));
        assert_eq!(sweep_pair(2, 1), (5, 7));
        assert_eq!(sweep_pair(4, 0), (3, 7));
    }

    #[test]
    fn pairs_of_a_round_are_disjoint() {
        let n = 64;
        let mut active = n / 2;
        while active > 0 {
            let offset = round_offset(n, active);
            let mut touched = vec![false; n];
            for t in 0..active {
                let (ai, bi) = sweep_pair(offset, t);
                assert!(ai < bi && bi < n);
                assert!(!touched[ai] && !touched[bi]);
                touched[ai] = true;
                touched[bi] = true;
            }
            active /= 2;
        }
    }
}
