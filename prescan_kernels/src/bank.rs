//! Conflict-free addressing of the scan's staging buffer.
//!
//! Shared memory is split into `NUM_BANKS` banks, and consecutive 32-bit
//! words live in consecutive banks. When the threads of one access step hit
//! different words of the same bank the accesses are serialized, so a tree
//! traversal with a power-of-two stride degrades into an `n`-way conflict.
//! Padding every logical index with one extra slot per `NUM_BANKS` elements
//! shifts each stride-aligned run into a different bank.

/// Log2 of the number of shared memory banks.
pub const LOG_NUM_BANKS: u32 = 4;

/// The number of shared memory banks.
pub const NUM_BANKS: usize = 1 << LOG_NUM_BANKS;

/// The layout used by the device kernel and by default on the host.
///
/// First order padding keeps strides below `NUM_BANKS²` apart. The tree
/// rounds with wider strides still conflict, up to eight ways over a
/// 2048-element section. With `Correction::SecondOrder` every access of a
/// step gets its own bank at that size.
pub const DEFAULT_LAYOUT: BankLayout = BankLayout::new(LOG_NUM_BANKS, Correction::FirstOrder);

/// How much padding is inserted in front of a logical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Correction {
    /// No padding. Physical and logical indices are identical.
    None,
    /// One slot per `NUM_BANKS` elements: `i >> LOG_NUM_BANKS`.
    FirstOrder,
    /// The first order padding plus one further slot per `NUM_BANKS²`
    /// elements, which keeps strides up to `NUM_BANKS²` conflict free.
    SecondOrder,
}

/// Maps logical staging indices onto padded physical offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BankLayout {
    log_num_banks: u32,
    correction: Correction,
}

impl BankLayout {
    /// Creates a layout for `2^log_num_banks` banks.
    ///
    /// `log_num_banks` must leave room for the second order shift, so it has
    /// to be smaller than half the width of `usize`.
    pub const fn new(log_num_banks: u32, correction: Correction) -> Self {
        assert!(log_num_banks < usize::BITS / 2);
        Self {
            log_num_banks,
            correction,
        }
    }

    pub const fn log_num_banks(&self) -> u32 {
        self.log_num_banks
    }

    pub const fn num_banks(&self) -> usize {
        1 << self.log_num_banks
    }

    pub const fn correction(&self) -> Correction {
        self.correction
    }

    /// The number of padding slots inserted before logical index `i`.
    #[inline(always)]
    pub const fn padding(&self, i: usize) -> usize {
        match self.correction {
            Correction::None => 0,
            Correction::FirstOrder => i >> self.log_num_banks,
            Correction::SecondOrder => {
                (i >> self.log_num_banks) + (i >> (2 * self.log_num_banks))
            }
        }
    }

    /// The physical offset of logical index `i`.
    #[inline(always)]
    pub const fn physical(&self, i: usize) -> usize {
        i + self.padding(i)
    }

    /// The number of staging slots needed to hold `n` logical elements.
    pub const fn staging_len(&self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.physical(n - 1) + 1
        }
    }

    /// The bank that serves the given physical offset.
    #[inline(always)]
    pub const fn bank_of(&self, physical: usize) -> usize {
        physical & (self.num_banks() - 1)
    }
}

impl Default for BankLayout {
    fn default() -> Self {
        DEFAULT_LAYOUT
    }
}
