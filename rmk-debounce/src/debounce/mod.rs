//! Key matrix debouncers.
//!
//! A debouncer turns the raw sample of each matrix scan into a stable
//! (cooked) key matrix. Three algorithms are provided, the `Debouncer` alias
//! names the one selected by `algorithm` in the `[debounce]` section of
//! `keyboard.toml`.

use core::fmt;

use crate::matrix::MatrixRow;

pub mod asym_defer;
pub mod eager_list;
pub mod quiesce;

pub use asym_defer::AsymDeferDebouncer;
pub use eager_list::EagerListDebouncer;
pub use quiesce::QuiesceDebouncer;

/// The debouncer selected in `keyboard.toml`
#[cfg(debounce_algorithm = "asym_defer")]
pub type Debouncer<R, const ROW: usize, const COL: usize> = AsymDeferDebouncer<R, ROW, COL>;
/// The debouncer selected in `keyboard.toml`
#[cfg(debounce_algorithm = "eager_list")]
pub type Debouncer<R, const ROW: usize, const COL: usize> = EagerListDebouncer<R, ROW, COL>;
/// The debouncer selected in `keyboard.toml`
#[cfg(debounce_algorithm = "quiesce")]
pub type Debouncer<R, const ROW: usize, const COL: usize> = QuiesceDebouncer<R, ROW, COL>;

/// Common interface of all debouncers.
///
/// `ROW` of the implementing type is the number of rows storage is reserved
/// for. A debouncer may be initialized with fewer rows, a split keyboard half
/// only debounces its own rows for example.
pub trait DebouncerTrait<R: MatrixRow> {
    /// Reset all state and size it for `num_rows` rows.
    ///
    /// Also restarts elapsed time tracking, the first `debounce` afterwards counts as one tick.
    fn init(&mut self, num_rows: usize) -> Result<(), DebounceError>;

    /// Update `cooked` in place from the current `raw` sample.
    ///
    /// `changed` tells whether `raw` differs from the sample of the previous
    /// call. It is only a hint: a spurious `true` costs a full scan of the
    /// matrix, it never corrupts the cooked state.
    fn debounce(&mut self, raw: &[R], cooked: &mut [R], num_rows: usize, changed: bool);

    /// Release all state. Safe to call repeatedly, or without `init`.
    fn teardown(&mut self);

    /// Whether `debounce` must be called every scan even if nothing changed.
    ///
    /// All provided debouncers run timers that have to be advanced until they expire.
    fn requires_periodic_service(&self) -> bool {
        true
    }

    /// Number of keys currently waiting for a timer to expire
    fn in_flight(&self) -> usize;
}

/// Debouncer errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceError {
    /// More rows were requested than storage was reserved for
    OutOfMemory { requested: usize, capacity: usize },
}

impl fmt::Display for DebounceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceError::OutOfMemory { requested, capacity } => write!(
                f,
                "debouncer storage for {} rows requested, only {} rows reserved",
                requested, capacity
            ),
        }
    }
}

impl core::error::Error for DebounceError {}

/// Number of rows that can be processed safely in one pass
#[inline]
pub(crate) fn rows_to_scan<R>(num_rows: usize, allocated: usize, raw: &[R], cooked: &[R]) -> usize {
    num_rows.min(allocated).min(raw.len()).min(cooked.len())
}

/// Copy the raw bit selected by `mask` into `cooked`
#[inline]
pub(crate) fn commit<R: MatrixRow>(cooked: R, raw: R, mask: R) -> R {
    (cooked & !mask) | (raw & mask)
}
