use core::marker::PhantomData;

use heapless::Vec;

use super::{DebounceError, DebouncerTrait, commit, rows_to_scan};
use crate::clock::{Clock, DefaultClock, ElapsedTimer};
use crate::config::{BuildTiming, DebounceTiming};
use crate::matrix::MatrixRow;

/// Asymmetric per-key deferred debouncer.
///
/// Every key has a countdown. A raw edge (re)arms it with `T::DOWN` for a
/// press or `T::UP` for a release, the raw state is committed once the
/// countdown runs out. Any further edge restarts the countdown, so a key that
/// keeps bouncing holds its previous cooked state until it has been quiet for
/// a full window.
///
/// Each row also keeps the number of keys it has counting down. Rows with
/// none are skipped when the scan reports no change.
pub struct AsymDeferDebouncer<R, const ROW: usize, const COL: usize, C: Clock = DefaultClock, T = BuildTiming> {
    timer: ElapsedTimer<C>,
    /// [row][col] ticks until the key is considered debounced, 0 when idle
    counters: Vec<[u8; COL], ROW>,
    /// [row] number of keys in the row currently debouncing
    row_counts: Vec<u8, ROW>,
    _marker: PhantomData<(R, T)>,
}

impl<R, const ROW: usize, const COL: usize, C: Clock + Default, T> Default for AsymDeferDebouncer<R, ROW, COL, C, T> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<R, const ROW: usize, const COL: usize, C: Clock, T> AsymDeferDebouncer<R, ROW, COL, C, T> {
    /// Create a debouncer without any rows, call `init` before use
    pub const fn new(clock: C) -> Self {
        Self {
            timer: ElapsedTimer::new(clock),
            counters: Vec::new(),
            row_counts: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<R: MatrixRow, const ROW: usize, const COL: usize, C: Clock, T: DebounceTiming>
    AsymDeferDebouncer<R, ROW, COL, C, T>
{
    const LAYOUT: () = {
        assert!(COL <= R::BITS, "matrix row type is narrower than the number of columns");
        assert!(COL <= u8::MAX as usize, "too many columns for the per-row counter");
        assert!(T::DOWN > 0 && T::UP > 0, "debounce thresholds must be nonzero");
    };
}

impl<R: MatrixRow, const ROW: usize, const COL: usize, C: Clock, T: DebounceTiming> DebouncerTrait<R>
    for AsymDeferDebouncer<R, ROW, COL, C, T>
{
    fn init(&mut self, num_rows: usize) -> Result<(), DebounceError> {
        let () = Self::LAYOUT;
        self.teardown();
        let out_of_memory = DebounceError::OutOfMemory {
            requested: num_rows,
            capacity: ROW,
        };
        if self.counters.resize(num_rows, [0; COL]).is_err() || self.row_counts.resize(num_rows, 0).is_err() {
            error!("Asym defer debouncer: {} rows requested, {} reserved", num_rows, ROW);
            self.teardown();
            return Err(out_of_memory);
        }
        info!(
            "Asym defer debouncer initialized: {} rows, down {} up {}",
            num_rows,
            T::DOWN,
            T::UP
        );
        Ok(())
    }

    fn debounce(&mut self, raw: &[R], cooked: &mut [R], num_rows: usize, changed: bool) {
        let elapsed = self.timer.elapsed();
        let num_rows = rows_to_scan(num_rows, self.counters.len(), raw, cooked);

        for row in 0..num_rows {
            let row_count = &mut self.row_counts[row];
            if *row_count == 0 && !changed {
                continue;
            }

            let raw_row = raw[row];
            let mut cooked_row = cooked[row];
            let delta = raw_row ^ cooked_row;

            for (col, count) in self.counters[row].iter_mut().enumerate() {
                let col_mask = R::col_mask(col);
                if changed && !(delta & col_mask).is_zero() {
                    // New edge, restart the countdown for its direction
                    if *count == 0 {
                        *row_count += 1;
                    }
                    *count = T::threshold(raw_row.bit(col));
                } else if *count > elapsed {
                    *count -= elapsed;
                } else if *count != 0 {
                    *count = 0;
                    cooked_row = commit(cooked_row, raw_row, col_mask);
                    *row_count -= 1;
                    trace!("Asym defer debouncer: key ({}, {}) debounced", row, col);
                }
            }

            cooked[row] = cooked_row;
        }
    }

    fn teardown(&mut self) {
        if !self.counters.is_empty() {
            debug!("Asym defer debouncer: releasing {} rows", self.counters.len());
        }
        self.counters.clear();
        self.row_counts.clear();
        self.timer.reset();
    }

    fn in_flight(&self) -> usize {
        self.row_counts.iter().map(|&count| count as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    struct Timing;

    impl DebounceTiming for Timing {
        const DOWN: u8 = 3;
        const UP: u8 = 6;
        const QUIESCE: u8 = 0;
    }

    type TestDebouncer<'a> = AsymDeferDebouncer<u8, 2, 8, &'a ManualClock, Timing>;

    /// Every row count must equal the number of nonzero counters in the row
    fn assert_consistent(debouncer: &TestDebouncer) {
        for (counters, &row_count) in debouncer.counters.iter().zip(debouncer.row_counts.iter()) {
            let active = counters.iter().filter(|&&c| c != 0).count();
            assert_eq!(active, row_count as usize);
        }
    }

    #[test]
    fn test_row_counts_track_active_keys() {
        let clock = ManualClock::new();
        let mut debouncer = TestDebouncer::new(&clock);
        debouncer.init(2).unwrap();

        let mut raw = [0b0000_0101u8, 0b1000_0000];
        let mut cooked = [0u8; 2];
        debouncer.debounce(&raw, &mut cooked, 2, true);
        assert_eq!(debouncer.row_counts.as_slice(), &[2, 1]);
        assert_eq!(debouncer.in_flight(), 3);
        assert_consistent(&debouncer);

        // Key (0, 2) bounces back before being debounced
        clock.advance(1);
        raw[0] = 0b0000_0001;
        debouncer.debounce(&raw, &mut cooked, 2, true);
        assert_consistent(&debouncer);
        assert_eq!(cooked, [0, 0]);

        for _ in 0..2 {
            clock.advance(1);
            debouncer.debounce(&raw, &mut cooked, 2, false);
            assert_consistent(&debouncer);
            assert_eq!(cooked, [0, 0]);
        }
        // (0, 2) expires without a change, (0, 0) and (1, 7) were re-armed by the second scan
        assert_eq!(debouncer.in_flight(), 2);

        clock.advance(1);
        debouncer.debounce(&raw, &mut cooked, 2, false);
        assert_consistent(&debouncer);
        assert_eq!(cooked, [0b0000_0001, 0b1000_0000]);
        assert_eq!(debouncer.in_flight(), 0);
    }

    #[test]
    fn test_release_uses_up_threshold() {
        let clock = ManualClock::new();
        let mut debouncer = TestDebouncer::new(&clock);
        debouncer.init(1).unwrap();

        let raw = [0u8];
        let mut cooked = [0b10u8];
        debouncer.debounce(&raw, &mut cooked, 1, true);
        for _ in 0..5 {
            clock.advance(1);
            debouncer.debounce(&raw, &mut cooked, 1, false);
            assert_eq!(cooked, [0b10]);
        }
        clock.advance(1);
        debouncer.debounce(&raw, &mut cooked, 1, false);
        assert_eq!(cooked, [0]);
    }

    #[test]
    fn test_init_checks_capacity() {
        let clock = ManualClock::new();
        let mut debouncer = TestDebouncer::new(&clock);
        assert_eq!(
            debouncer.init(3),
            Err(DebounceError::OutOfMemory {
                requested: 3,
                capacity: 2
            })
        );
        assert!(debouncer.counters.is_empty());
        assert!(debouncer.init(2).is_ok());
    }

    #[test]
    fn test_debounce_without_init_is_noop() {
        let clock = ManualClock::new();
        let mut debouncer = TestDebouncer::new(&clock);
        let raw = [0xffu8, 0xff];
        let mut cooked = [0u8; 2];
        debouncer.debounce(&raw, &mut cooked, 2, true);
        assert_eq!(cooked, [0, 0]);
        debouncer.teardown();
        debouncer.teardown();
        assert_eq!(debouncer.in_flight(), 0);
    }
}
