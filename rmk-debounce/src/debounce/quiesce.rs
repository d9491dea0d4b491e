use core::marker::PhantomData;

use heapless::Vec;

use super::{DebounceError, DebouncerTrait, commit, rows_to_scan};
use crate::clock::{Clock, DefaultClock, ElapsedTimer};
use crate::config::{BuildTiming, DebounceTiming};
use crate::matrix::MatrixRow;

/// Debounce phase of a single key
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyPhase {
    /// Raw and cooked agree, waiting for an edge
    Waiting,
    /// An edge was seen, waiting for it to hold for the threshold
    Debouncing,
    /// The edge was committed, every change is ignored until the settle window ends
    Quiescing,
}

/// State machine of a single key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct KeyState {
    phase: KeyPhase,
    /// Ticks left in the current phase, 0 while waiting
    remaining: u8,
}

impl KeyState {
    const WAITING: KeyState = KeyState {
        phase: KeyPhase::Waiting,
        remaining: 0,
    };
}

/// Per-key debouncer with a quiescence window after every commit.
///
/// A key that sees an edge starts debouncing. If raw goes back to the cooked
/// state before the threshold expires the edge is dropped, otherwise it is
/// committed and the key quiesces for `T::QUIESCE` ticks, ignoring every
/// change. This gives up fast repeated actuation of one key in exchange for
/// the strongest chatter rejection.
pub struct QuiesceDebouncer<R, const ROW: usize, const COL: usize, C: Clock = DefaultClock, T = BuildTiming> {
    timer: ElapsedTimer<C>,
    /// [row][col] key state machines
    keys: Vec<[KeyState; COL], ROW>,
    /// [row] number of keys in the row that are not waiting
    row_active: Vec<u8, ROW>,
    _marker: PhantomData<(R, T)>,
}

impl<R, const ROW: usize, const COL: usize, C: Clock + Default, T> Default for QuiesceDebouncer<R, ROW, COL, C, T> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<R, const ROW: usize, const COL: usize, C: Clock, T> QuiesceDebouncer<R, ROW, COL, C, T> {
    /// Create a debouncer without any rows, call `init` before use
    pub const fn new(clock: C) -> Self {
        Self {
            timer: ElapsedTimer::new(clock),
            keys: Vec::new(),
            row_active: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Current phase of the key at (`row`, `col`), `None` if the row isn't initialized
    pub fn phase(&self, row: usize, col: usize) -> Option<KeyPhase> {
        self.keys.get(row).and_then(|keys| keys.get(col)).map(|key| key.phase)
    }
}

impl<R: MatrixRow, const ROW: usize, const COL: usize, C: Clock, T: DebounceTiming>
    QuiesceDebouncer<R, ROW, COL, C, T>
{
    const LAYOUT: () = {
        assert!(COL <= R::BITS, "matrix row type is narrower than the number of columns");
        assert!(COL <= u8::MAX as usize, "too many columns for the per-row counter");
        assert!(T::DOWN > 0 && T::UP > 0, "debounce thresholds must be nonzero");
    };
}

impl<R: MatrixRow, const ROW: usize, const COL: usize, C: Clock, T: DebounceTiming> DebouncerTrait<R>
    for QuiesceDebouncer<R, ROW, COL, C, T>
{
    fn init(&mut self, num_rows: usize) -> Result<(), DebounceError> {
        let () = Self::LAYOUT;
        self.teardown();
        let out_of_memory = DebounceError::OutOfMemory {
            requested: num_rows,
            capacity: ROW,
        };
        if self.keys.resize(num_rows, [KeyState::WAITING; COL]).is_err()
            || self.row_active.resize(num_rows, 0).is_err()
        {
            error!("Quiesce debouncer: {} rows requested, {} reserved", num_rows, ROW);
            self.teardown();
            return Err(out_of_memory);
        }
        info!(
            "Quiesce debouncer initialized: {} rows, down {} up {} quiesce {}",
            num_rows,
            T::DOWN,
            T::UP,
            T::QUIESCE
        );
        Ok(())
    }

    fn debounce(&mut self, raw: &[R], cooked: &mut [R], num_rows: usize, _changed: bool) {
        let elapsed = self.timer.elapsed();
        let num_rows = rows_to_scan(num_rows, self.keys.len(), raw, cooked);

        for row in 0..num_rows {
            let raw_row = raw[row];
            let mut cooked_row = cooked[row];
            let delta = raw_row ^ cooked_row;

            // A key leaving quiescence picks up a raw state that changed while it was quiescing,
            // so rows are scanned on their own delta rather than the scan hint
            let active = &mut self.row_active[row];
            if *active == 0 && delta.is_zero() {
                continue;
            }

            for (col, key) in self.keys[row].iter_mut().enumerate() {
                let edge = delta.bit(col);
                match key.phase {
                    KeyPhase::Waiting => {
                        if edge {
                            key.phase = KeyPhase::Debouncing;
                            key.remaining = T::threshold(raw_row.bit(col));
                            *active += 1;
                        }
                    }
                    KeyPhase::Debouncing => {
                        if !edge {
                            // Bounced back before the threshold
                            *key = KeyState::WAITING;
                            *active -= 1;
                        } else if key.remaining > elapsed {
                            key.remaining -= elapsed;
                        } else {
                            cooked_row = commit(cooked_row, raw_row, R::col_mask(col));
                            trace!("Quiesce debouncer: key ({}, {}) debounced", row, col);
                            if T::QUIESCE == 0 {
                                *key = KeyState::WAITING;
                                *active -= 1;
                            } else {
                                key.phase = KeyPhase::Quiescing;
                                key.remaining = T::QUIESCE;
                            }
                        }
                    }
                    KeyPhase::Quiescing => {
                        if key.remaining > elapsed {
                            key.remaining -= elapsed;
                        } else {
                            *key = KeyState::WAITING;
                            *active -= 1;
                        }
                    }
                }
            }

            cooked[row] = cooked_row;
        }
    }

    fn teardown(&mut self) {
        if !self.keys.is_empty() {
            debug!("Quiesce debouncer: releasing {} rows", self.keys.len());
        }
        self.keys.clear();
        self.row_active.clear();
        self.timer.reset();
    }

    fn in_flight(&self) -> usize {
        self.row_active.iter().map(|&count| count as usize).sum()
    }
}
