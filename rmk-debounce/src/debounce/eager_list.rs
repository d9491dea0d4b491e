use core::marker::PhantomData;

use heapless::Vec;

use super::{DebounceError, DebouncerTrait, commit, rows_to_scan};
use crate::clock::{Clock, DefaultClock, ElapsedTimer};
use crate::config::{BuildTiming, DebounceTiming};
use crate::matrix::MatrixRow;

/// Link value marking the end of the in-flight list
const NULL: u8 = u8::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Node {
    /// Ticks until the key is debounced. Nonzero exactly when the key is in the list.
    remaining: u8,
    /// Index of the next in-flight key
    next: u8,
}

impl Node {
    const IDLE: Node = Node { remaining: 0, next: NULL };
}

/// Per-key debouncer that only visits keys which are in flight.
///
/// Keys with a running countdown are chained in a singly linked list, each
/// link being the `row * COL + col` index of the next key. Expired keys
/// take their raw state and are unlinked, new edges are pushed at the head.
/// When a scan reports a change and a key that is already counting down
/// still differs from cooked, its countdown is extended by the elapsed time
/// rather than restarted. New edges are found from the raw/cooked delta of
/// every row, so a stale `changed` hint only loses that extension.
///
/// The countdown is never restarted, so the key takes whatever raw shows when
/// it expires. A bounce that happens to straddle the expiry reaches cooked.
///
/// Links are a single byte with `u8::MAX` reserved, so `ROW * COL` must be
/// smaller than 255. This is checked at compile time.
pub struct EagerListDebouncer<R, const ROW: usize, const COL: usize, C: Clock = DefaultClock, T = BuildTiming> {
    timer: ElapsedTimer<C>,
    /// [row][col] key nodes
    nodes: Vec<[Node; COL], ROW>,
    /// First in-flight key
    head: u8,
    _marker: PhantomData<(R, T)>,
}

impl<R, const ROW: usize, const COL: usize, C: Clock + Default, T> Default for EagerListDebouncer<R, ROW, COL, C, T> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<R, const ROW: usize, const COL: usize, C: Clock, T> EagerListDebouncer<R, ROW, COL, C, T> {
    /// Create a debouncer without any rows, call `init` before use
    pub const fn new(clock: C) -> Self {
        Self {
            timer: ElapsedTimer::new(clock),
            nodes: Vec::new(),
            head: NULL,
            _marker: PhantomData,
        }
    }

    fn node_mut(&mut self, index: u8) -> &mut Node {
        let index = index as usize;
        &mut self.nodes[index / COL][index % COL]
    }

    /// Iterate over the indices of in-flight keys, most recent first
    fn pending(&self) -> impl Iterator<Item = u8> + '_ {
        let first = (self.head != NULL).then_some(self.head);
        core::iter::successors(first, |&index| {
            let index = index as usize;
            let next = self.nodes[index / COL][index % COL].next;
            (next != NULL).then_some(next)
        })
    }
}

impl<R: MatrixRow, const ROW: usize, const COL: usize, C: Clock, T: DebounceTiming>
    EagerListDebouncer<R, ROW, COL, C, T>
{
    const LAYOUT: () = {
        assert!(COL <= R::BITS, "matrix row type is narrower than the number of columns");
        assert!(ROW * COL < NULL as usize, "ROW * COL must be smaller than 255");
        assert!(T::DOWN > 0 && T::UP > 0, "debounce thresholds must be nonzero");
    };

    /// Advance every in-flight key, committing and unlinking the expired ones
    fn expire(&mut self, raw: &[R], cooked: &mut [R], elapsed: u8) {
        let mut prev = NULL;
        let mut current = self.head;
        while current != NULL {
            let node = self.node_mut(current);
            debug_assert!(node.remaining != 0);
            if node.remaining > elapsed {
                node.remaining -= elapsed;
                prev = current;
                current = node.next;
                continue;
            }

            // Expired: apply raw to cooked and unlink
            let next = node.next;
            *node = Node::IDLE;
            let (row, col) = (current as usize / COL, current as usize % COL);
            if let (Some(&raw_row), Some(cooked_row)) = (raw.get(row), cooked.get_mut(row)) {
                *cooked_row = commit(*cooked_row, raw_row, R::col_mask(col));
                trace!("Eager list debouncer: key ({}, {}) debounced", row, col);
            }
            if prev == NULL {
                self.head = next;
            } else {
                self.node_mut(prev).next = next;
            }
            current = next;
        }
    }
}

impl<R: MatrixRow, const ROW: usize, const COL: usize, C: Clock, T: DebounceTiming> DebouncerTrait<R>
    for EagerListDebouncer<R, ROW, COL, C, T>
{
    fn init(&mut self, num_rows: usize) -> Result<(), DebounceError> {
        let () = Self::LAYOUT;
        self.teardown();
        if self.nodes.resize(num_rows, [Node::IDLE; COL]).is_err() {
            error!("Eager list debouncer: {} rows requested, {} reserved", num_rows, ROW);
            return Err(DebounceError::OutOfMemory {
                requested: num_rows,
                capacity: ROW,
            });
        }
        info!(
            "Eager list debouncer initialized: {} rows, down {} up {}",
            num_rows,
            T::DOWN,
            T::UP
        );
        Ok(())
    }

    fn debounce(&mut self, raw: &[R], cooked: &mut [R], num_rows: usize, changed: bool) {
        let elapsed = self.timer.elapsed();

        if self.head != NULL {
            self.expire(raw, cooked, elapsed);
        }

        let num_rows = rows_to_scan(num_rows, self.nodes.len(), raw, cooked);
        for row in 0..num_rows {
            let raw_row = raw[row];
            let delta = cooked[row] ^ raw_row;
            if delta.is_zero() {
                continue;
            }

            for col in 0..COL {
                if !delta.bit(col) {
                    continue;
                }
                let head = self.head;
                let node = &mut self.nodes[row][col];
                if node.remaining == 0 {
                    // Not debouncing yet, push to the head of the list
                    node.remaining = T::threshold(raw_row.bit(col));
                    node.next = head;
                    self.head = (row * COL + col) as u8;
                } else if changed {
                    // Fluttering: this frame doesn't count
                    node.remaining = node.remaining.saturating_add(elapsed);
                }
            }
        }
    }

    fn teardown(&mut self) {
        if !self.nodes.is_empty() {
            debug!("Eager list debouncer: releasing {} rows", self.nodes.len());
        }
        self.nodes.clear();
        self.head = NULL;
        self.timer.reset();
    }

    fn in_flight(&self) -> usize {
        self.pending().count()
    }
}
