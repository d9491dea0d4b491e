use core::ops::{BitAnd, BitOr, BitXor, Not};

/// One scan row of the key matrix, one bit per column.
///
/// Bit `i` of a row is column `i`. The same row type is used for the raw
/// electrical sample and for the debounced (cooked) state.
pub trait MatrixRow:
    Copy
    + Default
    + Eq
    + core::fmt::Debug
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// Number of columns a row can hold
    const BITS: usize;
    /// A row with no key pressed
    const ZERO: Self;

    /// Mask selecting a single column
    fn col_mask(col: usize) -> Self;

    fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Whether the key at `col` is pressed
    fn bit(self, col: usize) -> bool {
        !(self & Self::col_mask(col)).is_zero()
    }

    /// Copy of this row with the key at `col` set to `pressed`
    fn with_bit(self, col: usize, pressed: bool) -> Self {
        let mask = Self::col_mask(col);
        if pressed { self | mask } else { self & !mask }
    }
}

macro_rules! impl_matrix_row {
    ($($t:ty),*) => {
        $(
            impl MatrixRow for $t {
                const BITS: usize = <$t>::BITS as usize;
                const ZERO: Self = 0;

                #[inline]
                fn col_mask(col: usize) -> Self {
                    1 << col
                }
            }
        )*
    };
}

impl_matrix_row!(u8, u16, u32, u64);

/// Produces the `changed` hint for a scanning loop.
///
/// Keeps the raw sample of the previous scan and reports whether the new one
/// differs from it.
pub struct ChangeTracker<R: MatrixRow, const ROW: usize> {
    previous: [R; ROW],
}

impl<R: MatrixRow, const ROW: usize> Default for ChangeTracker<R, ROW> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: MatrixRow, const ROW: usize> ChangeTracker<R, ROW> {
    pub fn new() -> Self {
        Self {
            previous: [R::ZERO; ROW],
        }
    }

    /// Record a new raw sample, returns true if any row differs from the previous one
    pub fn update(&mut self, raw: &[R]) -> bool {
        let mut changed = false;
        for (previous, &row) in self.previous.iter_mut().zip(raw) {
            if *previous != row {
                *previous = row;
                changed = true;
            }
        }
        changed
    }

    /// The last recorded raw sample
    pub fn previous(&self) -> &[R; ROW] {
        &self.previous
    }
}
