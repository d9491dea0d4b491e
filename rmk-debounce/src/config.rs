use crate::{DEBOUNCE_DOWN, DEBOUNCE_QUIESCE, DEBOUNCE_UP};

/// Compile-time debounce thresholds, in clock ticks.
///
/// `DOWN` and `UP` must be nonzero, every debouncer checks this when it is initialized.
pub trait DebounceTiming {
    /// Quiet time required before a press is committed
    const DOWN: u8;
    /// Quiet time required before a release is committed
    const UP: u8;
    /// Settle window after a commit, only used by the quiesce debouncer
    const QUIESCE: u8;

    /// Threshold for a key whose raw state is now `pressed`
    #[inline]
    fn threshold(pressed: bool) -> u8 {
        if pressed { Self::DOWN } else { Self::UP }
    }
}

/// Thresholds from the `[debounce]` section of `keyboard.toml`
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildTiming;

impl DebounceTiming for BuildTiming {
    const DOWN: u8 = DEBOUNCE_DOWN;
    const UP: u8 = DEBOUNCE_UP;
    const QUIESCE: u8 = DEBOUNCE_QUIESCE;
}
