//! Default values of the `[debounce]` section

/// Default debounce threshold, in milliseconds
pub const DEBOUNCE_TIME: u8 = 5;

/// Default settle window of the quiesce algorithm, in milliseconds
pub const QUIESCE_TIME: u8 = 30;
