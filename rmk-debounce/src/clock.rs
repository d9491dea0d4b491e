//! Time sources for the debouncers.
//!
//! Debouncers only need a fast 16-bit wrapping tick counter. Differences are
//! computed with wrapping subtraction, so a counter overflow between two polls
//! is harmless as long as the polls are less than 65 seconds apart.

use core::cell::Cell;

use embassy_time::Instant;

/// Monotonic wrapping tick counter
pub trait Clock {
    /// Current tick, wraps at `u16::MAX`
    fn now(&self) -> u16;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u16 {
        (**self).now()
    }
}

/// Millisecond clock backed by `embassy_time`
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> u16 {
        Instant::now().as_millis() as u16
    }
}

/// Counts scan passes instead of milliseconds, every poll is one tick later than the last.
#[derive(Debug, Default)]
pub struct FrameClock {
    frame: Cell<u16>,
}

impl FrameClock {
    pub const fn new() -> Self {
        Self { frame: Cell::new(0) }
    }
}

impl Clock for FrameClock {
    fn now(&self) -> u16 {
        let frame = self.frame.get().wrapping_add(1);
        self.frame.set(frame);
        frame
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u16>,
}

impl ManualClock {
    pub const fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn set(&self, now: u16) {
        self.now.set(now);
    }

    pub fn advance(&self, ticks: u16) {
        self.now.set(self.now.get().wrapping_add(ticks));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u16 {
        self.now.get()
    }
}

/// Clock used when none is given explicitly
#[cfg(not(debounce_use_frames))]
pub type DefaultClock = EmbassyClock;
/// Clock used when none is given explicitly
#[cfg(debounce_use_frames)]
pub type DefaultClock = FrameClock;

/// Ticks elapsed between consecutive debounce passes
pub struct ElapsedTimer<C: Clock> {
    clock: C,
    last: Option<u16>,
}

impl<C: Clock> ElapsedTimer<C> {
    pub const fn new(clock: C) -> Self {
        Self { clock, last: None }
    }

    /// Forget the previous poll, the next call to `elapsed` returns 1
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Ticks since the previous call, saturated to `u8::MAX`.
    ///
    /// The first call after construction or `reset` has no reference point and reports a single tick.
    pub fn elapsed(&mut self) -> u8 {
        let now = self.clock.now();
        match self.last.replace(now) {
            None => 1,
            Some(last) => now.wrapping_sub(last).min(u8::MAX as u16) as u8,
        }
    }
}
