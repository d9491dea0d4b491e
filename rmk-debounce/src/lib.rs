//! Key matrix debouncing for RMK.
//!
//! A matrix scanner produces a raw sample of the key matrix every scan. The
//! debouncers in this crate filter contact bounce out of that sample and keep
//! a stable (cooked) matrix up to date in place:
//!
//! - [`AsymDeferDebouncer`]: per-key countdown restarted by every edge, with separate press/release thresholds
//! - [`EagerListDebouncer`]: per-key countdowns chained in a list of in-flight keys
//! - [`QuiesceDebouncer`]: per-key state machine that ignores all changes for a while after a commit
//!
//! The algorithm and its thresholds are chosen in the `[debounce]` section of
//! `keyboard.toml`, the [`Debouncer`] alias names the selected one.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod debounce;
pub mod matrix;

pub use clock::{Clock, DefaultClock, EmbassyClock, FrameClock, ManualClock};
pub use config::{BuildTiming, DebounceTiming};
pub use debounce::{
    AsymDeferDebouncer, DebounceError, Debouncer, DebouncerTrait, EagerListDebouncer, QuiesceDebouncer,
};
pub use matrix::{ChangeTracker, MatrixRow};

include!(concat!(env!("OUT_DIR"), "/constants.rs"));
