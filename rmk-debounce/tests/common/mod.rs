#![allow(dead_code)]

use log::debug;
use rmk_debounce::{ChangeTracker, Clock, DebounceTiming, DebouncerTrait, ManualClock, MatrixRow};

pub const ROWS: usize = 4;
pub const COLS: usize = 10;

pub type Row = u16;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// 5ms thresholds, 30ms settle window
pub struct Timing5;

impl DebounceTiming for Timing5 {
    const DOWN: u8 = 5;
    const UP: u8 = 5;
    const QUIESCE: u8 = 30;
}

/// Presses debounce in 5ms, releases in 10ms
pub struct Timing5Down10Up;

impl DebounceTiming for Timing5Down10Up {
    const DOWN: u8 = 5;
    const UP: u8 = 10;
    const QUIESCE: u8 = 30;
}

#[derive(Debug, Clone, Copy)]
pub struct KeyChange {
    pub row: usize,
    pub col: usize,
    pub pressed: bool,
}

pub const fn down(row: usize, col: usize) -> KeyChange {
    KeyChange { row, col, pressed: true }
}

pub const fn up(row: usize, col: usize) -> KeyChange {
    KeyChange { row, col, pressed: false }
}

/// Raw inputs applied at `time`, and the changes the cooked matrix must show right after
#[derive(Debug, Clone, Copy)]
pub struct DebounceEvent<'e> {
    pub time: u16,
    pub inputs: &'e [KeyChange],
    pub outputs: &'e [KeyChange],
}

pub const fn event<'e>(time: u16, inputs: &'e [KeyChange], outputs: &'e [KeyChange]) -> DebounceEvent<'e> {
    DebounceEvent { time, inputs, outputs }
}

fn apply(matrix: &mut [Row; ROWS], changes: &[KeyChange]) {
    for change in changes {
        matrix[change.row] = matrix[change.row].with_bit(change.col, change.pressed);
    }
}

/// Drive a debouncer through a timeline of events.
///
/// The clock starts at the first event. Without `time_jumps` the debouncer is
/// run every millisecond and the cooked matrix may only change at event times,
/// with `time_jumps` it only runs at event times, simulating a late scan.
pub struct DebounceTest<'a, D: DebouncerTrait<Row>> {
    debouncer: D,
    clock: &'a ManualClock,
    tracker: ChangeTracker<Row, ROWS>,
    raw: [Row; ROWS],
    cooked: [Row; ROWS],
    expected: [Row; ROWS],
    pub time_jumps: bool,
}

impl<'a, D: DebouncerTrait<Row>> DebounceTest<'a, D> {
    pub fn new(mut debouncer: D, clock: &'a ManualClock) -> Self {
        debouncer.init(ROWS).expect("debouncer init failed");
        Self {
            debouncer,
            clock,
            tracker: ChangeTracker::new(),
            raw: [0; ROWS],
            cooked: [0; ROWS],
            expected: [0; ROWS],
            time_jumps: false,
        }
    }

    pub fn debouncer(&self) -> &D {
        &self.debouncer
    }

    pub fn cooked(&self) -> &[Row; ROWS] {
        &self.cooked
    }

    fn run_debounce(&mut self) {
        let changed = self.tracker.update(&self.raw);
        let raw = self.raw;
        self.debouncer.debounce(&raw, &mut self.cooked, ROWS, changed);
        assert_eq!(raw, self.raw, "debounce() modified the raw matrix");
    }

    fn check_cooked(&self, context: &str) {
        assert_eq!(
            self.expected,
            self.cooked,
            "{} at t={}, expected left but actually right",
            context,
            self.clock.now()
        );
    }

    pub fn run_events(&mut self, events: &[DebounceEvent<'_>]) {
        let Some(first) = events.first() else {
            return;
        };
        self.clock.set(first.time);

        for (index, event) in events.iter().enumerate() {
            if index > 0 {
                if self.time_jumps {
                    self.clock.set(event.time);
                } else {
                    assert!(event.time >= self.clock.now(), "events must be ordered by time");
                    while self.clock.now() + 1 < event.time {
                        // Ticks between events must not change the cooked matrix
                        self.clock.advance(1);
                        self.run_debounce();
                        self.check_cooked("debounce() modified the cooked matrix");
                    }
                    self.clock.set(event.time);
                }
            }

            apply(&mut self.raw, event.inputs);
            self.run_debounce();
            apply(&mut self.expected, event.outputs);
            debug!("t={}: raw {:?}, cooked {:?}", event.time, self.raw, self.cooked);
            self.check_cooked("unexpected cooked matrix");
        }
    }
}

/// Run `events` against a freshly initialized debouncer built by `make`
pub fn run<'a, D, F>(clock: &'a ManualClock, make: F, events: &[DebounceEvent<'_>], time_jumps: bool)
where
    D: DebouncerTrait<Row>,
    F: FnOnce(&'a ManualClock) -> D,
{
    let mut test = DebounceTest::new(make(clock), clock);
    test.time_jumps = time_jumps;
    test.run_events(events);
}
