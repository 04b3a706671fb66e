//! Monotonic clock arithmetic.
//!
//! [`Timestamp`] is a `(sec, nsec)` pair read from the monotonic clock. Every
//! constructor and arithmetic operation keeps `nsec` in `[0, 1e9)`, so the
//! derived lexicographic ordering is the time ordering.
//!
//! The wait strategies are written against [`MonotonicClock`] rather than the
//! OS directly. [`SystemClock`] is the production implementation and
//! [`SimulatedClock`] drives them deterministically in tests.

use std::cell::{Cell, RefCell};

/// Nanoseconds per second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A monotonic clock reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    sec: i64,
    nsec: i64,
}

impl Timestamp {
    /// The clock origin.
    pub const ZERO: Self = Self { sec: 0, nsec: 0 };

    /// Build a timestamp from arbitrary components, carrying or borrowing
    /// whole seconds out of `nsec`.
    pub fn normalized(sec: i64, nsec: i64) -> Self {
        Self {
            sec: sec.saturating_add(nsec.div_euclid(NANOS_PER_SEC)),
            nsec: nsec.rem_euclid(NANOS_PER_SEC),
        }
    }

    /// Read the system monotonic clock.
    pub fn now() -> Self {
        crate::platform::monotonic_now()
    }

    /// Whole seconds.
    pub const fn sec(&self) -> i64 {
        self.sec
    }

    /// Nanoseconds within the second, always in `[0, 1e9)`.
    pub const fn nsec(&self) -> i64 {
        self.nsec
    }

    /// Shift by a signed number of nanoseconds.
    pub fn with_offset(self, offset_ns: i64) -> Self {
        // rem_euclid keeps the sub-second part non-negative, so the sum stays
        // below 2e9 and cannot overflow.
        let nsec = self.nsec + offset_ns.rem_euclid(NANOS_PER_SEC);
        Self::normalized(
            self.sec.saturating_add(offset_ns.div_euclid(NANOS_PER_SEC)),
            nsec,
        )
    }

    /// Signed nanoseconds from `earlier` to `self`, saturating at the `i64`
    /// range.
    pub fn diff_ns(&self, earlier: &Timestamp) -> i64 {
        let delta = (self.as_nanos()).saturating_sub(earlier.as_nanos());
        i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
    }

    /// Strictly earlier than `other`.
    pub fn before(&self, other: &Timestamp) -> bool {
        self < other
    }

    /// Total nanoseconds since the clock origin.
    pub fn as_nanos(&self) -> i128 {
        i128::from(self.sec) * i128::from(NANOS_PER_SEC) + i128::from(self.nsec)
    }

    /// Build from total nanoseconds since the clock origin.
    pub fn from_nanos(nanos: i64) -> Self {
        Self::normalized(0, nanos)
    }
}

/// `a − b` in nanoseconds.
pub fn diff(a: &Timestamp, b: &Timestamp) -> i64 {
    a.diff_ns(b)
}

/// Whether `a` is strictly earlier than `b`.
pub fn before(a: &Timestamp, b: &Timestamp) -> bool {
    a.before(b)
}

/// Monotonic time source with absolute-deadline sleeping.
pub trait MonotonicClock {
    /// Current reading.
    fn now(&self) -> Timestamp;

    /// Block until the clock reaches `deadline`. Returns immediately when
    /// the deadline has already passed.
    fn sleep_until(&self, deadline: &Timestamp);
}

/// The OS monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        crate::platform::monotonic_now()
    }

    #[inline]
    fn sleep_until(&self, deadline: &Timestamp) {
        crate::platform::sleep_until(deadline);
    }
}

/// Deterministic clock for tests and benchmarks.
///
/// Every `now()` call returns the current reading and then advances it by a
/// fixed step, so spin loops terminate. `sleep_until` jumps forward to the
/// deadline and records it.
#[derive(Debug)]
pub struct SimulatedClock {
    current: Cell<Timestamp>,
    read_cost_ns: i64,
    sleeps: RefCell<Vec<Timestamp>>,
}

impl SimulatedClock {
    /// Start at `start`; each clock read costs `read_cost_ns`.
    pub fn new(start: Timestamp, read_cost_ns: i64) -> Self {
        Self {
            current: Cell::new(start),
            read_cost_ns,
            sleeps: RefCell::new(Vec::new()),
        }
    }

    /// Reading without advancing the clock.
    pub fn peek(&self) -> Timestamp {
        self.current.get()
    }

    /// Move the clock forward by `ns`.
    pub fn advance(&self, ns: i64) {
        self.current.set(self.current.get().with_offset(ns));
    }

    /// Deadlines passed to `sleep_until`, in call order.
    pub fn sleeps(&self) -> Vec<Timestamp> {
        self.sleeps.borrow().clone()
    }
}

impl MonotonicClock for SimulatedClock {
    fn now(&self) -> Timestamp {
        let reading = self.current.get();
        self.current.set(reading.with_offset(self.read_cost_ns));
        reading
    }

    fn sleep_until(&self, deadline: &Timestamp) {
        self.sleeps.borrow_mut().push(*deadline);
        if self.current.get() < *deadline {
            self.current.set(*deadline);
        }
    }
}
