//! Environment abstraction for deterministic testing.
//!
//! Chat logic never reads the system clock or RNG directly. Timers (typing
//! debounce, reconnect backoff) compare instants handed in by the caller, and
//! message stamps come from [`Environment::wall_clock`]. Simulation swaps in a
//! virtual clock and a seeded RNG; production uses the real ones.

use std::{fmt::Debug, ops::Sub, time::Duration};

use chrono::{DateTime, FixedOffset};

/// Monotonic instant usable by the state machines.
///
/// Implemented for every type with the required bounds, so
/// `std::time::Instant` and virtual instants both qualify.
pub trait Timestamp: Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> {}

impl<T> Timestamp for T where T: Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> {}

/// Abstract environment providing time, randomness, and async sleep.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - given the same seed, a simulated environment yields the same sequence of
///   random bytes
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type. Production uses `std::time::Instant`, simulation a
    /// virtual instant.
    type Instant: Timestamp;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; state machines take time as input.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Local wall-clock time, used to stamp outgoing messages.
    fn wall_clock(&self) -> DateTime<FixedOffset>;

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Random 128-bit id rendered as 32 hex digits.
    ///
    /// Used for client message ids, which only need to be unique per sender.
    fn random_id(&self) -> String {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        format!("{:032x}", u128::from_be_bytes(bytes))
    }
}
