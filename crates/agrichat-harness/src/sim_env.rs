//! Simulated environment: virtual clock and seeded RNG.
//!
//! Time only moves when the test says so ([`SimEnv::advance`] or
//! [`Environment::sleep`]), and random bytes come from a seeded ChaCha
//! stream, so a run with the same seed and the same schedule is identical.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use agrichat_core::Environment;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 2024-05-01T09:00:00Z
const DEFAULT_EPOCH_SECS: i64 = 1_714_554_000;

/// Deterministic environment shared by every simulated participant.
///
/// Clones share the clock and the RNG stream.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed_ms: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
    epoch: DateTime<FixedOffset>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Seed used by [`SimEnv::new`].
    pub const DEFAULT_SEED: u64 = 0x00C0_FFEE;

    /// Environment with the default seed, starting at 09:00 UTC.
    pub fn new() -> Self {
        Self::with_seed(Self::DEFAULT_SEED)
    }

    /// Environment with an explicit seed.
    pub fn with_seed(seed: u64) -> Self {
        let epoch = DateTime::<Utc>::from_timestamp(DEFAULT_EPOCH_SECS, 0)
            .unwrap_or_default()
            .fixed_offset();
        Self {
            elapsed_ms: Arc::new(AtomicU64::new(0)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            epoch,
        }
    }

    /// Start the wall clock at `epoch` instead.
    #[must_use]
    pub fn starting_at(mut self, epoch: DateTime<FixedOffset>) -> Self {
        self.epoch = epoch;
        self
    }

    /// Move virtual time forward. Millisecond resolution.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Virtual time since the simulation started.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }

    fn wall_clock(&self) -> DateTime<FixedOffset> {
        let delta = TimeDelta::from_std(self.elapsed()).unwrap_or(TimeDelta::MAX);
        self.epoch.checked_add_signed(delta).unwrap_or(self.epoch)
    }
}
