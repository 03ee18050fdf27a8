use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of wall-clock time in milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Shared `local - server` clock difference in milliseconds.
///
/// Written only by an explicit resync and read by every nonce; clones share
/// the same value.
#[derive(Debug, Clone, Default)]
pub struct TimeOffset(Arc<AtomicI64>);

impl TimeOffset {
    pub fn new(offset_ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(offset_ms)))
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, offset_ms: i64) {
        self.0.store(offset_ms, Ordering::Release);
    }
}

/// Produces request nonces as `now_millis - offset`.
///
/// Two calls within the same millisecond return the same nonce.
#[derive(Clone)]
pub struct NonceGenerator {
    clock: Arc<dyn Clock>,
    offset: TimeOffset,
}

impl fmt::Debug for NonceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceGenerator")
            .field("offset", &self.offset.get())
            .finish_non_exhaustive()
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), TimeOffset::default())
    }
}

impl NonceGenerator {
    pub fn new(clock: Arc<dyn Clock>, offset: TimeOffset) -> Self {
        Self { clock, offset }
    }

    pub fn next(&self) -> i64 {
        self.clock.now_millis().saturating_sub(self.offset.get())
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn offset(&self) -> &TimeOffset {
        &self.offset
    }
}
