//! Timestamp representation for page records.
//!
//! A `Timestamp` is a signed count of seconds since the Unix epoch plus a
//! nanosecond fraction in `0..1_000_000_000`. The fraction is normalized on
//! construction so derived ordering and equality are byte-exact with the
//! 12-byte wire encoding (8-byte seconds, 4-byte nanos).

use serde::{Deserialize, Serialize};

pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    /// Creates a timestamp, carrying any whole seconds out of `nanos`.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        let carry = (nanos / NANOS_PER_SECOND) as i64;
        Self {
            seconds: seconds + carry,
            nanos: nanos % NANOS_PER_SECOND,
        }
    }

    pub const fn from_epoch_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }
}
