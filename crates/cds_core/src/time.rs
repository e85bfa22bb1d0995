//! Time types for CDS.
//!
//! Contest events are positioned by a logical offset from contest start.
//! Wall clock mapping happens only at replay time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Logical position of an event relative to contest start
///
/// `Immediate` sorts before every concrete offset and is delivered without
/// any pacing delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventOffset {
    /// Before any timed event, never waited for
    Immediate,
    /// A concrete offset from contest start
    At(#[serde(with = "duration_ms")] Duration),
}

impl EventOffset {
    /// Offset at contest start
    #[must_use]
    pub const fn zero() -> Self {
        Self::At(Duration::ZERO)
    }

    /// Offset from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self::At(Duration::from_millis(millis))
    }

    /// Concrete offset, if any
    #[must_use]
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Immediate => None,
            Self::At(offset) => Some(*offset),
        }
    }

    /// Check whether the event skips pacing
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate)
    }
}

impl From<Duration> for EventOffset {
    fn from(value: Duration) -> Self {
        Self::At(value)
    }
}

impl std::fmt::Display for EventOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate => write!(f, "-inf"),
            Self::At(offset) => write!(f, "+{}ms", offset.as_millis()),
        }
    }
}

/// Serde adapter: `Duration` as integer milliseconds
pub mod duration_ms {
    use super::*;

    /// Serialize as milliseconds
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserialize from milliseconds
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Serde adapter: `Option<Duration>` as optional integer milliseconds
pub mod option_duration_ms {
    use super::*;

    /// Serialize as optional milliseconds
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => super::duration_ms::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from optional milliseconds
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|millis| millis.map(Duration::from_millis))
    }
}
