//! The `latency` query parameter.
//!
//! Accepted forms:
//!
//! - empty: no delay
//! - `N`: exactly `N` milliseconds
//! - `-N`: a uniform draw from `[0, N]`
//! - `A-B`: a uniform draw from `[A, B]`
//!
//! Anything else is logged and collapses to a zero delay. A bound that fails
//! to parse is zeroed on its own; the other bound is kept.

use std::{fmt, num::ParseIntError, time::Duration};

use rand::Rng;
use tracing::error;

/// Source of the random draws used for latency ranges.
pub trait RandomSource: Send + Sync {
    /// Draws uniformly from `[min, max]`, both ends inclusive. Callers
    /// guarantee `min < max`.
    fn between(&self, min: u64, max: u64) -> u64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn between(&self, min: u64, max: u64) -> u64 {
        rand::rng().random_range(min..=max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
    Exact,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min => f.write_str("min"),
            Bound::Max => f.write_str("max"),
            Bound::Exact => f.write_str("exact"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LatencySpecError {
    #[error("expected `N`, `-N` or `min-max`, found {segments} hyphen-separated segments")]
    TooManySegments { segments: usize },

    #[error("{bound} latency {value:?} is not a non-negative integer")]
    InvalidBound {
        bound: Bound,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("min latency {min}ms is greater than max latency {max}ms")]
    InvertedRange { min: u64, max: u64 },
}

/// Inclusive millisecond range a delay is drawn from. Always `min_ms <= max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyRange {
    min_ms: u64,
    max_ms: u64,
}

impl LatencyRange {
    pub const ZERO: Self = Self {
        min_ms: 0,
        max_ms: 0,
    };

    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self, LatencySpecError> {
        if min_ms > max_ms {
            return Err(LatencySpecError::InvertedRange {
                min: min_ms,
                max: max_ms,
            });
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn exact(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    /// Parses a latency spec, logging and normalizing anything malformed.
    pub fn parse(spec: &str) -> Self {
        if spec.is_empty() {
            return Self::ZERO;
        }

        let segments: Vec<&str> = spec.split('-').collect();
        let (min, max) = match segments.as_slice() {
            [exact] => return Self::exact(parse_bound(spec, Bound::Exact, exact)),
            ["", max] => (0, parse_bound(spec, Bound::Max, max)),
            [min, max] => (
                parse_bound(spec, Bound::Min, min),
                parse_bound(spec, Bound::Max, max),
            ),
            _ => {
                let err = LatencySpecError::TooManySegments {
                    segments: segments.len(),
                };
                error!(latency = spec, %err, "invalid 'latency' parameter, defaulting to 0ms");
                return Self::ZERO;
            }
        };

        Self::new(min, max).unwrap_or_else(|err| {
            error!(
                latency = spec,
                latency_min = min,
                latency_max = max,
                %err,
                "invalid 'latency' range, defaulting to 0ms"
            );
            Self::ZERO
        })
    }

    pub fn is_exact(&self) -> bool {
        self.min_ms == self.max_ms
    }

    /// Picks the concrete delay. Exact ranges never touch `random`.
    pub fn resolve(&self, random: &dyn RandomSource) -> u64 {
        if self.is_exact() {
            self.min_ms
        } else {
            random.between(self.min_ms, self.max_ms)
        }
    }

    /// Resolves the delay and sleeps for it, returning the milliseconds slept.
    ///
    /// Only the calling task is suspended; other requests keep being served.
    pub async fn apply(&self, random: &dyn RandomSource) -> u64 {
        let ms = self.resolve(random);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        ms
    }
}

fn parse_bound(spec: &str, bound: Bound, value: &str) -> u64 {
    value.parse().unwrap_or_else(|source| {
        let err = LatencySpecError::InvalidBound {
            bound,
            value: value.to_owned(),
            source,
        };
        error!(latency = spec, %err, "invalid 'latency' parameter, defaulting bound to 0ms");
        0
    })
}
