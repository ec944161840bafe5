//! Staleness checking and fallback resolution.

use lib_types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::feed::{FeedReading, PriceFeed};

/// A point-in-time quote with explicit provenance.
///
/// `from_oracle = false` means the fallback price was used; this is a status
/// flag, not an error, and the quote remains usable for pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleQuote {
    /// Price at [`crate::PRICE_SCALE`] fixed-point scale
    pub value: Amount,
    /// Host timestamp at which the quote was taken
    pub observed_at: Timestamp,
    /// Whether the value came from a live, fresh feed reading
    pub from_oracle: bool,
}

/// Normalizes feed readings into validated quotes.
///
/// A reading is accepted only if it is positive and no older than
/// `staleness_threshold_secs`; otherwise the administrator-set fallback
/// price is returned with `from_oracle = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceOracleAdapter {
    /// Administrator-set price used when the feed is absent or stale
    fallback_price: Amount,
    /// Maximum accepted reading age in seconds
    staleness_threshold_secs: u64,
}

impl PriceOracleAdapter {
    /// Create an adapter with the given fallback price and staleness bound.
    pub fn new(fallback_price: Amount, staleness_threshold_secs: u64) -> Self {
        Self {
            fallback_price,
            staleness_threshold_secs,
        }
    }

    /// Current fallback price.
    pub fn fallback_price(&self) -> Amount {
        self.fallback_price
    }

    /// Current staleness threshold in seconds.
    pub fn staleness_threshold_secs(&self) -> u64 {
        self.staleness_threshold_secs
    }

    /// Administrative update of the fallback price.
    pub fn set_fallback_price(&mut self, price: Amount) {
        self.fallback_price = price;
    }

    /// Administrative update of the staleness threshold.
    pub fn set_staleness_threshold_secs(&mut self, secs: u64) {
        self.staleness_threshold_secs = secs;
    }

    /// Read a quote from the feed, falling back when absent or stale.
    ///
    /// Never a hard failure. The host calls this at most once per operation;
    /// a quote is never reused across operations.
    pub fn read_price(&self, feed: &dyn PriceFeed, now: Timestamp) -> OracleQuote {
        match feed.latest() {
            Some(reading) if self.is_fresh(&reading, now) => OracleQuote {
                value: reading.value,
                observed_at: now,
                from_oracle: true,
            },
            Some(reading) => {
                warn!(
                    value = reading.value as u64,
                    updated_at = reading.updated_at,
                    now,
                    "oracle reading stale or invalid, using fallback price"
                );
                self.fallback(now)
            }
            None => {
                warn!(now, "oracle feed absent, using fallback price");
                self.fallback(now)
            }
        }
    }

    fn is_fresh(&self, reading: &FeedReading, now: Timestamp) -> bool {
        reading.value > 0
            && now >= reading.updated_at
            && now - reading.updated_at <= self.staleness_threshold_secs
    }

    fn fallback(&self, now: Timestamp) -> OracleQuote {
        OracleQuote {
            value: self.fallback_price,
            observed_at: now,
            from_oracle: false,
        }
    }
}
