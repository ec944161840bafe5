//! External price feed interface.

use lib_types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// A raw reading from an external price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReading {
    /// Reported price at [`crate::PRICE_SCALE`] fixed-point scale
    pub value: Amount,
    /// When the feed last updated this value
    pub updated_at: Timestamp,
}

/// Trait for external price feeds.
///
/// This is the minimal interface the adapter needs. Implementations are
/// provided by the host environment; tests use in-memory mocks.
pub trait PriceFeed {
    /// Latest reading, or `None` if the feed is unavailable.
    fn latest(&self) -> Option<FeedReading>;
}

/// A feed that is permanently absent. Useful for fallback-only deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeed;

impl PriceFeed for NoFeed {
    fn latest(&self) -> Option<FeedReading> {
        None
    }
}
