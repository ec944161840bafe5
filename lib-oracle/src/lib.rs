//! Price Oracle Adapter
//!
//! Normalizes an external price feed reading into a validated,
//! staleness-checked quote, falling back to an administrator-set price when
//! the feed is absent or stale.
//!
//! # Key Types
//!
//! - [`PriceFeed`]: The minimal interface an external feed must provide
//! - [`PriceOracleAdapter`]: Staleness checking + fallback resolution
//! - [`OracleQuote`]: A point-in-time quote with explicit provenance
//!
//! Degraded mode is never a hard failure: callers always receive a usable
//! price and a `from_oracle` flag describing where it came from.

pub mod adapter;
pub mod convert;
pub mod feed;

pub use adapter::{OracleQuote, PriceOracleAdapter};
pub use convert::{convert, ConvertError, PRICE_SCALE};
pub use feed::{FeedReading, PriceFeed};
