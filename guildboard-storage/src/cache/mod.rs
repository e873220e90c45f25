//! Read-through cache layer.
//!
//! Staleness is explicit: every read returns a [`CacheRead<T>`] carrying the
//! refresh time, whether it was a hit, and whether it is a stale fallback.
//! Callers choose via [`Freshness`] whether a failed refresh may fall back to
//! the expired value.
//!
//! # Example
//!
//! ```ignore
//! let guilds = ReadThroughCache::new(
//!     CacheConfig::new("guild", Duration::from_secs(60)),
//!     SystemClock::shared(),
//! );
//!
//! // Loads on first use, then serves from memory for 60 seconds.
//! let read = guilds.get(&CacheKey::new("lucid"), Freshness::Strict, &fetcher).await?;
//! ```

pub mod clock;
pub mod entry;
pub mod freshness;
pub mod read_through;
pub mod traits;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use entry::{is_stale, TimedEntry};
pub use freshness::{CacheRead, Freshness};
pub use read_through::{CacheConfig, ReadThroughCache};
pub use traits::{AggregateFetcher, CacheStats, CacheableRecord, StorageFetcher};
