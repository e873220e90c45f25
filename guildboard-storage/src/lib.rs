//! Guildboard Storage - Cache Layer and Store Contract
//!
//! Defines the read-through cache the service puts in front of the
//! leaderboard database, the traits that database must implement, and an
//! in-memory mock of it.

pub mod cache;
pub mod mock;
pub mod store;

pub use cache::{
    is_stale, AggregateFetcher, CacheConfig, CacheRead, CacheStats, CacheableRecord, Clock,
    Freshness, ManualClock, ReadThroughCache, SharedClock, StorageFetcher, SystemClock, TimedEntry,
};
pub use mock::{MockPatronSource, MockStore};
pub use store::{LeaderboardStore, PatronSource};
