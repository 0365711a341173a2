//! Multi-tier result cache.
//!
//! Three independent [`CacheTier`]s (parsed tokens, whole generations, built rules) plus a
//! [`KeyMemoizer`] for their keys, owned by an explicit [`CacheContext`].

pub mod clock;
pub mod context;
pub mod lru;
pub mod memo;
pub mod sweeper;
pub mod tier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{CacheContext, CacheStats, CacheTiers, ParseOutcome};
pub use memo::{KeyMemoizer, MemoConfig, MemoStats};
pub use sweeper::Sweeper;
pub use tier::{CacheEntry, CacheTier, TierConfig, TierStats};
