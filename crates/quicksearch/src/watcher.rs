//! Change watching.
//!
//! - `feed` - the change feed seam and its `notify` implementation
//! - `coordinator` - keeps the feed subscribed to the watched-directory set
//! - `walker` - path coalescing for bursts of changes

mod coordinator;
mod feed;
mod walker;

pub use coordinator::WatchCoordinator;
pub(crate) use feed::FeedEvent;
pub use feed::{ChangeFeed, ChangeSink, NotifyFeed};
pub use walker::{coalesce_event_paths, dedup_paths, path_in_scope};
