//! Live, query-driven file and application picker index.
//!
//! This crate keeps a ranked entry list current while the filesystem
//! changes and the query is edited:
//! - Cancellable directory and application-registry scans on a worker pool
//! - Generation-based rejection of results from superseded configurations
//! - Path-set diffs applied as batched contiguous-range list updates
//! - Fuzzy subsequence matching and relevance ordering
//! - Change watching of the root and, when recursive, its subdirectories

pub mod bus;
pub mod cancel;
pub mod config;
pub mod diff;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod model;
mod pool;
pub mod scan;
pub mod thumbnail;
pub mod types;
pub mod watcher;

// Re-export main types
pub use bus::{EventBus, IndexEvent};
pub use cancel::{CancellationToken, GenerationController};
pub use config::{EngineOptions, IndexConfig};
pub use error::{QuicksearchError, Result};
pub use fuzzy::{fuzzy_match, FuzzyMatch};
pub use index::{FeedFactory, LiveIndex, LiveIndexBuilder};
pub use model::{Entry, ListEvent, MediaKind};
pub use types::{FilterKind, SortKey};

pub use desktop_entry::DesktopEntry;
