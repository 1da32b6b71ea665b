//! The live entry model: entries, their ordering and the ordered list.

mod attributes;
mod compare;
mod entry;
mod events;
mod list;

pub use attributes::{
    AttributeCache, MediaKind, ThumbnailLookup, DESKTOP_MIME_TYPE, DIRECTORY_MIME_TYPE,
};
pub use compare::{compare_entries, ScoreCache, SortSpec};
pub use entry::{relative_path, Entry};
pub use events::ListEvent;
pub use list::OrderedEntries;
