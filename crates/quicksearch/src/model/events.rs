/// A mutation of the ordered entry list, in list indices at the time it
/// happened. Replaying events in order reproduces the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    Inserted { index: usize, count: usize },
    Removed { index: usize, count: usize },
    /// Entries changed in place, such as relative paths after a root change
    /// or a thumbnail becoming available.
    Updated { index: usize, count: usize },
    /// The whole list changed; re-read it.
    Reset,
}

impl ListEvent {
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Updated { .. })
    }
}
