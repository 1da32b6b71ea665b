use std::path::{Path, PathBuf};

use fnv::FnvHashMap;

use super::entry::Entry;

pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";
pub const DESKTOP_MIME_TYPE: &str = "application/x-desktop";

/// Coarse media classification derived from the mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Self {
        match mime.split_once('/').map(|(top, _)| top) {
            Some("image") => Self::Image,
            Some("video") => Self::Video,
            Some("audio") => Self::Audio,
            _ => Self::Other,
        }
    }

    pub fn is_media(self) -> bool {
        self != Self::Other
    }
}

/// What [`AttributeCache::thumbnail`] found for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailLookup {
    /// Generation finished; `None` if the entry has no thumbnail.
    Ready(Option<PathBuf>),
    /// A generation is already in flight.
    Pending,
    /// Nothing known yet. The entry is now pending and the caller owns the
    /// generation for a media entry of this kind.
    Generate(MediaKind),
}

#[derive(Debug, Clone, Default)]
enum ThumbnailState {
    #[default]
    Unknown,
    Pending,
    Ready(Option<PathBuf>),
}

#[derive(Debug, Clone, Default)]
struct Attributes {
    mime_type: Option<String>,
    thumbnail: ThumbnailState,
}

/// Derived entry attributes, computed on first access and keyed by path.
#[derive(Debug, Default)]
pub struct AttributeCache {
    attributes: FnvHashMap<PathBuf, Attributes>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn mime_type(&mut self, entry: &Entry) -> &str {
        let attributes = self.attributes.entry(entry.path().to_path_buf()).or_default();
        attributes
            .mime_type
            .get_or_insert_with(|| guess_mime_type(entry))
    }

    pub fn media_kind(&mut self, entry: &Entry) -> MediaKind {
        MediaKind::from_mime(self.mime_type(entry))
    }

    /// Looks up the thumbnail of `entry`, claiming its generation if none
    /// has started. Non-media entries resolve to `Ready(None)` at once.
    pub fn thumbnail(&mut self, entry: &Entry) -> ThumbnailLookup {
        let kind = self.media_kind(entry);
        let attributes = self.attributes.entry(entry.path().to_path_buf()).or_default();
        match &attributes.thumbnail {
            ThumbnailState::Ready(path) => ThumbnailLookup::Ready(path.clone()),
            ThumbnailState::Pending => ThumbnailLookup::Pending,
            ThumbnailState::Unknown if !kind.is_media() => {
                attributes.thumbnail = ThumbnailState::Ready(None);
                ThumbnailLookup::Ready(None)
            }
            ThumbnailState::Unknown => {
                attributes.thumbnail = ThumbnailState::Pending;
                ThumbnailLookup::Generate(kind)
            }
        }
    }

    /// Records a finished generation. A failure is remembered until the
    /// entry is evicted. Returns false if the entry was evicted meanwhile.
    pub fn finish_thumbnail(&mut self, path: &Path, thumbnail: Option<PathBuf>) -> bool {
        match self.attributes.get_mut(path) {
            Some(attributes) => {
                attributes.thumbnail = ThumbnailState::Ready(thumbnail);
                true
            }
            None => false,
        }
    }

    /// Forgets an interrupted generation so the next lookup starts again.
    pub fn abandon_thumbnail(&mut self, path: &Path) {
        if let Some(attributes) = self.attributes.get_mut(path) {
            if matches!(attributes.thumbnail, ThumbnailState::Pending) {
                attributes.thumbnail = ThumbnailState::Unknown;
            }
        }
    }

    pub fn evict(&mut self, path: &Path) {
        self.attributes.remove(path);
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }
}

fn guess_mime_type(entry: &Entry) -> String {
    if entry.is_dir() {
        return DIRECTORY_MIME_TYPE.to_string();
    }
    if entry.application().is_some() {
        return DESKTOP_MIME_TYPE.to_string();
    }
    mime_guess::from_path(entry.path())
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::EntrySeed;

    fn entry(seed: EntrySeed) -> Entry {
        Entry::from_seed(seed, Path::new("/r"))
    }

    #[test]
    fn mime_types_by_kind() {
        let mut cache = AttributeCache::new();
        let photo = entry(EntrySeed::file(PathBuf::from("/r/photo.JPG"), 1));
        let song = entry(EntrySeed::file(PathBuf::from("/r/song.mp3"), 1));
        let folder = entry(EntrySeed::dir(PathBuf::from("/r/folder.png")));
        let unknown = entry(EntrySeed::file(PathBuf::from("/r/blob"), 1));

        assert_eq!(cache.mime_type(&photo), "image/jpeg");
        assert_eq!(cache.media_kind(&photo), MediaKind::Image);
        assert_eq!(cache.media_kind(&song), MediaKind::Audio);
        assert_eq!(cache.mime_type(&folder), DIRECTORY_MIME_TYPE);
        assert_eq!(cache.media_kind(&folder), MediaKind::Other);
        assert_eq!(cache.mime_type(&unknown), "application/octet-stream");
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn thumbnail_generation_is_claimed_once() {
        let mut cache = AttributeCache::new();
        let photo = entry(EntrySeed::file(PathBuf::from("/r/photo.png"), 1));
        let text = entry(EntrySeed::file(PathBuf::from("/r/notes.txt"), 1));

        assert_eq!(cache.thumbnail(&text), ThumbnailLookup::Ready(None));
        assert_eq!(
            cache.thumbnail(&photo),
            ThumbnailLookup::Generate(MediaKind::Image)
        );
        assert_eq!(cache.thumbnail(&photo), ThumbnailLookup::Pending);

        let thumb = PathBuf::from("/cache/photo.png");
        assert!(cache.finish_thumbnail(photo.path(), Some(thumb.clone())));
        assert_eq!(cache.thumbnail(&photo), ThumbnailLookup::Ready(Some(thumb)));

        cache.evict(photo.path());
        assert!(!cache.finish_thumbnail(photo.path(), None));
        assert_eq!(
            cache.thumbnail(&photo),
            ThumbnailLookup::Generate(MediaKind::Image)
        );

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn abandoned_generation_can_be_claimed_again() {
        let mut cache = AttributeCache::new();
        let clip = entry(EntrySeed::file(PathBuf::from("/r/clip.mp4"), 1));

        assert_eq!(cache.thumbnail(&clip), ThumbnailLookup::Generate(MediaKind::Video));
        cache.abandon_thumbnail(clip.path());
        assert_eq!(cache.thumbnail(&clip), ThumbnailLookup::Generate(MediaKind::Video));

        cache.finish_thumbnail(clip.path(), None);
        cache.abandon_thumbnail(clip.path());
        assert_eq!(cache.thumbnail(&clip), ThumbnailLookup::Ready(None));
    }

    #[test]
    fn media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("text/plain"), MediaKind::Other);
        assert_eq!(MediaKind::from_mime("garbage"), MediaKind::Other);
    }
}
