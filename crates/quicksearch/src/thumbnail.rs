//! On-demand thumbnails for media entries.

use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use fnv::FnvHasher;
use image::{imageops, GenericImageView, ImageFormat};

use crate::model::MediaKind;

/// Longest edge of a generated thumbnail, in pixels.
pub const THUMBNAIL_MAX_SIZE: u32 = 512;

/// The thumbnail collaborator.
pub trait Thumbnailer: Send + Sync {
    /// A cached or freshly generated thumbnail for `path`, or `None`.
    fn thumbnail(&self, path: &Path, kind: MediaKind) -> Option<PathBuf>;
}

/// Scales images into a PNG cache. Video and audio get no thumbnail.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    cache_dir: PathBuf,
    max_size: u32,
}

impl ImageThumbnailer {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            max_size: THUMBNAIL_MAX_SIZE,
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache file name, unique per path and modification time.
    fn cache_path(&self, path: &Path) -> Option<PathBuf> {
        let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
        let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();

        let mut hasher = FnvHasher::default();
        hasher.write(path.as_os_str().as_encoded_bytes());
        hasher.write_u64(since_epoch.as_secs());
        hasher.write_u32(since_epoch.subsec_nanos());
        Some(self.cache_dir.join(format!("{:016x}.png", hasher.finish())))
    }

    fn generate(&self, path: &Path, output: &Path) -> Option<PathBuf> {
        let image = match image::open(path) {
            Ok(image) => image,
            Err(error) => {
                log::debug!("cannot decode {} for thumbnail: {error}", path.display());
                return None;
            }
        };

        let (width, height) = image.dimensions();
        if width <= self.max_size && height <= self.max_size {
            return Some(path.to_path_buf());
        }
        let (thumb_width, thumb_height) = scaled_dimensions(width, height, self.max_size);
        let thumb = imageops::resize(&image, thumb_width, thumb_height, imageops::FilterType::Triangle);

        let saved = fs::create_dir_all(&self.cache_dir)
            .map_err(|error| error.to_string())
            .and_then(|()| {
                thumb
                    .save_with_format(output, ImageFormat::Png)
                    .map_err(|error| error.to_string())
            });
        match saved {
            Ok(()) => Some(output.to_path_buf()),
            Err(error) => {
                log::warn!("failed to write thumbnail {}: {error}", output.display());
                Some(path.to_path_buf())
            }
        }
    }
}

impl Thumbnailer for ImageThumbnailer {
    fn thumbnail(&self, path: &Path, kind: MediaKind) -> Option<PathBuf> {
        if kind != MediaKind::Image {
            return None;
        }
        let output = self.cache_path(path)?;
        if output.is_file() {
            return Some(output);
        }
        self.generate(path, &output)
    }
}

/// Fits `width x height` inside a `max x max` box, keeping the aspect ratio.
fn scaled_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width >= height {
        let scaled = (u64::from(height) * u64::from(max) / u64::from(width.max(1))) as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (u64::from(width) * u64::from(max) / u64::from(height.max(1))) as u32;
        (scaled.max(1), max)
    }
}
