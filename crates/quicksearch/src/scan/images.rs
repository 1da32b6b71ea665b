use std::path::Path;

/// Extensions of the image formats the decoder supports.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "tif", "tiff", "webp", "pnm", "pbm", "pgm", "ppm",
    "pam", "tga", "dds", "hdr", "exr", "ff", "qoi",
];

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// True if the file's header decodes as an image.
pub fn is_decodable_image(path: &Path) -> bool {
    image::image_dimensions(path).is_ok()
}
