//! Decoding of user-selected files with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::ImageReader;

use super::{DecodeError, Orientation, SourceImage};

/// Sniff the MIME type of an encoded image.
///
/// Returns `None` when the bytes are not a recognized image container.
pub fn image_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

/// Decode an image file into a [`SourceImage`], applying EXIF orientation.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not an image this
/// build can read, `DecodeError::CorruptedFile` if decoding fails, and
/// `DecodeError::Empty` for zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<SourceImage, DecodeError> {
    let format = image::guess_format(bytes).map_err(|_| DecodeError::InvalidFormat)?;
    if !format.reading_enabled() {
        return Err(DecodeError::InvalidFormat);
    }

    let orientation = get_orientation(bytes);

    let reader = ImageReader::with_format(Cursor::new(bytes), format);
    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    log::debug!(
        "decoded {:?} image {}x{} (orientation {:?})",
        format,
        img.width(),
        img.height(),
        orientation
    );

    SourceImage::new(orientation.apply(img).into_rgba8())
}

/// Read the EXIF orientation of an encoded image.
///
/// Files without EXIF data, or with an unknown tag value, are `Upright`.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .and_then(Orientation::from_exif)
        .unwrap_or_default()
}
