//! Source image decoding for cropgen.
//!
//! This module turns the bytes of a user-selected file into a
//! [`SourceImage`]: an RGBA8 raster plus its natural dimensions, with the
//! EXIF orientation applied the same way a browser applies it to an
//! `<img>` element.
//!
//! # Examples
//!
//! ```ignore
//! use cropgen_core::decode::SourceImage;
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let source = SourceImage::from_bytes(&bytes)?;
//! println!("Decoded {}x{} image", source.width(), source.height());
//! ```

mod source;
mod types;

pub use source::{decode_image, get_orientation, image_mime_type};
pub use types::{DecodeError, Orientation, SourceImage};
