//! Image encoding for cropgen exports.
//!
//! This module provides functionality for:
//! - Encoding RGBA pixel data to PNG
//! - Encoding a rendered [`Surface`](crate::render::Surface) directly
//!
//! # Examples
//!
//! ```ignore
//! use cropgen_core::encode::encode_png;
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray, half transparent
//! let png_bytes = encode_png(&pixels, 100, 100).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod png;

pub use png::{encode_png, encode_surface, EncodeError, PNG_MIME_TYPE};
