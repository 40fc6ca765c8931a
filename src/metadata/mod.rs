//! Embedded image metadata reading.
//!
//! [`read_metadata`] pulls the four report fields out of a picture:
//!
//! - width and height from EXIF IFD0, falling back to the container header
//!   (JPEG SOF, PNG IHDR, GIF logical screen, TIFF IFD)
//! - artist and copyright from EXIF IFD0
//!
//! [`digits_only`] normalizes dimension strings for the report.

mod reader;

pub use reader::{ImageMetadata, digits_only, read_metadata};
