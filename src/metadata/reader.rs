use anyhow::{Context, Result};
use image::codecs::png::PngDecoder;
use image::{ImageDecoder, ImageReader};
use nom_exif::*;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::scan::ImageKind;

// IFD0 tag IDs
const TAG_IMAGE_WIDTH: u16 = 0x0100;
const TAG_IMAGE_LENGTH: u16 = 0x0101;
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;

// APP1 marker some PNG writers leave in front of the TIFF header
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// Metadata fields extracted from a picture.
///
/// Each field is `None` when neither the EXIF block nor the container header
/// carries it. Dimensions are kept as found; use [`digits_only`] before
/// writing them out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: Option<String>,
    pub height: Option<String>,
    pub artist: Option<String>,
    pub copyright: Option<String>,
}

/// Read width, height, artist, and copyright from an image file.
///
/// A picture without EXIF is fine: dimensions then come from the container
/// header and artist/copyright stay empty. EXIF dimensions win over the header
/// when both are present.
///
/// Returns an error only when the file yields neither EXIF nor a readable header.
pub fn read_metadata(path: &Path) -> Result<ImageMetadata> {
    let exif = read_exif_tags(path);
    let header = match (&exif, probe_dimensions(path)) {
        (_, Ok(dims)) => Some(dims),
        (Err(_), Err(e)) => {
            return Err(e).with_context(|| format!("Unreadable image {}", path.display()));
        }
        (Ok(_), Err(e)) => {
            log::debug!("No readable header in {}: {e:#}", path.display());
            None
        }
    };

    let mut data = exif.unwrap_or_else(|e| {
        log::debug!("No EXIF data found in {}: {e:#}", path.display());
        ImageMetadata::default()
    });

    if let Some((width, height)) = header {
        data.width.get_or_insert_with(|| width.to_string());
        data.height.get_or_insert_with(|| height.to_string());
    }

    Ok(data)
}

/// Read the IFD0 report tags with nom-exif.
///
/// PNG keeps its EXIF in an `eXIf` chunk that nom-exif does not look for, so
/// the chunk is pulled out with the PNG decoder and parsed as a bare TIFF block.
fn read_exif_tags(path: &Path) -> Result<ImageMetadata> {
    let mut parser = MediaParser::new();
    let iter: ExifIter = match ImageKind::from_path(path) {
        Some(ImageKind::Png) => {
            let ms = MediaSource::seekable(Cursor::new(png_exif_chunk(path)?))
                .context("Failed to read eXIf chunk")?;
            parser.parse(ms).context("Failed to parse EXIF")?
        }
        _ => {
            let ms = MediaSource::file_path(path).context("Failed to open image file")?;
            parser.parse(ms).context("Failed to parse EXIF")?
        }
    };
    let exif: Exif = iter.into();

    let tag = |code: u16| exif.get_by_ifd_tag_code(0, code).and_then(entry_to_string);

    Ok(ImageMetadata {
        width: tag(TAG_IMAGE_WIDTH),
        height: tag(TAG_IMAGE_LENGTH),
        artist: tag(TAG_ARTIST),
        copyright: tag(TAG_COPYRIGHT),
    })
}

/// Raw TIFF bytes of a PNG `eXIf` chunk.
fn png_exif_chunk(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).context("Failed to open image file")?;
    let mut decoder = PngDecoder::new(BufReader::new(file)).context("Failed to read PNG header")?;
    let raw = decoder
        .exif_metadata()
        .context("Failed to read eXIf chunk")?
        .context("No eXIf chunk")?;

    if raw.starts_with(EXIF_PREFIX) {
        Ok(raw[EXIF_PREFIX.len()..].to_vec())
    } else {
        Ok(raw)
    }
}

/// Pixel dimensions from the container header, without decoding pixels.
fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    let mut reader = ImageReader::open(path)
        .context("Failed to open image file")?
        .with_guessed_format()
        .context("Failed to read image header")?;

    // Dotfiles like `.png` have no extension to go by
    if reader.format().is_none() {
        if let Some(kind) = ImageKind::from_path(path) {
            reader.set_format(kind.format());
        }
    }

    reader
        .into_dimensions()
        .context("Failed to read image dimensions")
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = match val.as_str() {
        Some(text) => text.to_string(),
        None => val.to_string(),
    };
    let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let s = s.trim_matches('"').trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Keep only the ASCII digits of a string.
///
/// ```rust
/// use drawing_metadata_retriever::metadata::digits_only;
///
/// assert_eq!(digits_only("1920 pixels"), "1920");
/// assert_eq!(digits_only(""), "");
/// ```
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
