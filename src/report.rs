use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::metadata::{ImageMetadata, digits_only};

/// Column titles of the report.
pub const HEADER: [&str; 6] = [
    "File",
    "Width",
    "Height",
    "Artist",
    "Copyright",
    "Filesize (bytes)",
];

/// One data row of the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataRow {
    pub file: String,
    pub width: String,
    pub height: String,
    pub artist: String,
    pub copyright: String,
    pub filesize: u64,
}

impl MetadataRow {
    /// Build a row from a file name, its size, and whatever metadata was found.
    ///
    /// Width and height are reduced to their digits.
    pub fn new(file: impl Into<String>, filesize: u64, metadata: ImageMetadata) -> Self {
        Self {
            file: file.into(),
            width: digits_only(metadata.width.as_deref().unwrap_or_default()),
            height: digits_only(metadata.height.as_deref().unwrap_or_default()),
            artist: metadata.artist.unwrap_or_default(),
            copyright: metadata.copyright.unwrap_or_default(),
            filesize,
        }
    }

    /// A row with only the file name and size filled in.
    pub fn blank(file: impl Into<String>, filesize: u64) -> Self {
        Self::new(file, filesize, ImageMetadata::default())
    }
}

/// CSV report writer that groups rows under folder section headers.
///
/// Section headers are single-cell rows holding a folder path. Every folder
/// after the first is preceded by a single-cell blank row.
///
/// # Example
///
/// ```rust
/// use drawing_metadata_retriever::report::{MetadataRow, ReportWriter};
/// use std::path::Path;
///
/// let mut report = ReportWriter::from_writer(Vec::new(), false);
/// report.write_header().unwrap();
/// report.begin_folder(Path::new("/art")).unwrap();
/// report.write_row(&MetadataRow::blank("a.png", 10)).unwrap();
///
/// let bytes = report.into_inner().unwrap();
/// assert_eq!(
///     String::from_utf8(bytes).unwrap(),
///     "File,Width,Height,Artist,Copyright,Filesize (bytes)\n/art\na.png,,,,,10\n"
/// );
/// ```
pub struct ReportWriter<W: Write> {
    inner: csv::Writer<W>,
    current_folder: Option<PathBuf>,
}

fn builder(quote_all: bool) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .quote_style(if quote_all {
            QuoteStyle::Always
        } else {
            QuoteStyle::Necessary
        });
    builder
}

impl ReportWriter<File> {
    /// Create (or truncate) the report file.
    pub fn from_path(path: &Path, quote_all: bool) -> Result<Self> {
        let inner = builder(quote_all)
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self {
            inner,
            current_folder: None,
        })
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap any writer.
    pub fn from_writer(writer: W, quote_all: bool) -> Self {
        Self {
            inner: builder(quote_all).from_writer(writer),
            current_folder: None,
        }
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.inner
            .write_record(HEADER)
            .context("Failed to write CSV header")
    }

    /// Start a folder section, unless it is already the current one.
    pub fn begin_folder(&mut self, folder: &Path) -> Result<()> {
        if self.current_folder.as_deref() == Some(folder) {
            return Ok(());
        }

        if self.current_folder.is_some() {
            self.inner
                .write_record([""])
                .context("Failed to write CSV separator")?;
        }

        self.inner
            .write_record([folder.to_string_lossy().as_bytes()])
            .context("Failed to write CSV section header")?;
        self.current_folder = Some(folder.to_path_buf());
        Ok(())
    }

    pub fn write_row(&mut self, row: &MetadataRow) -> Result<()> {
        self.inner
            .write_record([
                row.file.as_str(),
                row.width.as_str(),
                row.height.as_str(),
                row.artist.as_str(),
                row.copyright.as_str(),
                row.filesize.to_string().as_str(),
            ])
            .with_context(|| format!("Failed to write CSV row for {}", row.file))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().context("Failed to flush CSV report")
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| anyhow::Error::new(e.into_error()))
            .context("Failed to flush CSV report")
    }
}
