//! # drawing-metadata-retriever
//!
//! Walk a folder of drawings, read the pixel dimensions, artist, copyright, and
//! file size of every picture, and export them to a CSV report grouped by folder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drawing_metadata_retriever::config::Config;
//! use drawing_metadata_retriever::pipeline::run;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!
//!     // Writes DrawingMetadataRetrieved.csv in the current directory
//!     let summary = run(Path::new("./drawings"), &config)?;
//!
//!     println!("{} picture(s) reported", summary.rows.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Report Layout
//!
//! ```text
//! File,Width,Height,Artist,Copyright,Filesize (bytes)
//! /home/me/drawings
//! cat.png,1920,1080,Jane Doe,(c) Jane Doe,482113
//! ""
//! /home/me/drawings/sketches
//! dog.jpg,800,600,,,90211
//! ```
//!
//! Pictures directly in the chosen folder come first, then each subfolder in turn.
//! A picture whose metadata cannot be read still gets a row with its name and size.
//!
//! ## Supported Formats
//!
//! | Format | Dimensions | Artist / Copyright |
//! |--------|------------|--------------------|
//! | JPEG (`.jpg`, `.jpeg`) | EXIF, else SOF header | EXIF |
//! | PNG (`.png`) | `eXIf` chunk, else IHDR | `eXIf` chunk |
//! | GIF (`.gif`) | logical screen | not available |
//! | TIFF (`.tiff`) | IFD0 | IFD0 |
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`metadata`]: EXIF and container header reading
//! - [`pipeline`]: Per-picture processing and the full report run
//! - [`prompt`]: Interactive folder prompt
//! - [`report`]: Grouped CSV writer
//! - [`scan`]: Directory walk, picture filtering, and folder grouping

pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod scan;
