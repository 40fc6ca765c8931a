use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::metadata::read_metadata;
use crate::report::{MetadataRow, ReportWriter};
use crate::scan::collect_images;

/// The result of processing a single picture.
///
/// `row` is `None` when the file was skipped entirely (its size could not be
/// read). When only the metadata could not be read, `row` holds the file name
/// and size with blank metadata fields and `error` says why.
#[derive(Debug)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub row: Option<MetadataRow>,
    pub error: Option<String>,
}

/// What a report run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Report file, when written to disk.
    pub output: Option<PathBuf>,
    /// Data rows in the order they were written.
    pub rows: Vec<MetadataRow>,
    /// Pictures written with blank metadata because it could not be read.
    pub unreadable: usize,
    /// Pictures left out of the report.
    pub skipped: usize,
    /// The root could not be walked; only the header was written.
    pub scan_failed: bool,
}

/// Read the size and metadata of one picture.
///
/// # Example
///
/// ```rust,no_run
/// use drawing_metadata_retriever::pipeline::process_image;
/// use std::path::Path;
///
/// let result = process_image(Path::new("drawings/cat.png"));
/// if let Some(row) = result.row {
///     println!("{}: {}x{} ({} bytes)", row.file, row.width, row.height, row.filesize);
/// }
/// ```
pub fn process_image(path: &Path) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        row: None,
        error: None,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let filesize = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            result.error = Some(format!("Failed to read file attributes: {e}"));
            return result;
        }
    };

    let row = match read_metadata(path) {
        Ok(data) => MetadataRow::new(file_name, filesize, data),
        Err(e) => {
            result.error = Some(format!("{e:#}"));
            MetadataRow::blank(file_name, filesize)
        }
    };
    result.row = Some(row);

    result
}

/// Scan `root` and write the grouped report into `report`.
///
/// The header is always written. If the root cannot be walked the failure is
/// logged and the run ends there; per-file failures are logged and do not stop
/// the run. Only CSV write errors are returned.
pub fn write_report<W: Write>(
    root: &Path,
    report: &mut ReportWriter<W>,
    config: &Config,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    report.write_header()?;

    let scan = match collect_images(root, config.scan.follow_links) {
        Ok(scan) => scan,
        Err(e) => {
            log::error!("Error finding the chosen directory: {e:#}");
            summary.scan_failed = true;
            report.flush()?;
            return Ok(summary);
        }
    };

    let total = scan.len();
    log::info!("Found {total} image(s) in {}", scan.root.display());

    let mut done = 0;
    for group in scan.folders() {
        for path in &group.files {
            done += 1;
            log::debug!("[{done}/{total}] Processing: {}", path.display());

            let result = process_image(path);
            match (result.row, result.error) {
                (Some(row), error) => {
                    if let Some(err) = error {
                        log::warn!("Error reading image metadata: {err}");
                        summary.unreadable += 1;
                    }
                    report.begin_folder(&group.folder)?;
                    report.write_row(&row)?;
                    summary.rows.push(row);
                }
                (None, error) => {
                    log::warn!(
                        "Skipping {}: {}",
                        path.display(),
                        error.unwrap_or_default()
                    );
                    summary.skipped += 1;
                }
            }
        }
    }

    report.flush()?;
    Ok(summary)
}

/// Create the configured report file and write the report for `root` into it.
///
/// Failing to create the file is the only fatal error.
///
/// # Example
///
/// ```rust,no_run
/// use drawing_metadata_retriever::config::Config;
/// use drawing_metadata_retriever::pipeline::run;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let summary = run(Path::new("./drawings"), &config)?;
/// println!("{} row(s) written", summary.rows.len());
/// # Ok(())
/// # }
/// ```
pub fn run(root: &Path, config: &Config) -> Result<RunSummary> {
    let output = config.output_path();
    let mut report = ReportWriter::from_path(&output, config.output.quote_all)?;

    let mut summary = write_report(root, &mut report, config)?;
    summary.output = Some(output);

    log::info!(
        "Done: {} row(s) written, {} without metadata, {} skipped",
        summary.rows.len(),
        summary.unreadable,
        summary.skipped
    );

    Ok(summary)
}
