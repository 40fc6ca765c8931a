use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};

use drawing_metadata_retriever::report::{HEADER, MetadataRow};
use drawing_metadata_retriever::{config, pipeline, prompt, scan};

#[derive(Parser, Debug)]
#[command(
    name = "drawing-metadata-retriever",
    version,
    about = "Export the dimensions, artist, copyright, and file size of every drawing in a folder to CSV"
)]
struct Cli {
    /// Folder to search (prompted for when omitted)
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    /// Report file (default: DrawingMetadataRetrieved.csv in the current directory)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Also print the written rows as JSON
    #[arg(long)]
    json: bool,

    /// Display the metadata of every picture instead of writing the report
    #[arg(long = "show-metadata")]
    show_metadata: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let written = config::Config::default().save(cli.config.as_deref())?;
        println!("Default config written to {}", written.display());
        return Ok(());
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override output from CLI flag
    if let Some(ref output) = cli.output {
        config.output.file = output.to_string_lossy().into_owned();
    }

    let root = match cli.root {
        Some(root) => root,
        None => prompt::read_root(io::stdin().lock(), io::stdout())?,
    };

    // Handle --show-metadata
    if cli.show_metadata {
        let scan = match scan::collect_images(&root, config.scan.follow_links) {
            Ok(scan) => scan,
            Err(e) => {
                log::error!("Error finding the chosen directory: {e:#}");
                return Ok(());
            }
        };
        for group in scan.folders() {
            for image_path in &group.files {
                print_metadata(image_path);
            }
        }
        return Ok(());
    }

    let summary = pipeline::run(&root, &config)?;

    if let Some(ref output) = summary.output {
        log::info!("Report written to {}", output.display());
    }

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary.rows)?);
    }

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Width of the longest report column name, "Filesize (bytes)".
const LABEL_WIDTH: usize = 16;
/// Artist and copyright notices wrap past this many characters.
const TEXT_WIDTH: usize = 52;

/// Print the report fields of a picture as a table.
fn print_metadata(path: &Path) {
    let result = pipeline::process_image(path);

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(LABEL_WIDTH + 3 + TEXT_WIDTH + 2));

    let Some(row) = result.row else {
        println!("  {DIM}(skipped: {}){RESET}", result.error.unwrap_or_default());
        println!();
        return;
    };

    for line in table_lines(&row) {
        println!("{line}");
    }

    if let Some(err) = result.error {
        println!("  {DIM}(no metadata: {err}){RESET}");
    } else if [&row.width, &row.height, &row.artist, &row.copyright]
        .iter()
        .all(|v| v.is_empty())
    {
        println!("  {DIM}(no metadata found){RESET}");
    }
    println!();
}

/// Lay out the filled columns of a report row, labelled with the CSV header names.
///
/// Long notices continue on lines aligned under the value column.
fn table_lines(row: &MetadataRow) -> Vec<String> {
    let filesize = row.filesize.to_string();
    let columns = [
        (HEADER[1], row.width.as_str()),
        (HEADER[2], row.height.as_str()),
        (HEADER[3], row.artist.as_str()),
        (HEADER[4], row.copyright.as_str()),
        (HEADER[5], filesize.as_str()),
    ];

    let mut lines = Vec::new();
    for (label, value) in columns {
        for (i, part) in wrap_words(value, TEXT_WIDTH).into_iter().enumerate() {
            let label = if i == 0 { label } else { "" };
            let sep = if i == 0 { ':' } else { ' ' };
            lines.push(format!("  {label:<LABEL_WIDTH$} {sep} {part}"));
        }
    }
    lines
}

/// Greedy word wrap. A single word longer than `width` keeps its own line.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    text.split_whitespace()
        .fold(Vec::<String>::new(), |mut lines, word| {
            match lines.last_mut() {
                Some(line) if line.len() + 1 + word.len() <= width => {
                    line.push(' ');
                    line.push_str(word);
                }
                _ => lines.push(word.to_string()),
            }
            lines
        })
}
