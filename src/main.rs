//! # Batch Convert - Main Entry Point
//!
//! ## Execution flow:
//! 1. Parse CLI arguments with `clap` (subcommands: convert, index, sync)
//! 2. Configure logging (INFO, or DEBUG with the verbose flag)
//! 3. Build the media type registry (fails fast on an ambiguous table)
//! 4. Run the requested operation with an explicit event sink (run log
//!    file when requested, console otherwise)
//!
//! ## Example usage:
//! ```bash
//! batch-convert convert --input-dir /photos --output /converted \
//!     --format jpg --resize 1920 1080
//! batch-convert index /archive --filter photo
//! batch-convert sync /sdcard /archive/incoming --filter photo
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use batchconvert::platform::PlatformCommands;
use batchconvert::{
    BoundingBox, ChecksumIndex, ConsoleSink, ConversionOptions, ConversionPipeline,
    ConvertError, EventSink, FfmpegBackend, InputSource, MediaClass, MediaTypeRegistry,
    RunLog, SyncEngine,
};

#[derive(Parser)]
#[command(name = "batch-convert")]
#[command(about = "Convert and resize images and videos, sync archives by checksum")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert and/or resize a batch of media files
    Convert {
        /// One or more input files (mutually exclusive with --input-dir)
        files: Vec<PathBuf>,

        /// Directory containing media files to convert
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Do not descend into subdirectories of --input-dir
        #[arg(long)]
        no_recurse: bool,

        /// Output directory for converted files
        #[arg(short, long)]
        output: PathBuf,

        /// Target format (e.g. jpg, png, webp, mp4); default keeps the original
        #[arg(short, long)]
        format: Option<String>,

        /// Resize bounding box as LENGTH WIDTH (longest and shortest side)
        #[arg(long, num_args = 2, value_names = ["LENGTH", "WIDTH"])]
        resize: Option<Vec<u32>>,

        /// Write the per-file run log to this file
        #[arg(long)]
        log: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Scan a tree and write its checksum index
    Index {
        /// Root of the tree to scan
        root: PathBuf,

        /// Index file to write
        #[arg(long)]
        index: Option<PathBuf>,

        /// Restrict the scan to a media class
        #[arg(long, default_value = "all")]
        filter: MediaClass,
    },

    /// Copy files missing from an indexed archive
    Sync {
        /// Source tree to pull files from
        source: PathBuf,

        /// Destination folder for copied files
        dest: PathBuf,

        /// Index file describing the archive
        #[arg(long)]
        index: Option<PathBuf>,

        /// Copy everything without consulting the index (bulk import)
        #[arg(long)]
        no_checksum: bool,

        /// Restrict candidates to a media class
        #[arg(long, default_value = "all")]
        filter: MediaClass,

        /// Write the per-file run log to this file
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

/// Default index location, one per user.
fn default_index_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not find home directory"))?;
    Ok(home.join(".batchconvert").join("scan_results.csv"))
}

fn make_sink(log: Option<&PathBuf>) -> Result<Box<dyn EventSink>> {
    match log {
        Some(path) => Ok(Box::new(RunLog::create(path)?)),
        None => Ok(Box::new(ConsoleSink)),
    }
}

/// The confirmation gate before a batch touches the filesystem.
fn confirm_or_abort(count: usize, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("About to process {} files. Press enter to continue (or type 'n' to abort): ", count);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(!answer.trim().eq_ignore_ascii_case("n"))
}

async fn run_convert(
    files: Vec<PathBuf>,
    input_dir: Option<PathBuf>,
    no_recurse: bool,
    output: PathBuf,
    format: Option<String>,
    resize: Option<Vec<u32>>,
    log: Option<PathBuf>,
    yes: bool,
) -> Result<()> {
    let input = match (files.is_empty(), input_dir) {
        (false, None) => InputSource::Files(files),
        (true, Some(path)) => InputSource::Folder {
            path,
            recurse: !no_recurse,
        },
        (false, Some(_)) => {
            return Err(ConvertError::Configuration(
                "give either input files or --input-dir, not both".to_string(),
            )
            .into())
        }
        (true, None) => {
            return Err(ConvertError::Configuration(
                "give input files or --input-dir".to_string(),
            )
            .into())
        }
    };

    let options = ConversionOptions {
        input,
        output_dir: output,
        format,
        resize: resize.map(|r| BoundingBox::new(r[0], r[1])),
        assume_yes: yes,
    };

    let registry = MediaTypeRegistry::build()?;
    let pipeline = ConversionPipeline::new(registry, Arc::new(FfmpegBackend::new()));
    let sink = make_sink(log.as_ref())?;

    let candidates = pipeline.candidates(&options)?;
    if candidates.is_empty() {
        let mut known: Vec<_> = pipeline.registry().known_input_extensions().collect();
        known.sort_unstable();
        info!("No convertible files found (known extensions: {})", known.join(", "));
        return Ok(());
    }

    let platform = PlatformCommands::instance();
    if !platform.is_command_available("ffmpeg").await {
        warn!("ffmpeg not found on PATH, video files will fail to convert");
    }

    if !confirm_or_abort(candidates.len(), options.assume_yes)? {
        info!("Aborted by user before processing");
        return Ok(());
    }

    let report = pipeline
        .convert_files(&candidates, &options, sink.as_ref())
        .await?;
    info!("{} saved, {} skipped", report.saved(), report.skipped());

    Ok(())
}

async fn run_index(root: PathBuf, index: Option<PathBuf>, filter: MediaClass) -> Result<()> {
    let index_path = match index {
        Some(path) => path,
        None => default_index_path()?,
    };

    let registry = MediaTypeRegistry::build()?;
    let sink = ConsoleSink;
    let built = ChecksumIndex::build(&root, &registry, filter, &sink).await?;
    built.save(&index_path).await?;

    info!(
        "Indexed {} files from {} into {}",
        built.len(),
        root.display(),
        index_path.display()
    );
    Ok(())
}

async fn run_sync(
    source: PathBuf,
    dest: PathBuf,
    index: Option<PathBuf>,
    no_checksum: bool,
    filter: MediaClass,
    log: Option<PathBuf>,
) -> Result<()> {
    let index_path = match index {
        Some(path) => path,
        None => default_index_path()?,
    };

    let verify_by_checksum = !no_checksum;
    let mut index = if verify_by_checksum {
        if !index_path.exists() {
            return Err(ConvertError::Configuration(format!(
                "index file not found: {} (run 'batch-convert index' first, or pass --no-checksum)",
                index_path.display()
            ))
            .into());
        }
        ChecksumIndex::load(&index_path).await?
    } else {
        ChecksumIndex::new()
    };

    let registry = MediaTypeRegistry::build()?;
    let sink = make_sink(log.as_ref())?;
    let engine = SyncEngine::new(&registry);
    let report = engine
        .sync(
            &source,
            &dest,
            &mut index,
            verify_by_checksum,
            filter,
            sink.as_ref(),
        )
        .await?;

    info!(
        "Sync complete: {} copied, {} already present, {} failed out of {} candidates",
        report.copied, report.already_present, report.failed, report.candidates
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Convert {
            files,
            input_dir,
            no_recurse,
            output,
            format,
            resize,
            log,
            yes,
        } => run_convert(files, input_dir, no_recurse, output, format, resize, log, yes).await,
        Command::Index { root, index, filter } => run_index(root, index, filter).await,
        Command::Sync {
            source,
            dest,
            index,
            no_checksum,
            filter,
            log,
        } => run_sync(source, dest, index, no_checksum, filter, log).await,
    }
}
