//! digitar CLI
//!
//! Create, extract and list binary-digit text archives (similar to the tar command).

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use digitar::{walk, Archive, ArchiveReport, Compression, Decoder, Encoder, WalkConfig};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "digitar")]
#[command(version)]
#[command(about = "Binary-digit text archive tool")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an archive from files/directories
    Create {
        /// Files and directories to archive
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output archive file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Gzip the archive (implied by a .gz output name)
        #[arg(short = 'z', long)]
        gzip: bool,

        /// Follow symbolic links while walking directories
        #[arg(long)]
        follow_links: bool,
    },

    /// Extract an archive
    #[command(name = "x")]
    Extract {
        /// Archive file to extract, plain or gzip (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Directory to extract to (default: current directory)
        #[arg(short = 'C', long, default_value = ".")]
        directory: PathBuf,
    },

    /// List contents of an archive
    #[command(name = "t")]
    List {
        /// Archive file to list, plain or gzip (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Show content sizes
        #[arg(short, long)]
        long: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Create { inputs, output, gzip, follow_links } => {
            create_archive(inputs, output, gzip, follow_links)?;
        }
        Commands::Extract { input, directory } => {
            extract_archive(input, directory)?;
        }
        Commands::List { input, long } => {
            list_archive(input, long)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn create_archive(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    gzip: bool,
    follow_links: bool,
) -> Result<()> {
    let mut archive = Archive::new();
    let mut report = ArchiveReport::new();
    let config = WalkConfig {
        follow_links,
        ..WalkConfig::default()
    };

    for input in &inputs {
        if input.is_dir() {
            walk::add_dir(&mut archive, input, &config, &mut report)
                .with_context(|| format!("Failed to walk: {}", input.display()))?;
        } else {
            let file_name = input
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid filename: {}", input.display()))?;
            let name = match walk::entry_name(Path::new(file_name)) {
                Ok(name) => name,
                Err(err) => {
                    report.skip(err);
                    continue;
                }
            };

            match archive.add_file_from_path(input, &name) {
                Ok(len) => {
                    log::info!("added {} ({} bytes)", name, len);
                    report.entries_added += 1;
                    report.bytes_read += len;
                }
                Err(err) => report.skip(err),
            }
        }
    }

    let mut encoder = Encoder::new();
    if gzip {
        encoder = encoder.with_compression(Compression::Gzip);
    }

    if let Some(output_path) = &output {
        encoder
            .encode_to_file(&archive, output_path)
            .with_context(|| format!("Failed to write: {}", output_path.display()))?;
        eprintln!(
            "Created: {} ({} files, {} skipped)",
            output_path.display(),
            report.entries_added,
            report.skipped.len()
        );
    } else {
        let stdout = io::stdout();
        encoder
            .encode_to_writer(&archive, stdout.lock())
            .context("Failed to write archive to stdout")?;
        if report.has_skipped() {
            eprintln!("{} file(s) skipped", report.skipped.len());
        }
    }

    Ok(())
}

fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match input {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn extract_archive(input: Option<PathBuf>, directory: PathBuf) -> Result<()> {
    let reader = open_input(input.as_deref())?;

    let report = Decoder::new()
        .extract(reader, &directory)
        .with_context(|| format!("Failed to extract into: {}", directory.display()))?;

    eprintln!(
        "Extracted: {} files into {} ({} skipped)",
        report.files_written,
        directory.display(),
        report.skipped.len()
    );
    for err in &report.skipped {
        eprintln!("  skipped {}: {}", err.subject(), err);
    }

    Ok(())
}

fn list_archive(input: Option<PathBuf>, long: bool) -> Result<()> {
    let reader = digitar::compression::open_reader(open_input(input.as_deref())?)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut skipped = 0usize;

    for item in Decoder::new().records(reader) {
        match item {
            Ok(entry) if long => writeln!(out, "{}  {}", entry.path, entry.content.len())?,
            Ok(entry) => writeln!(out, "{}", entry.path)?,
            Err(digitar::Error::Entry(err)) => {
                log::warn!("skipped {}: {}", err.subject(), err);
                skipped += 1;
            }
            Err(err) => return Err(err).context("Failed to read archive"),
        }
    }

    if skipped > 0 {
        eprintln!("{} record(s) skipped", skipped);
    }

    Ok(())
}
