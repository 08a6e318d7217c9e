//! jsonstream - multi-document JSON stream tool
//!
//! Converts between NDJSON, length-prefixed, record-separator and
//! concatenated JSON streams, and counts documents in a stream.

mod config;
mod convert;

use clap::{Parser, Subcommand};
use config::Config;
use convert::ConvertOptions;
use jsonstream_framing::{Framing, FramingConfig};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonstream")]
#[command(about = "Convert and inspect multi-document JSON streams")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "JSONSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Separator byte for record-separator streams (e.g. 30, 0x1e, '|')
    #[arg(long, global = true, value_parser = config::parse_separator)]
    separator: Option<u8>,

    /// Largest document accepted, in bytes
    #[arg(long, global = true)]
    max_document_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-frame every document from one framing into another
    Convert {
        /// Input framing (ndjson, length-prefixed, record-separator, concatenated)
        #[arg(short, long)]
        from: Option<Framing>,

        /// Output framing
        #[arg(short, long)]
        to: Option<Framing>,

        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decode and re-encode every document
        #[arg(long)]
        validate: bool,

        /// Skip documents that fail on their own instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Count the documents in a stream
    Count {
        /// Input framing
        #[arg(short, long)]
        framing: Option<Framing>,

        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays a clean stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    if let Some(sep) = cli.separator {
        config.input.separator = sep;
        config.output.separator = sep;
    }
    if let Some(max) = cli.max_document_size {
        config.input.max_document_size = max;
        config.output.max_document_size = max;
    }

    match cli.command {
        Commands::Convert {
            from,
            to,
            input,
            output,
            validate,
            skip_invalid,
        } => {
            if let Some(framing) = from {
                config.input.framing = framing;
            }
            if let Some(framing) = to {
                config.output.framing = framing;
            }
            let options = ConvertOptions {
                validate,
                skip_invalid,
                recoverable_reads: !config.input.framing.latches_errors(),
            };
            run_convert(&config, input.as_deref(), output.as_deref(), options)
        }
        Commands::Count { framing, input } => {
            if let Some(framing) = framing {
                config.input.framing = framing;
            }
            run_count(&config.input, input.as_deref())
        }
    }
}

fn run_convert(
    config: &Config,
    input: Option<&Path>,
    output: Option<&Path>,
    options: ConvertOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Converting {} -> {}",
        config.input.framing,
        config.output.framing
    );

    let mut reader = config.input.reader(open_input(input)?);
    let mut writer = config.output.writer(open_output(output)?);

    match convert::convert(&mut reader, &mut writer, options) {
        Ok(stats) => {
            tracing::info!(
                "Wrote {} document(s) ({} empty, {} skipped)",
                stats.documents,
                stats.empty,
                stats.skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Conversion failed: {}", e);
            Err(e.into())
        }
    }
}

fn run_count(
    config: &FramingConfig,
    input: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = config.reader(open_input(input)?);
    match convert::count(&mut reader) {
        Ok(n) => {
            println!("{}", n);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to read {} stream: {}", config.framing, e);
            Err(e.into())
        }
    }
}

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            tracing::debug!("Reading from {}", path.display());
            Ok(Box::new(File::open(path)?))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            tracing::debug!("Writing to {}", path.display());
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
