use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use der_sexp::{Codec, DEFAULT_BLOCK_SIZE, Dictionary, Direction, pump};
use tracing_subscriber::EnvFilter;

/// Decode DER data from FILE(s), or standard input, to S-expressions.
#[derive(Parser, Debug)]
#[command(name = "der-sexp", version, about)]
struct Cli {
    /// Encode S-expressions to DER data
    #[arg(short, long)]
    encode: bool,

    /// Interpret tags in accordance with this representation config
    #[arg(short, long, value_name = "FILE.conf")]
    format: Option<PathBuf>,

    /// Skip 0xFF filler octets surrounding top-level tags
    #[arg(long)]
    fillers: bool,

    /// Input files; with no FILE, or when FILE is `-', read standard input
    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let dict = match &cli.format {
        Some(path) => {
            Some(Dictionary::load(path).with_context(|| path.display().to_string())?)
        }
        None => None,
    };
    let direction = if cli.encode { Direction::Encode } else { Direction::Decode };

    let mut files = cli.files;
    if files.is_empty() {
        files.push("-".into());
    }

    let mut failed = false;
    for path in &files {
        if let Err(err) = process(direction, dict.as_ref(), cli.fillers, path) {
            eprintln!("der-sexp: {path}: {err}");
            failed = true;
        }
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn process(
    direction: Direction,
    dict: Option<&Dictionary>,
    fillers: bool,
    path: &str,
) -> anyhow::Result<()> {
    let stdout = io::BufWriter::new(io::stdout().lock());
    let mut codec = Codec::new(direction, stdout, dict, fillers);

    // The codec flushes its sink when it reports completion, so nothing
    // is left in the BufWriter on the success path.
    if path == "-" {
        pump(&mut codec, io::stdin().lock(), DEFAULT_BLOCK_SIZE)?;
    } else {
        let file = File::open(path)?;
        pump(&mut codec, file, DEFAULT_BLOCK_SIZE)?;
    }
    Ok(())
}
