//! spec2ophyd - Convert a SPEC config file into ophyd setup statements
//!
//! The ophyd setup goes to stdout, one line per motor, counter or signal.
//! Logs go to stderr.

mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use spec2ophyd_core::{write_setup, SpecConfig};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "spec2ophyd")]
#[command(about = "Convert a SPEC config file into ophyd setup statements")]
#[command(version)]
struct Args {
    /// SPEC config file (default taken from the settings file)
    spec_config: Option<PathBuf>,

    /// Path to settings file
    #[arg(short, long, default_value = "spec2ophyd.toml")]
    settings: PathBuf,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// List unrecognized config lines on stderr
    #[arg(long)]
    show_unhandled: bool,

    /// Fail if any motor or counter line could not be parsed
    #[arg(long)]
    strict: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the generated setup, keep logs off it
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = config::load_config(&args.settings)?;

    if let Some(path) = args.spec_config {
        config.input.path = path;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    config.output.show_unhandled |= args.show_unhandled;
    config.output.strict |= args.strict;

    info!(
        input = %config.input.path.display(),
        format = ?config.output.format,
        "Converting SPEC config"
    );

    let spec = SpecConfig::from_file(&config.input.path)
        .with_context(|| format!("Cannot convert {}", config.input.path.display()))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match config.output.format {
        OutputFormat::Text => write_setup(&spec, &mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &spec)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    if config.output.show_unhandled {
        eprintln!("{} unhandled line(s):", spec.unhandled.len());
        for line in &spec.unhandled {
            eprintln!("  {}", line);
        }
    }

    if config.output.strict && !spec.rejected.is_empty() {
        bail!(
            "{} motor/counter line(s) in {} could not be parsed",
            spec.rejected.len(),
            config.input.path.display()
        );
    }

    Ok(())
}
