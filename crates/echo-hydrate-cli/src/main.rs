// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `echo-hydrate`: serialize JSON state into a self-contained JavaScript
//! expression. The expression goes to stdout; diagnostics go to stderr.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use echo_hydrate::config::{parse_level, parse_limit};
use echo_hydrate::{serialize_with, SerializeOptions, TracingSink, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serialize JSON state into a JavaScript expression")]
struct Args {
    /// JSON input file (reads stdin when omitted)
    input: Option<PathBuf>,
    /// Severity for unsupported-value diagnostics (overrides ECHO_HYDRATE_LOG_LEVEL).
    /// Also the stderr filter for serializer events. Plain JSON never holds
    /// unsupported values, so at `debug` only the pass summaries appear.
    #[arg(long)]
    level: Option<String>,
    /// Maximum diagnostics per run (overrides ECHO_HYDRATE_LOG_LIMIT)
    #[arg(long)]
    limit: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let options = resolve_options(&args)?;

    // Serializer events pass at the diagnostic level; everything else at warn.
    let serializer = format!(
        "echo_hydrate={}",
        options.level.as_str().to_ascii_lowercase()
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("warn".parse()?)
                .add_directive(serializer.parse()?),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let text = read_input(args.input.as_deref())?;
    let json: serde_json::Value = serde_json::from_str(&text).context("input is not valid JSON")?;
    debug!(bytes = text.len(), "parsed input");

    let expression = serialize_with(&Value::from(json), &options, &mut TracingSink);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{expression}").context("write expression")?;
    Ok(())
}

fn resolve_options(args: &Args) -> Result<SerializeOptions> {
    let mut options = SerializeOptions::from_env();
    if let Some(level) = &args.level {
        options.level = parse_level(level)?;
    }
    if let Some(limit) = &args.limit {
        options.diagnostic_limit = parse_limit(limit)?;
    }
    Ok(options)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        }
    }
}
