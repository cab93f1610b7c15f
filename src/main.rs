use anyhow::{Context, Result};
use clap::Parser;
use hbgraph::cli::{Cli, OutputFormat};
use hbgraph::config::AnalyzerConfig;
use hbgraph::graph::DependencyGraph;
use hbgraph::{json_output, pipeline, text_output};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for diagnostics on stderr
fn init_tracing(verbose: bool, debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    // RUST_LOG, when set, takes precedence over the flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn load_config(args: &Cli) -> Result<AnalyzerConfig> {
    let base = match &args.config {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    Ok(args.apply(base))
}

fn write_graph<W: Write>(graph: &DependencyGraph, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => text_output::write_text(graph, out)?,
        OutputFormat::Json => {
            let json = json_output::to_json(graph)?;
            writeln!(out, "{}", json)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose, args.debug);

    let config = load_config(&args)?;

    // The output file is only created once the whole graph exists, so a
    // fatal analysis error never leaves a partial artifact behind.
    let graph = pipeline::analyze_dir(&args.trace_dir, &config)
        .with_context(|| format!("failed to analyze {}", args.trace_dir.display()))?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_graph(&graph, args.format, &mut BufWriter::new(file))?;
        }
        None => {
            let stdout = io::stdout();
            write_graph(&graph, args.format, &mut stdout.lock())?;
        }
    }

    if args.summary {
        eprint!("{}", graph.summary());
    }

    Ok(())
}
