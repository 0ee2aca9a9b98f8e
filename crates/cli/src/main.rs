use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use structgraph_core::{ast, extract, ExtractConfig, RelationshipKind};

mod render;

use render::Format;

/// structgraph - Record type relationship extractor for C and C++
#[derive(Parser, Debug)]
#[command(name = "structgraph")]
#[command(version)] // Auto-pull version from Cargo.toml
#[command(about = "Extract struct/class relationships from a C or C++ codebase", long_about = None)]
struct Cli {
    /// Codebase root; only declarations under it are captured
    root: PathBuf,

    /// Regular expression candidate source paths must match
    #[arg(long)]
    filter: Option<String>,

    /// Glob pattern selecting translation units (repeatable)
    #[arg(long = "glob", value_name = "PATTERN")]
    globs: Vec<String>,

    /// Compilation database (default: <ROOT>/compile_commands.json)
    #[arg(long, value_name = "PATH")]
    compile_db: Option<PathBuf>,

    /// Relationship recorded for pointer and reference members
    #[arg(long, value_enum, default_value = "aggregation")]
    pointer_as: PointerPolicy,

    /// Output format
    #[arg(long, value_enum, default_value = "minimal")]
    format: Format,

    /// Print each unit's lowered syntax tree before the graph
    #[arg(long)]
    dump_ast: bool,

    /// Worker threads (0: one per core)
    #[arg(long, short = 'j', default_value_t = 0)]
    jobs: usize,

    /// Log level for tracing output; RUST_LOG takes precedence
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PointerPolicy {
    Aggregation,
    Association,
}

impl From<PointerPolicy> for RelationshipKind {
    fn from(policy: PointerPolicy) -> Self {
        match policy {
            PointerPolicy::Aggregation => RelationshipKind::Aggregation,
            PointerPolicy::Association => RelationshipKind::Association,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing subscriber on stderr so stdout carries only the graph
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if !cli.root.is_dir() {
        bail!("codebase root {} is not an accessible directory", cli.root.display());
    }

    let config = build_config(&cli)?;
    let extraction = extract(&config)
        .with_context(|| format!("extracting types from {}", cli.root.display()))?;
    let graph = extraction.graph();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for unit in &extraction.units {
        writeln!(out, "# {}", unit.path.display()).context("writing syntax tree")?;
        out.write_all(ast::dump(&unit.root).as_bytes()).context("writing syntax tree")?;
        writeln!(out).context("writing syntax tree")?;
    }
    render::render(&graph, cli.format, &mut out).context("writing graph")?;
    out.flush().context("writing graph")?;
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<ExtractConfig> {
    let mut config = ExtractConfig::new(&cli.root)
        .with_pointer_relationship(cli.pointer_as.into())
        .with_jobs(cli.jobs)
        .with_retained_trees(cli.dump_ast);
    if !cli.globs.is_empty() {
        config = config.with_patterns(cli.globs.iter().cloned());
    }
    if let Some(path) = &cli.compile_db {
        config = config.with_compile_db(path);
    }
    if let Some(filter) = &cli.filter {
        config = config
            .with_path_filter(filter)
            .with_context(|| format!("invalid --filter expression {filter:?}"))?;
    }
    Ok(config)
}
