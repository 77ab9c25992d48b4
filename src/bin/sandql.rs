//! sandql command-line shell
//!
//! Runs read-only queries against the demo reconciliation catalog, or against
//! a catalog snapshot.
//!
//! ```bash
//! # Run one query
//! sandql -e "SELECT status, count(*) FROM processing_operations GROUP BY status"
//!
//! # Read queries line by line from stdin
//! echo "SELECT * FROM commission_rates" | sandql
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sandql::{Catalog, EngineConfig, QueryEngine, QueryOutcome, Session, demo, install_panic_hook};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sandboxed SQL shell over in-memory tables
#[derive(Parser, Debug)]
#[command(name = "sandql", version, about = "Read-only SQL over an in-memory catalog")]
struct Args {
    /// Execute a single query and exit
    #[arg(short = 'e', long)]
    execute: Option<String>,

    /// Engine configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load the catalog from a snapshot instead of the demo data
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Write the demo catalog snapshot to FILE and exit
    #[arg(long, value_name = "FILE")]
    dump_catalog: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `sandql=info`
    #[arg(long, default_value = "warn", env = "SANDQL_LOG")]
    log_level: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    install_panic_hook();

    if let Some(path) = &args.dump_catalog {
        let bytes = demo::catalog()?.to_bytes()?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "catalog snapshot written");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Catalog::from_bytes(&bytes)?
        }
        None => demo::catalog()?,
    };
    let mut session = QueryEngine::with_config(Arc::new(catalog), config).session();

    if let Some(sql) = &args.execute {
        let outcome = session.execute(sql);
        print_outcome(&outcome);
        return match outcome.error {
            Some(kind) => Err(anyhow::anyhow!("query failed ({})", kind)),
            None => Ok(()),
        };
    }

    repl(&mut session)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Reads one query per line until end of input
fn repl(session: &mut Session<Arc<Catalog>>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "sandql> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            return Ok(());
        }
        match line.trim() {
            "" => {}
            ".quit" | ".exit" => return Ok(()),
            ".schema" => println!("{}", session.engine().provider().describe()),
            ".history" => {
                for (i, entry) in session.history().enumerate() {
                    let mark = if entry.error.is_some() { "!" } else { " " };
                    println!("{:>3}{} {}  -- {}", i + 1, mark, entry.sql, entry.summary);
                }
            }
            ".help" => {
                println!(".schema   list tables and columns");
                println!(".history  show recent queries");
                println!(".quit     exit");
            }
            sql => print_outcome(&session.execute(sql)),
        }
    }
}

fn print_outcome(outcome: &QueryOutcome) {
    if let Some(table) = &outcome.table {
        println!("{}", table);
    }
    match outcome.error {
        Some(kind) => println!("{}: {}", kind, outcome.message),
        None => println!("{}", outcome.message),
    }
}
