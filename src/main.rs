use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use serde_json::json;

use phpns::cache::IndexCache;
use phpns::config::Settings;
use phpns::error::Error;
use phpns::types::{Fqdn, Insertion};
use phpns::{edit, format, walk};

/// phpns: index PHP classes by short name and add `use` statements in order.
#[derive(Parser)]
#[command(name = "phpns", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (default: phpns.toml in the first root).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where persisted indexes live (overrides settings).
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Print shell completions for the given shell.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Scan the project and persist a fresh index.
    Index {
        /// Project root folders (default: current directory).
        roots: Vec<PathBuf>,
    },
    /// List the FQDNs known for a short name or namespace segment.
    Lookup {
        symbol: String,

        /// Project root folder; repeat for several.
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
    },
    /// Add `use <FQDN>;` to a file, keeping imports sorted.
    Import {
        fqdn: String,
        file: PathBuf,

        /// Write the file instead of printing the plan.
        #[arg(long)]
        write: bool,
    },
    /// Look a short name up and import it: directly when unique, else list candidates.
    Resolve {
        symbol: String,
        file: PathBuf,

        /// Project root folder; repeat for several.
        #[arg(long = "root")]
        roots: Vec<PathBuf>,

        /// Choose candidate N (1-based) from the list.
        #[arg(long)]
        pick: Option<usize>,

        /// Write the file instead of printing the plan.
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "phpns", &mut io::stdout());
        return;
    }

    let Some(command) = cli.command.as_ref() else {
        eprintln!("usage: phpns <index|lookup|import|resolve> ... (see --help)");
        process::exit(3);
    };

    if let Err(e) = execute(&cli, command) {
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

/// RUST_LOG wins; otherwise `warn`, or `debug` with --verbose.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: &Cli, command: &Command) -> Result<(), Error> {
    match command {
        Command::Index { roots } => run_index(cli, &canonical_roots(roots)),
        Command::Lookup { symbol, roots } => run_lookup(cli, symbol, &canonical_roots(roots)),
        Command::Import { fqdn, file, write } => {
            let fqdn = Fqdn::parse(fqdn)?;
            let settings = Settings::discover(cli.config.as_deref(), &[])?;
            run_import(cli, &settings, &fqdn, file, *write)
        }
        Command::Resolve {
            symbol,
            file,
            roots,
            pick,
            write,
        } => run_resolve(cli, symbol, file, &canonical_roots(roots), *pick, *write),
    }
}

/// Canonical roots keep the project key stable across working directories.
fn canonical_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let roots = if roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        roots.to_vec()
    };
    roots
        .into_iter()
        .map(|r| r.canonicalize().unwrap_or(r))
        .collect()
}

fn open_cache(cli: &Cli, settings: &Settings, roots: &[PathBuf]) -> IndexCache {
    let root = cli
        .cache_dir
        .clone()
        .unwrap_or_else(|| settings.cache_root(roots));
    let cache = IndexCache::new(root);
    tracing::debug!(cache = %cache.cache_root().display(), "index cache");
    cache
}

fn run_index(cli: &Cli, roots: &[PathBuf]) -> Result<(), Error> {
    let settings = Settings::discover(cli.config.as_deref(), roots)?;
    let cache = open_cache(cli, &settings, roots);
    let rebuilt = cache.rebuild(roots, &settings, &AtomicBool::new(false))?;

    if cli.json {
        let errors: Vec<_> = rebuilt
            .report
            .errors
            .iter()
            .map(|e| {
                json!({
                    "path": e.path().map(|p| p.display().to_string()),
                    "message": e.to_string(),
                })
            })
            .collect();
        print_json(&json!({
            "path": rebuilt.path.display().to_string(),
            "files": rebuilt.report.files_scanned,
            "fqdns": rebuilt.index.len(),
            "symbols": rebuilt.index.symbol_count(),
            "errors": errors,
        }));
    } else {
        println!(
            "{}",
            format::scan_summary(&rebuilt.index, &rebuilt.report, &rebuilt.path)
        );
        let failures = format::scan_failures(&rebuilt.report);
        if !failures.is_empty() {
            eprintln!("{failures}");
        }
    }
    Ok(())
}

fn run_lookup(cli: &Cli, symbol: &str, roots: &[PathBuf]) -> Result<(), Error> {
    let settings = Settings::discover(cli.config.as_deref(), roots)?;
    let cache = open_cache(cli, &settings, roots);
    let index = cache.get_or_build(roots, &settings, &AtomicBool::new(false))?;
    let found = index.lookup(symbol);

    if cli.json {
        let fqdns: Vec<&str> = found.into_iter().flatten().map(Fqdn::as_str).collect();
        print_json(&json!({ "symbol": symbol, "fqdns": fqdns }));
        return Ok(());
    }

    match found {
        Some(fqdns) => {
            println!("{}", format::lookup_header(symbol, fqdns.len()));
            print!("{}", format::candidates(fqdns));
        }
        None => println!("{}", format::lookup_header(symbol, 0)),
    }
    Ok(())
}

fn run_import(
    cli: &Cli,
    settings: &Settings,
    fqdn: &Fqdn,
    file: &Path,
    write: bool,
) -> Result<(), Error> {
    if !walk::is_candidate(file, &settings.filter()) {
        return Err(Error::NoAnchor {
            path: Some(file.to_path_buf()),
        });
    }

    let outcome = if write {
        edit::apply_to_file(file, fqdn)?
    } else {
        edit::plan_file(file, fqdn)?
    };

    if cli.json {
        let value = match &outcome {
            Insertion::AlreadyImported { line } => json!({
                "file": file.display().to_string(),
                "fqdn": fqdn.as_str(),
                "status": "already_imported",
                "line": line,
            }),
            Insertion::Insert(d) => json!({
                "file": file.display().to_string(),
                "fqdn": fqdn.as_str(),
                "status": if write { "written" } else { "planned" },
                "directive": d,
            }),
        };
        print_json(&value);
    } else {
        println!("{}", format::insertion(file, fqdn, &outcome));
    }
    Ok(())
}

fn run_resolve(
    cli: &Cli,
    symbol: &str,
    file: &Path,
    roots: &[PathBuf],
    pick: Option<usize>,
    write: bool,
) -> Result<(), Error> {
    let settings = Settings::discover(cli.config.as_deref(), roots)?;
    let cache = open_cache(cli, &settings, roots);
    let index = cache.get_or_build(roots, &settings, &AtomicBool::new(false))?;

    let Some(candidates) = index.lookup(symbol) else {
        if cli.json {
            print_json(&json!({ "symbol": symbol, "fqdns": [] }));
        } else {
            println!("{}", format::lookup_header(symbol, 0));
        }
        return Ok(());
    };

    let chosen = match (candidates.len(), pick) {
        (1, _) => candidates.iter().next(),
        (_, Some(n)) => n.checked_sub(1).and_then(|i| candidates.iter().nth(i)),
        _ => None,
    };

    let Some(fqdn) = chosen else {
        if cli.json {
            let fqdns: Vec<&str> = candidates.iter().map(Fqdn::as_str).collect();
            print_json(&json!({ "symbol": symbol, "fqdns": fqdns, "ambiguous": true }));
        } else {
            println!("{}", format::lookup_header(symbol, candidates.len()));
            print!("{}", format::candidates(candidates));
            println!("(pass --pick N to choose)");
        }
        return Ok(());
    };

    run_import(cli, &settings, fqdn, file, write)
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("serde_json::Value is always serializable")
    );
}
