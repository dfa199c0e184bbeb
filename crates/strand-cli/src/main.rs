use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

/// Drive the strand C-ABI contract from the command line.
///
/// Loads the provider library, then runs the call scenarios, prints the
/// declared contract, or calls a single exported symbol.
///
/// EXAMPLES:
///     strand run                      Run every scenario
///     strand run census primes        Run selected scenarios
///     strand contract                 Print the declared signatures
///     strand call add_u32 1 2         Call one symbol
///     strand --linked run             Use the built-in provider
///
/// ENVIRONMENT VARIABLES:
///     STRAND_LIBRARY       Provider library name or path
///     STRAND_LIBRARY_PATH  Extra directories to search (path list)
///     STRAND_LOG           Log level (trace, debug, info, warn, error)
#[derive(Parser)]
#[command(name = "strand")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Provider library name or path
    #[arg(long, global = true)]
    library: Option<String>,

    /// Directory to search for the provider (repeatable)
    #[arg(long = "search-path", global = true, value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Configuration file to use instead of the nearest strand.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the provider compiled into this binary instead of loading one
    #[arg(long, global = true)]
    linked: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run call scenarios
    ///
    /// Each scenario exercises one boundary shape and releases everything it
    /// allocated before the next one starts. With no names, all run in order.
    ///
    /// EXAMPLES:
    ///     strand run
    ///     strand run chant fixed-array
    ///     strand run --json
    Run {
        /// Scenario names (add, count_chars, chant, sum_even, swap, census,
        /// fixed_array, primes)
        scenarios: Vec<String>,
        /// Output reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the declared signature of every exported symbol
    Contract {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call one exported symbol with arguments parsed from its declaration
    ///
    /// Integers are decimal, arrays are comma separated (`1,2,3`) and a pair
    /// is `x,y`.
    ///
    /// EXAMPLES:
    ///     strand call count_chars "göes to élevên"
    ///     strand call sum_even 1,2,3,4,5,6
    ///     strand call swap_pair 10,20
    Call {
        /// Exported symbol name
        symbol: String,
        /// Arguments, one per declared parameter
        args: Vec<String>,
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = config::overrides(cli.library, cli.search_paths, cli.verbose);
    let resolved = config::load(cli.config.as_deref(), &overrides)?;
    logging::init(&resolved.config.logging.level);
    tracing::debug!(
        sources = ?resolved.sources,
        project = resolved.is_project(),
        "configuration loaded"
    );

    let target = if cli.linked {
        commands::Target::Linked
    } else {
        commands::Target::Library(resolved.config.library.clone())
    };

    let result = match cli.command {
        Commands::Run { scenarios, json } => commands::run::run(&target, &scenarios, json),
        Commands::Contract { json } => commands::contract::run(json),
        Commands::Call { symbol, args, json } => commands::call::run(&target, &symbol, &args, json),
        Commands::Config => commands::config::run(&resolved),
    };

    strand_adapter::shared::shutdown();
    result
}
