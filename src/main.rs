//! Weave CLI entry point

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Dependency resolution and call graph stitching for package ecosystems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./weave.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Where the dependency graph comes from.
#[derive(Args, Clone, Default)]
pub struct GraphArgs {
    /// JSON metadata file
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Dependency graph snapshot, preferred over --metadata when it exists
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Skip constraints on unknown artifacts instead of failing
    #[arg(long)]
    pub ignore_missing: bool,
}

/// Query shape shared by `resolve` and `dependents`.
#[derive(Args, Clone)]
pub struct QueryArgs {
    /// Coordinate `groupId:artifactId:version`; omit with --input
    pub coordinate: Option<String>,

    /// Only consider revisions released by this timestamp (0 or negative: no limit)
    #[arg(long, allow_negative_numbers = true)]
    pub at: Option<i64>,

    /// Direct relations only
    #[arg(long)]
    pub direct: bool,

    /// Resolve every coordinate in this file, one per line
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Batch output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the full resolution as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub graph: GraphArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the dependencies of a revision
    Resolve(QueryArgs),
    /// Resolve the revisions depending on a revision
    Dependents(QueryArgs),
    /// Merge the partial call graph of an artifact with its dependencies
    Merge {
        /// Partial call graph file or coordinate in the repository
        input: String,

        /// CHA or RTA-like
        #[arg(short, long)]
        strategy: Option<String>,

        /// Also resolve the dependencies' own call sites
        #[arg(long)]
        deep: bool,

        /// Resolve dependencies as of this timestamp
        #[arg(long, allow_negative_numbers = true)]
        at: Option<i64>,

        /// Partial call graph repository
        #[arg(long)]
        repository: Option<PathBuf>,

        /// Dependency partial graph files, used instead of resolving
        #[arg(long = "dependency", short = 'd')]
        dependencies: Vec<PathBuf>,

        /// Output file for the merged graph (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the JCG format instead of the merged graph document
        #[arg(long)]
        jcg: bool,

        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Run inputs through the analysis pipeline into the graph store
    Analyze {
        /// Partial call graph files or coordinates
        #[arg(required = true)]
        inputs: Vec<String>,

        #[arg(long, allow_negative_numbers = true)]
        at: Option<i64>,

        #[arg(short, long)]
        strategy: Option<String>,

        #[arg(long)]
        repository: Option<PathBuf>,

        /// Graph store directory
        #[arg(long)]
        store: Option<PathBuf>,

        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Convert merged graph documents to one JCG document
    Convert {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Verify every graph in the graph store
    CheckStore {
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Count duplicate node URIs in merged graph documents
    CheckUris {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Backward-ball and closure sizes for growing seed sets
    SeedStats {
        /// Largest backward radius
        #[arg(short, long, default_value_t = 1)]
        radius: usize,

        /// Seed with the N products ranked highest by PageRank
        #[arg(long, conflicts_with = "products")]
        top: Option<usize>,

        /// With --top, seed with the top revisions instead of their products
        #[arg(long, requires = "top")]
        revisions: bool,

        /// Seed products `groupId:artifactId`, taken as growing prefixes
        products: Vec<String>,

        #[arg(long)]
        json: bool,

        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Build the dependency graph and save it as a snapshot
    Snapshot {
        /// JSON metadata file
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weave={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Weave v{}", env!("CARGO_PKG_VERSION"));
    let config = weave_core::WeaveConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve(args) => commands::resolve(&config, args, commands::Direction::Dependencies),
        Commands::Dependents(args) => commands::resolve(&config, args, commands::Direction::Dependents),
        Commands::Merge {
            input,
            strategy,
            deep,
            at,
            repository,
            dependencies,
            output,
            jcg,
            graph,
        } => commands::merge(
            &config,
            commands::MergeArgs {
                input,
                strategy,
                deep,
                at,
                repository,
                dependencies,
                output,
                jcg,
                graph,
            },
        ),
        Commands::Analyze {
            inputs,
            at,
            strategy,
            repository,
            store,
            graph,
        } => commands::analyze(&config, inputs, at, strategy, repository, store, graph).await,
        Commands::Convert { inputs, output } => commands::convert(&inputs, output),
        Commands::CheckStore { store } => commands::check_store(&config, store),
        Commands::CheckUris { inputs } => commands::check_uris(&inputs),
        Commands::SeedStats {
            radius,
            top,
            revisions,
            products,
            json,
            graph,
        } => commands::seed_stats(&config, radius, top, revisions, &products, json, graph),
        Commands::Snapshot { metadata, output } => commands::snapshot(&config, metadata, output),
        Commands::Version => {
            println!("Weave v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
