//! CLI command implementations

use crate::{GraphArgs, QueryArgs};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use weave_core::{ArtifactKey, Coordinate, MergedCallGraph, PartialCallGraph, WeaveConfig};
use weave_merger::{CallGraphMerger, JcgDocument, MergeOptions, check_uris as scan_uris, to_jcg};
use weave_pipeline::{AnalysisPipeline, AnalysisRequest, RepositoryProvider, StoreSink};
use weave_resolver::{
    BatchMode, DependencyGraph, JsonMetadataSource, ResolveOptions, Resolver, RevisionGraph,
    SeedSelection, effective_timestamp, load_snapshot, resolve_batch, save_snapshot,
};
use weave_store::{AnalysisInput, FsGraphStore, PartialGraphRepository, read_partial_graph};

#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Dependencies,
    Dependents,
}

pub struct MergeArgs {
    pub input: String,
    pub strategy: Option<String>,
    pub deep: bool,
    pub at: Option<i64>,
    pub repository: Option<PathBuf>,
    pub dependencies: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub jcg: bool,
    pub graph: GraphArgs,
}

// ── Resolution ──────────────────────────────────────────────

pub fn resolve(config: &WeaveConfig, args: QueryArgs, direction: Direction) -> Result<()> {
    let graph = open_dependency_graph(config, &args.graph)?.context(
        "no dependency metadata: pass --metadata or --snapshot, or set resolver.metadata in weave.toml",
    )?;
    let resolver = Resolver::with_options(&graph, resolve_options(config, &args.graph));
    let at = effective_timestamp(args.at);
    let transitive = !args.direct;

    if let Some(input) = &args.input {
        let reader = BufReader::new(
            File::open(input).with_context(|| format!("opening {}", input.display()))?,
        );
        let mode = match direction {
            Direction::Dependencies => BatchMode::Dependencies,
            Direction::Dependents => BatchMode::Dependents,
        };
        let summary = match &args.output {
            Some(path) => {
                let writer = BufWriter::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                );
                resolve_batch(&resolver, reader, writer, mode, at, transitive)?
            }
            None => resolve_batch(&resolver, reader, std::io::stdout().lock(), mode, at, transitive)?,
        };
        tracing::info!(
            "Batch finished: {} resolved, {} failed",
            summary.resolved,
            summary.failed
        );
        return Ok(());
    }

    let raw = args
        .coordinate
        .as_deref()
        .context("a coordinate or --input is required")?;
    let coordinate: Coordinate = raw.parse()?;
    let resolution = match direction {
        Direction::Dependencies => resolver.resolve_dependencies(&coordinate, at, transitive)?,
        Direction::Dependents => resolver.resolve_dependents(&coordinate, at, transitive)?,
    };
    for degradation in &resolution.degraded {
        tracing::warn!("{}", degradation);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        for revision in &resolution.revisions {
            println!("{}", revision.coordinate);
        }
    }
    Ok(())
}

pub fn seed_stats(
    config: &WeaveConfig,
    radius: usize,
    top: Option<usize>,
    revisions: bool,
    products: &[String],
    json: bool,
    graph_args: GraphArgs,
) -> Result<()> {
    let selection = match top {
        Some(n) if revisions => SeedSelection::TopRevisions(n),
        Some(n) => SeedSelection::TopProducts(n),
        None if products.is_empty() => anyhow::bail!("pass seed products or --top"),
        None => SeedSelection::Products(
            products
                .iter()
                .map(|p| p.parse::<ArtifactKey>())
                .collect::<Result<_, _>>()?,
        ),
    };
    let graph = open_dependency_graph(config, &graph_args)?
        .context("no dependency metadata: pass --metadata or --snapshot")?;
    let revision_graph = RevisionGraph::build(&graph, &config.resolver.scopes);
    if let SeedSelection::TopProducts(n) = selection {
        let ranked: Vec<String> = revision_graph
            .top_products(n)
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!("Seed products: {}", ranked.join(", "));
    }

    for stat in revision_graph.seed_stats(&selection, radius) {
        if json {
            println!("{}", serde_json::to_string(&stat)?);
        } else {
            println!("{}\t{}\t{}\t{}", stat.radius, stat.seeds, stat.ball, stat.closure);
        }
    }
    Ok(())
}

pub fn snapshot(config: &WeaveConfig, metadata: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let metadata = metadata
        .or_else(|| config.resolver.metadata.clone())
        .context("no metadata file: pass --metadata or set resolver.metadata")?;
    let output = output
        .or_else(|| config.resolver.snapshot.clone())
        .context("no snapshot path: pass --output or set resolver.snapshot")?;

    let graph = build_dependency_graph(&metadata)?;
    save_snapshot(&graph, &output)?;
    println!(
        "{} revisions, {} constraints -> {}",
        graph.revision_count(),
        graph.constraint_count(),
        output.display()
    );
    Ok(())
}

// ── Merging ─────────────────────────────────────────────────

pub fn merge(config: &WeaveConfig, args: MergeArgs) -> Result<()> {
    let mut options = MergeOptions::try_from(&config.merger)?;
    if let Some(strategy) = &args.strategy {
        options.strategy = strategy.parse()?;
    }
    options.deep |= args.deep;

    let repository =
        PartialGraphRepository::new(args.repository.clone().unwrap_or_else(|| config.repository.path.clone()));
    let input = parse_input(&args.input)?;
    let base = repository.load_input(&input)?;

    let dependencies = if !args.dependencies.is_empty() {
        args.dependencies
            .iter()
            .map(|path| read_partial_graph(path))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        resolve_partial_graphs(config, &args, &repository, &base)?
    };

    let outcome = CallGraphMerger::new(options).merge(&base, &dependencies)?;
    for degradation in &outcome.report.degraded {
        tracing::warn!("{}", degradation);
    }

    let json = if args.jcg {
        serde_json::to_string_pretty(&to_jcg(&outcome.graph))?
    } else {
        serde_json::to_string_pretty(&outcome.graph)?
    };
    write_output(args.output.as_deref(), &json)
}

/// Partial graphs of the base's resolved dependencies that the repository
/// holds. Without a dependency graph the base is merged alone.
fn resolve_partial_graphs(
    config: &WeaveConfig,
    args: &MergeArgs,
    repository: &PartialGraphRepository,
    base: &PartialCallGraph,
) -> Result<Vec<PartialCallGraph>> {
    let Some(graph) = open_dependency_graph(config, &args.graph)? else {
        tracing::warn!("No dependency metadata configured, merging {} alone", base.coordinate());
        return Ok(Vec::new());
    };
    let resolver = Resolver::with_options(&graph, resolve_options(config, &args.graph));
    let resolution = resolver.resolve_dependencies(base.coordinate(), effective_timestamp(args.at), true)?;
    let coordinates: Vec<Coordinate> = resolution
        .revisions
        .into_iter()
        .map(|r| r.coordinate)
        .collect();

    let (graphs, missing) = repository.load_available(&coordinates)?;
    for coordinate in &missing {
        tracing::warn!("No partial call graph for dependency {}", coordinate);
    }
    Ok(graphs)
}

pub async fn analyze(
    config: &WeaveConfig,
    inputs: Vec<String>,
    at: Option<i64>,
    strategy: Option<String>,
    repository: Option<PathBuf>,
    store: Option<PathBuf>,
    graph_args: GraphArgs,
) -> Result<()> {
    let mut options = MergeOptions::try_from(&config.merger)?;
    if let Some(strategy) = &strategy {
        options.strategy = strategy.parse()?;
    }
    let requests = inputs
        .iter()
        .map(|raw| parse_input(raw))
        .collect::<Result<Vec<_>>>()?;

    let graph = match open_dependency_graph(config, &graph_args)? {
        Some(graph) => graph,
        None => {
            tracing::warn!("No dependency metadata configured, every input is merged alone");
            DependencyGraph::from_parts(Vec::new(), Vec::new())
        }
    };
    let repository = PartialGraphRepository::new(repository.unwrap_or_else(|| config.repository.path.clone()));
    let store = FsGraphStore::open(store.unwrap_or_else(|| config.store.path.clone()))?;

    let pipeline = Arc::new(
        AnalysisPipeline::new(
            Arc::new(graph),
            Arc::new(RepositoryProvider::new(Arc::new(repository))),
            Arc::new(StoreSink::new(Arc::new(store))),
        )
        .with_resolve_options(resolve_options(config, &graph_args))
        .with_merge_options(options),
    );
    let mut outcomes = pipeline.subscribe();
    let (sender, handle) = Arc::clone(&pipeline).spawn();

    let expected = requests.len();
    let at = effective_timestamp(at);
    tokio::spawn(async move {
        for (id, input) in requests.into_iter().enumerate() {
            let mut request = AnalysisRequest::new(id as u64, input);
            request.at = at;
            if sender.send(request).await.is_err() {
                tracing::error!("Analysis pipeline stopped early");
                break;
            }
        }
    });

    let mut failed = 0;
    let mut received = 0;
    while received < expected {
        match outcomes.recv().await {
            Ok(outcome) => {
                received += 1;
                if outcome.is_failed() {
                    failed += 1;
                }
                println!("{}", serde_json::to_string(&outcome)?);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {} pipeline outcomes", skipped);
                received += skipped as usize;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
    handle.await.context("analysis pipeline task")?;

    if failed > 0 {
        anyhow::bail!("{} of {} analyses failed", failed, expected);
    }
    Ok(())
}

// ── Conversion and checks ───────────────────────────────────

pub fn convert(inputs: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    let documents = inputs
        .iter()
        .map(|path| read_merged_graph(path).map(|graph| to_jcg(&graph)))
        .collect::<Result<Vec<_>>>()?;
    let combined = JcgDocument::concat(documents);
    tracing::info!(
        "Converted {} graphs into {} reachable methods",
        inputs.len(),
        combined.reachable_methods.len()
    );
    write_output(output.as_deref(), &serde_json::to_string_pretty(&combined)?)
}

pub fn check_uris(inputs: &[PathBuf]) -> Result<()> {
    let mut duplicated = 0;
    for path in inputs {
        let check = scan_uris(&read_merged_graph(path)?);
        println!(
            "{}: {} URIs, {} duplicated",
            path.display(),
            check.total,
            check.duplicates.len()
        );
        for (uri, count) in &check.duplicates {
            println!("  {} x{}", uri, count);
        }
        duplicated += check.duplicates.len();
    }
    if duplicated > 0 {
        anyhow::bail!("{} duplicated URIs found", duplicated);
    }
    Ok(())
}

pub fn check_store(config: &WeaveConfig, store: Option<PathBuf>) -> Result<()> {
    let store = FsGraphStore::open(store.unwrap_or_else(|| config.store.path.clone()))?;
    let report = weave_store::check_store(&store)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_healthy() {
        anyhow::bail!("{} problems in graph store {}", report.problems.len(), store.root().display());
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────

/// A path to an existing file or a `.json` name is a file input; anything
/// else must parse as a coordinate.
fn parse_input(raw: &str) -> Result<AnalysisInput> {
    let path = Path::new(raw);
    if path.is_file() || raw.ends_with(".json") {
        return Ok(AnalysisInput::File(path.to_path_buf()));
    }
    let coordinate: Coordinate = raw
        .parse()
        .with_context(|| format!("{} is neither a file nor a coordinate", raw))?;
    Ok(AnalysisInput::Coordinate(coordinate))
}

fn resolve_options(config: &WeaveConfig, args: &GraphArgs) -> ResolveOptions {
    let mut options = ResolveOptions::from(&config.resolver);
    options.ignore_missing |= args.ignore_missing;
    options
}

/// Restore the snapshot when one exists, otherwise build from the metadata
/// file. `None` when neither is configured.
fn open_dependency_graph(config: &WeaveConfig, args: &GraphArgs) -> Result<Option<DependencyGraph>> {
    let snapshot = args.snapshot.clone().or_else(|| config.resolver.snapshot.clone());
    if let Some(path) = snapshot.as_deref().filter(|p| p.exists()) {
        return Ok(Some(load_snapshot(path)?));
    }
    match args.metadata.clone().or_else(|| config.resolver.metadata.clone()) {
        Some(path) => Ok(Some(build_dependency_graph(&path)?)),
        None => Ok(None),
    }
}

fn build_dependency_graph(metadata: &Path) -> Result<DependencyGraph> {
    let source = JsonMetadataSource::from_path(metadata)?;
    if source.skipped() > 0 {
        tracing::warn!("Skipped {} malformed dependency entries", source.skipped());
    }
    let graph = DependencyGraph::build(&source)?;
    tracing::info!(
        "Dependency graph: {} revisions of {} artifacts, {} constraints",
        graph.revision_count(),
        graph.artifact_count(),
        graph.constraint_count()
    );
    Ok(graph)
}

fn read_merged_graph(path: &Path) -> Result<MergedCallGraph> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing merged graph {}", path.display()))
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
