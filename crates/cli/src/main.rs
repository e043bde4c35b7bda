use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use evidence_concepts::StubConceptExtractor;
use evidence_pipeline::GraphPipeline;
use evidence_protocol::GraphRequest;
use evidence_semantic::StubEmbeddingProvider;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod providers;

use config::CliConfig;
use providers::{HttpConceptExtractor, HttpEmbeddingProvider};

#[derive(Parser)]
#[command(name = "evidence-graph")]
#[command(about = "Build traceable evidence graphs from cited answers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an evidence graph from a request JSON file
    Build(BuildArgs),
    /// Validate a request without building anything
    Validate(InputArgs),
    /// Print the JSON schema of the request contract
    Schema,
}

#[derive(Args)]
struct InputArgs {
    /// Request JSON file, or "-" for stdin
    input: String,
}

#[derive(Args)]
struct BuildArgs {
    /// Request JSON file, or "-" for stdin
    input: String,

    /// Write the graph artifact here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config with collaborator endpoints and density/semantic knobs
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use deterministic in-process collaborators instead of HTTP endpoints
    #[arg(long)]
    stub: bool,

    /// Skip layer-3 concept extraction
    #[arg(long)]
    no_concepts: bool,

    /// Skip semantic-similarity edges
    #[arg(long)]
    no_semantic: bool,

    /// Print a per-layer summary to stderr
    #[arg(long)]
    summary: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Build(args) => run_build(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Schema => run_schema(),
    }
}

async fn run_build(args: BuildArgs) -> Result<()> {
    let request = read_request(&args.input)?;
    let config = config::load(args.config.as_deref())?;
    let pipeline = build_pipeline(&config, &args)?;

    let artifact = pipeline
        .build(&request)
        .await
        .context("evidence graph build failed")?;

    if args.summary {
        eprintln!(
            "graph: {} nodes, {} edges ({} concepts, {} semantic edges)",
            artifact.metadata.node_count,
            artifact.metadata.edge_count,
            artifact.metadata.secondary_concepts,
            artifact.metadata.semantic_edges,
        );
        for (layer, count) in &artifact.metadata.nodes_by_layer {
            eprintln!("  layer {layer}: {count} nodes");
        }
    }

    let json = serde_json::to_string_pretty(&artifact)?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_validate(args: InputArgs) -> Result<()> {
    let request = read_request(&args.input)?;
    match evidence_graph_core::validate(&request) {
        Ok(()) => {
            println!("{}", serde_json::json!({ "valid": true }));
            Ok(())
        }
        Err(err) => bail!("invalid request: {err}"),
    }
}

fn run_schema() -> Result<()> {
    let schema = schemars::schema_for!(GraphRequest);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn build_pipeline(config: &CliConfig, args: &BuildArgs) -> Result<GraphPipeline> {
    let mut pipeline = GraphPipeline::new()
        .with_density(config.density)
        .with_semantic_config(config.semantic);

    if !args.no_concepts {
        if args.stub {
            pipeline = pipeline.with_concept_extractor(Arc::new(StubConceptExtractor));
        } else if let Some(endpoint) = &config.concepts {
            let extractor = HttpConceptExtractor::new(endpoint.url.clone(), endpoint.timeout_ms)?;
            pipeline = pipeline.with_concept_extractor(Arc::new(extractor));
        } else {
            log::debug!("no concept extractor configured; layer 3 will be empty");
        }
    }

    if !args.no_semantic {
        if args.stub {
            pipeline = pipeline.with_embedding_provider(Arc::new(StubEmbeddingProvider::default()));
        } else if let Some(endpoint) = &config.embeddings {
            let provider = HttpEmbeddingProvider::new(
                endpoint.url.clone(),
                endpoint.timeout_ms,
                endpoint.batch_size,
            )?;
            pipeline = pipeline.with_embedding_provider(Arc::new(provider));
        } else {
            log::debug!("no embedding provider configured; semantic edges will be empty");
        }
    }

    Ok(pipeline)
}

fn read_request(input: &str) -> Result<GraphRequest> {
    let raw = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read request from stdin")?;
        buffer
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };
    serde_json::from_str(&raw).context("request is not valid JSON for the GraphRequest contract")
}
