//! Grapple CLI - graph embedding and community detection from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Generate Zachary's karate club and show stats
//! grapple generate karate -o karate.csv
//! grapple stats karate.csv
//!
//! # Random walk corpus
//! grapple walks karate.csv -o walks.txt --length 40 --num-walks 10
//!
//! # Node embeddings
//! grapple embed karate.csv --model deepwalk -o embedding.csv
//! grapple embed karate.csv --model asne --features features.csv -o embedding.csv
//! grapple embed karate.csv --model grarep --config grarep.json -o embedding.csv
//!
//! # Communities (JSON map of node -> community ids)
//! grapple cluster karate.csv --model louvain -o communities.json
//! grapple cluster karate.csv --model danmf --config danmf.json --seed 7 -o out.json
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` or pass `--verbose` for per-iteration output.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use grapple_community::{
    BigClam, BigClamConfig, Danmf, DanmfConfig, EdMot, EdMotConfig, EgoNetSplitter,
    EgoNetSplitterConfig, LabelPropagation, LabelPropagationConfig, Louvain, LouvainConfig, Mnmf,
    MnmfConfig, Nnsed, NnsedConfig,
};
use grapple_core::formats::{EdgeListCsv, EmbeddingCsv, FeatureCsv, MembershipJson};
use grapple_core::generators::{erdos_renyi, karate_club, newman_watts_strogatz};
use grapple_core::ndarray::Array2;
use grapple_core::walk::{generate_walks, WalkConfig};
use grapple_core::{
    modularity, AttributedEstimator, CommunityDetection, Estimator, Graph, Memberships,
    NodeEmbedding,
};
use grapple_embed::{
    Asne, AsneConfig, Bane, BaneConfig, DeepWalk, DeepWalkConfig, GraRep, GraRepConfig,
    GraphWave, GraphWaveConfig, NetMF, NetMFConfig, Node2Vec, Node2VecConfig, Walklets,
    WalkletsConfig,
};
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grapple")]
#[command(about = "Graph embedding and community detection", long_about = None)]
struct Cli {
    /// Log per-iteration progress (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about a graph
    Stats {
        /// Edge list (u,v[,weight])
        input: PathBuf,
    },

    /// Generate random walks (DeepWalk / node2vec)
    Walks {
        /// Edge list (u,v[,weight])
        input: PathBuf,

        /// Output file (one walk per line)
        #[arg(short, long)]
        output: PathBuf,

        /// Walk length
        #[arg(long, default_value = "80")]
        length: usize,

        /// Number of walks per node
        #[arg(long, default_value = "10")]
        num_walks: usize,

        /// Return parameter p
        #[arg(long, default_value = "1.0")]
        p: f32,

        /// In-out parameter q
        #[arg(long, default_value = "1.0")]
        q: f32,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Fit a node embedding and write it as CSV
    Embed {
        /// Edge list (u,v[,weight])
        input: PathBuf,

        #[arg(short, long)]
        model: EmbedModel,

        /// Output file (id,x_0,...)
        #[arg(short, long)]
        output: PathBuf,

        /// Node features (node,feature[,value]); required by asne and bane
        #[arg(long)]
        features: Option<PathBuf>,

        /// JSON file with model parameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides the seed from --config
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Detect communities and write memberships as JSON
    Cluster {
        /// Edge list (u,v[,weight])
        input: PathBuf,

        #[arg(short, long)]
        model: ClusterModel,

        /// Output file ({"node": [community, ...]})
        #[arg(short, long)]
        output: PathBuf,

        /// JSON file with model parameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides the seed from --config
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write a synthetic graph as an edge list
    Generate {
        kind: GraphKind,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of nodes (nws, er)
        #[arg(long, default_value = "100")]
        nodes: usize,

        /// Ring neighbours per node (nws)
        #[arg(long, default_value = "10")]
        k: usize,

        /// Shortcut probability (nws) or edge probability (er)
        #[arg(long, default_value = "0.05")]
        p: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedModel {
    Deepwalk,
    Node2vec,
    Walklets,
    /// Needs --features
    Asne,
    Graphwave,
    Grarep,
    Netmf,
    /// Needs --features
    Bane,
}

#[derive(Clone, Copy, ValueEnum)]
enum ClusterModel {
    Bigclam,
    EgoSplitter,
    Nnsed,
    Danmf,
    Mnmf,
    LabelPropagation,
    Edmot,
    Louvain,
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphKind {
    /// Zachary's karate club (34 nodes)
    Karate,
    /// Newman-Watts-Strogatz small world
    Nws,
    /// Erdos-Renyi G(n, p)
    Er,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stats { input } => cmd_stats(&input),
        Commands::Walks {
            input,
            output,
            length,
            num_walks,
            p,
            q,
            seed,
        } => cmd_walks(
            &input,
            &output,
            WalkConfig {
                walk_length: length,
                walk_number: num_walks,
                p,
                q,
                seed,
            },
        ),
        Commands::Embed {
            input,
            model,
            output,
            features,
            config,
            seed,
        } => cmd_embed(
            &input,
            model,
            &output,
            features.as_deref(),
            config.as_deref(),
            seed,
        ),
        Commands::Cluster {
            input,
            model,
            output,
            config,
            seed,
        } => cmd_cluster(&input, model, &output, config.as_deref(), seed),
        Commands::Generate {
            kind,
            output,
            nodes,
            k,
            p,
            seed,
        } => cmd_generate(kind, &output, nodes, k, p, seed),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Spinner that keeps ticking while the calling thread is busy.
fn spinner(message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn load_graph(path: &Path) -> Result<Graph> {
    let start = Instant::now();
    let pb = spinner(format!("Loading {}...", path.display()));

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let graph = EdgeListCsv::read(file)
        .with_context(|| format!("Failed to parse edge list {}", path.display()))?;

    pb.finish_with_message(format!("Loaded in {:.2?}", start.elapsed()));
    Ok(graph)
}

/// Model parameters from an optional JSON file, with the seed overridden.
///
/// Missing fields fall back to the model defaults.
fn model_config<C: DeserializeOwned>(path: Option<&Path>, seed: Option<u64>) -> Result<C> {
    let mut value = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    if let Some(seed) = seed {
        value
            .as_object_mut()
            .context("Model config must be a JSON object")?
            .insert("seed".to_string(), seed.into());
    }
    serde_json::from_value(value).context("Invalid model config")
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn cmd_stats(input: &Path) -> Result<()> {
    let graph = load_graph(input)?;
    let stats = graph.stats();

    println!("Graph Statistics");
    println!("================");
    println!("Nodes:          {}", stats.node_count);
    println!("Edges:          {}", stats.edge_count);
    println!("Density:        {:.4}", stats.density);
    println!("Avg degree:     {:.2}", stats.avg_degree);
    println!("Max degree:     {}", stats.max_degree);
    println!("Isolated nodes: {}", stats.isolated_nodes);
    println!("Components:     {}", stats.component_count);

    Ok(())
}

fn cmd_walks(input: &Path, output: &Path, config: WalkConfig) -> Result<()> {
    let graph = load_graph(input)?;

    println!(
        "Generating random walks (l={}, n={}, p={}, q={})...",
        config.walk_length, config.walk_number, config.p, config.q
    );
    let start = Instant::now();
    let walks = generate_walks(&graph, config)?;
    println!("Generated {} walks in {:.2?}", walks.len(), start.elapsed());

    let mut out = create_output(output)?;
    for walk in &walks {
        let line: Vec<String> = walk.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;

    println!("Wrote {}", output.display());
    Ok(())
}

fn fit_embedding<E: Estimator + NodeEmbedding>(mut model: E, graph: &Graph) -> Result<Array2<f64>> {
    model
        .fit(graph)
        .with_context(|| format!("{} failed to fit", E::NAME))?;
    Ok(model.embedding()?)
}

fn fit_attributed<E: AttributedEstimator + NodeEmbedding>(
    mut model: E,
    graph: &Graph,
    features: Option<&Path>,
) -> Result<Array2<f64>> {
    let Some(path) = features else {
        bail!(
            "{} needs node features, pass --features <file.csv>",
            E::NAME
        );
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let features = FeatureCsv::read(file, graph.node_count())
        .with_context(|| format!("Failed to parse features {}", path.display()))?;
    model
        .fit(graph, &features)
        .with_context(|| format!("{} failed to fit", E::NAME))?;
    Ok(model.embedding()?)
}

fn cmd_embed(
    input: &Path,
    model: EmbedModel,
    output: &Path,
    features: Option<&Path>,
    config: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    let graph = load_graph(input)?;

    let start = Instant::now();
    let pb = spinner("Fitting embedding...");

    let embedding = match model {
        EmbedModel::Deepwalk => fit_embedding(
            DeepWalk::new(model_config::<DeepWalkConfig>(config, seed)?),
            &graph,
        )?,
        EmbedModel::Node2vec => fit_embedding(
            Node2Vec::new(model_config::<Node2VecConfig>(config, seed)?),
            &graph,
        )?,
        EmbedModel::Walklets => fit_embedding(
            Walklets::new(model_config::<WalkletsConfig>(config, seed)?),
            &graph,
        )?,
        EmbedModel::Graphwave => fit_embedding(
            GraphWave::new(model_config::<GraphWaveConfig>(config, seed)?),
            &graph,
        )?,
        EmbedModel::Grarep => fit_embedding(
            GraRep::new(model_config::<GraRepConfig>(config, seed)?),
            &graph,
        )?,
        EmbedModel::Netmf => fit_embedding(
            NetMF::new(model_config::<NetMFConfig>(config, seed)?),
            &graph,
        )?,
        EmbedModel::Asne => fit_attributed(
            Asne::new(model_config::<AsneConfig>(config, seed)?),
            &graph,
            features,
        )?,
        EmbedModel::Bane => fit_attributed(
            Bane::new(model_config::<BaneConfig>(config, seed)?),
            &graph,
            features,
        )?,
    };
    pb.finish_with_message(format!("Fitted in {:.2?}", start.elapsed()));

    let mut out = create_output(output)?;
    EmbeddingCsv::write(&embedding, &mut out)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    out.flush()?;

    info!(rows = embedding.nrows(), cols = embedding.ncols(), "embedding written");
    println!("Embedding: {} x {}", embedding.nrows(), embedding.ncols());
    println!("Wrote {}", output.display());
    Ok(())
}

fn fit_communities<E: Estimator + CommunityDetection>(
    mut model: E,
    graph: &Graph,
) -> Result<Memberships> {
    model
        .fit(graph)
        .with_context(|| format!("{} failed to fit", E::NAME))?;
    Ok(model.memberships()?)
}

fn cmd_cluster(
    input: &Path,
    model: ClusterModel,
    output: &Path,
    config: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    let graph = load_graph(input)?;

    let start = Instant::now();
    let pb = spinner("Detecting communities...");

    let memberships = match model {
        ClusterModel::Bigclam => {
            fit_communities(BigClam::new(model_config::<BigClamConfig>(config, seed)?), &graph)?
        }
        ClusterModel::EgoSplitter => fit_communities(
            EgoNetSplitter::new(model_config::<EgoNetSplitterConfig>(config, seed)?),
            &graph,
        )?,
        ClusterModel::Nnsed => {
            fit_communities(Nnsed::new(model_config::<NnsedConfig>(config, seed)?), &graph)?
        }
        ClusterModel::Danmf => {
            fit_communities(Danmf::new(model_config::<DanmfConfig>(config, seed)?), &graph)?
        }
        ClusterModel::Mnmf => {
            fit_communities(Mnmf::new(model_config::<MnmfConfig>(config, seed)?), &graph)?
        }
        ClusterModel::LabelPropagation => fit_communities(
            LabelPropagation::new(model_config::<LabelPropagationConfig>(config, seed)?),
            &graph,
        )?,
        ClusterModel::Edmot => {
            fit_communities(EdMot::new(model_config::<EdMotConfig>(config, seed)?), &graph)?
        }
        ClusterModel::Louvain => {
            fit_communities(Louvain::new(model_config::<LouvainConfig>(config, seed)?), &graph)?
        }
    };
    pb.finish_with_message(format!("Fitted in {:.2?}", start.elapsed()));

    let mut out = create_output(output)?;
    MembershipJson::write(&memberships, &mut out)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    out.flush()?;

    println!("Communities: {}", memberships.community_count());
    match memberships.labels() {
        Some(labels) => println!("Modularity:  {:.4}", modularity(&graph, &labels, 1.0)?),
        None => println!("Overlapping: yes"),
    }
    println!("Wrote {}", output.display());
    Ok(())
}

fn cmd_generate(
    kind: GraphKind,
    output: &Path,
    nodes: usize,
    k: usize,
    p: f64,
    seed: u64,
) -> Result<()> {
    let graph = match kind {
        GraphKind::Karate => karate_club(),
        GraphKind::Nws => newman_watts_strogatz(nodes, k, p, seed)?,
        GraphKind::Er => erdos_renyi(nodes, p, seed)?,
    };

    let mut out = create_output(output)?;
    EdgeListCsv::write(&graph, &mut out)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    out.flush()?;

    println!(
        "Generated {} nodes, {} edges -> {}",
        graph.node_count(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_ticks_until_finished() {
        let pb = spinner("Fitting embedding...");
        assert_eq!(pb.message(), "Fitting embedding...");
        assert!(!pb.is_finished());
        pb.finish_with_message("done");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_model_config_seed_override() {
        let config: LabelPropagationConfig = model_config(None, Some(7)).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.iterations, LabelPropagationConfig::default().iterations);
    }
}
