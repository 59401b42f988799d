//! dungraph
//!
//! Generates a level from a dependency graph and prints the rooms.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use strum::IntoEnumIterator;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use dg_core::demo::demo_graph;
use dg_core::{GenerationConfig, GraphSpec, Level, LevelGenerator, NodeGraph, NodeType};

/// Dependency-graph dungeon generator
#[derive(Parser, Debug)]
#[command(name = "dungraph")]
#[command(author, version, about = "Materialize a level graph into rooms", long_about = None)]
struct Args {
    /// Level graph (JSON)
    #[arg(short = 'g', long = "graph", conflicts_with = "demo")]
    graph: Option<PathBuf>,

    /// Generation config (TOML)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Seed of the first attempt (overrides the config)
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Attempts before giving up (overrides the config)
    #[arg(short = 'a', long = "attempts")]
    attempts: Option<u32>,

    /// Use the built-in sample graph (the default without --graph)
    #[arg(short = 'd', long = "demo")]
    demo: bool,

    /// Print the level as JSON
    #[arg(long = "json")]
    json: bool,

    /// List node types accepted in graph files
    #[arg(long = "list-types")]
    list_types: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.list_types {
        for node_type in NodeType::iter() {
            println!("{node_type}");
        }
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dungraph: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.general.log_level, args.verbose);

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str, verbose: u8) {
    let level = match verbose {
        0 => log_level,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(args: &Args) -> dg_core::Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_file(path)?,
        None => GenerationConfig::default(),
    };
    if args.seed.is_some() {
        config.general.seed = args.seed;
    }
    if let Some(attempts) = args.attempts {
        config.general.max_attempts = attempts;
    }
    config.validate()?;
    Ok(config)
}

fn load_graph(args: &Args) -> dg_core::Result<NodeGraph> {
    match &args.graph {
        Some(path) => NodeGraph::from_spec(&GraphSpec::from_file(path)?),
        None => demo_graph(),
    }
}

fn run(args: &Args, config: GenerationConfig) -> dg_core::Result<()> {
    let mut graph = load_graph(args)?;
    debug!(nodes = graph.len(), "graph loaded");

    let generator = LevelGenerator::new(config);
    let level = generator.generate_incremental(&mut graph, |state| {
        debug!(rooms = state.room_count, "yielded");
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&level)?);
    } else {
        print_level(&level, &graph);
    }
    Ok(())
}

fn print_level(level: &Level, graph: &NodeGraph) {
    println!(
        "seed {}  attempts {}  rooms {}  insertions {}",
        level.seed, level.attempts, level.room_count, level.insertions
    );
    println!(
        "{:<5} {:<12} {:>9} {:>5} {:<6} {:<6} {:<10} nodes",
        "room", "prefab", "at", "size", "parent", "via", "connection"
    );
    for room in &level.rooms {
        let parent = room.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        let via = room
            .attached_via
            .map(|d| format!("{d:?}"))
            .unwrap_or_else(|| "-".into());
        let nodes: Vec<String> = room
            .nodes
            .iter()
            .map(|&n| format!("{}:{}", n, graph.node_type(n)))
            .collect();
        println!(
            "{:<5} {:<12} {:>9} {:>5} {:<6} {:<6} {:<10} {}",
            room.id.to_string(),
            room.prefab,
            format!("{},{}", room.x, room.y),
            format!("{}x{}", room.width, room.height),
            parent,
            via,
            room.connection.to_string(),
            nodes.join(" ")
        );
    }
    let special: Vec<String> = level
        .special_rooms
        .iter()
        .flatten()
        .map(|r| r.to_string())
        .collect();
    if !special.is_empty() {
        println!("special rooms: {}", special.join(" "));
    }
}
