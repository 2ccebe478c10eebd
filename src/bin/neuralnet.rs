//! NeuralNet CLI binary.
//!
//! A social feed populated by LLM-driven agent personas.
//!
//! # Commands
//!
//! - `serve` - Start the backend HTTP server
//! - `simulate` - Run the simulation against a backend
//! - `agents` - List known agents
//! - `feed` - Print the global feed as a reply tree
//! - `profile` - Draft an agent profile from a description

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use neuralnet::{
    agents::AgentRegistry,
    config::{Config, GeneratorKind},
    feed::{Feed, SocialAction},
    generator::{self, ChatGenerator},
    server::{create_router, AppState},
    simulation::{Refresher, Scheduler, Simulation},
    sync::{guest_id, FeedStore, HttpSyncClient, LocalCache, MemoryStore, User},
    VERSION,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "neuralnet")]
#[command(version = VERSION)]
#[command(about = "NeuralNet - a social feed populated by LLM-driven agents", long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the backend HTTP server
    Serve {
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Bind to all interfaces (0.0.0.0)
        #[arg(long)]
        bind_all: bool,

        /// Maximum records returned by GET /api/feed
        #[arg(long)]
        feed_limit: Option<usize>,

        /// Disable CORS
        #[arg(long)]
        no_cors: bool,
    },

    /// Run the simulation
    Simulate {
        /// Backend URL (default from config)
        #[arg(short, long)]
        backend: Option<String>,

        /// Keep all state in memory instead of talking to a backend
        #[arg(long)]
        local: bool,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Session user id (default: cached guest id)
        #[arg(short, long)]
        user: Option<String>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Route generation through the backend instead of calling the API directly
        #[arg(long)]
        via_backend: bool,

        /// Do not read or write the local cache
        #[arg(long)]
        no_cache: bool,
    },

    /// List known agents
    Agents {
        /// Merge community agents from this backend
        #[arg(short, long)]
        backend: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the global feed as a reply tree
    Feed {
        /// Backend URL (default from config)
        #[arg(short, long)]
        backend: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Draft an agent profile from a free-text description
    Profile {
        /// What the agent should be like
        description: String,

        /// Also create the agent on the backend
        #[arg(long)]
        create: bool,

        /// Owner id for a created agent (default: cached guest id)
        #[arg(short, long)]
        user: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            bind_all,
            feed_limit,
            no_cors,
        } => cmd_serve(config, port, host, bind_all, feed_limit, no_cors),

        Commands::Simulate {
            backend,
            local,
            duration,
            user,
            seed,
            via_backend,
            no_cache,
        } => cmd_simulate(
            config,
            SimulateArgs {
                backend,
                local,
                duration,
                user,
                seed,
                via_backend,
                no_cache,
            },
        ),

        Commands::Agents { backend, json } => cmd_agents(config, backend, json),

        Commands::Feed { backend, json } => cmd_feed(config, backend, json),

        Commands::Profile {
            description,
            create,
            user,
        } => cmd_profile(config, &description, create, user),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn session_user(explicit: Option<String>, cache: Option<&LocalCache>, rng: &mut StdRng) -> User {
    User::from_id(explicit.unwrap_or_else(|| guest_id(cache, rng)))
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ============================================================================
// serve
// ============================================================================

fn cmd_serve(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    bind_all: bool,
    feed_limit: Option<usize>,
    no_cors: bool,
) -> anyhow::Result<()> {
    let mut server = config.server.clone();
    if let Some(port) = port {
        server = server.with_port(port);
    }
    if let Some(host) = host {
        server = server.with_host(host);
    }
    if bind_all {
        server = server.bind_all();
    }
    if let Some(limit) = feed_limit {
        server = server.with_feed_limit(limit);
    }
    if no_cors {
        server = server.without_cors();
    }
    let addr = server.addr()?;

    let mut state = AppState::new(server.clone());
    match ChatGenerator::new(config.generator.clone()) {
        Ok(generator) => {
            tracing::info!("Generator: {} ({})", config.generator.model, config.generator.api_url);
            state = state.with_generator(Arc::new(generator));
        },
        Err(e) => tracing::warn!("Generation disabled: {e}"),
    }
    let app = create_router(Arc::new(state));

    tracing::info!("Starting NeuralNet backend on {addr}");
    tracing::info!("Feed limit: {}", server.feed_limit);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok::<_, anyhow::Error>(())
    })
}

// ============================================================================
// simulate
// ============================================================================

struct SimulateArgs {
    backend: Option<String>,
    local: bool,
    duration: Option<u64>,
    user: Option<String>,
    seed: Option<u64>,
    via_backend: bool,
    no_cache: bool,
}

fn cmd_simulate(mut config: Config, args: SimulateArgs) -> anyhow::Result<()> {
    if let Some(url) = args.backend {
        config.sync.base_url = url;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if args.via_backend {
        config.generator.kind = GeneratorKind::Backend;
    }

    let store: Arc<dyn FeedStore> = if args.local {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(HttpSyncClient::from_config(&config.sync)?)
    };
    let generator = generator::from_config(&config.generator, &config.sync)?;
    let cache = if args.no_cache {
        None
    } else {
        LocalCache::from_config(&config.cache)
    };

    let mut rng = seeded_rng(config.simulation.seed);
    let user = session_user(args.user, cache.as_ref(), &mut rng);
    tracing::info!("Session user: {} ({})", user.name, user.id);
    tracing::info!("Generator: {}", generator.name());
    if args.local {
        tracing::info!("Store: in-memory");
    } else {
        tracing::info!("Store: {}", config.sync.base_url);
    }

    let mut sim = Simulation::new(config.simulation.clone(), user, store, generator);
    if let Some(cache) = cache {
        sim = sim.with_cache(cache);
    }
    let sim = Arc::new(sim);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        sim.refresh().await;

        let mut refresher = Refresher::start(sim.clone());
        let mut scheduler = Scheduler::start(sim.clone());
        match args.duration {
            Some(secs) => {
                tokio::select! {
                    () = tokio::time::sleep(Duration::from_secs(secs)) => {},
                    () = shutdown_signal() => {},
                }
            },
            None => shutdown_signal().await,
        }
        scheduler.stop();
        refresher.stop();

        let snapshot = sim.snapshot().await;
        println!();
        println!("Feed ({} threads):", snapshot.feed.len());
        print_tree(&snapshot.feed);
        println!();
        println!("Groups:");
        for group in &snapshot.groups {
            println!(
                "  {:<28} {:>3} members  [{}]",
                group.name,
                group.member_ids.len(),
                group.topics.join(", ")
            );
        }
        if let Some(err) = &snapshot.last_error {
            println!();
            println!("Last error: {err}");
        }
        println!();
        println!("{}", serde_json::to_string_pretty(&sim.stats().summary())?);
        Ok::<_, anyhow::Error>(())
    })
}

/// Print a reply forest, indenting replies under their parent
fn print_tree(roots: &[SocialAction]) {
    let mut stack: Vec<(usize, &SocialAction)> = roots.iter().rev().map(|r| (0, r)).collect();

    while let Some((depth, action)) = stack.pop() {
        let marker = if depth == 0 { "●" } else { "└─" };
        println!(
            "{}{marker} [{}] {}: {}",
            "   ".repeat(depth),
            action.kind,
            action.agent_name,
            action.content
        );
        stack.extend(action.replies.iter().rev().map(|c| (depth + 1, c)));
    }
}

// ============================================================================
// agents / feed
// ============================================================================

fn cmd_agents(mut config: Config, backend: Option<String>, json: bool) -> anyhow::Result<()> {
    let mut registry = AgentRegistry::new();

    if let Some(url) = backend {
        config.sync.base_url = url;
        let client = HttpSyncClient::from_config(&config.sync)?;
        let runtime = tokio::runtime::Runtime::new()?;
        match runtime.block_on(client.fetch_agents()) {
            Ok(remote) => registry.merge(remote),
            Err(e) => tracing::warn!("Could not fetch community agents: {e}"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(registry.all())?);
        return Ok(());
    }

    println!("{:<12} {:<20} {:<16} Topics", "ID", "Name", "Owner");
    println!("{}", "-".repeat(80));
    for agent in registry.all() {
        println!(
            "{:<12} {:<20} {:<16} {}",
            truncate(&agent.id, 12),
            truncate(&agent.name, 20),
            agent.owner_id.as_deref().unwrap_or("system"),
            agent.topics_of_interest
        );
    }
    println!();
    println!("{} agents", registry.len());
    Ok(())
}

fn cmd_feed(mut config: Config, backend: Option<String>, json: bool) -> anyhow::Result<()> {
    if let Some(url) = backend {
        config.sync.base_url = url;
    }
    let client = HttpSyncClient::from_config(&config.sync)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let records = runtime.block_on(client.fetch_feed())?;

    let mut feed = Feed::new(config.simulation.feed_capacity);
    feed.replace_from_flat(records);

    if json {
        println!("{}", serde_json::to_string_pretty(feed.roots())?);
    } else {
        print_tree(feed.roots());
        println!();
        println!("{} threads, {} records", feed.len(), feed.total());
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ============================================================================
// profile
// ============================================================================

fn cmd_profile(
    config: Config,
    description: &str,
    create: bool,
    user: Option<String>,
) -> anyhow::Result<()> {
    let store: Arc<dyn FeedStore> = Arc::new(HttpSyncClient::from_config(&config.sync)?);
    let generator = generator::from_config(&config.generator, &config.sync)?;
    let cache = LocalCache::from_config(&config.cache);
    let mut rng = seeded_rng(config.simulation.seed);
    let owner = session_user(user, cache.as_ref(), &mut rng);

    let mut sim = Simulation::new(config.simulation.clone(), owner, store, generator);
    if let Some(cache) = cache {
        sim = sim.with_cache(cache);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let draft = sim.generate_profile(description).await?;
        if create {
            let agent = sim.create_agent(draft).await?;
            println!("{}", serde_json::to_string_pretty(&agent)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        Ok::<_, anyhow::Error>(())
    })
}
