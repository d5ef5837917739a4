//! chat-relay e2e test runner
//!
//! Default (no args): finds the relay binary, spawns one relay per service
//! mode against a mock provider, runs all tests, kills them.
//!
//!   cargo run                          # auto-detect relay binary, run all tests
//!   cargo run -- list                  # list all tests
//!   cargo run -- run                   # connect to already-running relays
//!   cargo run -- spawn-and-run [opts]  # explicit binary / config directory

mod backend;
mod client;
mod runner;
mod tests;
mod types;

use clap::{Parser, Subcommand};
use colored::Colorize;
use runner::{list_tests, run_tests, TestContext};
use tests::all_tests;

/// Default relay binary candidates, tried in order
const DEFAULT_RELAY_BINS: &[&str] = &["../target/release/chat-relay", "../target/debug/chat-relay"];

const DEFAULT_CONFIG_DIR: &str = "test_configs";
const DEFAULT_BACKEND_PORT: u16 = 18080;
const DEFAULT_GRAPH_ADDR: &str = "127.0.0.1:18066";
const DEFAULT_DIRECT_ADDR: &str = "127.0.0.1:18067";
const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:18068";

/// Config file per mode; the graph relay starts first because the bridge talks to it
const MODE_CONFIGS: &[(&str, &str)] = &[
    ("graph", "graph.yaml"),
    ("direct", "direct.yaml"),
    ("bridge", "bridge.yaml"),
];

#[derive(Parser)]
#[command(
    name = "e2e",
    about = "End-to-end tests for chat-relay",
    long_about = "Runs all e2e tests by default (no arguments needed).\n\
                  Spawns one relay per service mode, runs tests, then kills them."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Only run tests whose name contains this string (applies to default run)
    #[arg(long, short, global = true)]
    filter: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to already-running relays and run tests
    Run {
        /// Address of the graph-mode relay
        #[arg(long, default_value = DEFAULT_GRAPH_ADDR)]
        graph_addr: String,

        /// Address of the direct-mode relay
        #[arg(long, default_value = DEFAULT_DIRECT_ADDR)]
        direct_addr: String,

        /// Address of the bridge-mode relay
        #[arg(long, default_value = DEFAULT_BRIDGE_ADDR)]
        bridge_addr: String,

        /// Port for the mock provider - must not conflict with real services
        #[arg(long, default_value_t = DEFAULT_BACKEND_PORT)]
        backend_port: u16,

        /// Only run tests whose name contains this string
        #[arg(long, short)]
        filter: Option<String>,
    },

    /// List all available tests
    List,

    /// Spawn the relays, run all tests, then kill them
    SpawnAndRun {
        /// Path to the chat-relay binary
        #[arg(long)]
        relay_bin: Option<String>,

        /// Directory holding graph.yaml, direct.yaml and bridge.yaml
        #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
        config_dir: String,

        /// Port for the mock provider - must match the configs
        #[arg(long, default_value_t = DEFAULT_BACKEND_PORT)]
        backend_port: u16,

        /// Only run tests whose name contains this string
        #[arg(long, short)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // ── No subcommand: default full run ──────────────────────────────────
        None => {
            let relay_bin = find_relay_bin()?;
            do_spawn_and_run(relay_bin, DEFAULT_CONFIG_DIR.to_string(), DEFAULT_BACKEND_PORT, cli.filter).await?;
        }

        // ── list ─────────────────────────────────────────────────────────────
        Some(Command::List) => {
            list_tests(&all_tests());
        }

        // ── run (connect to existing relays) ──────────────────────────────────
        Some(Command::Run {
            graph_addr,
            direct_addr,
            bridge_addr,
            backend_port,
            filter,
        }) => {
            let filter = filter.or(cli.filter);
            println!("Starting mock provider on port {}...", backend_port);
            let backend_state = backend::start(backend_port).await?;
            println!("Mock provider running on 127.0.0.1:{}", backend_port);

            let ctx = TestContext {
                graph_addr,
                direct_addr,
                bridge_addr,
                backend_state,
                http_client: client::build_client(),
            };

            let results = run_tests(all_tests(), ctx, filter.as_deref()).await;
            exit_on_failure(&results);
        }

        // ── spawn-and-run ─────────────────────────────────────────────────────
        Some(Command::SpawnAndRun {
            relay_bin,
            config_dir,
            backend_port,
            filter,
        }) => {
            let filter = filter.or(cli.filter);
            let relay_bin = match relay_bin {
                Some(p) => p,
                None => find_relay_bin()?,
            };
            do_spawn_and_run(relay_bin, config_dir, backend_port, filter).await?;
        }
    }

    Ok(())
}

/// Shared implementation for spawn-and-run (used by both default and explicit subcommand)
async fn do_spawn_and_run(
    relay_bin: String,
    config_dir: String,
    backend_port: u16,
    filter: Option<String>,
) -> anyhow::Result<()> {
    println!("Starting mock provider on port {}...", backend_port);
    let backend_state = backend::start(backend_port).await?;
    println!("Mock provider running on 127.0.0.1:{}", backend_port);

    let addrs = [DEFAULT_GRAPH_ADDR, DEFAULT_DIRECT_ADDR, DEFAULT_BRIDGE_ADDR];
    let mut relays = Vec::new();
    for ((mode, file), addr) in MODE_CONFIGS.iter().zip(addrs) {
        let config_path = format!("{}/{}", config_dir, file);
        println!("Spawning {} relay: {} run --config {}", mode.bright_cyan(), relay_bin, config_path);
        let process = tokio::process::Command::new(&relay_bin)
            .arg("run")
            .arg("--config")
            .arg(&config_path)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn '{}': {}", relay_bin, e))?;
        relays.push(process);

        println!("Waiting for {} relay at {}...", mode, addr);
        wait_for_relay(addr).await?;
    }
    println!("Relays are ready!\n");

    let ctx = TestContext {
        graph_addr: DEFAULT_GRAPH_ADDR.to_string(),
        direct_addr: DEFAULT_DIRECT_ADDR.to_string(),
        bridge_addr: DEFAULT_BRIDGE_ADDR.to_string(),
        backend_state,
        http_client: client::build_client(),
    };

    let results = run_tests(all_tests(), ctx, filter.as_deref()).await;

    for relay in &mut relays {
        relay.kill().await.ok();
    }

    exit_on_failure(&results);
    Ok(())
}

/// Find the relay binary, trying release then debug builds
fn find_relay_bin() -> anyhow::Result<String> {
    for candidate in DEFAULT_RELAY_BINS {
        if std::path::Path::new(candidate).exists() {
            println!("Using relay binary: {}", candidate.bright_cyan());
            return Ok(candidate.to_string());
        }
    }
    Err(anyhow::anyhow!(
        "No relay binary found. Tried: {}\nBuild with: cd .. && cargo build --release",
        DEFAULT_RELAY_BINS.join(", ")
    ))
}

/// Exit with code 1 if any tests failed
fn exit_on_failure(results: &[crate::types::TestResult]) {
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }
}

/// Wait for a relay to start accepting connections (retry with backoff)
async fn wait_for_relay(addr: &str) -> anyhow::Result<()> {
    let client = client::build_client();
    let health_url = format!("http://{}/health", addr);

    for attempt in 0..30 {
        tokio::time::sleep(tokio::time::Duration::from_millis(200 + attempt * 100)).await;
        if client.get(&health_url).send().await.is_ok() {
            return Ok(());
        }
    }

    Err(anyhow::anyhow!(
        "Relay did not start within timeout. Is the binary correct? Check: {}",
        addr
    ))
}
