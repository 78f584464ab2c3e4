//! MediForge - mock multi-agent medical AI cascade
//!
//! A CLI tool that runs a roster of agents over a symptom description,
//! adds a generated summary and a retrieved evidence snippet, and renders
//! the result as a report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, output file, etc.)
//!   2 - Primary agent not ready, no report produced

mod cascade;
mod cli;
mod config;
mod error;
mod inference;
mod models;
mod registry;
mod report;
mod retrieval;
mod session;
mod source;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use cascade::{Cascade, CascadeOptions};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::CascadeError;
use inference::{AgentInference, HttpInference, HuggingFaceGenerator, Unavailable};
use session::Session;
use source::{http_client, ResourceSource};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("MediForge v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .mediforge.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your registry, inference service and retrieval data.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the session, run the cascade and write the report. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the session state
    let fetch_client = http_client(config.registry.timeout_seconds)
        .context("Failed to create HTTP client")?;
    let registry_source = ResourceSource::parse(&config.registry.source);
    let retrieval_source = config
        .retrieval
        .enabled
        .then(|| ResourceSource::parse(&config.retrieval.source));

    let session = Session::start(
        &registry_source,
        retrieval_source.as_ref(),
        config.registry.fallback_size,
        &fetch_client,
    )
    .await;

    if session.used_fallback {
        warn!("Agent registry unavailable; using {} fallback agents", session.registry.len());
    }

    if args.dry_run {
        return Ok(handle_dry_run(&session));
    }

    // Step 2: Wire the backends
    let inference: Arc<dyn AgentInference> = match config.inference.endpoint {
        Some(ref endpoint) => {
            let client = http_client(config.inference.timeout_seconds)
                .context("Failed to create HTTP client")?;
            Arc::new(HttpInference::new(
                endpoint.clone(),
                client,
                config.inference.timeout_seconds,
            ))
        }
        None => {
            info!("No inference endpoint configured; agents will use placeholder results");
            Arc::new(Unavailable)
        }
    };

    let summary_client = http_client(config.summary.timeout_seconds)
        .context("Failed to create HTTP client")?;
    let generator = Arc::new(HuggingFaceGenerator::new(
        config.summary.endpoint.clone(),
        config.summary.token.clone(),
        summary_client,
        config.summary.timeout_seconds,
    ));

    println!("🤖 Initializing cascade...");
    println!(
        "   Inference: {}",
        config.inference.endpoint.as_deref().unwrap_or("placeholder only")
    );
    if generator.has_credential() {
        println!("   Summary: {}", config.summary.endpoint);
    } else {
        println!("   Summary: offline (no token)");
    }
    println!("   Timeout: {}s", config.inference.timeout_seconds);

    let cascade = Cascade::new(
        inference,
        generator,
        CascadeOptions {
            concurrency: config.inference.concurrency,
            timeout_seconds: config.inference.timeout_seconds,
            summary_timeout_seconds: config.summary.timeout_seconds,
            show_progress: !args.quiet,
        },
    );

    // Step 3: Run the cascade
    println!("🔬 Running cascade over {} agents...", session.registry.len());
    let report = match session.run(&cascade, args.input_text()).await {
        Ok(report) => report,
        Err(e @ CascadeError::AgentNotReady(_)) => {
            error!("{}", e);
            eprintln!("\n⏳ {}", e);
            return Ok(2);
        }
    };

    // Step 4: Generate and save the report
    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Html => report::generate_html_report(&report),
    };

    let output_path = std::path::PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let duration = start_time.elapsed().as_secs_f64();

    // Print summary
    println!("\n📊 Cascade Summary:");
    println!("   Agents: {}", report.agents.len());
    println!(
        "   Placeholder results: {}",
        report.metadata.placeholder_results
    );
    println!("   Summary: {}", report.summary);
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(0)
}

/// Handle --dry-run: print what a cascade would run, exit.
fn handle_dry_run(session: &Session) -> i32 {
    println!("\n🔍 Dry run: no inference calls will be made.\n");

    for agent in session.registry.iter() {
        let status = if agent.ready { "ready" } else { "not ready" };
        match agent.description {
            Some(ref description) => {
                println!("   🤖 {:>3} {} ({}) - {}", agent.id, agent.name, status, description)
            }
            None => println!("   🤖 {:>3} {} ({})", agent.id, agent.name, status),
        }
    }

    println!("\n   Total: {} agents", session.registry.len());
    match session.retrieval {
        Some(ref index) => println!("   Retrieval records: {}", index.len()),
        None => println!("   Retrieval records: none (default snippet only)"),
    }

    println!("\n✅ Dry run complete.");
    0
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
