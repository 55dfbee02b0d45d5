//! Grammy Charts - chart-ready aggregates from Grammy nominee datasets
//!
//! A CLI tool and small HTTP service that loads a nominations dataset with
//! an unknown-in-advance schema, resolves which columns play which role,
//! and builds the distribution, evolution, efficiency and marquee views
//! consumed by the charts front-end.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (dataset unavailable, invalid arguments, config, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod server;
mod source;

use analysis::PayloadAssembler;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata, Role};
use source::{load_dataset, DatasetCache, DatasetSource, LoadOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
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

    // Load configuration before logging so the file can set verbosity
    let (mut config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("Grammy Charts v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_origin);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .grammy-charts.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the source, palette, keywords, and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the selected mode.
async fn run(args: Args, config: Config) -> Result<()> {
    let source = DatasetSource::parse(&config.source.location)
        .with_context(|| format!("Invalid dataset source: {}", config.source.location))?;
    let show_progress = !args.quiet && !args.serve && config.general.output != "-";
    let options = LoadOptions::from(&config.source).with_progress(show_progress);
    let assembler = PayloadAssembler::from_config(&config);

    if args.serve {
        return run_server(&config, source, options, assembler).await;
    }

    if args.dry_run {
        return handle_dry_run(&source, &options, &assembler).await;
    }

    generate_payload(&args, &config, source, options, assembler).await
}

/// Default mode: build the payload once and write it out.
async fn generate_payload(
    args: &Args,
    config: &Config,
    source: DatasetSource,
    options: LoadOptions,
    assembler: PayloadAssembler,
) -> Result<()> {
    let start_time = Instant::now();
    let output_path = PathBuf::from(&config.general.output);
    let to_stdout = output_path.as_os_str() == "-";

    if !to_stdout && !args.quiet {
        println!("📥 Loading dataset: {}", source);
    }
    let dataset = load_dataset(&source, &options)
        .await
        .with_context(|| format!("Dataset unavailable: {}", source))?;

    if dataset.is_empty() {
        warn!("Dataset {} has no rows, every chart will be empty", source);
    }

    if !to_stdout && !args.quiet {
        println!("📊 Building payload from {} rows...", dataset.row_count());
    }
    let payload = tokio::task::spawn_blocking(move || assembler.assemble(&dataset))
        .await
        .context("Payload assembly task failed")?;

    for section in &payload.meta.degraded {
        warn!("Section {} was replaced by its empty shape", section);
    }

    let report = Report {
        metadata: ReportMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        payload,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_payload(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    report::write_output(&output, &output_path)
        .with_context(|| format!("Failed to write payload to {}", output_path.display()))?;

    if to_stdout || args.quiet {
        return Ok(());
    }

    let payload = &report.payload;
    println!("\n📊 Payload Summary:");
    println!("   Rows: {}", payload.meta.row_count);
    println!("   Years: {}", payload.meta.year_range);
    println!("   Categories: {}", payload.polar.labels.len());
    println!("   Entities: {}", payload.scatter.points.len());
    if payload.big4.is_placeholder() {
        println!("   Marquee winners: none");
    } else {
        println!("   Marquee winners: {}", payload.big4.labels.len());
    }
    if !payload.meta.degraded.is_empty() {
        println!("   ⚠️  Degraded: {}", payload.meta.degraded.join(", "));
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!("\n✅ Payload saved to: {}", output_path.display());

    Ok(())
}

/// Handle --dry-run: load the dataset, show the resolved columns, exit.
async fn handle_dry_run(
    source: &DatasetSource,
    options: &LoadOptions,
    assembler: &PayloadAssembler,
) -> Result<()> {
    println!("\n🔍 Dry run: loading {} (no payload is built)...\n", source);

    let dataset = load_dataset(source, options)
        .await
        .with_context(|| format!("Dataset unavailable: {}", source))?;
    let roles = assembler.resolver().resolve(dataset.columns());

    println!("   Rows: {}", dataset.row_count());
    println!("   Columns ({}):", dataset.columns().len());
    for column in dataset.columns() {
        println!("     📄 {}", column);
    }

    println!("\n   Resolved roles:");
    for role in Role::ALL {
        println!(
            "     {:<9} → {}",
            role.to_string(),
            roles.get(role).unwrap_or("(unresolved)")
        );
    }
    if let Some(ref award) = roles.award {
        println!("     {:<9} → {}", "award", award);
    }

    println!("\n✅ Dry run complete.");
    Ok(())
}

/// Handle --serve: run the HTTP layer until stopped.
async fn run_server(
    config: &Config,
    source: DatasetSource,
    options: LoadOptions,
    assembler: PayloadAssembler,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address: {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let cache = DatasetCache::new(source, options, assembler.resolver().clone());
    server::serve(addr, server::AppState::new(cache, assembler)).await
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so it returns a description of where the
/// configuration came from instead of logging it.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, CONFIG_FILE_NAME.to_string())),
        Ok(None) => Ok((Config::default(), "defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}. Using defaults.", e);
            Ok((Config::default(), "defaults".to_string()))
        }
    }
}
