use std::{path::Path, sync::Arc, time::Duration};

use axum::{Router, http::HeaderValue};
use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use http::{HeaderMap, Uri, header::USER_AGENT};
use serde::Serialize;
use showroom_guard::{
    adapters::{FileConfigProvider, GuardState, with_guard},
    config::{GuardConfig, GuardConfigValidator, loader::load_config},
    core::{RequestClassifier, RequestDescriptor, Verdict},
    ports::ConfigProvider,
    tracing_setup,
    utils::{GracefulShutdown, graceful_shutdown::ShutdownReason},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "guard.toml")]
    config: String,

    /// Human-readable logs instead of JSON
    #[clap(long)]
    console_log: bool,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        #[clap(short, long, default_value = "guard.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        #[clap(short, long, default_value = "guard.toml")]
        config: String,
    },
    /// Start the guarded site server (default)
    Serve {
        #[clap(short, long, default_value = "guard.toml")]
        config: String,
    },
    /// Classify a single request target offline
    Classify {
        /// Configuration file; shipped defaults are used when omitted
        #[clap(short, long)]
        config: Option<String>,
        /// Request target, e.g. "/search?q=suv"
        target: String,
        #[clap(short, long)]
        user_agent: Option<String>,
        /// Print the verdict as JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Classify {
            config,
            target,
            user_agent,
            json,
        }) => classify_command(config.as_deref(), &target, user_agent.as_deref(), json).await,
        Some(Commands::Serve { config }) => serve(&config, args.console_log).await,
        None => serve(&args.config, args.console_log).await,
    }
}

async fn serve(config_path: &str, console_log: bool) -> Result<()> {
    if console_log {
        tracing_setup::init_console_tracing()?;
    } else {
        tracing_setup::init_tracing()?;
    }

    tracing::info!("Loading initial configuration from {config_path}");

    let config_provider: Arc<dyn ConfigProvider> = Arc::new(
        FileConfigProvider::new(config_path).context("Failed to create config provider")?,
    );

    let config = config_provider
        .load_config()
        .await
        .with_context(|| format!("Failed to load initial config from {config_path}"))?;
    GuardConfigValidator::validate(&config).map_err(|e| eyre!("{e}"))?;

    let state = GuardState::from_config(&config).context("Failed to build request classifier")?;
    log_rule_sets(&config);

    spawn_config_watcher(config_provider.clone(), state.clone(), config_path.to_string());

    let shutdown = Arc::new(GracefulShutdown::new());
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signal_shutdown.run_signal_handler().await;
    });

    let site = Router::new().fallback_service(ServeDir::new(&config.site_root));
    let app = with_guard(site, state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        site_root = %config.site_root,
        "Request guard listening"
    );

    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_shutdown.wait_for_shutdown_signal().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return result
                .context("Server task panicked")?
                .context("Server error");
        }
        _ = shutdown.wait_for_shutdown_signal() => {}
    }

    let reason = shutdown
        .drain(async move {
            match server.await {
                Ok(Err(e)) => tracing::error!("Server error during shutdown: {}", e),
                Err(e) => tracing::error!("Server task failed during shutdown: {}", e),
                Ok(Ok(())) => {}
            }
        })
        .await;

    match reason {
        ShutdownReason::Graceful => tracing::info!("Server stopped gracefully"),
        ShutdownReason::Force => tracing::warn!("Server stopped with requests still in flight"),
    }
    Ok(())
}

fn log_rule_sets(config: &GuardConfig) {
    tracing::info!(
        enabled = config.enabled,
        malicious = config.malicious.enabled,
        size_limit = config.size_limit.enabled,
        max_length = config.size_limit.max_length,
        sensitive_paths = config.sensitive_paths.enabled,
        bot_blocklist = config.bot_blocklist.enabled,
        "Rule sets configured"
    );
}

fn spawn_config_watcher(provider: Arc<dyn ConfigProvider>, state: GuardState, config_path: String) {
    let debounce_duration = Duration::from_secs(2);
    let mut notify_rx = provider.watch();

    tokio::spawn(async move {
        tracing::info!("Config watcher task started.");
        let mut last_reload_attempt_time = tokio::time::Instant::now();
        last_reload_attempt_time = last_reload_attempt_time
            .checked_sub(debounce_duration)
            .unwrap_or(last_reload_attempt_time);

        while notify_rx.recv().await.is_some() {
            if last_reload_attempt_time.elapsed() < debounce_duration {
                tracing::info!("Debouncing config reload event. Still within cooldown period.");
                while notify_rx.try_recv().is_ok() {}
                continue;
            }
            last_reload_attempt_time = tokio::time::Instant::now();

            tracing::info!("Attempting to reload configuration from {}", config_path);

            let reloaded = match provider.load_config().await {
                Ok(config) => GuardConfigValidator::validate(&config)
                    .map_err(|e| eyre!("{e}"))
                    .and_then(|()| state.reload(&config).map_err(|e| eyre!("{e}")))
                    .map(|()| config),
                Err(e) => Err(e),
            };

            match reloaded {
                Ok(config) => {
                    tracing::info!("Configuration reloaded; classifier swapped.");
                    log_rule_sets(&config);
                }
                Err(e) => tracing::error!(
                    "Failed to reload configuration: {}. Keeping old configuration.",
                    e
                ),
            }
            while notify_rx.try_recv().is_ok() {}
        }
        tracing::info!("Config watcher task is shutting down.");
    });
}

#[derive(Serialize)]
struct ClassifyReport<'a> {
    target: &'a str,
    verdict: &'static str,
    status: u16,
    rule_set: Option<&'static str>,
    signature: Option<String>,
}

async fn classify_command(
    config_path: Option<&str>,
    target: &str,
    user_agent: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config(path).await?,
        None => GuardConfig::default(),
    };
    let classifier = RequestClassifier::from_config(&config)?;

    let uri: Uri = target
        .parse()
        .with_context(|| format!("Invalid request target '{target}'"))?;
    let mut headers = HeaderMap::new();
    if let Some(user_agent) = user_agent {
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).context("Invalid user-agent")?,
        );
    }
    let descriptor = RequestDescriptor::from_uri(&uri, &headers);

    let violation = classifier.evaluate(&descriptor);
    let verdict = classifier.classify(&descriptor);
    let report = ClassifyReport {
        target,
        verdict: match verdict {
            Verdict::Allow { .. } => "allow",
            Verdict::Reject(_) => "reject",
        },
        status: verdict.status().as_u16(),
        rule_set: violation.as_ref().map(|v| v.rule_set.as_str()),
        signature: violation.map(|v| v.signature),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match (&report.rule_set, &report.signature) {
            (Some(rule_set), Some(signature)) => println!(
                "{} {} ({}: {})",
                report.verdict, report.status, rule_set, signature
            ),
            _ => println!("{} {}", report.verdict, report.status),
        }
    }
    Ok(())
}

async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = GuardConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = RequestClassifier::from_config(&config) {
        eprintln!("❌ Rule catalog compilation failed:");
        eprintln!("   {e}");
        std::process::exit(1);
    }

    println!("✅ Configuration validation: OK");
    println!();
    println!("📋 Configuration Summary:");
    println!("   • Listen Address: {}", config.listen_addr);
    println!("   • Site Root: {}", config.site_root);
    println!("   • Guard Enabled: {}", config.enabled);
    println!("   • Malicious Patterns: {}", config.malicious.enabled);
    println!(
        "   • Size Limit: {} ({} bytes)",
        config.size_limit.enabled, config.size_limit.max_length
    );
    println!("   • Sensitive Paths: {}", config.sensitive_paths.enabled);
    println!("   • Bot Blocklist: {}", config.bot_blocklist.enabled);
    println!();
    println!("🎉 Configuration is valid and ready to use!");
    Ok(())
}

async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Request guard configuration

# The address to listen on
listen_addr = "127.0.0.1:3000"

# Directory served to requests that pass the guard
site_root = "./public"

# Characters of a rejected path/query kept in log lines
log_truncate_chars = 100

# Path + query signatures -> 400
[malicious]
enabled = true
# patterns = []          # replaces the shipped catalog when set
# extra_patterns = []    # appended to the catalog

# Path + query longer than max_length bytes -> 414
[size_limit]
enabled = true
max_length = 2048

# Path-only probe signatures -> 404
[sensitive_paths]
enabled = true
# extra_patterns = ["^/staging"]

# user-agent substrings -> 403 (observe before enabling)
[bot_blocklist]
enabled = false
# extra_identifiers = ["lotscraper"]

[headers]
tracking_header = "x-request-id"
content_type_options = "nosniff"

# Requests matching these skip the guard entirely
[exclusions]
prefixes = ["/_next/static", "/_next/image", "/favicon.ico"]
extensions = ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'showroom-guard serve --config {config_path}' to start the server");
    Ok(())
}
