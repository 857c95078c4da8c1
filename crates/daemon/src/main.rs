//! menu-mailer daemon entry point.
//!
//! Loads configuration, wires the mailer, notifier and scheduler together,
//! starts the status server and the scheduler loop, and handles graceful
//! shutdown.

mod scheduler;
mod signals;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use menumailer_core::config::{AppConfig, LogFormat};
use menumailer_core::{MenuScheduler, Notifier, SmtpMailer, SystemClock};
use menumailer_web::WebServer;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Daily school menu mailer.
#[derive(Parser, Debug)]
#[command(
    name = "menu-mailer",
    version,
    about = "Emails the day's school menu image and serves a small status API"
)]
struct Args {
    /// Path to an optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Env file loaded into the environment before configuration is read.
    /// Skipped when it does not exist.
    #[arg(long, default_value = "/app/config/app.env")]
    env_file: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_file_loaded = if args.env_file.exists() {
        dotenvy::from_path(&args.env_file)
            .with_context(|| format!("failed to load env file {}", args.env_file.display()))?;
        true
    } else {
        false
    };

    let config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    // Initialize tracing
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);
    init_tracing(log_level, config.daemon.log_format);

    // Startup banner
    info!("========================================");
    info!("  menu-mailer v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    match args.config {
        Some(ref path) => info!("Config file   : {}", path.display()),
        None => info!("Config file   : (none, defaults + environment)"),
    }
    if env_file_loaded {
        info!("Env file      : {}", args.env_file.display());
    }
    info!("Image dir     : {}", config.menu.image_dir.display());
    info!("Scan interval : {}s", config.menu.scan_interval_secs);
    info!(
        "Send time     : {:02}:{:02} {}",
        config.schedule.send_hour, config.schedule.send_minute, config.schedule.timezone
    );
    info!("Skip weekends : {}", config.schedule.skip_weekends);
    info!("Retry window  : {}m", config.schedule.retry_window_minutes);
    info!(
        "SMTP          : {}:{} (tls: {})",
        config.smtp.host, config.smtp.port, config.smtp.use_tls
    );
    info!("From          : {}", config.mail.from);
    info!("Recipients    : {}", config.mail.to.join(", "));
    info!("Web listen    : {}", config.web.listen_addr());
    info!("Log level     : {}", log_level);
    info!("========================================");

    // Wire components
    let mailer = Arc::new(
        SmtpMailer::from_config(&config.smtp, &config.mail)
            .context("failed to initialize SMTP mailer")?,
    );
    let notifier = Arc::new(Notifier::new(
        &config.notifications,
        &config.mail.viewer_base_url,
    ));
    if !notifier.is_configured() {
        info!("ntfy notifications disabled");
    }
    let menu_scheduler = Arc::new(
        MenuScheduler::from_config(&config, mailer, notifier, Arc::new(SystemClock))
            .context("failed to initialize scheduler")?,
    );

    // Start the status server in the background
    let web_server = WebServer::new(menu_scheduler.clone());
    let listen_addr = config.web.listen_addr();
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start(&listen_addr).await {
            error!("status server error: {}", e);
        }
    });

    // Start the scheduler loop in the background
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let loop_shutdown = shutdown.clone();
    let tick_loop = scheduler::TickLoop::new(menu_scheduler, config.menu.scan_interval());
    let scheduler_handle = tokio::spawn(async move {
        tick_loop.run(loop_shutdown).await;
    });

    signals::wait_for_shutdown().await;

    info!("Shutdown signal received, stopping...");

    // A stored permit reaches the loop even if it is mid-tick.
    shutdown.notify_one();

    match tokio::time::timeout(std::time::Duration::from_secs(10), scheduler_handle).await {
        Ok(Ok(())) => info!("scheduler stopped gracefully"),
        Ok(Err(e)) => warn!("scheduler task error: {}", e),
        Err(_) => warn!("scheduler did not stop within 10s, forcing shutdown"),
    }

    web_handle.abort();

    info!("menu-mailer stopped.");
    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
