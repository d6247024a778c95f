use anyhow::Result;
use clap::Parser;
use fitmirror::camera::CameraSourceBuilder;
use fitmirror::config::DEFAULT_PRODUCT_IMAGE;
use fitmirror::keyboard::CloseKeyHandler;
use fitmirror::pose::{HttpPoseBackend, LibraryCache};
use fitmirror::{Product, SessionController, SessionState, SessionStatus, TryOnConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "fitmirror")]
#[command(about = "Live camera try-on preview with a pose-aligned garment overlay")]
#[command(version)]
#[command(long_about = "Opens the front camera, shows a mirrored live view and draws the selected \
garment over it. When a pose model is available the garment follows the shoulders; otherwise \
a static overlay is centered on the frame.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fitmirror.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Product image to try on (URL or file path)
    #[arg(long, value_name = "URL", help = "Product image URL or file path")]
    product_image: Option<String>,

    /// Alternate image used when the product image fails to load
    #[arg(long, value_name = "URL", help = "Alternate product image URL or file path")]
    alt_image: Option<String>,

    /// Product display name
    #[arg(long, default_value = "Product", help = "Product name shown in logs")]
    product_name: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without opening the camera")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - build the session but don't start it
    #[arg(long, help = "Build camera, garment and pose components without starting a session")]
    dry_run: bool,

    /// Don't listen for close keys on the terminal
    #[arg(long, help = "Disable the q/Esc close keys (signals still close the session)")]
    no_keyboard: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting fitmirror v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match TryOnConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match config.validate() {
        Ok(()) if args.validate_config => {
            info!("Configuration validation successful");
            println!("✓ Configuration is valid");
            return Ok(());
        }
        Ok(()) => {}
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    }

    let product = build_product(&args);

    let camera_source = CameraSourceBuilder::new()
        .config(config.camera.clone())
        .build()
        .map_err(|e| {
            error!("Failed to create camera source: {}", e);
            e
        })?;
    let pose_backend = Arc::new(HttpPoseBackend::new(config.pose.clone()));

    let session = Arc::new(
        SessionController::new(config, camera_source, pose_backend, LibraryCache::global())
            .map_err(|e| {
                error!("Failed to create session: {}", e);
                e
            })?,
    );

    if args.dry_run {
        info!("Dry run mode - session built but not started");
        println!("✓ Dry run completed successfully - session components built");
        return Ok(());
    }

    let close_requested = CancellationToken::new();
    setup_signal_handlers(close_requested.clone());

    let keyboard = if args.no_keyboard {
        None
    } else {
        let handler = CloseKeyHandler::new(close_requested.clone());
        handler.start().await?;
        Some(handler)
    };

    // Every close path (keys, signals) funnels into one session.close()
    let closer = {
        let session = Arc::clone(&session);
        let close_requested = close_requested.clone();
        tokio::spawn(async move {
            close_requested.cancelled().await;
            session.close().await;
        })
    };

    let status_reporter = spawn_status_reporter(Arc::clone(&session));

    let exit_code = match session.start(product).await {
        Ok(()) => {
            let state = session.wait_finished().await;
            exit_code_for(&state)
        }
        Err(e) => {
            error!("Try-on session could not start: {}", e);
            eprintln!("✗ {}", e);
            1
        }
    };

    if awaits_close_key(keyboard.is_some(), &session.state()) {
        eprintln!("Press q or Esc to close");
    } else {
        close_requested.cancel();
    }
    if let Err(e) = closer.await {
        warn!("Close task ended abnormally: {}", e);
    }
    status_reporter.abort();

    if let Some(handler) = keyboard {
        handler.stop().await?;
    }

    if let Some(stats) = session.render_stats() {
        info!(
            "Rendered {} frames ({} tracked, {} static), {} skipped, {} estimation errors",
            stats.frames_rendered,
            stats.aligned_frames,
            stats.fallback_frames,
            stats.frames_skipped,
            stats.estimation_errors
        );
    }

    info!("fitmirror exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn build_product(args: &Args) -> Product {
    let image = args
        .product_image
        .clone()
        .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string());
    let mut product = Product::new("cli", args.product_name.clone(), image);
    if let Some(alt) = &args.alt_image {
        product = product.with_alt_image(alt.clone());
    }
    product
}

/// Only a failed session stays on screen for the user to dismiss; one
/// that never acquired anything exits right away.
fn awaits_close_key(keyboard_enabled: bool, state: &SessionState) -> bool {
    keyboard_enabled && matches!(state, SessionState::Failed(_))
}

fn exit_code_for(state: &SessionState) -> i32 {
    match state {
        SessionState::Failed(_) => 1,
        _ => 0,
    }
}

/// Log the status badge whenever it changes
fn spawn_status_reporter(session: Arc<SessionController>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(500));
        let mut last: Option<SessionStatus> = None;
        loop {
            interval.tick().await;
            let status = session.status();
            if last.as_ref() != Some(&status) {
                match &status {
                    SessionStatus::Error(message) => error!("Status: {}", message),
                    other => info!("Status: {}", other),
                }
                last = Some(status);
            }
        }
    })
}

/// SIGINT and SIGTERM request a close like the close keys do
fn setup_signal_handlers(close_requested: CancellationToken) {
    #[cfg(unix)]
    {
        let close_requested = close_requested.clone();
        tokio::spawn(async move {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    if sigterm.recv().await.is_some() {
                        info!("Received SIGTERM signal");
                        close_requested.cancel();
                    }
                }
                Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
            }
        });
    }

    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            close_requested.cancel();
        }
    });
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fitmirror={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# fitmirror configuration file");
    println!("# Every key is optional; FITMIRROR_<SECTION>__<KEY> environment variables override it");
    println!();
    println!("{}", toml::to_string_pretty(&TryOnConfig::default())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitmirror::{CameraError, SessionError};

    #[test]
    fn test_close_key_wait_only_after_failure() {
        let failed = SessionState::Failed(SessionError::Camera(CameraError::PermissionDenied));
        assert!(awaits_close_key(true, &failed));
        assert!(!awaits_close_key(false, &failed));

        // rejected product: nothing was acquired
        assert!(!awaits_close_key(true, &SessionState::Idle));
        assert!(!awaits_close_key(true, &SessionState::Closed));
    }

    #[test]
    fn test_exit_codes() {
        let failed = SessionState::Failed(SessionError::NotLive);
        assert_eq!(exit_code_for(&failed), 1);
        assert_eq!(exit_code_for(&SessionState::Closed), 0);
    }
}
