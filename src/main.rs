#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, Context, Result};
use orgexplorer::app::explorer::breadcrumbs::trail_text;
use orgexplorer::app::explorer::{ExplorerConfig, ExplorerSession, PaneSide};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "", "orgexplorer")
}

fn init_logging() -> Result<Option<PathBuf>> {
    // To enable: TOKIO_CONSOLE=1 RUSTFLAGS="--cfg tokio_unstable" cargo run
    let use_tokio_console = std::env::var("TOKIO_CONSOLE")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    if use_tokio_console {
        console_subscriber::init();
        eprintln!("tokio-console profiling enabled - connect with: tokio-console");
        eprintln!("NOTE: File logging disabled when using tokio-console");
        return Ok(None);
    }

    let Some(proj_dirs) = project_dirs() else {
        return Ok(None);
    };
    let log_dir = proj_dirs.data_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
    let log_path = log_dir.join("orgexplorer.log");

    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = file.metadata() {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            if let Err(e) = std::fs::set_permissions(&log_path, perms) {
                eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
            }
        }
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => tracing_subscriber::EnvFilter::builder()
            .parse(&directives)
            .with_context(|| format!("Invalid RUST_LOG '{}'", directives))?,
        _ => tracing_subscriber::EnvFilter::builder()
            .parse(orgexplorer::DEFAULT_LOG_FILTER)
            .context("Failed to parse default log filter")?,
    };
    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Must run after the subscriber is installed
    tracing_log::LogTracer::init().context("Failed to initialize log-to-tracing bridge")?;

    orgexplorer::set_tracing_reload_handle(reload_handle);
    tracing::info!("Logging initialized to: {:?}", log_path);
    Ok(Some(log_path))
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let crash_msg = format!(
            "orgexplorer crashed!\n\
             Panic occurred at: {}\n\
             Details: {}\n\
             Backtrace:\n{:?}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
            std::backtrace::Backtrace::force_capture()
        );

        if let Some(proj_dirs) = project_dirs() {
            let log_dir = proj_dirs.data_dir().join("logs");
            let _ = std::fs::create_dir_all(&log_dir);
            let crash_log_path = log_dir.join("crash.log");

            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                use std::io::Write;
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
            }
            eprintln!("\n{}", crash_msg);
            eprintln!("Crash log written to: {:?}", crash_log_path);
        } else {
            eprintln!("\n{}", crash_msg);
        }
    }));
}

/// `--config <path>` is the only recognized argument
fn config_path(args: &[String]) -> Result<Option<PathBuf>> {
    let mut iter = args.iter().skip(1);
    let mut path = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a path"))?;
                path = Some(PathBuf::from(value));
            }
            other => return Err(anyhow!("Unknown argument '{}'", other)),
        }
    }
    Ok(path)
}

async fn print_pane(session: &ExplorerSession, side: PaneSide) {
    let pane = session.pane(side);
    println!("[{}] {}", side, session.title(side).await);
    println!("  {}", trail_text(&session.breadcrumbs(side).await));
    for node in pane.visible_children().await {
        let marker = if node.has_children { "+" } else { " " };
        println!("  {} {} ({})", marker, node.name, node.kind.as_str());
    }
}

fn main() -> Result<()> {
    setup_panic_handler();

    let args: Vec<String> = std::env::args().collect();
    let log_path = init_logging()?;
    tracing::info!("orgexplorer starting, args: {:?}", args);

    let config = ExplorerConfig::load(config_path(&args)?.as_deref())?;
    let session = ExplorerSession::from_config(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        session
            .open()
            .await
            .context("Failed to open explorer session")?;
        print_pane(&session, PaneSide::Left).await;
        print_pane(&session, PaneSide::Right).await;
        Ok::<_, anyhow::Error>(())
    })?;

    if let Some(path) = log_path {
        eprintln!("Log written to {:?}", path);
    }
    Ok(())
}
