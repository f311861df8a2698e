use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use colored::Colorize;
use eyre::{Result, WrapErr};

use quoter_client::Settings;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    Layer,
    filter::{EnvFilter, LevelFilter},
    fmt,
    prelude::*,
};

#[cfg(feature = "daemon")]
mod daemon;

#[cfg(feature = "sync")]
mod sync;

mod default_config;
mod quote;
mod transfer;

/// Remove rotated log files older than the retention period.
fn cleanup_old_logs(log_dir: &Path, prefix: &str, retention_days: u64) {
    let cutoff = std::time::SystemTime::now()
        - std::time::Duration::from_secs(retention_days * 24 * 60 * 60);

    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // Match files like "daemon.log.2024-02-23"
        if !name.starts_with(prefix) || name == prefix {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };

        if modified < cutoff {
            let _ = fs::remove_file(&path);
        }
    }
}

/// Show a success banner.
fn notify(message: &str) {
    println!("{}", message.green());
}

/// Show a failure banner.
fn alert(message: &str) {
    eprintln!("{}", message.red().bold());
}

fn console_filter(env_log_set: bool, default: LevelFilter) -> EnvFilter {
    if env_log_set {
        EnvFilter::from_env("QUOTER_LOG")
    } else {
        EnvFilter::default().add_directive(default.into())
    }
}

#[derive(Subcommand, Debug)]
#[command(infer_subcommands = true)]
pub enum QuoterCmd {
    /// Show a random quote
    Random(quote::Random),

    /// Show the last quote shown in this session
    Last,

    /// List every quote
    List(quote::List),

    /// Add a new quote
    Add(quote::Add),

    /// List the categories available for filtering
    Categories,

    /// Export all quotes to a JSON file
    Export(transfer::Export),

    /// Import quotes from a JSON file
    Import(transfer::Import),

    /// Run one sync cycle against the remote now
    #[cfg(feature = "sync")]
    Sync(sync::Cmd),

    /// Run the background daemon, syncing on a timer
    #[cfg(feature = "daemon")]
    Daemon(daemon::Cmd),

    /// Print the default configuration (config.toml)
    #[command()]
    DefaultConfig,
}

impl QuoterCmd {
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("could not start async runtime")?;

        let settings = Settings::new().wrap_err("could not load settings")?;
        let res = runtime.block_on(self.run_inner(settings));

        runtime.shutdown_timeout(std::time::Duration::from_millis(50));

        res
    }

    async fn run_inner(self, settings: Settings) -> Result<()> {
        self.init_logging(&settings)?;

        tracing::trace!(command = ?self, "quoter command");

        if matches!(self, Self::DefaultConfig) {
            default_config::run();
            return Ok(());
        }

        let store = settings.open_store();

        match self {
            Self::Random(cmd) => cmd.run(store),
            Self::Last => quote::last(&store),
            Self::List(cmd) => cmd.run(&store),
            Self::Add(cmd) => cmd.run(store),
            Self::Categories => quote::categories(&store),
            Self::Export(cmd) => cmd.run(&store),
            Self::Import(cmd) => cmd.run(store),

            #[cfg(feature = "sync")]
            Self::Sync(cmd) => cmd.run(&settings, store).await,

            #[cfg(feature = "daemon")]
            Self::Daemon(cmd) => cmd.run(settings, store).await,

            Self::DefaultConfig => unreachable!(),
        }
    }

    /// The daemon logs to a daily file (plus the console with `--show-logs`);
    /// everything else logs to stderr, filtered by `QUOTER_LOG`.
    fn init_logging(&self, settings: &Settings) -> Result<()> {
        #[cfg(feature = "daemon")]
        let (use_daemon_logging, daemon_show_logs) = match self {
            Self::Daemon(cmd) => (settings.logs.enabled, cmd.show_logs()),
            _ => (false, false),
        };

        #[cfg(not(feature = "daemon"))]
        let (use_daemon_logging, daemon_show_logs) = (false, false);

        // QUOTER_LOG overrides the configured level
        let env_log_set = std::env::var("QUOTER_LOG").is_ok();

        if use_daemon_logging {
            let log_dir = PathBuf::from(&settings.logs.dir);
            fs_err::create_dir_all(&log_dir)
                .wrap_err_with(|| format!("could not create log dir {}", log_dir.display()))?;

            cleanup_old_logs(&log_dir, &settings.logs.file, settings.logs.retention_days);

            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &log_dir, &settings.logs.file);

            let file_filter = if env_log_set {
                EnvFilter::from_env("QUOTER_LOG")
            } else {
                EnvFilter::default().add_directive(settings.logs.level.as_directive().parse()?)
            };

            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(file_filter);

            // Optionally mirror to the console for --show-logs
            let console_layer = daemon_show_logs.then(|| {
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(console_filter(env_log_set, LevelFilter::INFO))
            });

            tracing_subscriber::registry()
                .with(file_layer)
                .with(console_layer)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_filter(console_filter(env_log_set, LevelFilter::WARN)),
                )
                .init();
        }

        Ok(())
    }
}
