mod cycle;
mod poll;
mod state_file;

use ciewatch_core::AppConfig;
use ciewatch_wizard::{ChromeLauncher, PageLauncher};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::cycle::CycleRunner;
use crate::poll::PollSettings;
use crate::state_file::StateFile;

#[derive(Debug, Parser)]
#[command(name = "ciewatch")]
#[command(about = "Watch the CIE appointment wizard for new availability")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll the wizard and notify on new slots (the default)
    Watch {
        /// Stop after this many cycles
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        cycles: Option<u64>,
    },
    /// Run one cycle and print matching offices without notifying
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = ciewatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let launcher = ChromeLauncher::new(config.headless);
    let runner = CycleRunner::new(&launcher, &config);

    match cli.command.unwrap_or(Commands::Watch { cycles: None }) {
        Commands::Watch { cycles } => run_watch(&runner, &config, cycles).await,
        Commands::Check => run_check(&runner).await,
    }
}

async fn run_watch<L: PageLauncher>(
    runner: &CycleRunner<'_, L>,
    config: &AppConfig,
    cycles: Option<u64>,
) -> anyhow::Result<()> {
    let notifier =
        ciewatch_notify::build_notifier(config.telegram.as_ref(), config.notify_max_retries)?;
    let store = config.state_path.clone().map(StateFile::new);
    let mut state = store.as_ref().map(StateFile::load).unwrap_or_default();
    let settings = PollSettings::from_app_config(config, cycles);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    tracing::info!(
        targets = config.targets.len(),
        mode = %config.extraction_mode,
        interval_secs = config.poll_interval_secs,
        jitter_secs = config.poll_jitter_secs,
        "watching for new slots"
    );
    let ran = poll::watch(
        runner,
        notifier.as_ref(),
        store.as_ref(),
        &settings,
        &mut state,
        stop_rx,
    )
    .await;
    tracing::info!(cycles = ran, "watcher stopped");
    Ok(())
}

async fn run_check<L: PageLauncher>(runner: &CycleRunner<'_, L>) -> anyhow::Result<()> {
    for (target, records) in runner.candidates().await? {
        println!("{} ({} candidate(s))", target.key, records.len());
        for record in records {
            println!(
                "  - {} | {} | {}",
                record.office_name, record.office_address, record.date_text
            );
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping after the current cycle");
}
