//! Contains the router CLI.

use crate::{loader, router::Router, scheduler::Scheduler};
use anyhow::{Context, Result};
use clap::Parser;
use omni_cli::{LogArgs, MetricsArgs, cli_styles};
use omni_relay::{DEFAULT_MAX_TRIGGERS_PER_SWEEP, Metrics, RelayOptions};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Omniverse message router.
///
/// Watches every configured chain for protocol transactions, forwards each one to the other
/// chains, and periodically submits pending messages and triggers delayed executions.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub(crate) struct Cli {
    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log: LogArgs,
    /// Prometheus CLI arguments.
    #[command(flatten)]
    pub(crate) metrics: MetricsArgs,
    /// Path to the TOML configuration file.
    #[arg(long, short = 'c', default_value = "config/default.toml", env = "OMNI_ROUTER_CONFIG")]
    pub(crate) config: PathBuf,
    /// Path to the secrets file, overriding the one named in the configuration.
    #[arg(long, env = "OMNI_ROUTER_SECRET")]
    pub(crate) secret: Option<PathBuf>,
    /// Seconds between two scheduler ticks.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) interval: u64,
    /// Upper bound of delayed transactions triggered per chain and tick.
    #[arg(long, default_value_t = DEFAULT_MAX_TRIGGERS_PER_SWEEP)]
    pub(crate) max_triggers: usize,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        self.log.init_tracing()?;
        self.metrics.init_with(Metrics::init)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        runtime.block_on(self.start())
    }

    /// The relay options selected on the command line.
    pub(crate) fn relay_options(&self) -> RelayOptions {
        RelayOptions { max_triggers_per_sweep: self.max_triggers, ..Default::default() }
    }

    /// Connects every configured chain and routes until Ctrl-C.
    pub(crate) async fn start(self) -> Result<()> {
        let settings = loader::load_settings(&self.config, self.secret.as_deref())?;
        let relays = loader::connect(&settings, self.relay_options()).await?;

        let cancel = CancellationToken::new();
        let router = Arc::new(Router::new(relays.clone()));
        let mut dispatchers = Vec::with_capacity(relays.len());
        for relay in &relays {
            let handle = relay
                .start_subscription(router.clone(), cancel.child_token())
                .with_context(|| format!("failed to start subscription on {}", relay.name()))?;
            dispatchers.push(handle);
        }

        let scheduler = Scheduler::new(relays, Duration::from_secs(self.interval));
        info!(target: "router", chains = dispatchers.len(), interval = self.interval, "Router started");

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                info!(target: "router", "Received Ctrl-C, shutting down");
            }
            _ = scheduler.run(cancel.clone()) => {}
        }

        cancel.cancel();
        for handle in dispatchers {
            if let Err(err) = handle.shutdown().await {
                warn!(target: "router", %err, "Dispatcher task did not exit cleanly");
            }
        }
        info!(target: "router", "Router stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_flags() {
        let cli = Cli::try_parse_from(["omni-router"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        assert_eq!(cli.secret, None);
        assert_eq!(cli.interval, 10);
        assert_eq!(cli.relay_options(), RelayOptions::default());
        assert!(!cli.metrics.enabled);
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "omni-router",
            "--config",
            "/etc/omni/router.toml",
            "--secret",
            "/run/secrets/omni.json",
            "--interval",
            "3",
            "--max-triggers",
            "5",
            "-vv",
            "--metrics.enabled",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("/etc/omni/router.toml"));
        assert_eq!(cli.secret, Some(PathBuf::from("/run/secrets/omni.json")));
        assert_eq!(cli.interval, 3);
        assert_eq!(cli.relay_options().max_triggers_per_sweep, 5);
        assert_eq!(cli.log.v, 2);
        assert!(cli.metrics.enabled);
    }

    #[rstest]
    #[case::zero_interval(&["omni-router", "--interval", "0"])]
    #[case::negative_triggers(&["omni-router", "--max-triggers", "-1"])]
    #[case::unknown_flag(&["omni-router", "--chain", "alpha"])]
    fn test_invalid_flags(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
