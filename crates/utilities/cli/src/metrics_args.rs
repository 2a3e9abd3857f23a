//! Prometheus metrics CLI arguments.

use crate::{CliResult, init_prometheus_server};
use clap::Args;
use std::net::{IpAddr, Ipv4Addr};

/// Configuration of the Prometheus exporter.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Enables the Prometheus metrics endpoint.
    #[arg(long = "metrics.enabled", global = true, default_value_t = false, env = "OMNI_METRICS_ENABLED")]
    pub enabled: bool,

    /// Listen address of the metrics endpoint.
    #[arg(
        long = "metrics.addr",
        global = true,
        default_value = "0.0.0.0",
        env = "OMNI_METRICS_ADDR"
    )]
    pub addr: IpAddr,

    /// Listen port of the metrics endpoint.
    #[arg(long = "metrics.port", global = true, default_value_t = 9090, env = "OMNI_METRICS_PORT")]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the exporter when enabled, then runs `describe` to register metric descriptions.
    pub fn init_with(&self, describe: impl FnOnce()) -> CliResult<()> {
        if self.enabled {
            init_prometheus_server(self.addr, self.port)?;
            describe();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        metrics: MetricsArgs,
    }

    #[test]
    fn test_default_metrics_args() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        assert_eq!(cli.metrics, MetricsArgs::default());
    }

    #[test]
    fn test_metrics_args_parse() {
        let cli = TestCli::try_parse_from([
            "test",
            "--metrics.enabled",
            "--metrics.addr",
            "127.0.0.1",
            "--metrics.port",
            "9999",
        ])
        .unwrap();

        assert!(cli.metrics.enabled);
        assert_eq!(cli.metrics.addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(cli.metrics.port, 9999);
    }

    #[test]
    fn test_disabled_metrics_skip_describe() {
        let mut described = false;
        MetricsArgs::default().init_with(|| described = true).unwrap();
        assert!(!described);
    }
}
