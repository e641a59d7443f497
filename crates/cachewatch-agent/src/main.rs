mod config;

use anyhow::{Context, Result};
use cachewatch_cloud::collector::{dispatch, ElastiCacheCollector};
use cachewatch_sink::zabbix::ZabbixSender;
use clap::Parser;
use config::{AgentConfig, Overrides};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Poll AWS ElastiCache metrics from CloudWatch once and print them as JSON.
#[derive(Parser, Debug)]
#[command(name = "cachewatch", version, long_about = None)]
struct Cli {
    /// Cache engine ("redis" or "memcached")
    engine: Option<String>,

    /// ElastiCache cluster ID
    cluster_id: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cache node ID
    #[arg(long)]
    node_id: Option<String>,

    /// Polling interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Host tag attached to every record
    #[arg(long)]
    hostname: Option<String>,

    /// AWS region
    #[arg(long)]
    region: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Metric name to skip (repeatable)
    #[arg(long = "ignore")]
    ignore_metrics: Vec<String>,

    /// Also push the records to the [zabbix] trapper from the config file
    #[arg(long)]
    send: bool,

    /// Pretty-print the JSON document
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            cache_engine: self.engine.clone(),
            cache_cluster_id: self.cluster_id.clone(),
            cache_node_id: self.node_id.clone(),
            interval: self.interval,
            hostname: self.hostname.clone(),
            region_name: self.region.clone(),
            aws_access_key_id: self.access_key_id.clone(),
            aws_secret_access_key: self.secret_access_key.clone(),
            ignore_metrics: self.ignore_metrics.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON document only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("cachewatch=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    config.apply(cli.overrides());

    let cloud = config.cloudwatch_config()?;
    let collector = ElastiCacheCollector::new(config.collector_options()?);
    tracing::info!(
        engine = %config.cache_engine,
        cluster = %config.cache_cluster_id,
        region = %cloud.region_name,
        "cachewatch polling"
    );

    let report = collector.collect(&cloud).await.context("Poll cycle failed")?;

    let document = report.to_document();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    if cli.send {
        let zabbix = config
            .zabbix
            .as_ref()
            .context("--send requires a [zabbix] section in the config file")?;
        let sender = ZabbixSender::from_config(zabbix);
        let summary = dispatch(&report, &sender).await;
        tracing::info!(
            endpoint = sender.endpoint(),
            accepted = summary.accepted,
            failed = summary.failed,
            "Sent poll cycle"
        );
    }

    Ok(())
}
