use anyhow::{bail, Context};
use cachewatch_cloud::collector::CollectorOptions;
use cachewatch_cloud::{CloudWatchConfig, Dimensions};
use cachewatch_sink::zabbix::ZabbixConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_region")]
    pub region_name: String,
    #[serde(default)]
    pub aws_access_key_id: Option<String>,
    #[serde(default)]
    pub aws_secret_access_key: Option<String>,
    /// CloudWatch endpoint override (VPC endpoint, local emulator)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// "redis" or "memcached"
    #[serde(default)]
    pub cache_engine: String,
    #[serde(default)]
    pub cache_cluster_id: String,
    #[serde(default = "default_node_id")]
    pub cache_node_id: String,
    /// Polling interval of the host framework, in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Host tag for every record; falls back to the cluster ID
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ignore_metrics: Vec<String>,
    #[serde(default)]
    pub zabbix: Option<ZabbixConfig>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_node_id() -> String {
    "0001".to_string()
}

fn default_interval() -> u64 {
    60
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            region_name: default_region(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            endpoint: None,
            request_timeout_secs: default_request_timeout(),
            cache_engine: String::new(),
            cache_cluster_id: String::new(),
            cache_node_id: default_node_id(),
            interval: default_interval(),
            hostname: None,
            ignore_metrics: Vec::new(),
            zabbix: None,
        }
    }
}

/// Values given on the command line; each `Some` wins over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub cache_engine: Option<String>,
    pub cache_cluster_id: Option<String>,
    pub cache_node_id: Option<String>,
    pub interval: Option<u64>,
    pub hostname: Option<String>,
    pub region_name: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub ignore_metrics: Vec<String>,
}

impl AgentConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.cache_engine {
            self.cache_engine = v;
        }
        if let Some(v) = overrides.cache_cluster_id {
            self.cache_cluster_id = v;
        }
        if let Some(v) = overrides.cache_node_id {
            self.cache_node_id = v;
        }
        if let Some(v) = overrides.interval {
            self.interval = v;
        }
        if let Some(v) = overrides.hostname {
            self.hostname = Some(v);
        }
        if let Some(v) = overrides.region_name {
            self.region_name = v;
        }
        if overrides.aws_access_key_id.is_some() {
            self.aws_access_key_id = overrides.aws_access_key_id;
        }
        if overrides.aws_secret_access_key.is_some() {
            self.aws_secret_access_key = overrides.aws_secret_access_key;
        }
        self.ignore_metrics.extend(overrides.ignore_metrics);
    }

    pub fn cloudwatch_config(&self) -> anyhow::Result<CloudWatchConfig> {
        let (Some(key_id), Some(secret)) = (&self.aws_access_key_id, &self.aws_secret_access_key) else {
            bail!("aws_access_key_id and aws_secret_access_key must be set in the config file or environment");
        };

        Ok(CloudWatchConfig {
            region_name: self.region_name.clone(),
            aws_access_key_id: key_id.clone(),
            aws_secret_access_key: secret.clone(),
            endpoint: self.endpoint.clone(),
            request_timeout_secs: self.request_timeout_secs,
        })
    }

    pub fn collector_options(&self) -> anyhow::Result<CollectorOptions> {
        if self.cache_cluster_id.is_empty() {
            bail!("cache_cluster_id is required");
        }

        Ok(CollectorOptions {
            cache_engine: self.cache_engine.clone(),
            dimensions: Dimensions::new(&self.cache_cluster_id, &self.cache_node_id),
            interval_secs: self.interval,
            hostname: self
                .hostname
                .clone()
                .unwrap_or_else(|| self.cache_cluster_id.clone()),
            ignore_metrics: self.ignore_metrics.clone(),
        })
    }
}
