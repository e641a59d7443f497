//! Metrics requested per category.
//!
//! Names follow the `AWS/ElastiCache` namespace. A metric listed under both
//! statistics gets a statistic suffix on its output key.

use cachewatch_common::types::{MetricCategory, MetricSpec, Statistic};

use Statistic::{Average, Maximum};

pub const HOST_LEVEL: &[MetricSpec] = &[
    MetricSpec::new("CPUUtilization", Average),
    MetricSpec::new("SwapUsage", Average),
    MetricSpec::new("FreeableMemory", Average),
    MetricSpec::new("NetworkBytesIn", Average),
    MetricSpec::new("NetworkBytesOut", Average),
];

pub const REDIS: &[MetricSpec] = &[
    MetricSpec::new("CurrConnections", Average),
    MetricSpec::new("CurrConnections", Maximum),
    MetricSpec::new("Evictions", Average),
    MetricSpec::new("Evictions", Maximum),
    MetricSpec::new("Reclaimed", Average),
    MetricSpec::new("Reclaimed", Maximum),
    MetricSpec::new("NewConnections", Average),
    MetricSpec::new("NewConnections", Maximum),
    MetricSpec::new("BytesUsedForCache", Maximum),
    MetricSpec::new("CacheHits", Average),
    MetricSpec::new("CacheHits", Maximum),
    MetricSpec::new("CacheMisses", Average),
    MetricSpec::new("CacheMisses", Maximum),
    MetricSpec::new("ReplicationLag", Average),
    MetricSpec::new("ReplicationLag", Maximum),
    MetricSpec::new("GetTypeCmds", Maximum),
    MetricSpec::new("SetTypeCmds", Maximum),
    MetricSpec::new("KeyBasedCmds", Maximum),
    MetricSpec::new("StringBasedCmds", Maximum),
    MetricSpec::new("HashBasedCmds", Maximum),
    MetricSpec::new("ListBasedCmds", Maximum),
    MetricSpec::new("SetBasedCmds", Maximum),
    MetricSpec::new("SortedSetBasedCmds", Maximum),
    MetricSpec::new("CurrItems", Maximum),
];

pub const MEMCACHED: &[MetricSpec] = &[
    MetricSpec::new("CurrConnections", Average),
    MetricSpec::new("CurrConnections", Maximum),
    MetricSpec::new("Evictions", Average),
    MetricSpec::new("Evictions", Maximum),
    MetricSpec::new("Reclaimed", Average),
    MetricSpec::new("Reclaimed", Maximum),
    MetricSpec::new("NewConnections", Average),
    MetricSpec::new("NewConnections", Maximum),
    MetricSpec::new("GetHits", Average),
    MetricSpec::new("GetHits", Maximum),
    MetricSpec::new("GetMisses", Average),
    MetricSpec::new("GetMisses", Maximum),
    MetricSpec::new("BytesUsedForCacheItems", Maximum),
    MetricSpec::new("BytesReadIntoMemcached", Maximum),
    MetricSpec::new("BytesWrittenOutFromMemcached", Maximum),
    MetricSpec::new("CmdGet", Maximum),
    MetricSpec::new("CmdSet", Maximum),
    MetricSpec::new("CmdFlush", Maximum),
    MetricSpec::new("CasHits", Maximum),
    MetricSpec::new("CasMisses", Maximum),
    MetricSpec::new("CasBadval", Maximum),
    MetricSpec::new("DeleteHits", Maximum),
    MetricSpec::new("DeleteMisses", Maximum),
    MetricSpec::new("IncrHits", Maximum),
    MetricSpec::new("IncrMisses", Maximum),
    MetricSpec::new("DecrHits", Maximum),
    MetricSpec::new("DecrMisses", Maximum),
    MetricSpec::new("CurrItems", Maximum),
    MetricSpec::new("NewItems", Maximum),
    MetricSpec::new("UnusedMemory", Maximum),
];

pub fn catalog(category: MetricCategory) -> &'static [MetricSpec] {
    match category {
        MetricCategory::Host => HOST_LEVEL,
        MetricCategory::Redis => REDIS,
        MetricCategory::Memcached => MEMCACHED,
    }
}

/// True when `category` samples `metric_name` under more than one statistic.
pub fn is_multi_statistic(category: MetricCategory, metric_name: &str) -> bool {
    catalog(category)
        .iter()
        .filter(|spec| spec.metric_name == metric_name)
        .take(2)
        .count()
        > 1
}
