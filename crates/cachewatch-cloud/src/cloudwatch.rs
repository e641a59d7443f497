use crate::error::{CloudWatchError, Result};
use crate::{CloudWatchConfig, Datapoint, MetricsProvider, StatisticsQuery};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "monitoring";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const GET_METRIC_STATISTICS_TARGET: &str = "GraniteServiceVersion20100801.GetMetricStatistics";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-date;x-amz-target";

#[derive(Debug, Deserialize)]
struct GetMetricStatisticsOutput {
    #[serde(rename = "Datapoints", default)]
    datapoints: Vec<Datapoint>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// CloudWatch client bound to one region.
///
/// Holds its own HTTP connection pool; build one per poll cycle and drop it
/// when the cycle ends.
pub struct CloudWatchClient {
    name: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    url: Url,
    host: String,
    client: Client,
}

impl CloudWatchClient {
    pub fn connect(config: &CloudWatchConfig) -> Result<Self> {
        if config.region_name.is_empty() {
            return Err(CloudWatchError::ConfigError("region_name is empty".to_string()));
        }
        if config.aws_access_key_id.is_empty() || config.aws_secret_access_key.is_empty() {
            return Err(CloudWatchError::ConfigError(
                "aws_access_key_id and aws_secret_access_key are required".to_string(),
            ));
        }

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.{}.amazonaws.com/", SERVICE, config.region_name));
        let url = Url::parse(&endpoint)
            .map_err(|e| CloudWatchError::ConfigError(format!("invalid endpoint {endpoint}: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(CloudWatchError::ConfigError(format!("endpoint {endpoint} has no host")));
            }
        };

        let client = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            name: format!("cloudwatch:{}", config.region_name),
            region: config.region_name.clone(),
            access_key_id: config.aws_access_key_id.clone(),
            secret_access_key: config.aws_secret_access_key.clone(),
            url,
            host,
            client,
        })
    }

    /// AWS Signature Version 4 for a JSON-protocol POST to `/`.
    fn sign_v4(&self, target: &str, payload: &str, now: DateTime<Utc>) -> Result<String> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        // Step 1: Build canonical request
        let canonical_headers = format!(
            "content-type:{}\nhost:{}\nx-amz-date:{}\nx-amz-target:{}\n",
            CONTENT_TYPE, self.host, amz_date, target
        );
        let hashed_payload = format!("{:x}", Sha256::digest(payload.as_bytes()));
        let canonical_request = format!(
            "POST\n/\n\n{}\n{}\n{}",
            canonical_headers, SIGNED_HEADERS, hashed_payload
        );
        let hashed_canonical_request = format!("{:x}", Sha256::digest(canonical_request.as_bytes()));

        // Step 2: Build string to sign
        let credential_scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date, credential_scope, hashed_canonical_request
        );

        // Step 3: Derive signing key and sign
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_access_key).as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key_id, credential_scope, SIGNED_HEADERS, signature
        ))
    }

    async fn call_api(&self, target: &str, payload: &str) -> Result<String> {
        let now = Utc::now();
        let authorization = self.sign_v4(target, payload, now)?;

        let response = self
            .client
            .post(self.url.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-Amz-Date", now.format("%Y%m%dT%H%M%SZ").to_string())
            .header("X-Amz-Target", target)
            .header("Authorization", authorization)
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), body));
        }

        Ok(body)
    }
}

fn statistics_payload(query: &StatisticsQuery<'_>) -> serde_json::Value {
    serde_json::json!({
        "Namespace": query.namespace,
        "MetricName": query.metric_name,
        "Dimensions": [
            { "Name": "CacheClusterId", "Value": query.dimensions.cache_cluster_id },
            { "Name": "CacheNodeId", "Value": query.dimensions.cache_node_id },
        ],
        "StartTime": query.window.start.timestamp(),
        "EndTime": query.window.end.timestamp(),
        "Period": query.window.period_secs,
        "Statistics": [query.statistic.as_str()],
    })
}

fn api_error(status: u16, body: String) -> CloudWatchError {
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(ApiErrorBody {
            error_type: Some(error_type),
            message,
        }) => CloudWatchError::ApiResponseError {
            // "com.amazonaws.monitoring#InvalidParameterValueException" -> last segment
            code: error_type.rsplit('#').next().unwrap_or(&error_type).to_string(),
            message: message.unwrap_or_default(),
        },
        _ => CloudWatchError::HttpError { status, body },
    }
}

#[async_trait::async_trait]
impl MetricsProvider for CloudWatchClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_metric_statistics(&self, query: &StatisticsQuery<'_>) -> Result<Vec<Datapoint>> {
        let payload = statistics_payload(query).to_string();
        let body = self.call_api(GET_METRIC_STATISTICS_TARGET, &payload).await?;
        let output: GetMetricStatisticsOutput = serde_json::from_str(&body)?;

        tracing::trace!(
            metric = query.metric_name,
            statistic = %query.statistic,
            datapoints = output.datapoints.len(),
            "GetMetricStatistics"
        );
        Ok(output.datapoints)
    }
}

/// HMAC-SHA256 helper function
fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| CloudWatchError::HmacError(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
