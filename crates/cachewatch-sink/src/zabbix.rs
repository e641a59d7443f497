//! Zabbix sender protocol client.
//!
//! Frame layout: `ZBXD`, one flags byte, little-endian data length (4 bytes)
//! plus 4 reserved bytes, then the JSON body.

use crate::error::{Result, SinkError};
use crate::{Destination, ForwardSummary};
use async_trait::async_trait;
use cachewatch_common::types::OutputRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const FRAME_MAGIC: &[u8; 4] = b"ZBXD";
const FLAG_ZABBIX: u8 = 0x01;
const FLAG_COMPRESSED: u8 = 0x02;
const HEADER_LEN: usize = 13;
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Trapper endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZabbixConfig {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    10051
}

fn default_timeout() -> u64 {
    10
}

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: &'a [OutputRecord],
    clock: i64,
}

#[derive(Debug, Deserialize)]
struct SenderResponse {
    response: String,
    #[serde(default)]
    info: String,
}

/// Counters from the trapper's `info` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedInfo {
    pub processed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProcessedInfo {
    /// Parses `"processed: 3; failed: 1; total: 4; seconds spent: 0.000055"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachewatch_sink::zabbix::ProcessedInfo;
    ///
    /// let info = ProcessedInfo::parse("processed: 3; failed: 1; total: 4; seconds spent: 0.000055").unwrap();
    /// assert_eq!((info.processed, info.failed, info.total), (3, 1, 4));
    /// ```
    pub fn parse(info: &str) -> Option<Self> {
        let mut processed = None;
        let mut failed = None;
        let mut total = None;

        for part in info.split(';') {
            let Some((name, value)) = part.split_once(':') else {
                continue;
            };
            let value = value.trim().parse::<usize>().ok();
            match name.trim() {
                "processed" => processed = value,
                "failed" => failed = value,
                "total" => total = value,
                _ => {}
            }
        }

        Some(Self {
            processed: processed?,
            failed: failed?,
            total: total?,
        })
    }
}

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(FRAME_MAGIC);
    frame.push(FLAG_ZABBIX);
    frame.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    if &header[..4] != FRAME_MAGIC {
        return Err(SinkError::Protocol("missing ZBXD header".to_string()));
    }
    let flags = header[4];
    if flags & FLAG_COMPRESSED != 0 {
        return Err(SinkError::Protocol("compressed frames are not supported".to_string()));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&header[5..9]);
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(SinkError::Protocol(format!("frame of {len} bytes exceeds limit")));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Pushes records to a Zabbix server or proxy trapper port.
///
/// All records of a batch go out in a single request.
pub struct ZabbixSender {
    endpoint: String,
    timeout: Duration,
}

impl ZabbixSender {
    pub fn new(server: &str, port: u16, timeout_secs: u64) -> Self {
        Self {
            endpoint: format!("{server}:{port}"),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn from_config(config: &ZabbixConfig) -> Self {
        Self::new(&config.server, config.port, config.timeout_secs)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `records` in one request and returns the trapper's counters.
    ///
    /// # Errors
    ///
    /// Fails on connection, timeout or framing errors, and when the trapper
    /// does not answer `success`.
    pub async fn send(&self, records: &[OutputRecord]) -> Result<ProcessedInfo> {
        let request = SenderRequest {
            request: "sender data",
            data: records,
            clock: Utc::now().timestamp(),
        };
        let payload = serde_json::to_vec(&request)?;

        let body = tokio::time::timeout(self.timeout, self.exchange(&payload))
            .await
            .map_err(|_| SinkError::Timeout(self.timeout.as_secs()))??;

        let response: SenderResponse = serde_json::from_slice(&body)?;
        if response.response != "success" {
            return Err(SinkError::Rejected {
                endpoint: self.endpoint.clone(),
                info: response.info,
            });
        }

        // Older trappers omit counters; treat everything as processed then.
        Ok(ProcessedInfo::parse(&response.info).unwrap_or(ProcessedInfo {
            processed: records.len(),
            failed: 0,
            total: records.len(),
        }))
    }

    async fn exchange(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut stream = TcpStream::connect(&self.endpoint).await?;
        stream.write_all(&encode_frame(payload)).await?;
        stream.flush().await?;
        read_frame(&mut stream).await
    }
}

#[async_trait]
impl Destination for ZabbixSender {
    fn name(&self) -> &str {
        "zabbix"
    }

    async fn forward(&self, record: &OutputRecord) -> Result<()> {
        let info = self.send(std::slice::from_ref(record)).await?;
        if info.failed > 0 {
            return Err(SinkError::Rejected {
                endpoint: self.endpoint.clone(),
                info: format!("item {} not processed", record.key),
            });
        }
        Ok(())
    }

    async fn forward_all(&self, records: &[OutputRecord]) -> ForwardSummary {
        if records.is_empty() {
            return ForwardSummary::default();
        }

        match self.send(records).await {
            Ok(info) => {
                let accepted = info.processed.min(records.len());
                let failed = records.len() - accepted;
                if failed > 0 {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        processed = info.processed,
                        failed = info.failed,
                        total = info.total,
                        "Zabbix trapper did not process every item"
                    );
                } else {
                    tracing::debug!(endpoint = %self.endpoint, processed = info.processed, "Sent items");
                }
                ForwardSummary { accepted, failed }
            }
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, count = records.len(), "Failed to send items");
                ForwardSummary {
                    accepted: 0,
                    failed: records.len(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn record(key: &str, value: &str) -> OutputRecord {
        OutputRecord::new(key, value, "cache01", 1_700_000_000)
    }

    /// Accepts one connection, captures the request body and answers with `reply`.
    async fn fake_trapper(reply: serde_json::Value) -> (u16, tokio::task::JoinHandle<serde_json::Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let body = read_frame(&mut socket).await.unwrap();
            let frame = encode_frame(reply.to_string().as_bytes());
            socket.write_all(&frame).await.unwrap();
            serde_json::from_slice(&body).unwrap()
        });
        (port, handle)
    }

    #[test]
    fn should_encode_header_with_little_endian_length() {
        let frame = encode_frame(b"{}");
        assert_eq!(&frame[..5], b"ZBXD\x01");
        assert_eq!(&frame[5..13], &2u64.to_le_bytes());
        assert_eq!(&frame[13..], b"{}");
    }

    #[tokio::test]
    async fn should_read_back_encoded_frame() {
        let frame = encode_frame(br#"{"response":"success"}"#);
        let mut reader = &frame[..];
        let payload = read_frame(&mut reader).await.unwrap();
        assert_eq!(payload, br#"{"response":"success"}"#);
    }

    #[tokio::test]
    async fn should_reject_frame_without_magic() {
        let mut reader = &b"HTTP/1.1 400 Bad Request\r\n"[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, SinkError::Protocol(_)));
    }

    #[test]
    fn should_not_parse_info_without_counters() {
        assert_eq!(ProcessedInfo::parse(""), None);
        assert_eq!(ProcessedInfo::parse("processed: 1"), None);
    }

    #[tokio::test]
    async fn should_send_all_records_in_one_request() {
        let (port, server) = fake_trapper(serde_json::json!({
            "response": "success",
            "info": "processed: 2; failed: 0; total: 2; seconds spent: 0.000100",
        }))
        .await;
        let sender = ZabbixSender::new("127.0.0.1", port, 5);
        let records = vec![record("blackbird.elasticache.ping", "1"), record("k", "2.5")];

        let summary = sender.forward_all(&records).await;
        let request = server.await.unwrap();

        assert_eq!(summary, ForwardSummary { accepted: 2, failed: 0 });
        assert_eq!(request["request"], "sender data");
        assert_eq!(request["data"].as_array().unwrap().len(), 2);
        assert_eq!(request["data"][0]["key"], "blackbird.elasticache.ping");
        assert_eq!(request["data"][1]["value"], "2.5");
        assert_eq!(request["data"][1]["clock"], 1_700_000_000);
    }

    #[tokio::test]
    async fn should_count_items_the_trapper_failed() {
        let (port, server) = fake_trapper(serde_json::json!({
            "response": "success",
            "info": "processed: 1; failed: 2; total: 3; seconds spent: 0.000100",
        }))
        .await;
        let sender = ZabbixSender::new("127.0.0.1", port, 5);
        let records = vec![record("a", "1"), record("b", "1"), record("c", "1")];

        let summary = sender.forward_all(&records).await;
        server.await.unwrap();

        assert_eq!(summary, ForwardSummary { accepted: 1, failed: 2 });
    }

    #[tokio::test]
    async fn should_fail_whole_batch_when_trapper_refuses() {
        let (port, server) = fake_trapper(serde_json::json!({
            "response": "failed",
            "info": "host not monitored",
        }))
        .await;
        let sender = ZabbixSender::new("127.0.0.1", port, 5);

        let err = sender.send(&[record("a", "1")]).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, SinkError::Rejected { .. }));
    }

    #[tokio::test]
    async fn should_count_every_record_as_failed_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let sender = ZabbixSender::new("127.0.0.1", port, 2);

        let summary = sender.forward_all(&[record("a", "1"), record("b", "1")]).await;

        assert_eq!(summary, ForwardSummary { accepted: 0, failed: 2 });
    }

    #[test]
    fn should_apply_config_defaults() {
        let cfg: ZabbixConfig = serde_json::from_value(serde_json::json!({ "server": "zbx.local" })).unwrap();
        let sender = ZabbixSender::from_config(&cfg);
        assert_eq!(sender.endpoint(), "zbx.local:10051");
        assert_eq!(cfg.timeout_secs, 10);
    }
}
