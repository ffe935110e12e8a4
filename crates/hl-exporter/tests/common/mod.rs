#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hl_exporter::MetricsSink;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the stub upstream answers to every request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this status and body.
    Body(u16, String),
    /// Advertise a `content-length` of the given size, send this shorter
    /// body, then close the connection.
    Truncated(usize, String),
    /// Accept the request and never respond.
    Hang,
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Minimal HTTP/1.1 server standing in for the Hyperliquid `info` API.
pub struct StubUpstream {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<()>,
}

impl StubUpstream {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let captured = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let captured = Arc::clone(&captured);
                let reply = reply.clone();
                tokio::spawn(async move {
                    serve_one(stream, reply, captured).await;
                });
            }
        });

        Self {
            url: format!("http://{addr}/info"),
            requests,
            task,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one(
    mut stream: TcpStream,
    reply: Reply,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    captured.lock().unwrap().push(CapturedRequest {
        method,
        path,
        headers,
        body,
    });

    match reply {
        Reply::Hang => std::future::pending::<()>().await,
        Reply::Body(status, body) => {
            let response = format!(
                "HTTP/1.1 {status} STUB\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Reply::Truncated(declared, body) => {
            let response = format!(
                "HTTP/1.1 200 STUB\r\ncontent-type: application/json\r\ncontent-length: {declared}\r\nconnection: close\r\n\r\n{body}"
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Stake(String, String, String, f64),
    Jailed(String, String, String, f64),
    Active(String, String, String, f64),
    RecentBlocks(String, String, String, i64),
    TotalStake(f64),
    JailedStake(f64),
    NotJailedStake(f64),
    ActiveStake(f64),
    InactiveStake(f64),
    ValidatorCount(i64),
}

impl Published {
    pub fn is_per_validator(&self) -> bool {
        matches!(
            self,
            Published::Stake(..)
                | Published::Jailed(..)
                | Published::Active(..)
                | Published::RecentBlocks(..)
        )
    }
}

/// [`MetricsSink`] that remembers every call in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Published>>,
    cycles: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Published> {
        self.events.lock().unwrap().clone()
    }

    pub fn cycles(&self) -> Vec<String> {
        self.cycles.lock().unwrap().clone()
    }

    fn push(&self, event: Published) {
        self.events.lock().unwrap().push(event);
    }
}

fn key(validator: &str, signer: &str, name: &str) -> (String, String, String) {
    (validator.to_string(), signer.to_string(), name.to_string())
}

impl MetricsSink for RecordingSink {
    fn set_validator_stake(&self, validator: &str, signer: &str, name: &str, stake: f64) {
        let (v, s, n) = key(validator, signer, name);
        self.push(Published::Stake(v, s, n, stake));
    }

    fn set_validator_jailed_status(&self, validator: &str, signer: &str, name: &str, status: f64) {
        let (v, s, n) = key(validator, signer, name);
        self.push(Published::Jailed(v, s, n, status));
    }

    fn set_validator_active_status(&self, validator: &str, signer: &str, name: &str, status: f64) {
        let (v, s, n) = key(validator, signer, name);
        self.push(Published::Active(v, s, n, status));
    }

    fn set_validator_recent_blocks(&self, validator: &str, signer: &str, name: &str, blocks: i64) {
        let (v, s, n) = key(validator, signer, name);
        self.push(Published::RecentBlocks(v, s, n, blocks));
    }

    fn set_total_stake(&self, value: f64) {
        self.push(Published::TotalStake(value));
    }

    fn set_jailed_stake(&self, value: f64) {
        self.push(Published::JailedStake(value));
    }

    fn set_not_jailed_stake(&self, value: f64) {
        self.push(Published::NotJailedStake(value));
    }

    fn set_active_stake(&self, value: f64) {
        self.push(Published::ActiveStake(value));
    }

    fn set_inactive_stake(&self, value: f64) {
        self.push(Published::InactiveStake(value));
    }

    fn set_validator_count(&self, count: i64) {
        self.push(Published::ValidatorCount(count));
    }

    fn record_cycle(&self, result: &str, _elapsed_secs: f64) {
        self.cycles.lock().unwrap().push(result.to_string());
    }
}

/// Body with one jailed/inactive validator (stake 100) and one
/// free/active validator (stake 50).
pub fn two_validators_body() -> String {
    serde_json::json!([
        {
            "validator": "0xaaa",
            "signer": "0xa51",
            "name": "Alpha",
            "description": "jailed and inactive",
            "nRecentBlocks": 0,
            "stake": 100,
            "isJailed": true,
            "unjailableAfter": 1_700_000_000_000i64,
            "isActive": false
        },
        {
            "validator": "0xbbb",
            "signer": "0xb51",
            "name": "Beta",
            "description": "healthy",
            "nRecentBlocks": 12,
            "stake": 50,
            "isJailed": false,
            "unjailableAfter": null,
            "isActive": true
        }
    ])
    .to_string()
}

/// Address nothing is listening on.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/info")
}
