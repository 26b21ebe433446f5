//! Client for the result endpoint (`GET /api/result/{id}`).
//!
//! Requests run on a worker thread so the event loop keeps drawing. Each
//! request is tagged with a sequence number; only the response to the most
//! recent request is ever handed back.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
#[cfg(test)]
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, COOKIE};
use thiserror::Error;

use super::models::ResultPayload;
use super::shaper::ShapeError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid payload: {0}")]
    Shape(#[from] ShapeError),
    #[error("could not start request: {0}")]
    Spawn(String),
}

/// Anything that can produce a result payload for an id
pub trait ResultSource: Send + Sync {
    fn fetch_result(&self, result_id: u64) -> Result<ResultPayload, FetchError>;
}

/// Blocking HTTP client for the detection server
pub struct HttpResultClient {
    base_url: String,
    session: Option<String>,
    http: reqwest::blocking::Client,
}

impl HttpResultClient {
    pub fn new(base_url: &str, session: Option<String>) -> Result<Self, FetchError> {
        // Unauthenticated requests are redirected to the login page; surface
        // the redirect status instead of decoding HTML.
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("energy-dash/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(HttpResultClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            http,
        })
    }

    pub fn result_url(&self, result_id: u64) -> String {
        format!("{}/api/result/{result_id}", self.base_url)
    }

    fn cookie_header(&self) -> Option<String> {
        self.session.as_ref().map(|s| {
            if s.contains('=') {
                s.clone()
            } else {
                format!("session={s}")
            }
        })
    }
}

impl ResultSource for HttpResultClient {
    fn fetch_result(&self, result_id: u64) -> Result<ResultPayload, FetchError> {
        let url = self.result_url(result_id);
        tracing::info!(%url, "fetching result");

        let mut request = self.http.get(&url).header(ACCEPT, "application/json");
        if let Some(cookie) = self.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text()?;
        let payload: ResultPayload = serde_json::from_str(&body)?;
        payload.validate()?;
        Ok(payload)
    }
}

/// A completed fetch
#[derive(Debug)]
pub struct FetchResponse {
    pub seq: u64,
    pub result_id: u64,
    pub outcome: Result<ResultPayload, FetchError>,
}

/// Issues background fetches and keeps only the latest response
pub struct ResultFetcher {
    source: Arc<dyn ResultSource>,
    tx: Sender<FetchResponse>,
    rx: Receiver<FetchResponse>,
    latest: u64,
}

impl ResultFetcher {
    pub fn new(source: Arc<dyn ResultSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        ResultFetcher {
            source,
            tx,
            rx,
            latest: 0,
        }
    }

    /// Start fetching `result_id`. Returns the request's sequence number;
    /// any earlier request still in flight is superseded.
    pub fn request(&mut self, result_id: u64) -> u64 {
        self.latest += 1;
        let seq = self.latest;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("result-fetch-{seq}"))
            .spawn(move || {
                let outcome = source.fetch_result(result_id);
                // Receiver gone means the page was torn down
                let _ = tx.send(FetchResponse {
                    seq,
                    result_id,
                    outcome,
                });
            });

        if let Err(e) = spawned {
            let _ = self.tx.send(FetchResponse {
                seq,
                result_id,
                outcome: Err(FetchError::Spawn(e.to_string())),
            });
        }
        seq
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    /// Drain finished fetches, returning the current one if it has arrived.
    pub fn poll(&self) -> Option<FetchResponse> {
        let mut current = None;
        while let Ok(response) = self.rx.try_recv() {
            if self.is_current(response.seq) {
                current = Some(response);
            } else {
                tracing::debug!(
                    seq = response.seq,
                    latest = self.latest,
                    result_id = response.result_id,
                    "dropping stale result response"
                );
            }
        }
        current
    }

    /// Block until the current fetch completes or `timeout` passes
    #[cfg(test)]
    pub fn wait(&self, timeout: Duration) -> Option<FetchResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(response) if self.is_current(response.seq) => return Some(response),
                Ok(response) => {
                    tracing::debug!(seq = response.seq, "dropping stale result response");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;

    /// Serve one canned HTTP response, returning the base URL and the raw
    /// request the client sent.
    fn serve_once(status_line: &str, body: &str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    /// Source answering from a fixed table, with optional per-id delays
    pub(crate) struct StubSource {
        pub responses: Mutex<Vec<(u64, Duration, Result<ResultPayload, u16>)>>,
    }

    impl StubSource {
        pub(crate) fn new(responses: Vec<(u64, Duration, Result<ResultPayload, u16>)>) -> Self {
            StubSource {
                responses: Mutex::new(responses),
            }
        }
    }

    impl ResultSource for StubSource {
        fn fetch_result(&self, result_id: u64) -> Result<ResultPayload, FetchError> {
            let entry = self
                .responses
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _, _)| *id == result_id)
                .map(|(_, delay, r)| (*delay, r.clone()));
            match entry {
                Some((delay, outcome)) => {
                    thread::sleep(delay);
                    outcome.map_err(FetchError::Status)
                }
                None => Err(FetchError::Status(404)),
            }
        }
    }

    #[test]
    fn test_http_500_is_reported_with_status() {
        let (base, server) = serve_once("500 Internal Server Error", "{}");
        let client = HttpResultClient::new(&base, None).unwrap();
        let err = client.fetch_result(42).unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
        assert!(err.to_string().contains("500"));

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /api/result/42 "));
    }

    #[test]
    fn test_http_success_decodes_payload_and_sends_session() {
        let body = r#"{"time_series": {"timestamps": ["a", "b"], "values": [1, 2], "anomalies": [0, 1]},
                       "anomaly_count": 1, "algorithm": "kmeans"}"#;
        let (base, server) = serve_once("200 OK", body);
        let client = HttpResultClient::new(&format!("{base}/"), Some("abc123".into())).unwrap();
        let payload = client.fetch_result(7).unwrap();
        assert_eq!(payload.time_series.anomalies, vec![false, true]);

        let request = server.join().unwrap().to_lowercase();
        assert!(request.contains("cookie: session=abc123"));
    }

    #[test]
    fn test_inconsistent_payload_is_rejected() {
        let body = r#"{"time_series": {"timestamps": ["a", "b"], "values": [1], "anomalies": [0, 1]}}"#;
        let (base, _server) = serve_once("200 OK", body);
        let client = HttpResultClient::new(&base, None).unwrap();
        assert!(matches!(client.fetch_result(1), Err(FetchError::Shape(_))));
    }

    #[test]
    fn test_result_url() {
        let client = HttpResultClient::new("http://localhost:5000/", None).unwrap();
        assert_eq!(client.result_url(42), "http://localhost:5000/api/result/42");
    }

    #[test]
    fn test_latest_request_wins_over_slow_earlier_response() {
        let source = StubSource::new(vec![
            (1, Duration::from_millis(200), Ok(ResultPayload::default())),
            (2, Duration::from_millis(0), Err(503)),
        ]);
        let mut fetcher = ResultFetcher::new(Arc::new(source));
        let first = fetcher.request(1);
        let second = fetcher.request(2);
        assert!(!fetcher.is_current(first));
        assert!(fetcher.is_current(second));

        let response = fetcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(response.seq, second);
        assert_eq!(response.result_id, 2);

        // The slow first response arrives later and is discarded
        thread::sleep(Duration::from_millis(300));
        assert!(fetcher.poll().is_none());
    }
}
